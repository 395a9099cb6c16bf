//! One-shot DXF generation and saving downloaded artifacts to the user's device.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use shared::{domain::DesignRequest, protocol::GenerateRequest};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};

use crate::{
    artifact::ArtifactStore, error::ClientError, preview::RequestToken, transport::DesignService,
};

pub const DXF_EXTENSION: &str = "dxf";
pub const DEFAULT_FILE_STEM: &str = "output";

/// Leaves room under the usual 255-byte name limit for the extension and a
/// collision suffix.
const MAX_FILE_STEM_BYTES: usize = 200;

const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];
const MAX_NAME_COLLISIONS: u32 = 1000;

/// Where downloaded artifacts end up.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persists `bytes` under a name derived from `file_name` and returns the
    /// final location.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ClientError>;
}

/// Saves into a directory. Existing files are never overwritten; a ` (n)`
/// suffix is added instead.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn candidate_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{file_name} ({attempt})"),
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ClientError> {
        fs::create_dir_all(&self.dir).await.map_err(|err| {
            ClientError::Io(format!(
                "could not create output directory '{}': {err}",
                self.dir.display()
            ))
        })?;

        for attempt in 0..MAX_NAME_COLLISIONS {
            let path = self.dir.join(candidate_name(file_name, attempt));
            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(ClientError::Io(format!("{}: {err}", path.display())));
                }
            };

            let written = async {
                file.write_all(bytes).await?;
                file.flush().await
            }
            .await;
            if let Err(err) = written {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(ClientError::Io(format!("{}: {err}", path.display())));
            }
            return Ok(path);
        }

        Err(ClientError::Io(format!(
            "too many files named like '{file_name}' in '{}'",
            self.dir.display()
        )))
    }
}

/// Turns free text into a file stem that is safe on every desktop platform.
///
/// The stem is capped in bytes on a char boundary, and names Windows reserves
/// for devices fall back to `fallback`.
pub fn sanitize_file_stem(text: &str, fallback: &str) -> String {
    let mut replaced = String::new();
    for ch in text.trim().chars() {
        let ch = if ch.is_alphanumeric() || matches!(ch, ' ' | '-' | '_' | '.') {
            ch
        } else {
            '_'
        };
        if replaced.len() + ch.len_utf8() > MAX_FILE_STEM_BYTES {
            break;
        }
        replaced.push(ch);
    }
    let trimmed = replaced.trim_matches(|ch: char| ch == '.' || ch == ' ' || ch == '_');
    if trimmed.is_empty() || is_reserved_device_name(trimmed) {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_reserved_device_name(stem: &str) -> bool {
    let base = stem.split('.').next().unwrap_or(stem).trim_end();
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(base))
}

pub fn dxf_file_name(text: &str) -> String {
    format!(
        "{}.{DXF_EXTENSION}",
        sanitize_file_stem(text, DEFAULT_FILE_STEM)
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: usize,
}

/// Runs generation requests. Calls are independent of each other and of the
/// live preview: each has its own token sequence entry and outcome.
pub struct GenerationInvoker {
    service: Arc<dyn DesignService>,
    sink: Arc<dyn ArtifactSink>,
    store: ArtifactStore,
    sequence: AtomicU64,
}

impl GenerationInvoker {
    pub fn new(service: Arc<dyn DesignService>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            service,
            sink,
            store: ArtifactStore::new(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub async fn generate(&self, request: &DesignRequest) -> Result<SavedArtifact, ClientError> {
        if !request.has_text() {
            return Err(ClientError::validation(
                "enter some text before generating a DXF",
            ));
        }

        let token = RequestToken(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        info!(%token, layout = %request.layout(), font = %request.font(), "requesting DXF generation");

        let payload = match self.service.generate(&GenerateRequest::from(request)).await {
            Ok(payload) if payload.is_empty() => {
                let err = ClientError::remote(None, "service returned an empty DXF");
                warn!(%token, error = %err, "DXF generation failed");
                return Err(err);
            }
            Ok(payload) => payload,
            Err(err) => {
                warn!(%token, error = %err, "DXF generation failed");
                return Err(err);
            }
        };

        let file_name = dxf_file_name(request.text());
        let handle = self.store.acquire(payload, token);
        let saved = self.sink.save(&file_name, handle.bytes()).await;
        let size_bytes = handle.bytes().len();
        self.store.release(handle);

        let path = saved.inspect_err(|err| warn!(%token, error = %err, "saving DXF failed"))?;
        info!(%token, path = %path.display(), size_bytes, "DXF saved");
        Ok(SavedArtifact {
            path,
            file_name,
            size_bytes,
        })
    }
}

#[cfg(test)]
#[path = "tests/generation_tests.rs"]
mod tests;
