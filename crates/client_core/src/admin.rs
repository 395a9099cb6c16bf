//! Admin dashboard calls: usage analytics, font uploads and CSV export.

use std::{path::Path, sync::Arc};

use shared::protocol::LayoutUsage;
use tokio::fs;
use tracing::info;

use crate::{
    error::ClientError,
    generation::{ArtifactSink, SavedArtifact},
    transport::{DesignService, FontUpload},
};

pub const ANALYTICS_EXPORT_FILE_NAME: &str = "analytics.csv";

/// Extensions the service accepts for uploaded fonts and templates.
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["ttf", "otf", "dxf", "svg", "png", "jpg", "jpeg"];

const DEFAULT_UPLOAD_MESSAGE: &str = "Font uploaded!";

pub fn validate_upload_name(file_name: &str) -> Result<(), ClientError> {
    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return Err(ClientError::validation(format!(
            "'{file_name}' has no file extension"
        )));
    };
    if stem.is_empty() {
        return Err(ClientError::validation(format!(
            "'{file_name}' has an empty file name"
        )));
    }
    let ext = ext.to_ascii_lowercase();
    if !ALLOWED_UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ClientError::validation(format!(
            "unsupported file type '.{ext}' (allowed: {})",
            ALLOWED_UPLOAD_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

pub struct AdminClient {
    service: Arc<dyn DesignService>,
    sink: Arc<dyn ArtifactSink>,
}

impl AdminClient {
    pub fn new(service: Arc<dyn DesignService>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self { service, sink }
    }

    pub async fn analytics(&self) -> Result<Vec<LayoutUsage>, ClientError> {
        self.service.analytics().await
    }

    /// Uploads a font or template file and returns the service's message.
    pub async fn upload_font(&self, path: &Path) -> Result<String, ClientError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::validation(format!("'{}' is not a file path", path.display()))
            })?
            .to_string();
        validate_upload_name(&file_name)?;

        let bytes = fs::read(path).await.map_err(|err| {
            ClientError::validation(format!("could not read '{}': {err}", path.display()))
        })?;
        if bytes.is_empty() {
            return Err(ClientError::validation(format!("'{file_name}' is empty")));
        }

        info!(%file_name, size_bytes = bytes.len(), "uploading font");
        let response = self
            .service
            .upload_font(FontUpload { file_name, bytes })
            .await?;
        Ok(response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_MESSAGE.to_string()))
    }

    pub async fn export_analytics(&self) -> Result<SavedArtifact, ClientError> {
        let payload = self.service.export_analytics().await?;
        let path = self
            .sink
            .save(ANALYTICS_EXPORT_FILE_NAME, &payload.bytes)
            .await?;
        info!(path = %path.display(), "analytics exported");
        Ok(SavedArtifact {
            path,
            file_name: ANALYTICS_EXPORT_FILE_NAME.to_string(),
            size_bytes: payload.len(),
        })
    }
}

#[cfg(test)]
#[path = "tests/admin_tests.rs"]
mod tests;
