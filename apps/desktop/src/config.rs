use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::domain::DEFAULT_TEXT_HEIGHT;

pub const DEFAULT_CONFIG_FILE: &str = "dxf-client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub output_dir: PathBuf,
    pub text_height: u32,
    pub request_timeout_secs: Option<u64>,
    pub extra_fonts: Vec<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            output_dir: PathBuf::from("."),
            text_height: DEFAULT_TEXT_HEIGHT,
            request_timeout_secs: None,
            extra_fonts: Vec::new(),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    output_dir: Option<PathBuf>,
    text_height: Option<u32>,
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    extra_fonts: Vec<String>,
}

/// Loads settings from the process environment and the config file.
///
/// An explicitly named file must exist; the default `dxf-client.toml` is
/// optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if let Some(file_cfg) = read_file_settings(&path, required)? {
        if let Some(v) = file_cfg.server_url {
            settings.server_url = v;
        }
        if let Some(v) = file_cfg.output_dir {
            settings.output_dir = v;
        }
        if let Some(v) = file_cfg.text_height {
            settings.text_height = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = Some(v);
        }
        settings.extra_fonts = file_cfg.extra_fonts;
    }

    if let Some(v) = env("DXF_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("DXF_OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }
    if let Some(v) = env("APP__OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }

    if let Some(v) = env("APP__TEXT_HEIGHT") {
        settings.text_height = v
            .trim()
            .parse()
            .with_context(|| format!("APP__TEXT_HEIGHT must be a positive integer, got '{v}'"))?;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = Some(v.trim().parse().with_context(|| {
            format!("APP__REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{v}'")
        })?);
    }

    if settings.text_height == 0 {
        bail!("text_height must be positive");
    }
    Ok(settings)
}

fn read_file_settings(path: &Path, required: bool) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound && !required => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    let parsed = toml::from_str(&raw)
        .with_context(|| format!("invalid config file '{}'", path.display()))?;
    Ok(Some(parsed))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
