use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local rejection of a value that is outside one of the closed design sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown layout '{0}'")]
    UnknownLayout(String),
    #[error("font '{0}' is not in the font catalog")]
    UnknownFont(String),
    #[error("invalid template name '{0}'")]
    InvalidTemplate(String),
    #[error("text height must be positive")]
    InvalidHeight,
}

/// Error body returned by the generation service on non-success statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RemoteErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn describe(&self) -> String {
        match self.detail.as_deref().map(str::trim) {
            Some(detail) if !detail.is_empty() => format!("{}: {detail}", self.error),
            _ => self.error.clone(),
        }
    }

    /// Extracts a human readable detail from a raw error response body.
    ///
    /// JSON bodies in the service's `{error, detail}` shape are flattened, any
    /// other non-empty body is returned trimmed as-is.
    pub fn detail_from_body(body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<RemoteErrorBody>(trimmed) {
            Ok(parsed) => Some(parsed.describe()),
            Err(_) => Some(trimmed.to_string()),
        }
    }
}
