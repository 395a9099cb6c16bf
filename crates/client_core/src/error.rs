//! Error taxonomy shared by every client component.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Local input was rejected before any request was issued.
    #[error("{0}")]
    Validation(String),
    /// The service could not be reached or the exchange broke off mid-way.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered, but with a failure status or unusable content.
    #[error("{}", describe_remote(.status, .detail))]
    Remote { status: Option<u16>, detail: String },
    /// A received artifact could not be written to the user's device.
    #[error("failed to save file: {0}")]
    Io(String),
    #[error("preview session unavailable: {0}")]
    SessionUnavailable(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn remote(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Remote {
            status,
            detail: detail.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn describe_remote(status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(status) => format!("service returned {status}: {detail}"),
        None => format!("unusable service response: {detail}"),
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::remote(Some(status.as_u16()), err.to_string());
        }
        Self::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
