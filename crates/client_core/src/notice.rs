//! User-visible messages produced at component boundaries.

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCategory {
    Validation,
    Transport,
    Remote,
    Storage,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeContext {
    Preview,
    Generation,
    Suggestion,
    Admin,
    General,
}

impl NoticeContext {
    fn label(self) -> &'static str {
        match self {
            NoticeContext::Preview => "preview",
            NoticeContext::Generation => "generate",
            NoticeContext::Suggestion => "suggest",
            NoticeContext::Admin => "admin",
            NoticeContext::General => "dxf",
        }
    }
}

/// Adds a next step to transport failures whose cause is recognizable.
pub fn classify_transport_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("connection refused")
        || lower.contains("failed to connect")
        || lower.contains("error sending request")
        || lower.contains("dns")
    {
        format!("Service unreachable; make sure the backend is running ({message})")
    } else if lower.contains("timed out") || lower.contains("timeout") {
        format!("Service did not answer in time; try again ({message})")
    } else {
        message.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    category: NoticeCategory,
    context: NoticeContext,
    message: String,
}

impl Notice {
    pub fn info(context: NoticeContext, message: impl Into<String>) -> Self {
        Self {
            category: NoticeCategory::Info,
            context,
            message: message.into(),
        }
    }

    pub fn from_error(context: NoticeContext, err: &ClientError) -> Self {
        let (category, message) = match err {
            ClientError::Validation(message) => (NoticeCategory::Validation, message.clone()),
            ClientError::Transport(message) => (
                NoticeCategory::Transport,
                classify_transport_failure(message),
            ),
            ClientError::SessionUnavailable(_) => (NoticeCategory::Transport, err.to_string()),
            ClientError::Remote { .. } => (NoticeCategory::Remote, err.to_string()),
            ClientError::Io(_) => (NoticeCategory::Storage, err.to_string()),
        };
        Self {
            category,
            context,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category != NoticeCategory::Info
    }

    pub fn category(&self) -> NoticeCategory {
        self.category
    }

    pub fn context(&self) -> NoticeContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.is_error() { "error" } else { "ok" };
        write!(f, "[{} {marker}] {}", self.context.label(), self.message)
    }
}
