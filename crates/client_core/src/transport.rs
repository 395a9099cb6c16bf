//! HTTP access to the DXF generation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    error::RemoteErrorBody,
    protocol::{
        BinaryPayload, GenerateRequest, LayoutUsage, PreviewRequest, SuggestRequest,
        SuggestResponse, UploadFontResponse, ANALYTICS_PATH, EXPORT_PATH, GENERATE_PATH,
        PREVIEW_PATH, SUGGEST_PATH, UPLOAD_FONT_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// A font or template file to hand to the admin upload endpoint.
#[derive(Debug, Clone)]
pub struct FontUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Every remote call the client makes. Implementations must only return a
/// payload once it has been received in full.
#[async_trait]
pub trait DesignService: Send + Sync {
    async fn preview(&self, request: &PreviewRequest) -> Result<BinaryPayload, ClientError>;
    async fn generate(&self, request: &GenerateRequest) -> Result<BinaryPayload, ClientError>;
    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestResponse, ClientError>;
    async fn analytics(&self) -> Result<Vec<LayoutUsage>, ClientError>;
    async fn upload_font(&self, upload: FontUpload) -> Result<UploadFontResponse, ClientError>;
    async fn export_analytics(&self) -> Result<BinaryPayload, ClientError>;
}

pub struct HttpDesignService {
    http: Client,
    base_url: String,
}

impl HttpDesignService {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ClientError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Validates the configured service address and strips trailing slashes so
/// endpoint paths can be appended verbatim.
pub fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|err| ClientError::validation(format!("invalid server url '{trimmed}': {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::validation(format!(
            "server url '{trimmed}' must use http or https"
        )));
    }
    if parsed.host_str().is_none() {
        return Err(ClientError::validation(format!(
            "server url '{trimmed}' has no host"
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = RemoteErrorBody::detail_from_body(&body).unwrap_or_else(|| status.to_string());
    Err(ClientError::remote(Some(status.as_u16()), detail))
}

async fn read_binary(response: Response) -> Result<BinaryPayload, ClientError> {
    let response = ensure_success(response).await?;
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ClientError::Transport(format!("failed to read response body: {err}")))?;
    Ok(BinaryPayload::new(bytes.to_vec(), content_type))
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let status = response.status().as_u16();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ClientError::Transport(format!("failed to read response body: {err}")))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        ClientError::remote(Some(status), format!("invalid {what} response payload: {err}"))
    })
}

#[async_trait]
impl DesignService for HttpDesignService {
    async fn preview(&self, request: &PreviewRequest) -> Result<BinaryPayload, ClientError> {
        debug!(layout = %request.layout, "POST {PREVIEW_PATH}");
        let response = self
            .http
            .post(self.endpoint(PREVIEW_PATH))
            .json(request)
            .send()
            .await?;
        read_binary(response).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<BinaryPayload, ClientError> {
        debug!(layout = %request.layout, "POST {GENERATE_PATH}");
        let response = self
            .http
            .post(self.endpoint(GENERATE_PATH))
            .json(request)
            .send()
            .await?;
        read_binary(response).await
    }

    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestResponse, ClientError> {
        debug!("POST {SUGGEST_PATH}");
        let response = self
            .http
            .post(self.endpoint(SUGGEST_PATH))
            .json(request)
            .send()
            .await?;
        read_json(response, "suggestion").await
    }

    async fn analytics(&self) -> Result<Vec<LayoutUsage>, ClientError> {
        debug!("GET {ANALYTICS_PATH}");
        let response = self.http.get(self.endpoint(ANALYTICS_PATH)).send().await?;
        read_json(response, "analytics").await
    }

    async fn upload_font(&self, upload: FontUpload) -> Result<UploadFontResponse, ClientError> {
        debug!(file_name = %upload.file_name, "POST {UPLOAD_FONT_PATH}");
        let form = Form::new().part("file", Part::bytes(upload.bytes).file_name(upload.file_name));
        let response = self
            .http
            .post(self.endpoint(UPLOAD_FONT_PATH))
            .multipart(form)
            .send()
            .await?;
        read_json(response, "upload").await
    }

    async fn export_analytics(&self) -> Result<BinaryPayload, ClientError> {
        debug!("GET {EXPORT_PATH}");
        let response = self.http.get(self.endpoint(EXPORT_PATH)).send().await?;
        read_binary(response).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
