use serde::{Deserialize, Serialize};

use crate::domain::{DesignRequest, Layout};

pub const PREVIEW_PATH: &str = "/api/dxf/preview";
pub const GENERATE_PATH: &str = "/api/dxf/generate";
pub const SUGGEST_PATH: &str = "/api/ai/suggest";
pub const ANALYTICS_PATH: &str = "/api/admin/analytics";
pub const UPLOAD_FONT_PATH: &str = "/api/admin/upload-font";
pub const EXPORT_PATH: &str = "/api/admin/export";

pub const PREVIEW_SCALE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub text: String,
    pub layout: Layout,
    pub font: String,
    pub template: Option<String>,
    pub height: u32,
    pub scale: f64,
    pub watermark: bool,
}

impl From<&DesignRequest> for PreviewRequest {
    fn from(request: &DesignRequest) -> Self {
        Self {
            text: request.text().to_string(),
            layout: request.layout(),
            font: request.font().to_string(),
            template: request.template().map(ToString::to_string),
            height: request.height(),
            scale: PREVIEW_SCALE,
            watermark: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    pub layout: Layout,
    pub font: String,
    pub height: u32,
}

impl From<&DesignRequest> for GenerateRequest {
    fn from(request: &DesignRequest) -> Self {
        Self {
            text: request.text().to_string(),
            layout: request.layout(),
            font: request.font().to_string(),
            height: request.height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub prompt: String,
}

/// Raw suggestion as the service returns it. Values are unchecked strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub font: String,
    pub layout: String,
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutUsage {
    pub layout: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFontResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Binary body of a successful preview, generation or export call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl BinaryPayload {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FontCatalog, TemplateName};

    #[test]
    fn preview_body_carries_fixed_scale_and_watermark() {
        let catalog = FontCatalog::builtin();
        let request = DesignRequest::new(
            "HELLO",
            Layout::Arched,
            catalog.resolve("Orbitron").expect("font"),
        )
        .with_template(Some(TemplateName::parse("farm").expect("template")));

        let body = serde_json::to_value(PreviewRequest::from(&request)).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({
                "text": "HELLO",
                "layout": "arched",
                "font": "Orbitron",
                "template": "farm",
                "height": 20,
                "scale": 1.0,
                "watermark": false,
            })
        );
    }

    #[test]
    fn preview_body_sends_null_template() {
        let body = serde_json::to_value(PreviewRequest::from(
            &DesignRequest::default().with_text("A"),
        ))
        .expect("serialize");
        assert!(body["template"].is_null());
    }

    #[test]
    fn generate_body_has_only_generation_fields() {
        let request = DesignRequest::default()
            .with_text("HELLO")
            .with_template(Some(TemplateName::parse("farm").expect("template")));
        let body = serde_json::to_value(GenerateRequest::from(&request)).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({
                "text": "HELLO",
                "layout": "straight",
                "font": "Arial",
                "height": 20,
            })
        );
    }

    #[test]
    fn suggestion_template_may_be_missing() {
        let parsed: SuggestResponse =
            serde_json::from_str(r#"{"font":"Arial","layout":"straight"}"#).expect("parse");
        assert_eq!(parsed.template, None);
    }
}
