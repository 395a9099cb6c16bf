//! Prompt-driven design suggestions.

use std::sync::Arc;

use shared::{
    domain::{DesignRequest, FontCatalog, FontName, Layout, TemplateName},
    protocol::{SuggestRequest, SuggestResponse},
};
use tracing::{info, warn};

use crate::{error::ClientError, transport::DesignService};

/// The part of a design a suggestion replaces. Text and height are left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignPatch {
    pub font: FontName,
    pub layout: Layout,
    pub template: Option<TemplateName>,
}

impl DesignPatch {
    pub fn apply_to(&self, request: &DesignRequest) -> DesignRequest {
        request
            .with_font(self.font.clone())
            .with_layout(self.layout)
            .with_template(self.template.clone())
    }
}

pub struct SuggestionAdapter {
    service: Arc<dyn DesignService>,
    catalog: FontCatalog,
}

impl SuggestionAdapter {
    pub fn new(service: Arc<dyn DesignService>, catalog: FontCatalog) -> Self {
        Self { service, catalog }
    }

    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    pub async fn suggest(&self, prompt: &str) -> Result<DesignPatch, ClientError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ClientError::validation("describe your design idea first"));
        }

        let response = self
            .service
            .suggest(&SuggestRequest {
                prompt: prompt.to_string(),
            })
            .await
            .inspect_err(|err| warn!(error = %err, "suggestion request failed"))?;

        let patch = self
            .validate(response)
            .inspect_err(|err| warn!(error = %err, "rejected suggestion"))?;
        info!(
            font = %patch.font,
            layout = %patch.layout,
            template = ?patch.template.as_ref().map(TemplateName::as_str),
            "suggestion accepted"
        );
        Ok(patch)
    }

    /// Checks a raw suggestion against the closed layout and font sets. The
    /// service is trusted for nothing: any value outside them is its error.
    pub fn validate(&self, response: SuggestResponse) -> Result<DesignPatch, ClientError> {
        let rejected = |err: shared::error::DomainError| {
            ClientError::remote(None, format!("suggestion rejected: {err}"))
        };

        let layout = response.layout.parse::<Layout>().map_err(rejected)?;
        let font = self.catalog.resolve(&response.font).map_err(rejected)?;
        let template = match response.template.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(TemplateName::parse(raw).map_err(rejected)?),
        };

        Ok(DesignPatch {
            font,
            layout,
            template,
        })
    }
}

#[cfg(test)]
#[path = "tests/suggestion_tests.rs"]
mod tests;
