use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::{Args, Subcommand};
use client_core::{
    AdminClient, ClientError, DesignPatch, DesignService, DirectorySink, DisplayState,
    GenerationInvoker, HttpDesignService, Notice, NoticeContext, PreviewSession,
    SuggestionAdapter,
};
use shared::domain::{DesignRequest, FontCatalog, Layout, TemplateName};
use tracing::debug;

use crate::config::ClientSettings;

pub const PREVIEW_FILE_NAME: &str = "preview.png";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session: every line typed re-renders the preview.
    Live,
    #[command(flatten)]
    Once(OneShot),
}

#[derive(Subcommand, Debug)]
pub enum OneShot {
    /// Render one preview image into the output directory.
    Preview(DesignArgs),
    /// Generate a DXF file into the output directory.
    Generate(DesignArgs),
    /// Ask the service for a font, layout and template matching a prompt.
    Suggest {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Show layout usage counts.
    Analytics,
    /// Download analytics as CSV.
    Export,
    /// Upload a font or template file.
    UploadFont { path: PathBuf },
}

#[derive(Args, Debug, Clone)]
pub struct DesignArgs {
    #[arg(long)]
    pub text: String,
    #[arg(long, default_value_t = Layout::Straight)]
    pub layout: Layout,
    #[arg(long)]
    pub font: Option<String>,
}

/// Everything a command needs: settings, the service and the font catalog.
pub struct App {
    settings: ClientSettings,
    service: Arc<dyn DesignService>,
    catalog: FontCatalog,
}

impl App {
    pub fn connect(settings: ClientSettings) -> anyhow::Result<Self> {
        let service =
            HttpDesignService::with_timeout(&settings.server_url, settings.request_timeout())
                .with_context(|| format!("cannot use server url '{}'", settings.server_url))?;
        debug!(server_url = %service.base_url(), "design service configured");
        Ok(Self::with_service(settings, Arc::new(service)))
    }

    pub fn with_service(settings: ClientSettings, service: Arc<dyn DesignService>) -> Self {
        let catalog = FontCatalog::builtin().with_extra(&settings.extra_fonts);
        Self {
            settings,
            service,
            catalog,
        }
    }

    pub fn service(&self) -> Arc<dyn DesignService> {
        self.service.clone()
    }

    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    pub fn sink(&self) -> Arc<DirectorySink> {
        Arc::new(DirectorySink::new(self.output_dir()))
    }

    /// Starting point for every design: empty text, default font and the
    /// configured height.
    pub fn blank_design(&self) -> DesignRequest {
        let request = DesignRequest::new("", Layout::default(), self.catalog.default_font());
        request
            .with_height(self.settings.text_height)
            .unwrap_or(request)
    }

    pub fn design_from(&self, args: &DesignArgs) -> Result<DesignRequest, ClientError> {
        let invalid = |err: shared::error::DomainError| ClientError::validation(err.to_string());
        let mut request = self
            .blank_design()
            .with_text(args.text.clone())
            .with_layout(args.layout);
        if let Some(font) = &args.font {
            request = request.with_font(self.catalog.resolve(font).map_err(invalid)?);
        }
        Ok(request)
    }
}

pub fn describe_patch(patch: &DesignPatch) -> String {
    let template = patch
        .template
        .as_ref()
        .map(TemplateName::as_str)
        .unwrap_or("none");
    format!(
        "font {}, layout {}, template {template}",
        patch.font, patch.layout
    )
}

/// Writes the current preview image, replacing the previous one.
pub async fn write_preview(dir: &Path, bytes: &[u8]) -> Result<PathBuf, ClientError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(PREVIEW_FILE_NAME);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Runs a one-shot command and reports its outcome as a notice.
pub async fn execute(app: &App, command: OneShot) -> Notice {
    match command {
        OneShot::Preview(args) => {
            report(NoticeContext::Preview, render_preview(app, &args).await)
        }
        OneShot::Generate(args) => {
            let outcome = async {
                let request = app.design_from(&args)?;
                let invoker = GenerationInvoker::new(app.service(), app.sink());
                let saved = invoker.generate(&request).await?;
                Ok::<_, ClientError>(format!(
                    "saved {} ({} bytes)",
                    saved.path.display(),
                    saved.size_bytes
                ))
            }
            .await;
            report(NoticeContext::Generation, outcome)
        }
        OneShot::Suggest { prompt } => {
            let adapter = SuggestionAdapter::new(app.service(), app.catalog().clone());
            let outcome = adapter
                .suggest(&prompt.join(" "))
                .await
                .map(|patch| format!("suggested {}", describe_patch(&patch)));
            report(NoticeContext::Suggestion, outcome)
        }
        OneShot::Analytics => {
            let admin = AdminClient::new(app.service(), app.sink());
            let outcome = admin.analytics().await.map(|usage| {
                if usage.is_empty() {
                    return "no designs recorded yet".to_string();
                }
                usage
                    .iter()
                    .map(|entry| format!("{:<10} {}", entry.layout, entry.count))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
            report(NoticeContext::Admin, outcome)
        }
        OneShot::Export => {
            let admin = AdminClient::new(app.service(), app.sink());
            let outcome = admin
                .export_analytics()
                .await
                .map(|saved| format!("analytics exported to {}", saved.path.display()));
            report(NoticeContext::Admin, outcome)
        }
        OneShot::UploadFont { path } => {
            let admin = AdminClient::new(app.service(), app.sink());
            report(NoticeContext::Admin, admin.upload_font(&path).await)
        }
    }
}

async fn render_preview(app: &App, args: &DesignArgs) -> Result<String, ClientError> {
    let request = app.design_from(args)?;
    if !request.has_text() {
        return Err(ClientError::validation("enter some text to preview"));
    }

    let session = PreviewSession::spawn(app.service());
    let outcome = async {
        let token = session.edit(request)?;
        match session.settled(token).await? {
            DisplayState::Ready { artifact } => {
                let bytes = session.store().open(&artifact).ok_or_else(|| {
                    ClientError::SessionUnavailable("preview was released early".to_string())
                })?;
                let path = write_preview(app.output_dir(), &bytes).await?;
                Ok::<_, ClientError>(format!(
                    "preview {} written to {}",
                    artifact.token,
                    path.display()
                ))
            }
            DisplayState::Error { error, .. } => Err(error),
            other => Err(ClientError::SessionUnavailable(format!(
                "preview ended in unexpected state {other:?}"
            ))),
        }
    }
    .await;
    session.shutdown().await;
    outcome
}

fn report(context: NoticeContext, outcome: Result<String, ClientError>) -> Notice {
    match outcome {
        Ok(message) => Notice::info(context, message),
        Err(err) => Notice::from_error(context, &err),
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
