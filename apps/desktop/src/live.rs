//! Interactive live-preview session on stdin.
//!
//! Every edit goes straight to the preview session; suggestions and DXF
//! generation run as background tasks so typing is never blocked on them.

use std::{path::Path, sync::Arc};

use anyhow::Context;
use client_core::{
    ClientError, DesignPatch, DisplayState, GenerationInvoker, Notice, NoticeContext,
    PreviewSession, SavedArtifact, SuggestionAdapter,
};
use shared::domain::{DesignRequest, FontCatalog, FontName, Layout};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinSet,
};
use tracing::{debug, info, warn};

use crate::commands::{describe_patch, write_preview, App};

const HELP: &str = "\
Type text to preview it. Commands:
  :layout <straight|arched|circular|monogram|stacked>
  :font <name>          :clear               :generate
  :suggest <prompt>     (also picks a template)
  :help                 :quit
Start a line with '::' to preview text beginning with ':'.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveCommand {
    Text(String),
    Layout(Layout),
    Font(FontName),
    Clear,
    Suggest(String),
    Generate,
    Help,
    Quit,
}

impl LiveCommand {
    /// The design after this command, for commands that edit it.
    pub fn apply(&self, design: &DesignRequest) -> Option<DesignRequest> {
        match self {
            LiveCommand::Text(text) => Some(design.with_text(text.clone())),
            LiveCommand::Layout(layout) => Some(design.with_layout(*layout)),
            LiveCommand::Font(font) => Some(design.with_font(font.clone())),
            LiveCommand::Clear => Some(design.with_text("")),
            LiveCommand::Suggest(_)
            | LiveCommand::Generate
            | LiveCommand::Help
            | LiveCommand::Quit => None,
        }
    }
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_line(line: &str, catalog: &FontCatalog) -> Result<Option<LiveCommand>, ClientError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    if let Some(escaped) = line.strip_prefix("::") {
        return Ok(Some(LiveCommand::Text(format!(":{escaped}"))));
    }
    let Some(body) = line.trim().strip_prefix(':') else {
        return Ok(Some(LiveCommand::Text(line.to_string())));
    };

    let (word, arg) = body
        .split_once(char::is_whitespace)
        .map(|(word, arg)| (word, arg.trim()))
        .unwrap_or((body, ""));
    let invalid = |err: shared::error::DomainError| ClientError::validation(err.to_string());
    let command = match word.to_ascii_lowercase().as_str() {
        "layout" => LiveCommand::Layout(arg.parse().map_err(invalid)?),
        "font" => LiveCommand::Font(catalog.resolve(arg).map_err(invalid)?),
        "template" => {
            return Err(ClientError::validation(
                "templates come from suggestions; try :suggest <prompt>",
            ))
        }
        "clear" => LiveCommand::Clear,
        "suggest" => LiveCommand::Suggest(arg.to_string()),
        "generate" => LiveCommand::Generate,
        "help" | "?" => LiveCommand::Help,
        "quit" | "exit" | "q" => LiveCommand::Quit,
        other => {
            return Err(ClientError::validation(format!(
                "unknown command ':{other}' (try :help)"
            )))
        }
    };
    Ok(Some(command))
}

enum Background {
    Suggested(Result<DesignPatch, ClientError>),
    Generated(Result<SavedArtifact, ClientError>),
}

pub async fn run(app: &App) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(app.output_dir())
        .await
        .with_context(|| {
            format!(
                "failed to create output directory '{}'",
                app.output_dir().display()
            )
        })?;

    let session = PreviewSession::spawn(app.service());
    let mut display = session.subscribe();
    let adapter = Arc::new(SuggestionAdapter::new(app.service(), app.catalog().clone()));
    let invoker = Arc::new(GenerationInvoker::new(app.service(), app.sink()));
    let mut background = JoinSet::new();
    let mut design = app.blank_design();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!(output_dir = %app.output_dir().display(), "live session started");
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let command = match parse_line(&line, app.catalog()) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        println!("{}", Notice::from_error(NoticeContext::General, &err));
                        continue;
                    }
                };
                match command {
                    LiveCommand::Quit => break,
                    LiveCommand::Help => println!("{HELP}"),
                    LiveCommand::Suggest(prompt) => {
                        let adapter = adapter.clone();
                        background.spawn(async move {
                            Background::Suggested(adapter.suggest(&prompt).await)
                        });
                    }
                    LiveCommand::Generate => {
                        let invoker = invoker.clone();
                        let snapshot = design.clone();
                        background.spawn(async move {
                            Background::Generated(invoker.generate(&snapshot).await)
                        });
                    }
                    edit => {
                        if let Some(next) = edit.apply(&design) {
                            design = next;
                            submit(&session, &design);
                        }
                    }
                }
            }
            changed = display.changed() => {
                if changed.is_err() {
                    warn!("preview loop stopped unexpectedly");
                    break;
                }
                let state = display.borrow_and_update().clone();
                show_state(&session, app.output_dir(), state).await;
            }
            Some(joined) = background.join_next(), if !background.is_empty() => {
                match joined {
                    Ok(outcome) => {
                        if let Some(patched) = finish_background(outcome, &design) {
                            design = patched;
                            submit(&session, &design);
                        }
                    }
                    Err(err) => warn!(error = %err, "background task failed"),
                }
            }
        }
    }

    if !background.is_empty() {
        println!("waiting for {} background task(s)", background.len());
    }
    while let Some(joined) = background.join_next().await {
        if let Ok(outcome) = joined {
            finish_background(outcome, &design);
        }
    }

    let store = session.store().clone();
    session.shutdown().await;
    debug!(stats = ?store.stats(), "live session closed");
    Ok(())
}

fn submit(session: &PreviewSession, design: &DesignRequest) {
    if let Err(err) = session.edit(design.clone()) {
        println!("{}", Notice::from_error(NoticeContext::Preview, &err));
    }
}

/// Reports a finished background task; an accepted suggestion yields the
/// patched design.
fn finish_background(outcome: Background, design: &DesignRequest) -> Option<DesignRequest> {
    match outcome {
        Background::Suggested(Ok(patch)) => {
            println!(
                "{}",
                Notice::info(
                    NoticeContext::Suggestion,
                    format!("applied {}", describe_patch(&patch))
                )
            );
            Some(patch.apply_to(design))
        }
        Background::Suggested(Err(err)) => {
            println!("{}", Notice::from_error(NoticeContext::Suggestion, &err));
            None
        }
        Background::Generated(Ok(saved)) => {
            println!(
                "{}",
                Notice::info(
                    NoticeContext::Generation,
                    format!("saved {} ({} bytes)", saved.path.display(), saved.size_bytes)
                )
            );
            None
        }
        Background::Generated(Err(err)) => {
            println!("{}", Notice::from_error(NoticeContext::Generation, &err));
            None
        }
    }
}

async fn show_state(session: &PreviewSession, output_dir: &Path, state: DisplayState) {
    let notice = match state {
        DisplayState::Empty => Notice::info(NoticeContext::Preview, "cleared"),
        DisplayState::Loading { token } => {
            Notice::info(NoticeContext::Preview, format!("rendering {token}..."))
        }
        DisplayState::Ready { artifact } => {
            // Already superseded and released: a newer state follows.
            let Some(bytes) = session.store().open(&artifact) else {
                debug!(token = %artifact.token, "skipping released preview");
                return;
            };
            match write_preview(output_dir, &bytes).await {
                Ok(path) => Notice::info(
                    NoticeContext::Preview,
                    format!(
                        "{} ready: {} ({} bytes)",
                        artifact.token,
                        path.display(),
                        artifact.size_bytes
                    ),
                ),
                Err(err) => Notice::from_error(NoticeContext::Preview, &err),
            }
        }
        DisplayState::Error { error, .. } => Notice::from_error(NoticeContext::Preview, &error),
    };
    println!("{notice}");
}

#[cfg(test)]
#[path = "tests/live_tests.rs"]
mod tests;
