//! Live preview state machine.
//!
//! Every edit of the design request moves the orchestrator to a new
//! [`RequestToken`]. Only the response carrying the latest token may change
//! what is displayed; anything older is dropped on arrival. The orchestrator is
//! the single writer of the live artifact and releases it before replacing it.

use std::fmt;

use shared::{
    domain::DesignRequest,
    protocol::{BinaryPayload, PreviewRequest},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    artifact::{ArtifactHandle, ArtifactRef, ArtifactStore},
    error::ClientError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Empty,
    Loading {
        token: RequestToken,
    },
    Ready {
        artifact: ArtifactRef,
    },
    Error {
        token: RequestToken,
        error: ClientError,
    },
}

impl DisplayState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, DisplayState::Loading { .. })
    }
}

/// A preview fetch the caller must issue on the orchestrator's behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTicket {
    pub token: RequestToken,
    pub body: PreviewRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Stale,
}

pub struct PreviewOrchestrator {
    store: ArtifactStore,
    latest: RequestToken,
    live: Option<ArtifactHandle>,
    display: watch::Sender<DisplayState>,
}

impl Default for PreviewOrchestrator {
    fn default() -> Self {
        Self::new(ArtifactStore::new())
    }
}

impl PreviewOrchestrator {
    pub fn new(store: ArtifactStore) -> Self {
        let (display, _) = watch::channel(DisplayState::Empty);
        Self {
            store,
            latest: RequestToken(0),
            live: None,
            display,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.display.subscribe()
    }

    pub fn display(&self) -> DisplayState {
        self.display.borrow().clone()
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest
    }

    pub fn live_artifact(&self) -> Option<&ArtifactRef> {
        self.live.as_ref().map(ArtifactHandle::reference)
    }

    /// Reacts to a replaced design request.
    ///
    /// Every edit takes a fresh token, including edits that clear the text, so
    /// responses still in flight for earlier requests become stale.
    pub fn apply_edit(&mut self, request: &DesignRequest) -> Option<PreviewTicket> {
        self.latest = RequestToken(self.latest.0 + 1);
        let token = self.latest;

        if !request.has_text() {
            self.release_live();
            self.display.send_replace(DisplayState::Empty);
            debug!(%token, "preview cleared");
            return None;
        }

        self.display.send_replace(DisplayState::Loading { token });
        debug!(%token, layout = %request.layout(), font = %request.font(), "preview requested");
        Some(PreviewTicket {
            token,
            body: PreviewRequest::from(request),
        })
    }

    /// Feeds the outcome of a preview fetch back into the state machine.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<BinaryPayload, ClientError>,
    ) -> Completion {
        if token != self.latest {
            // Never materialized, so there is no handle to release.
            debug!(%token, latest = %self.latest, "discarding stale preview response");
            return Completion::Stale;
        }

        let result = result.and_then(|payload| {
            if payload.is_empty() {
                Err(ClientError::remote(None, "service returned an empty preview"))
            } else {
                Ok(payload)
            }
        });

        match result {
            Ok(payload) => {
                self.release_live();
                let handle = self.store.acquire(payload, token);
                let artifact = handle.reference().clone();
                self.live = Some(handle);
                info!(%token, size_bytes = artifact.size_bytes, "preview ready");
                self.display.send_replace(DisplayState::Ready { artifact });
                Completion::Applied
            }
            Err(err) => {
                self.release_live();
                warn!(%token, error = %err, "preview failed");
                self.display
                    .send_replace(DisplayState::Error { token, error: err });
                Completion::Failed
            }
        }
    }

    /// Ends the session: the live artifact is released and readers see `Empty`.
    pub fn teardown(mut self) {
        self.release_live();
        self.display.send_replace(DisplayState::Empty);
    }

    fn release_live(&mut self) {
        if let Some(handle) = self.live.take() {
            debug!(id = %handle.reference().id, token = %handle.token(), "releasing live preview");
            self.store.release(handle);
        }
    }
}

impl Drop for PreviewOrchestrator {
    fn drop(&mut self) {
        self.release_live();
    }
}

#[cfg(test)]
#[path = "tests/preview_tests.rs"]
mod tests;
