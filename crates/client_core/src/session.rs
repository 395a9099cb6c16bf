//! Event loop that drives a [`PreviewOrchestrator`] against a [`DesignService`].
//!
//! The loop is one task: edits and fetch completions are handled strictly one
//! at a time, so the orchestrator never needs a lock.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use futures::{stream::FuturesUnordered, StreamExt};
use shared::{domain::DesignRequest, protocol::BinaryPayload};
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    artifact::ArtifactStore,
    error::ClientError,
    preview::{DisplayState, PreviewOrchestrator, PreviewTicket, RequestToken},
    transport::DesignService,
};

const EDIT_QUEUE_CAPACITY: usize = 64;

pub struct PreviewSession {
    edits: mpsc::Sender<DesignRequest>,
    queued: Mutex<u64>,
    applied: watch::Receiver<RequestToken>,
    display: watch::Receiver<DisplayState>,
    store: ArtifactStore,
    task: JoinHandle<()>,
}

impl PreviewSession {
    pub fn spawn(service: Arc<dyn DesignService>) -> Self {
        Self::spawn_with_store(service, ArtifactStore::new())
    }

    pub fn spawn_with_store(service: Arc<dyn DesignService>, store: ArtifactStore) -> Self {
        let orchestrator = PreviewOrchestrator::new(store.clone());
        let display = orchestrator.subscribe();
        let (edits, edit_rx) = mpsc::channel(EDIT_QUEUE_CAPACITY);
        let (applied_tx, applied) = watch::channel(orchestrator.latest_token());
        let task = tokio::spawn(run_preview_loop(service, orchestrator, edit_rx, applied_tx));
        Self {
            edits,
            queued: Mutex::new(0),
            applied,
            display,
            store,
            task,
        }
    }

    /// Queues a replaced design request without waiting for the loop.
    ///
    /// Edits are applied in queue order and each takes the next token, so the
    /// returned token is the one the orchestrator assigns to this edit.
    pub fn edit(&self, request: DesignRequest) -> Result<RequestToken, ClientError> {
        let mut queued = self.queued.lock().unwrap_or_else(PoisonError::into_inner);
        match self.edits.try_send(request) {
            Ok(()) => {
                *queued += 1;
                Ok(RequestToken(*queued))
            }
            Err(TrySendError::Full(_)) => Err(ClientError::SessionUnavailable(
                "edit queue is full; please retry".to_string(),
            )),
            Err(TrySendError::Closed(_)) => Err(ClientError::SessionUnavailable(
                "preview loop has stopped".to_string(),
            )),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.display.clone()
    }

    pub fn display(&self) -> DisplayState {
        self.display.borrow().clone()
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Waits until the edit holding `token` has been applied and the display
    /// has left `Loading`.
    pub async fn settled(&self, token: RequestToken) -> Result<DisplayState, ClientError> {
        let stopped = |_| ClientError::SessionUnavailable("preview loop has stopped".to_string());
        let mut applied = self.applied.clone();
        applied.wait_for(|latest| *latest >= token).await.map_err(stopped)?;

        let mut display = self.display.clone();
        let state = display
            .wait_for(DisplayState::is_settled)
            .await
            .map_err(stopped)?;
        Ok(state.clone())
    }

    /// Closes the edit queue and waits for the loop to release everything it holds.
    pub async fn shutdown(self) {
        let Self { edits, task, .. } = self;
        drop(edits);
        if let Err(err) = task.await {
            tracing::error!("preview loop terminated abnormally: {err}");
        }
    }
}

fn fetch_preview(
    service: Arc<dyn DesignService>,
    ticket: PreviewTicket,
) -> impl Future<Output = (RequestToken, Result<BinaryPayload, ClientError>)> {
    async move {
        let result = service.preview(&ticket.body).await;
        (ticket.token, result)
    }
}

async fn run_preview_loop(
    service: Arc<dyn DesignService>,
    mut orchestrator: PreviewOrchestrator,
    mut edits: mpsc::Receiver<DesignRequest>,
    applied: watch::Sender<RequestToken>,
) {
    let mut in_flight = FuturesUnordered::new();
    loop {
        tokio::select! {
            edit = edits.recv() => match edit {
                Some(request) => {
                    if let Some(ticket) = orchestrator.apply_edit(&request) {
                        in_flight.push(fetch_preview(Arc::clone(&service), ticket));
                    }
                    applied.send_replace(orchestrator.latest_token());
                }
                None => break,
            },
            Some((token, result)) = in_flight.next(), if !in_flight.is_empty() => {
                let completion = orchestrator.complete(token, result);
                debug!(%token, ?completion, pending = in_flight.len(), "preview response handled");
            }
        }
    }

    info!(abandoned = in_flight.len(), "preview session closing");
    drop(in_flight);
    orchestrator.teardown();
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
