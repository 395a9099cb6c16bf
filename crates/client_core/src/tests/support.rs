use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::protocol::{
    BinaryPayload, GenerateRequest, LayoutUsage, PreviewRequest, SuggestRequest, SuggestResponse,
    UploadFontResponse,
};
use tokio::sync::{mpsc, oneshot};

use crate::{
    error::ClientError,
    transport::{DesignService, FontUpload},
};

pub(crate) fn png(bytes: &[u8]) -> BinaryPayload {
    BinaryPayload::new(bytes.to_vec(), Some("image/png".to_string()))
}

/// A preview call parked until the test decides how and when it completes.
pub(crate) struct PendingPreview {
    pub body: PreviewRequest,
    respond: oneshot::Sender<Result<BinaryPayload, ClientError>>,
}

impl PendingPreview {
    pub fn respond(self, result: Result<BinaryPayload, ClientError>) {
        let _ = self.respond.send(result);
    }
}

#[derive(Default)]
pub(crate) struct Canned {
    pub generate: Option<Result<BinaryPayload, ClientError>>,
    pub suggest: Option<Result<SuggestResponse, ClientError>>,
    pub analytics: Option<Result<Vec<LayoutUsage>, ClientError>>,
    pub upload: Option<Result<UploadFontResponse, ClientError>>,
    pub export: Option<Result<BinaryPayload, ClientError>>,
}

fn canned<T: Clone>(slot: &Option<Result<T, ClientError>>) -> Result<T, ClientError> {
    slot.clone()
        .unwrap_or_else(|| Err(ClientError::Transport("no scripted response".to_string())))
}

/// In-memory service: previews are handed to the test through a channel,
/// everything else answers with a canned result and records its request.
pub(crate) struct ScriptedService {
    pending: mpsc::UnboundedSender<PendingPreview>,
    pub canned: Mutex<Canned>,
    pub generate_requests: Mutex<Vec<GenerateRequest>>,
    pub suggest_requests: Mutex<Vec<SuggestRequest>>,
    pub uploads: Mutex<Vec<FontUpload>>,
}

impl ScriptedService {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingPreview>) {
        let (pending, pending_rx) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            pending,
            canned: Mutex::new(Canned::default()),
            generate_requests: Mutex::new(Vec::new()),
            suggest_requests: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        });
        (service, pending_rx)
    }

    pub fn with_canned(canned: Canned) -> Arc<Self> {
        let (service, _) = Self::new();
        *service.canned.lock().expect("canned lock") = canned;
        service
    }
}

#[async_trait]
impl DesignService for ScriptedService {
    async fn preview(&self, request: &PreviewRequest) -> Result<BinaryPayload, ClientError> {
        let (respond, response) = oneshot::channel();
        self.pending
            .send(PendingPreview {
                body: request.clone(),
                respond,
            })
            .map_err(|_| ClientError::Transport("test harness gone".to_string()))?;
        response
            .await
            .unwrap_or_else(|_| Err(ClientError::Transport("response dropped".to_string())))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<BinaryPayload, ClientError> {
        self.generate_requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        canned(&self.canned.lock().expect("canned lock").generate)
    }

    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestResponse, ClientError> {
        self.suggest_requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        canned(&self.canned.lock().expect("canned lock").suggest)
    }

    async fn analytics(&self) -> Result<Vec<LayoutUsage>, ClientError> {
        canned(&self.canned.lock().expect("canned lock").analytics)
    }

    async fn upload_font(&self, upload: FontUpload) -> Result<UploadFontResponse, ClientError> {
        self.uploads.lock().expect("uploads lock").push(upload);
        canned(&self.canned.lock().expect("canned lock").upload)
    }

    async fn export_analytics(&self) -> Result<BinaryPayload, ClientError> {
        canned(&self.canned.lock().expect("canned lock").export)
    }
}
