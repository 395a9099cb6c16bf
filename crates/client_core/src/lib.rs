//! Client core for the DXF design service: live preview orchestration, DXF
//! generation, prompt suggestions and admin calls.

pub mod admin;
pub mod artifact;
pub mod error;
pub mod generation;
pub mod notice;
pub mod preview;
pub mod session;
pub mod suggestion;
pub mod transport;

pub use admin::AdminClient;
pub use artifact::{ArtifactHandle, ArtifactId, ArtifactRef, ArtifactStats, ArtifactStore};
pub use error::ClientError;
pub use generation::{ArtifactSink, DirectorySink, GenerationInvoker, SavedArtifact};
pub use notice::{Notice, NoticeCategory, NoticeContext};
pub use preview::{Completion, DisplayState, PreviewOrchestrator, PreviewTicket, RequestToken};
pub use session::PreviewSession;
pub use suggestion::{DesignPatch, SuggestionAdapter};
pub use transport::{DesignService, FontUpload, HttpDesignService};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
