//! Locally cached render results and their acquire/release lifecycle.
//!
//! A store plays the part of a browser's object-URL registry: acquiring a
//! payload registers it and hands back the single owning [`ArtifactHandle`],
//! readers look artifacts up by [`ArtifactRef`], and releasing the handle
//! revokes the entry so later lookups find nothing.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use shared::protocol::BinaryPayload;
use tracing::{trace, warn};

use crate::preview::RequestToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(pub u64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifact-{}", self.0)
    }
}

/// Reader-side description of an acquired artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub id: ArtifactId,
    pub token: RequestToken,
    pub size_bytes: usize,
    pub content_type: Option<String>,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactStats {
    pub acquired: u64,
    pub released: u64,
    pub live: usize,
}

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    entries: HashMap<ArtifactId, Arc<[u8]>>,
    acquired: u64,
    released: u64,
}

#[derive(Clone, Default)]
pub struct ArtifactStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("stats", &self.stats())
            .finish()
    }
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a fully received payload. The returned handle must be passed
    /// to [`ArtifactStore::release`] before it goes out of reach.
    pub fn acquire(&self, payload: BinaryPayload, token: RequestToken) -> ArtifactHandle {
        let bytes: Arc<[u8]> = Arc::from(payload.bytes);
        let id = {
            let mut inner = self.lock();
            inner.next_id += 1;
            let id = ArtifactId(inner.next_id);
            inner.entries.insert(id, Arc::clone(&bytes));
            inner.acquired += 1;
            id
        };
        trace!(%id, %token, size_bytes = bytes.len(), "artifact acquired");
        ArtifactHandle {
            reference: ArtifactRef {
                id,
                token,
                size_bytes: bytes.len(),
                content_type: payload.content_type,
                acquired_at: Utc::now(),
            },
            bytes,
            store: self.clone(),
            released: false,
        }
    }

    /// Revokes the handle's entry. Consuming the handle makes a second release
    /// of the same artifact impossible.
    pub fn release(&self, mut handle: ArtifactHandle) {
        handle.released = true;
        self.revoke(handle.reference.id);
    }

    fn revoke(&self, id: ArtifactId) {
        let mut inner = self.lock();
        if inner.entries.remove(&id).is_some() {
            inner.released += 1;
            trace!(%id, "artifact released");
        }
    }

    /// Returns the artifact's bytes while it is still live.
    pub fn open(&self, reference: &ArtifactRef) -> Option<Arc<[u8]>> {
        self.lock().entries.get(&reference.id).cloned()
    }

    pub fn is_live(&self, reference: &ArtifactRef) -> bool {
        self.lock().entries.contains_key(&reference.id)
    }

    pub fn stats(&self) -> ArtifactStats {
        let inner = self.lock();
        ArtifactStats {
            acquired: inner.acquired,
            released: inner.released,
            live: inner.entries.len(),
        }
    }
}

/// Sole owner of an acquired artifact.
pub struct ArtifactHandle {
    reference: ArtifactRef,
    bytes: Arc<[u8]>,
    store: ArtifactStore,
    released: bool,
}

impl ArtifactHandle {
    pub fn reference(&self) -> &ArtifactRef {
        &self.reference
    }

    pub fn token(&self) -> RequestToken {
        self.reference.token
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactHandle")
            .field("reference", &self.reference)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        if !self.released {
            warn!(id = %self.reference.id, "artifact handle dropped without release");
            self.store.revoke(self.reference.id);
        }
    }
}
