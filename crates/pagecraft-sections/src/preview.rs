//! Transient preview handles for pending uploads
//!
//! A [`PreviewHandle`] is acquired when a local file becomes a pending
//! attachment and is released when the handle drops. Handles live inside
//! the shared [`PendingAttachment`](crate::attachment::PendingAttachment),
//! so release happens when the last tree version referencing the attachment
//! drops. Tree values are persistent: a replaced or removed node keeps its
//! previews alive for as long as any prior version is held. An edit session
//! replaces its document on every edit, which makes replacement, removal of
//! the node or an ancestor tab container, and dropping the session release.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

#[derive(Debug, Default)]
struct RegistryInner {
    live: Mutex<HashMap<Uuid, u64>>,
}

/// Tracks outstanding preview handles for one editing session
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a handle for `size_bytes` of preview data
    #[must_use]
    pub fn acquire(&self, size_bytes: u64) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.inner.live.lock().insert(id, size_bytes);
        tracing::trace!(%id, size_bytes, "preview acquired");
        PreviewHandle {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Number of handles not yet released
    #[inline]
    #[must_use]
    pub fn live(&self) -> usize {
        self.inner.live.lock().len()
    }

    /// Total bytes held by live previews
    #[must_use]
    pub fn live_bytes(&self) -> u64 {
        self.inner.live.lock().values().sum()
    }

    /// Check if a handle is still outstanding
    #[inline]
    #[must_use]
    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.inner.live.lock().contains_key(&handle.id)
    }
}

/// Scoped preview reference, released on drop
pub struct PreviewHandle {
    id: Uuid,
    registry: Weak<RegistryInner>,
}

impl PreviewHandle {
    /// Short-lived URL the UI can display
    #[must_use]
    pub fn url(&self) -> String {
        format!("preview:{}", self.id)
    }

    /// Handle identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.id).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        // Registry may already be gone when the session is torn down
        if let Some(inner) = self.registry.upgrade() {
            inner.live.lock().remove(&self.id);
            tracing::trace!(id = %self.id, "preview released");
        }
    }
}
