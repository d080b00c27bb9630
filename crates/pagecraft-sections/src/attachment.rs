//! Attachment references
//!
//! An image field either points at an already persisted file ([`AttachmentRef::Remote`])
//! or holds bytes awaiting upload ([`AttachmentRef::Pending`]). Pending values
//! refuse to serialize: they must go through the extractor first.

use crate::preview::{PreviewHandle, PreviewRegistry};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Binary payload awaiting upload
pub struct PendingAttachment {
    bytes: Arc<[u8]>,
    mime_type: String,
    size_bytes: u64,
    preview: Option<PreviewHandle>,
}

impl PendingAttachment {
    /// Create from raw bytes and declared MIME type
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        let bytes = bytes.into();
        let size_bytes = bytes.len() as u64;
        Self {
            bytes,
            mime_type: mime_type.into(),
            size_bytes,
            preview: None,
        }
    }

    /// Attach a transient preview acquired from `registry`
    #[must_use]
    pub fn with_preview(mut self, registry: &PreviewRegistry) -> Self {
        self.preview = Some(registry.acquire(self.size_bytes));
        self
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// Declared MIME type
    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Payload size in bytes
    #[inline]
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Preview URL, if a preview was acquired
    #[must_use]
    pub fn preview_url(&self) -> Option<String> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    /// Preview handle, if any
    #[inline]
    #[must_use]
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }
}

impl fmt::Debug for PendingAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAttachment")
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

// Preview handles are session-scoped and do not take part in equality
impl PartialEq for PendingAttachment {
    fn eq(&self, other: &Self) -> bool {
        self.mime_type == other.mime_type && self.bytes == other.bytes
    }
}

impl Eq for PendingAttachment {}

/// Image or file reference held by a section field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentRef {
    /// Already persisted; an empty URL means no attachment
    Remote(String),
    /// Awaiting upload
    Pending(Arc<PendingAttachment>),
}

impl AttachmentRef {
    /// No attachment
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::Remote(String::new())
    }

    /// Persisted reference
    #[inline]
    #[must_use]
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote(url.into())
    }

    /// Pending upload
    #[inline]
    #[must_use]
    pub fn pending(attachment: PendingAttachment) -> Self {
        Self::Pending(Arc::new(attachment))
    }

    /// Check if no attachment is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Remote(url) if url.is_empty())
    }

    /// Check if bytes are awaiting upload
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Pending payload, if any
    #[inline]
    #[must_use]
    pub fn as_pending(&self) -> Option<&Arc<PendingAttachment>> {
        match self {
            Self::Pending(p) => Some(p),
            Self::Remote(_) => None,
        }
    }

    /// Remote URL, if persisted
    #[inline]
    #[must_use]
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            Self::Remote(url) => Some(url),
            Self::Pending(_) => None,
        }
    }
}

impl Default for AttachmentRef {
    fn default() -> Self {
        Self::none()
    }
}

impl Serialize for AttachmentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Remote(url) => serializer.serialize_str(url),
            Self::Pending(_) => Err(ser::Error::custom(
                "pending attachment must be extracted before serialization",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for AttachmentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RefVisitor;

        impl Visitor<'_> for RefVisitor {
            type Value = AttachmentRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an attachment URL string or null")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(AttachmentRef::Remote(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(AttachmentRef::Remote(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(AttachmentRef::none())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(AttachmentRef::none())
            }
        }

        deserializer.deserialize_any(RefVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_serializes_as_string() {
        let json = serde_json::to_value(AttachmentRef::remote("https://cdn/x.png")).unwrap();
        assert_eq!(json, serde_json::json!("https://cdn/x.png"));
    }

    #[test]
    fn pending_refuses_to_serialize() {
        let pending = AttachmentRef::pending(PendingAttachment::new(vec![1, 2, 3], "image/png"));
        assert!(serde_json::to_value(&pending).is_err());
    }

    #[test]
    fn null_deserializes_as_empty() {
        let parsed: AttachmentRef = serde_json::from_str("null").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn pending_equality_ignores_preview() {
        let registry = PreviewRegistry::new();
        let a = PendingAttachment::new(vec![7u8; 4], "image/webp").with_preview(&registry);
        let b = PendingAttachment::new(vec![7u8; 4], "image/webp");
        assert_eq!(a, b);
        assert!(a.preview_url().is_some());
        assert!(b.preview_url().is_none());
    }

    #[test]
    fn size_tracks_byte_length() {
        let pending = PendingAttachment::new(vec![0u8; 1024], "image/jpeg");
        assert_eq!(pending.size_bytes(), 1024);
        assert_eq!(pending.mime_type(), "image/jpeg");
    }

    #[test]
    fn dropping_attachment_releases_preview() {
        let registry = PreviewRegistry::new();
        let payload = PendingAttachment::new(vec![1u8], "image/png").with_preview(&registry);
        let image = AttachmentRef::pending(payload);
        let shared = image.clone();
        drop(image);
        assert_eq!(registry.live(), 1);
        drop(shared);
        assert_eq!(registry.live(), 0);
    }
}
