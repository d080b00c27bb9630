//! Transport error types

use pagecraft_sections::SectionError;
use std::time::Duration;

/// Errors raised while packaging or submitting a page
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Validation, extraction or edit failure in the section layer
    #[error(transparent)]
    Section(#[from] SectionError),

    /// Skeleton or scalar encoding failed
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend rejected the payload
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Backend did not answer in time
    #[error("submit timed out after {0:?}")]
    Timeout(Duration),

    /// Section group missing from the document
    #[error("unknown section group: {0}")]
    UnknownGroup(String),

    /// Two parts of one payload share a name
    #[error("duplicate multipart part: '{0}'")]
    DuplicatePart(String),
}

impl TransportError {
    /// Check if the editor can fix the problem and resubmit
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        match self {
            Self::Section(err) => err.is_user_recoverable(),
            Self::Api { status, .. } => (400..500).contains(status),
            Self::Timeout(_) => true,
            Self::Json(_) | Self::UnknownGroup(_) | Self::DuplicatePart(_) => false,
        }
    }
}

/// Result alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
