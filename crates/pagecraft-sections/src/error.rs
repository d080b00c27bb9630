//! Error types for section trees
//!
//! Two families share one enum:
//! - Structural contract violations (`PathNotFound`, `UnknownVariant`,
//!   `KeyCollision`, `InvalidField`, `DepthExceeded`) abort the operation.
//! - User-data errors (`AttachmentTooLarge`, `IncompleteLocalization`) are
//!   rejected before any network call and leave the tree untouched so the
//!   offending field can be corrected in place.

use crate::bilingual::Locale;
use crate::section::SectionKind;

/// Errors raised by the registry, mutator, extractor and validators
#[derive(Debug, thiserror::Error)]
pub enum SectionError {
    /// Path does not resolve to a node or container
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// Registry asked for a kind outside the fixed set
    #[error("unknown section variant: '{0}'")]
    UnknownVariant(String),

    /// Two attachment slots computed the same extraction key
    #[error("attachment key collision: '{0}'")]
    KeyCollision(String),

    /// Pending attachment exceeds the ceiling configured for its kind
    #[error("attachment of {size} bytes exceeds the {limit} byte limit for {kind}")]
    AttachmentTooLarge {
        kind: SectionKind,
        size: u64,
        limit: u64,
    },

    /// A bilingual value subject to the completeness rule has an empty half
    #[error("incomplete localization at {location}: {missing} text is empty")]
    IncompleteLocalization { location: String, missing: Locale },

    /// Field edit does not apply to the addressed section
    #[error("field '{field}' is not editable on a {kind} section")]
    InvalidField { kind: SectionKind, field: String },

    /// Nesting would exceed the configured ceiling
    #[error("tab nesting depth {depth} exceeds the configured maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },

    /// Textual path could not be parsed
    #[error("invalid section path '{0}'")]
    InvalidPath(String),

    /// String is not a well-formed extraction key
    #[error("invalid attachment key '{0}'")]
    InvalidKey(String),

    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be parsed
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl SectionError {
    /// Create path-not-found error for any displayable path
    pub fn path_not_found(path: impl ToString) -> Self {
        Self::PathNotFound {
            path: path.to_string(),
        }
    }

    /// Create invalid-field error
    pub fn invalid_field(kind: SectionKind, field: impl Into<String>) -> Self {
        Self::InvalidField {
            kind,
            field: field.into(),
        }
    }

    /// Check if the user can fix this by editing a field
    #[inline]
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AttachmentTooLarge { .. } | Self::IncompleteLocalization { .. }
        )
    }
}

/// Result type alias for section operations
pub type SectionResult<T> = Result<T, SectionError>;
