//! Editor configuration
//!
//! Builder-style, serde-backed settings loadable from TOML:
//!
//! ```toml
//! max_depth = 3
//! required_fields = ["title", "meta_title"]
//!
//! [attachment_limits]
//! default_bytes = 5242880
//! image = 10485760
//! block_collection = 2097152
//! ```

use crate::attachment::AttachmentRef;
use crate::error::SectionError;
use crate::section::SectionKind;
use serde::{Deserialize, Serialize};

/// Default ceiling for one pending attachment (5 MiB)
pub const DEFAULT_ATTACHMENT_LIMIT: u64 = 5 * 1024 * 1024;

/// Per-kind byte ceilings for pending attachments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentLimits {
    /// Ceiling for kinds without an explicit entry
    pub default_bytes: u64,
    pub image: Option<u64>,
    pub image_left: Option<u64>,
    pub image_right: Option<u64>,
    pub block_collection: Option<u64>,
}

impl AttachmentLimits {
    /// Ceiling for `kind`
    #[inline]
    #[must_use]
    pub fn limit_for(&self, kind: SectionKind) -> u64 {
        let explicit = match kind {
            SectionKind::Image => self.image,
            SectionKind::ImageLeft => self.image_left,
            SectionKind::ImageRight => self.image_right,
            SectionKind::BlockCollection => self.block_collection,
            _ => None,
        };
        explicit.unwrap_or(self.default_bytes)
    }

    /// Set the ceiling for `kind`
    ///
    /// Kinds that never hold attachments are ignored.
    pub fn set_limit(&mut self, kind: SectionKind, bytes: u64) {
        let slot = match kind {
            SectionKind::Image => &mut self.image,
            SectionKind::ImageLeft => &mut self.image_left,
            SectionKind::ImageRight => &mut self.image_right,
            SectionKind::BlockCollection => &mut self.block_collection,
            _ => return,
        };
        *slot = Some(bytes);
    }

    /// Check a value about to be assigned to a field of `kind`
    ///
    /// Remote references always pass.
    ///
    /// # Errors
    /// Returns `AttachmentTooLarge` if a pending payload exceeds the ceiling
    pub fn check(&self, kind: SectionKind, attachment: &AttachmentRef) -> Result<(), SectionError> {
        let Some(pending) = attachment.as_pending() else {
            return Ok(());
        };
        let limit = self.limit_for(kind);
        if pending.size_bytes() > limit {
            return Err(SectionError::AttachmentTooLarge {
                kind,
                size: pending.size_bytes(),
                limit,
            });
        }
        Ok(())
    }
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            default_bytes: DEFAULT_ATTACHMENT_LIMIT,
            image: None,
            image_left: None,
            image_right: None,
            block_collection: None,
        }
    }
}

/// Section editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Attachment size ceilings
    pub attachment_limits: AttachmentLimits,
    /// Maximum tab nesting depth; `None` means unbounded
    pub max_depth: Option<usize>,
    /// Also require both locales in descriptions
    pub require_complete_descriptions: bool,
    /// Page-level bilingual fields that must be complete on submit
    pub required_fields: Vec<String>,
    /// Prefix attachment keys with `{group}_`
    pub group_key_prefix: bool,
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns `Config` if the document is not valid TOML for this shape
    pub fn from_toml_str(source: &str) -> Result<Self, SectionError> {
        Ok(toml::from_str(source)?)
    }

    /// With a ceiling for one kind
    #[inline]
    #[must_use]
    pub fn with_attachment_limit(mut self, kind: SectionKind, bytes: u64) -> Self {
        self.attachment_limits.set_limit(kind, bytes);
        self
    }

    /// With the default ceiling
    #[inline]
    #[must_use]
    pub fn with_default_attachment_limit(mut self, bytes: u64) -> Self {
        self.attachment_limits.default_bytes = bytes;
        self
    }

    /// With maximum nesting depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// With description completeness
    #[inline]
    #[must_use]
    pub fn with_complete_descriptions(mut self, required: bool) -> Self {
        self.require_complete_descriptions = required;
        self
    }

    /// With required page-level fields
    #[must_use]
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// With group-scoped attachment keys
    #[inline]
    #[must_use]
    pub fn with_group_key_prefix(mut self, enabled: bool) -> Self {
        self.group_key_prefix = enabled;
        self
    }

    /// Check a nesting depth against the ceiling
    ///
    /// # Errors
    /// Returns `DepthExceeded` if `depth` is above `max_depth`
    pub fn check_depth(&self, depth: usize) -> Result<(), SectionError> {
        match self.max_depth {
            Some(max) if depth > max => Err(SectionError::DepthExceeded { depth, max }),
            _ => Ok(()),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            attachment_limits: AttachmentLimits::default(),
            max_depth: None,
            require_complete_descriptions: false,
            required_fields: vec!["title".to_string()],
            group_key_prefix: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::PendingAttachment;

    #[test]
    fn defaults() {
        let config = EditorConfig::default();
        assert_eq!(
            config.attachment_limits.limit_for(SectionKind::Image),
            DEFAULT_ATTACHMENT_LIMIT
        );
        assert_eq!(config.max_depth, None);
        assert_eq!(config.required_fields, vec!["title".to_string()]);
    }

    #[test]
    fn per_kind_limit_overrides_default() {
        let config = EditorConfig::new()
            .with_default_attachment_limit(100)
            .with_attachment_limit(SectionKind::BlockCollection, 10);
        let limits = &config.attachment_limits;
        assert_eq!(limits.limit_for(SectionKind::Image), 100);
        assert_eq!(limits.limit_for(SectionKind::BlockCollection), 10);
    }

    #[test]
    fn check_rejects_oversized_pending() {
        let limits = EditorConfig::new()
            .with_attachment_limit(SectionKind::Image, 3)
            .attachment_limits;
        let big = AttachmentRef::pending(PendingAttachment::new(vec![0u8; 4], "image/png"));
        let err = limits.check(SectionKind::Image, &big).unwrap_err();
        assert!(matches!(err, SectionError::AttachmentTooLarge { size: 4, limit: 3, .. }));

        assert!(limits.check(SectionKind::Image, &AttachmentRef::remote("x")).is_ok());
    }

    #[test]
    fn depth_ceiling() {
        let config = EditorConfig::new().with_max_depth(2);
        assert!(config.check_depth(2).is_ok());
        assert!(matches!(
            config.check_depth(3),
            Err(SectionError::DepthExceeded { depth: 3, max: 2 })
        ));
        assert!(EditorConfig::new().check_depth(100).is_ok());
    }

    #[test]
    fn from_toml() {
        let config = EditorConfig::from_toml_str(
            r#"
            max_depth = 3
            group_key_prefix = true

            [attachment_limits]
            default_bytes = 1000
            image_left = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.max_depth, Some(3));
        assert!(config.group_key_prefix);
        assert_eq!(config.attachment_limits.limit_for(SectionKind::ImageLeft), 10);
        assert_eq!(config.attachment_limits.limit_for(SectionKind::Image), 1000);
        assert_eq!(config.required_fields, vec!["title".to_string()]);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let result = EditorConfig::from_toml_str("max_depth = \"deep\"");
        assert!(matches!(result, Err(SectionError::Config(_))));
    }
}
