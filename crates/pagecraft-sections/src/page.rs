//! Page documents: scalar fields plus named section groups

use crate::bilingual::BilingualText;
use crate::config::EditorConfig;
use crate::error::SectionError;
use crate::extract::{AttachmentExtractor, AttachmentSink};
use crate::tree::SectionTree;
use crate::validate::CompletenessValidator;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default group name for pages with a single section tree
pub const DEFAULT_GROUP: &str = "sections";

/// Page-level scalar value
///
/// Numbers keep whatever JSON holds: integers of either sign or floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageField {
    Text(String),
    Flag(bool),
    Number(serde_json::Number),
    Bilingual(BilingualText),
}

impl PageField {
    /// Bilingual value, if this field holds one
    #[inline]
    #[must_use]
    pub fn as_bilingual(&self) -> Option<&BilingualText> {
        match self {
            Self::Bilingual(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for PageField {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PageField {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BilingualText> for PageField {
    fn from(value: BilingualText) -> Self {
        Self::Bilingual(value)
    }
}

impl From<bool> for PageField {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for PageField {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for PageField {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// One editable page
///
/// Scalar fields (title, slug, SEO) ride alongside one or more section
/// groups; both keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub fields: IndexMap<String, PageField>,
    #[serde(default)]
    pub groups: IndexMap<String, SectionTree>,
}

/// Extracted form of a whole page
#[derive(Debug, Clone)]
pub struct PageExtraction {
    /// Skeleton per group, in document order
    pub groups: IndexMap<String, SectionTree>,
    /// Payloads of every group
    pub attachments: AttachmentSink,
}

impl PageDocument {
    /// Empty page with the default group
    #[must_use]
    pub fn new() -> Self {
        let mut page = Self::default();
        page.groups.insert(DEFAULT_GROUP.to_string(), SectionTree::new());
        page
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns `Json` if `source` is not a page document
    pub fn from_json(source: &str) -> Result<Self, SectionError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Set a scalar field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<PageField>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a group's tree
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>, tree: SectionTree) -> Self {
        self.groups.insert(name.into(), tree);
        self
    }

    /// Tree of a group
    #[inline]
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&SectionTree> {
        self.groups.get(name)
    }

    /// Check required fields and every group against the completeness rule
    ///
    /// # Errors
    /// Returns `IncompleteLocalization` for the first violation
    pub fn validate(&self, config: &EditorConfig) -> Result<(), SectionError> {
        for name in &config.required_fields {
            match self.fields.get(name) {
                Some(PageField::Bilingual(text)) => text.require_complete(name.as_str())?,
                Some(PageField::Text(text)) if text.trim().is_empty() => {
                    return Err(SectionError::IncompleteLocalization {
                        location: name.clone(),
                        missing: crate::bilingual::Locale::Primary,
                    });
                }
                Some(_) => {}
                None => BilingualText::default().require_complete(name.as_str())?,
            }
        }

        let validator = CompletenessValidator::from_config(config);
        for (group, tree) in &self.groups {
            validator.check(group, tree)?;
        }
        Ok(())
    }

    /// Check every group against the nesting ceiling
    ///
    /// # Errors
    /// Returns `DepthExceeded` if any group nests too deep
    pub fn check_depth(&self, config: &EditorConfig) -> Result<(), SectionError> {
        for tree in self.groups.values() {
            config.check_depth(tree.nesting_depth())?;
        }
        Ok(())
    }

    /// Extract every group into one shared side channel
    ///
    /// # Errors
    /// Returns `KeyCollision` if two slots, possibly in different groups,
    /// share a key
    pub fn extract(&self, config: &EditorConfig) -> Result<PageExtraction, SectionError> {
        let mut attachments = AttachmentSink::new();
        let mut groups = IndexMap::with_capacity(self.groups.len());
        for (name, tree) in &self.groups {
            let extractor = if config.group_key_prefix {
                AttachmentExtractor::scoped(name)
            } else {
                AttachmentExtractor::new()
            };
            groups.insert(name.clone(), extractor.extract_into(tree, &mut attachments)?);
        }
        AttachmentExtractor::finish(&attachments)?;
        Ok(PageExtraction { groups, attachments })
    }

    /// Number of pending attachments across all groups
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let extractor = AttachmentExtractor::new();
        self.groups
            .values()
            .flat_map(|tree| extractor.slots(tree))
            .filter(|slot| slot.attachment.is_pending())
            .count()
    }
}
