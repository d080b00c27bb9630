//! Extraction keys for pending attachments
//!
//! The single naming rule for attachment parts:
//! - image section at top-level index `i`: `section_{i}`
//! - block `bi` of that section: `section_{i}_block_{bi}`
//! - every nesting level appends `_tab_{ti}_section_{si}`
//!
//! Keys encode the full structural path, so distinct slots in a well-formed
//! tree never share a key. An optional group scope prefixes `{group}_`.

use crate::error::SectionError;
use crate::path::SectionPath;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

/// Deterministic name of one attachment slot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentKey(String);

/// Slot addressed by a key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySlot {
    /// Section holding the attachment
    pub path: SectionPath,
    /// Block index for block collections
    pub block: Option<usize>,
}

impl AttachmentKey {
    /// Key of the single image of the section at `path`
    #[must_use]
    pub fn for_section(scope: Option<&str>, path: &SectionPath) -> Self {
        let mut key = String::new();
        if let Some(group) = scope {
            key.push_str(group);
            key.push('_');
        }
        key.push_str("section_");
        key.push_str(&path.top_index().to_string());
        for hop in path.hops() {
            key.push_str(&format!("_tab_{}_section_{}", hop.tab, hop.section));
        }
        Self(key)
    }

    /// Key of block `block` of the block collection at `path`
    #[must_use]
    pub fn for_block(scope: Option<&str>, path: &SectionPath, block: usize) -> Self {
        let Self(mut key) = Self::for_section(scope, path);
        key.push_str(&format!("_block_{block}"));
        Self(key)
    }

    /// Key for a slot
    #[must_use]
    pub fn for_slot(scope: Option<&str>, slot: &KeySlot) -> Self {
        match slot.block {
            Some(block) => Self::for_block(scope, &slot.path, block),
            None => Self::for_section(scope, &slot.path),
        }
    }

    /// Key as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying string
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse an unscoped key back into its slot
    ///
    /// # Errors
    /// Returns `InvalidKey` if `key` does not follow the naming rule
    pub fn parse(key: &str) -> Result<KeySlot, SectionError> {
        Self::parse_scoped(key, None)
    }

    /// Parse a key written under `scope`
    ///
    /// # Errors
    /// Returns `InvalidKey` if the prefix or naming rule does not match
    pub fn parse_scoped(key: &str, scope: Option<&str>) -> Result<KeySlot, SectionError> {
        let invalid = || SectionError::InvalidKey(key.to_string());

        let mut rest = key;
        if let Some(group) = scope {
            rest = rest
                .strip_prefix(group)
                .and_then(|r| r.strip_prefix('_'))
                .ok_or_else(invalid)?;
        }

        let (top, mut rest) = rest
            .strip_prefix("section_")
            .and_then(take_number)
            .ok_or_else(invalid)?;
        let mut path = SectionPath::top(top);

        while let Some(after) = rest.strip_prefix("_tab_") {
            let (tab, after) = take_number(after).ok_or_else(invalid)?;
            let (section, after) = after
                .strip_prefix("_section_")
                .and_then(take_number)
                .ok_or_else(invalid)?;
            path = path.nested(tab, section);
            rest = after;
        }

        let block = match rest.strip_prefix("_block_") {
            Some(after) => {
                let (block, after) = take_number(after).ok_or_else(invalid)?;
                rest = after;
                Some(block)
            }
            None => None,
        };

        if rest.is_empty() {
            Ok(KeySlot { path, block })
        } else {
            Err(invalid())
        }
    }
}

/// Split leading ASCII digits off `s`
fn take_number(s: &str) -> Option<(usize, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

impl Display for AttachmentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AttachmentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AttachmentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl SectionPath {
    /// Extraction key of this section's single image
    #[inline]
    #[must_use]
    pub fn attachment_key(&self) -> AttachmentKey {
        AttachmentKey::for_section(None, self)
    }

    /// Extraction key of block `block` in this section
    #[inline]
    #[must_use]
    pub fn block_key(&self, block: usize) -> AttachmentKey {
        AttachmentKey::for_block(None, self, block)
    }
}
