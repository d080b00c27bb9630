//! Section variant registry
//!
//! Maps each [`SectionKind`] to the canonical empty payload used when a new
//! section is added. Collection kinds start with one blank entry so the
//! editor has a field to show.

use crate::attachment::AttachmentRef;
use crate::bilingual::BilingualText;
use crate::error::SectionError;
use crate::section::{Block, Section, SectionBody, SectionKind, Tab};

/// Registry of the fixed section kinds
#[derive(Debug, Default, Clone, Copy)]
pub struct VariantRegistry;

impl VariantRegistry {
    /// Create registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// All registered kinds
    #[inline]
    #[must_use]
    pub fn kinds(&self) -> &'static [SectionKind] {
        &SectionKind::ALL
    }

    /// Check if a wire name is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        name.parse::<SectionKind>().is_ok()
    }

    /// Canonical empty payload for `kind`
    #[must_use]
    pub fn empty_body(&self, kind: SectionKind) -> SectionBody {
        match kind {
            SectionKind::Text => SectionBody::Text {
                title: BilingualText::default(),
                description: BilingualText::default(),
            },
            SectionKind::RichText => SectionBody::RichText {
                body: BilingualText::default(),
            },
            SectionKind::List => SectionBody::List {
                items: vec![BilingualText::default()],
            },
            SectionKind::BlockCollection => SectionBody::BlockCollection {
                blocks: vec![Block::default()],
            },
            SectionKind::Table => SectionBody::Table {
                header: String::new(),
                rows: vec![vec![String::new()]],
            },
            SectionKind::Image => SectionBody::Image {
                image: AttachmentRef::none(),
            },
            SectionKind::ImageLeft => SectionBody::ImageLeft {
                image: AttachmentRef::none(),
            },
            SectionKind::ImageRight => SectionBody::ImageRight {
                image: AttachmentRef::none(),
            },
            SectionKind::TabContainer => SectionBody::TabContainer {
                tabs: vec![Tab::default()],
            },
        }
    }

    /// New empty section of `kind` with a fresh id
    #[inline]
    #[must_use]
    pub fn create(&self, kind: SectionKind) -> Section {
        Section::new(self.empty_body(kind))
    }

    /// New empty section from a wire name
    ///
    /// # Errors
    /// Returns `UnknownVariant` if `name` is not a registered kind
    pub fn create_named(&self, name: &str) -> Result<Section, SectionError> {
        let kind = name.parse::<SectionKind>()?;
        Ok(self.create(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_matching_empty_body() {
        let registry = VariantRegistry::new();
        for kind in registry.kinds() {
            assert_eq!(registry.empty_body(*kind).kind(), *kind);
        }
    }

    #[test]
    fn create_named_known() {
        let section = VariantRegistry::new().create_named("block_collection").unwrap();
        assert_eq!(section.kind(), SectionKind::BlockCollection);
    }

    #[test]
    fn create_named_unknown_fails() {
        let result = VariantRegistry::new().create_named("carousel");
        assert!(matches!(result, Err(SectionError::UnknownVariant(_))));
    }

    #[test]
    fn contains_checks_wire_names() {
        let registry = VariantRegistry::new();
        assert!(registry.contains("image_left"));
        assert!(!registry.contains("ImageLeft"));
    }

    #[test]
    fn fresh_ids_per_section() {
        let registry = VariantRegistry::new();
        let a = registry.create(SectionKind::Text);
        let b = registry.create(SectionKind::Text);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn empty_tab_container_has_one_tab() {
        let body = VariantRegistry::new().empty_body(SectionKind::TabContainer);
        let SectionBody::TabContainer { tabs } = body else {
            panic!("expected tab container");
        };
        assert_eq!(tabs.len(), 1);
        assert!(tabs[0].sections.is_empty());
    }
}
