//! Completeness validation before submit
//!
//! Titles, tab labels, list items and block titles must be filled in both
//! locales. Descriptions and rich-text bodies join the rule when
//! `require_complete_descriptions` is set.

use crate::bilingual::BilingualText;
use crate::config::EditorConfig;
use crate::error::SectionError;
use crate::path::SectionPath;
use crate::section::SectionBody;
use crate::tree::SectionTree;

/// Completeness checker for section trees
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessValidator {
    require_descriptions: bool,
}

impl CompletenessValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new(require_descriptions: bool) -> Self {
        Self {
            require_descriptions,
        }
    }

    /// Create validator from editor config
    #[inline]
    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.require_complete_descriptions)
    }

    /// First violation in `tree`
    ///
    /// # Errors
    /// Returns `IncompleteLocalization` for the first incomplete field in
    /// pre-order
    pub fn check(&self, group: &str, tree: &SectionTree) -> Result<(), SectionError> {
        match self.issues(group, tree).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every violation in `tree`, pre-order
    #[must_use]
    pub fn issues(&self, group: &str, tree: &SectionTree) -> Vec<SectionError> {
        let mut out = Vec::new();
        for (path, section) in tree.walk() {
            self.check_body(group, &path, &section.body, &mut out);
        }
        out
    }

    fn check_body(
        &self,
        group: &str,
        path: &SectionPath,
        body: &SectionBody,
        out: &mut Vec<SectionError>,
    ) {
        let mut require = |text: &BilingualText, field: String| {
            if let Err(err) = text.require_complete(format!("{group}[{path}].{field}")) {
                out.push(err);
            }
        };

        match body {
            SectionBody::Text { title, description } => {
                require(title, "title".to_string());
                if self.require_descriptions {
                    require(description, "description".to_string());
                }
            }
            SectionBody::RichText { body } => {
                if self.require_descriptions {
                    require(body, "body".to_string());
                }
            }
            SectionBody::List { items } => {
                for (i, item) in items.iter().enumerate() {
                    require(item, format!("items[{i}]"));
                }
            }
            SectionBody::BlockCollection { blocks } => {
                for (i, block) in blocks.iter().enumerate() {
                    require(&block.title, format!("blocks[{i}].title"));
                    if self.require_descriptions {
                        require(&block.description, format!("blocks[{i}].description"));
                    }
                }
            }
            SectionBody::TabContainer { tabs } => {
                for (i, tab) in tabs.iter().enumerate() {
                    require(&tab.label, format!("tabs[{i}].label"));
                }
            }
            SectionBody::Table { .. }
            | SectionBody::Image { .. }
            | SectionBody::ImageLeft { .. }
            | SectionBody::ImageRight { .. } => {}
        }
    }
}
