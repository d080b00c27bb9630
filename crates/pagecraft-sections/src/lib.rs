//! Pagecraft Sections - typed page-section trees
//!
//! Provides:
//! - A closed registry of section variants with blank defaults
//! - Persistent section trees with path-addressed edits and structural sharing
//! - Bilingual text with completeness validation
//! - Attachment extraction into deterministic, collision-free keys
//!
//! # Example
//!
//! ```rust,ignore
//! use pagecraft_sections::{
//!     AttachmentExtractor, SectionKind, SectionPath, SectionTree, VariantRegistry,
//! };
//!
//! let registry = VariantRegistry::new();
//! let tree = SectionTree::new()
//!     .push(registry.create(SectionKind::Text))
//!     .push(registry.create(SectionKind::Image));
//!
//! let tree = tree.remove_at(&SectionPath::top(0))?;
//! let extraction = AttachmentExtractor::new().extract(&tree)?;
//! println!("{} pending attachments", extraction.attachments().len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod attachment;
pub mod bilingual;
pub mod config;
pub mod edit;
pub mod error;
pub mod extract;
pub mod keys;
pub mod page;
pub mod path;
pub mod preview;
pub mod registry;
pub mod section;
pub mod tree;
pub mod validate;

// Re-exports for convenience
pub use attachment::{AttachmentRef, PendingAttachment};
pub use bilingual::{BilingualText, Locale};
pub use config::{AttachmentLimits, EditorConfig, DEFAULT_ATTACHMENT_LIMIT};
pub use edit::{FieldEdit, TextField};
pub use error::{SectionError, SectionResult};
pub use extract::{
    reinline_json, AttachmentExtractor, AttachmentSink, AttachmentSlot, ExtractedAttachment,
    Extraction,
};
pub use keys::{AttachmentKey, KeySlot};
pub use page::{PageDocument, PageExtraction, PageField, DEFAULT_GROUP};
pub use path::{SectionPath, TabHop};
pub use preview::{PreviewHandle, PreviewRegistry};
pub use registry::VariantRegistry;
pub use section::{Block, Section, SectionBody, SectionId, SectionKind, SectionList, Tab};
pub use tree::SectionTree;
pub use validate::CompletenessValidator;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
