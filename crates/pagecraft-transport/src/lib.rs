//! Pagecraft Transport - packaging and submitting pages
//!
//! The edit session owns a page, applies checked edits, and on submit turns
//! it into one `multipart/form-data` payload:
//! - one part per page-level field
//! - one JSON part per section group, attachments replaced by their keys
//! - one binary part per pending attachment, named by its key
//!
//! # Example
//!
//! ```rust,ignore
//! use pagecraft_sections::{EditorConfig, PageDocument, SectionKind, SectionPath, DEFAULT_GROUP};
//! use pagecraft_transport::{EditSession, LoopbackApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = EditSession::new(PageDocument::new(), EditorConfig::new());
//! session.add_section(DEFAULT_GROUP, &SectionPath::top(0), SectionKind::Image)?;
//! session.attach_image(DEFAULT_GROUP, &SectionPath::top(0), None, vec![0u8; 16], "image/png")?;
//!
//! let saved = session.submit(&LoopbackApi::new("https://cdn.example")).await?;
//! println!("{} groups saved", saved.groups.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod error;
pub mod multipart;
pub mod packager;
pub mod session;

pub use api::{LoopbackApi, PageApi};
pub use error::{TransportError, TransportResult};
pub use multipart::{extension_for, MultipartPayload, Part, PartBody};
pub use packager::{Package, PackageSummary, Packager};
pub use session::{EditSession, DEFAULT_SUBMIT_TIMEOUT};
