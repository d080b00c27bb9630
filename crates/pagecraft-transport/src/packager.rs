//! Transport packager
//!
//! Turns a [`PageDocument`] into one multipart payload. Validation and size
//! checks run first, so a rejected page never reaches the network.

use crate::error::TransportResult;
use crate::multipart::MultipartPayload;
use pagecraft_sections::{
    AttachmentExtractor, EditorConfig, PageDocument, SectionError, SectionKind, SectionTree,
};
use serde::Serialize;

/// Counts describing one packaged page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub content_type: String,
    pub fields: Vec<String>,
    pub groups: Vec<String>,
    pub attachments: Vec<String>,
    pub attachment_bytes: u64,
}

/// Packaged page ready to send
#[derive(Debug, Clone)]
pub struct Package {
    pub payload: MultipartPayload,
    pub summary: PackageSummary,
}

/// Builds multipart payloads under one editor configuration
#[derive(Debug, Clone, Copy)]
pub struct Packager<'a> {
    config: &'a EditorConfig,
}

impl<'a> Packager<'a> {
    /// Create packager
    #[inline]
    #[must_use]
    pub fn new(config: &'a EditorConfig) -> Self {
        Self { config }
    }

    /// Validate, extract and encode `document`
    ///
    /// # Errors
    /// - `IncompleteLocalization` if a required bilingual value has an empty half
    /// - `AttachmentTooLarge` if a pending payload exceeds its ceiling
    /// - `DepthExceeded` if a group nests deeper than allowed
    /// - `KeyCollision` or `DuplicatePart` if two parts would share a name
    pub fn package(&self, document: &PageDocument) -> TransportResult<Package> {
        self.package_with(document, MultipartPayload::new())
    }

    /// Same as [`Packager::package`] into a caller-provided empty payload
    ///
    /// # Errors
    /// See [`Packager::package`]
    pub fn package_with(
        &self,
        document: &PageDocument,
        mut payload: MultipartPayload,
    ) -> TransportResult<Package> {
        document.check_depth(self.config)?;
        document.validate(self.config)?;
        for tree in document.groups.values() {
            self.check_sizes(tree)?;
        }

        let extraction = document.extract(self.config)?;

        for (name, value) in &document.fields {
            payload.push_json(name.as_str(), value)?;
        }
        for (name, skeleton) in &extraction.groups {
            payload.push_json(name.as_str(), skeleton)?;
        }
        for attachment in extraction.attachments.iter() {
            payload.push_binary(
                attachment.key.as_str(),
                attachment.payload.bytes().clone(),
                attachment.mime_type(),
            )?;
        }

        let summary = PackageSummary {
            content_type: payload.content_type(),
            fields: document.fields.keys().cloned().collect(),
            groups: extraction.groups.keys().cloned().collect(),
            attachments: extraction
                .attachments
                .iter()
                .map(|a| a.key.into_string())
                .collect(),
            attachment_bytes: extraction.attachments.total_bytes(),
        };
        tracing::info!(
            fields = summary.fields.len(),
            groups = summary.groups.len(),
            attachments = summary.attachments.len(),
            bytes = summary.attachment_bytes,
            "page packaged"
        );
        Ok(Package { payload, summary })
    }

    /// Re-check every pending payload against its ceiling
    ///
    /// Sessions check on assignment; documents built elsewhere are checked here.
    fn check_sizes(&self, tree: &SectionTree) -> Result<(), SectionError> {
        for slot in AttachmentExtractor::new().slots(tree) {
            let kind = match slot.slot.block {
                Some(_) => SectionKind::BlockCollection,
                None => tree
                    .get(&slot.slot.path)
                    .map(|section| section.kind())
                    .ok_or_else(|| SectionError::path_not_found(&slot.slot.path))?,
            };
            self.config.attachment_limits.check(kind, &slot.attachment)?;
        }
        Ok(())
    }
}
