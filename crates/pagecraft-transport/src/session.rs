//! Edit session
//!
//! An [`EditSession`] exclusively owns one page while it is being edited.
//! Every edit builds a new tree and only replaces the stored one on success,
//! so a rejected edit leaves the page exactly as it was. Dropping the session
//! drops every tree version and with it every outstanding preview.

use crate::api::PageApi;
use crate::error::{TransportError, TransportResult};
use crate::packager::{Package, Packager};
use pagecraft_sections::{
    AttachmentExtractor, AttachmentKey, AttachmentRef, EditorConfig, FieldEdit, PageDocument,
    PageField, PendingAttachment, PreviewRegistry, Section, SectionError, SectionKind,
    SectionPath, SectionTree, VariantRegistry,
};
use std::sync::Arc;
use std::time::Duration;

/// Default ceiling for one submit round trip
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// One page being edited
#[derive(Debug)]
pub struct EditSession {
    document: PageDocument,
    config: EditorConfig,
    previews: PreviewRegistry,
    registry: VariantRegistry,
    submit_timeout: Duration,
}

impl EditSession {
    /// Open a session on `document`
    #[must_use]
    pub fn new(document: PageDocument, config: EditorConfig) -> Self {
        tracing::info!(groups = document.groups.len(), "edit session opened");
        Self {
            document,
            config,
            previews: PreviewRegistry::new(),
            registry: VariantRegistry::new(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    /// With submit timeout
    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Current page
    #[inline]
    #[must_use]
    pub fn document(&self) -> &PageDocument {
        &self.document
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Preview handles of pending uploads
    #[inline]
    #[must_use]
    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Tree of `group`
    ///
    /// # Errors
    /// Returns `UnknownGroup` if the page has no such group
    pub fn group(&self, group: &str) -> TransportResult<&SectionTree> {
        self.document
            .group(group)
            .ok_or_else(|| TransportError::UnknownGroup(group.to_string()))
    }

    /// Set a page-level field
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<PageField>) {
        self.document.fields.insert(name.into(), value.into());
    }

    /// Add an empty group
    pub fn add_group(&mut self, group: impl Into<String>) {
        self.document.groups.entry(group.into()).or_default();
    }

    /// Insert a blank section of `kind` at `path`
    ///
    /// # Errors
    /// `PathNotFound` if `path` does not resolve, `DepthExceeded` if the
    /// result nests too deep
    pub fn add_section(
        &mut self,
        group: &str,
        path: &SectionPath,
        kind: SectionKind,
    ) -> TransportResult<()> {
        let section = self.registry.create(kind);
        self.insert(group, path, section)
    }

    /// Insert a blank section by variant name
    ///
    /// # Errors
    /// `UnknownVariant` for names outside the registry, otherwise as
    /// [`EditSession::add_section`]
    pub fn add_section_named(
        &mut self,
        group: &str,
        path: &SectionPath,
        name: &str,
    ) -> TransportResult<()> {
        let section = self.registry.create_named(name)?;
        self.insert(group, path, section)
    }

    /// Insert `section` at `path`
    ///
    /// # Errors
    /// `PathNotFound`, `DepthExceeded`, or `AttachmentTooLarge` for an
    /// oversized pending payload inside `section`
    pub fn insert(
        &mut self,
        group: &str,
        path: &SectionPath,
        section: Section,
    ) -> TransportResult<()> {
        let staged = SectionTree::from_sections([section.clone()]);
        for slot in AttachmentExtractor::new().slots(&staged) {
            let kind = match slot.slot.block {
                Some(_) => SectionKind::BlockCollection,
                None => staged
                    .get(&slot.slot.path)
                    .map_or(section.kind(), |node| node.kind()),
            };
            self.config.attachment_limits.check(kind, &slot.attachment)?;
        }

        let config = &self.config;
        edit_group(&mut self.document, group, |tree| {
            let next = tree.insert(path, section)?;
            config.check_depth(next.nesting_depth())?;
            Ok(next)
        })?;
        tracing::debug!(group, path = %path, "section inserted");
        Ok(())
    }

    /// Remove the section at `path` with its subtree
    ///
    /// # Errors
    /// Returns `PathNotFound` if nothing is at `path`
    pub fn remove(&mut self, group: &str, path: &SectionPath) -> TransportResult<()> {
        edit_group(&mut self.document, group, |tree| tree.remove_at(path))?;
        tracing::debug!(
            group,
            path = %path,
            live_previews = self.previews.live(),
            "section removed"
        );
        Ok(())
    }

    /// Move the section at `path` within its container
    ///
    /// # Errors
    /// Returns `PathNotFound` if `path` or `new_index` is out of range
    pub fn move_section(
        &mut self,
        group: &str,
        path: &SectionPath,
        new_index: usize,
    ) -> TransportResult<()> {
        edit_group(&mut self.document, group, |tree| tree.move_to(path, new_index))
    }

    /// Apply a leaf edit
    ///
    /// Attachments are checked against the ceiling of the receiving kind
    /// before the edit is applied.
    ///
    /// # Errors
    /// `PathNotFound`, `InvalidField` or `AttachmentTooLarge`
    pub fn update_field(
        &mut self,
        group: &str,
        path: &SectionPath,
        edit: FieldEdit,
    ) -> TransportResult<()> {
        if let Some(attachment) = edit.attachment() {
            let target = self
                .group(group)?
                .get(path)
                .ok_or_else(|| SectionError::path_not_found(path))?
                .kind();
            let kind = edit.attachment_kind(target);
            if let Err(err) = self.config.attachment_limits.check(kind, attachment) {
                tracing::warn!(group, path = %path, error = %err, "attachment rejected");
                return Err(err.into());
            }
        }
        edit_group(&mut self.document, group, |tree| tree.update_field(path, edit))
    }

    /// Attach local bytes to an image section, or to `block` of a block
    /// collection, registering a preview handle
    ///
    /// # Errors
    /// `AttachmentTooLarge` if `bytes` exceed the ceiling; `PathNotFound` or
    /// `InvalidField` if the slot does not exist
    pub fn attach_image(
        &mut self,
        group: &str,
        path: &SectionPath,
        block: Option<usize>,
        bytes: impl Into<Arc<[u8]>>,
        mime_type: impl Into<String>,
    ) -> TransportResult<()> {
        let image = AttachmentRef::pending(
            PendingAttachment::new(bytes, mime_type).with_preview(&self.previews),
        );
        let edit = match block {
            Some(block) => FieldEdit::SetBlockImage { block, image },
            None => FieldEdit::SetImage(image),
        };
        self.update_field(group, path, edit)
    }

    /// Attach local bytes at the slot named by an extraction key
    ///
    /// With group-scoped keys the group is read from the key prefix;
    /// otherwise the key applies to the first group.
    ///
    /// # Errors
    /// `InvalidKey` if no group matches the key, otherwise as
    /// [`EditSession::attach_image`]
    pub fn attach_by_key(
        &mut self,
        key: &str,
        bytes: impl Into<Arc<[u8]>>,
        mime_type: impl Into<String>,
    ) -> TransportResult<()> {
        let (group, slot) = self.resolve_key(key)?;
        self.attach_image(&group, &slot.path, slot.block, bytes, mime_type)
    }

    /// Clear the attachment at the slot named by an extraction key
    ///
    /// # Errors
    /// As [`EditSession::attach_by_key`]
    pub fn clear_by_key(&mut self, key: &str) -> TransportResult<()> {
        let (group, slot) = self.resolve_key(key)?;
        let edit = match slot.block {
            Some(block) => FieldEdit::SetBlockImage {
                block,
                image: AttachmentRef::none(),
            },
            None => FieldEdit::SetImage(AttachmentRef::none()),
        };
        self.update_field(&group, &slot.path, edit)
    }

    /// Keys and sizes of every pending upload, in submit order
    #[must_use]
    pub fn pending_attachments(&self) -> Vec<(AttachmentKey, u64)> {
        self.document
            .groups
            .iter()
            .flat_map(|(name, tree)| self.extractor_for(name).pending_attachments(tree))
            .collect()
    }

    /// Package the page without sending it
    ///
    /// # Errors
    /// As [`Packager::package`]
    pub fn package(&self) -> TransportResult<Package> {
        Packager::new(&self.config).package(&self.document)
    }

    /// Validate, package and save the page, then re-seed the session with
    /// the backend's canonical document
    ///
    /// Local failures return before any network call and leave the page
    /// untouched. Taking `&mut self` keeps submits of one session serial.
    ///
    /// # Errors
    /// Local validation errors, `Api` from the backend, or `Timeout`
    pub async fn submit<A>(&mut self, api: &A) -> TransportResult<&PageDocument>
    where
        A: PageApi + ?Sized,
    {
        let package = match self.package() {
            Ok(package) => package,
            Err(err) => {
                tracing::warn!(error = %err, "submit rejected locally");
                return Err(err);
            }
        };
        let attachments = package.summary.attachments.len();
        tracing::info!(
            attachments,
            bytes = package.summary.attachment_bytes,
            "submitting page"
        );

        let saved = match tokio::time::timeout(self.submit_timeout, api.save_page(package.payload))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(timeout = ?self.submit_timeout, "submit timed out");
                return Err(TransportError::Timeout(self.submit_timeout));
            }
        };

        self.document = saved;
        tracing::info!(
            attachments,
            live_previews = self.previews.live(),
            "page saved"
        );
        Ok(&self.document)
    }

    fn extractor_for<'a>(&self, group: &'a str) -> AttachmentExtractor<'a> {
        if self.config.group_key_prefix {
            AttachmentExtractor::scoped(group)
        } else {
            AttachmentExtractor::new()
        }
    }

    fn resolve_key(&self, key: &str) -> TransportResult<(String, pagecraft_sections::KeySlot)> {
        if self.config.group_key_prefix {
            for name in self.document.groups.keys() {
                if let Ok(slot) = AttachmentKey::parse_scoped(key, Some(name)) {
                    return Ok((name.clone(), slot));
                }
            }
            return Err(SectionError::InvalidKey(key.to_string()).into());
        }
        let group = self
            .document
            .groups
            .keys()
            .next()
            .ok_or_else(|| SectionError::InvalidKey(key.to_string()))?
            .clone();
        Ok((group, AttachmentKey::parse(key)?))
    }
}

/// Replace the tree of `group` with `f(tree)`, keeping it on failure
fn edit_group<F>(document: &mut PageDocument, group: &str, f: F) -> TransportResult<()>
where
    F: FnOnce(&SectionTree) -> Result<SectionTree, SectionError>,
{
    let tree = document
        .groups
        .get_mut(group)
        .ok_or_else(|| TransportError::UnknownGroup(group.to_string()))?;
    *tree = f(tree)?;
    Ok(())
}
