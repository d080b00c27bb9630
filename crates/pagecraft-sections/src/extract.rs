//! Attachment extraction
//!
//! Walks a tree pre-order, gives every pending attachment its deterministic
//! key (see [`crate::keys`]), and produces:
//! - a skeleton tree whose pending fields hold `Remote(key)` placeholders,
//!   which serializes to pure JSON;
//! - the side channel of `(key, bytes, mime type)` payloads.
//!
//! The live editing tree is never touched; the skeleton shares every node
//! that holds no pending attachment.

use crate::attachment::{AttachmentRef, PendingAttachment};
use crate::error::SectionError;
use crate::keys::{AttachmentKey, KeySlot};
use crate::path::SectionPath;
use crate::section::{Section, SectionBody};
use crate::tree::SectionTree;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// One extracted payload
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAttachment {
    /// Part name on the wire
    pub key: AttachmentKey,
    /// Payload (bytes, MIME type, size)
    pub payload: Arc<PendingAttachment>,
}

impl ExtractedAttachment {
    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.payload.bytes()
    }

    /// Declared MIME type
    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.payload.mime_type()
    }
}

/// Side channel of extracted payloads, keyed and ordered by discovery
///
/// Shared across groups of one page so that duplicates between groups are
/// caught as collisions too.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSink {
    entries: IndexMap<AttachmentKey, Arc<PendingAttachment>>,
    /// Occurrences of every string value in the emitted skeletons
    skeleton_strings: IndexMap<String, usize>,
}

impl AttachmentSink {
    /// Create empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a payload under `key`
    ///
    /// # Errors
    /// Returns `KeyCollision` if `key` is already taken
    pub fn record(
        &mut self,
        key: AttachmentKey,
        payload: Arc<PendingAttachment>,
    ) -> Result<(), SectionError> {
        match self.entries.entry(key) {
            indexmap::map::Entry::Occupied(entry) => {
                Err(SectionError::KeyCollision(entry.key().to_string()))
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(payload);
                Ok(())
            }
        }
    }

    /// Payload recorded under `key`
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<PendingAttachment>> {
        self.entries.get(key)
    }

    /// Check if `key` was recorded
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of payloads
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no payload was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total payload bytes
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|p| p.size_bytes()).sum()
    }

    /// Payloads in discovery order
    pub fn iter(&self) -> impl Iterator<Item = ExtractedAttachment> + '_ {
        self.entries.iter().map(|(key, payload)| ExtractedAttachment {
            key: key.clone(),
            payload: Arc::clone(payload),
        })
    }

    /// Count every string value of an emitted skeleton
    fn observe_skeleton(&mut self, skeleton: &SectionTree) -> Result<(), SectionError> {
        let json = serde_json::to_value(skeleton)?;
        count_strings(&json, &mut self.skeleton_strings);
        Ok(())
    }

    /// Fail if a skeleton string other than the placeholder equals a key
    ///
    /// The consumer substitutes every string matching a part name. Each key
    /// must therefore occur exactly once across all skeletons.
    fn ensure_keys_unambiguous(&self) -> Result<(), SectionError> {
        let ambiguous = self
            .entries
            .keys()
            .find(|key| self.skeleton_strings.get(key.as_str()).copied().unwrap_or(0) > 1);
        match ambiguous {
            Some(key) => Err(SectionError::KeyCollision(key.to_string())),
            None => Ok(()),
        }
    }
}

/// Result of extracting one tree
#[derive(Debug, Clone)]
pub struct Extraction {
    skeleton: SectionTree,
    attachments: AttachmentSink,
}

impl Extraction {
    /// Tree with placeholders instead of pending payloads
    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &SectionTree {
        &self.skeleton
    }

    /// Skeleton as JSON
    ///
    /// # Errors
    /// Returns `Json` if encoding fails
    pub fn skeleton_json(&self) -> Result<serde_json::Value, SectionError> {
        Ok(serde_json::to_value(&self.skeleton)?)
    }

    /// Extracted payloads
    #[inline]
    #[must_use]
    pub fn attachments(&self) -> &AttachmentSink {
        &self.attachments
    }

    /// Apply the consumer contract locally: substitute every key string with
    /// its payload again
    ///
    /// # Errors
    /// Returns `Json` if the skeleton does not survive a JSON round trip
    pub fn reinline(&self) -> Result<SectionTree, SectionError> {
        reinline_json(&self.skeleton_json()?, &self.attachments)
    }
}

/// Rebuild a tree from a JSON skeleton and its side channel
///
/// # Errors
/// Returns `Json` if `skeleton` is not a valid section array
pub fn reinline_json(
    skeleton: &serde_json::Value,
    attachments: &AttachmentSink,
) -> Result<SectionTree, SectionError> {
    let tree: SectionTree = serde_json::from_value(skeleton.clone())?;
    rewrite_attachments(&tree, &mut |_, image| {
        Ok(match image {
            AttachmentRef::Remote(url) => attachments
                .get(url)
                .map(|payload| AttachmentRef::Pending(Arc::clone(payload))),
            AttachmentRef::Pending(_) => None,
        })
    })
}

/// Attachment slot as seen by the extractor
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentSlot {
    /// Key the slot would be sent under
    pub key: AttachmentKey,
    /// Structural position
    pub slot: KeySlot,
    /// Current value
    pub attachment: AttachmentRef,
}

/// Attachment extractor, optionally scoped to a group prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentExtractor<'a> {
    scope: Option<&'a str>,
}

impl<'a> AttachmentExtractor<'a> {
    /// Extractor producing unscoped keys
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { scope: None }
    }

    /// Extractor prefixing keys with `{group}_`
    #[inline]
    #[must_use]
    pub fn scoped(group: &'a str) -> Self {
        Self { scope: Some(group) }
    }

    /// Extract a single tree into a fresh side channel
    ///
    /// # Errors
    /// Returns `KeyCollision` if two slots share a key
    pub fn extract(&self, tree: &SectionTree) -> Result<Extraction, SectionError> {
        let mut attachments = AttachmentSink::new();
        let skeleton = self.extract_into(tree, &mut attachments)?;
        attachments.ensure_keys_unambiguous()?;
        Ok(Extraction {
            skeleton,
            attachments,
        })
    }

    /// Extract a tree into a shared side channel, returning the skeleton
    ///
    /// Call [`AttachmentExtractor::finish`] once every group went through.
    ///
    /// # Errors
    /// Returns `KeyCollision` if a key is already in `sink`
    pub fn extract_into(
        &self,
        tree: &SectionTree,
        sink: &mut AttachmentSink,
    ) -> Result<SectionTree, SectionError> {
        let before = sink.len();
        let skeleton = rewrite_attachments(tree, &mut |slot, image| match image {
            AttachmentRef::Pending(payload) => {
                let key = AttachmentKey::for_slot(self.scope, &slot);
                tracing::debug!(
                    key = %key,
                    size = payload.size_bytes(),
                    mime = payload.mime_type(),
                    "attachment extracted"
                );
                sink.record(key.clone(), Arc::clone(payload))?;
                Ok(Some(AttachmentRef::Remote(key.into_string())))
            }
            AttachmentRef::Remote(_) => Ok(None),
        })?;
        sink.observe_skeleton(&skeleton)?;
        tracing::debug!(
            scope = self.scope.unwrap_or(""),
            extracted = sink.len() - before,
            "tree extraction complete"
        );
        Ok(skeleton)
    }

    /// Final cross-group check on a shared side channel
    ///
    /// # Errors
    /// Returns `KeyCollision` if any other skeleton string (a persisted URL,
    /// an id, a title) equals a generated key
    pub fn finish(sink: &AttachmentSink) -> Result<(), SectionError> {
        sink.ensure_keys_unambiguous()
    }

    /// Every attachment slot of `tree`, pending or not, pre-order
    #[must_use]
    pub fn slots(&self, tree: &SectionTree) -> Vec<AttachmentSlot> {
        let mut out = Vec::new();
        visit_slots(tree, &mut |slot, image| {
            out.push(AttachmentSlot {
                key: AttachmentKey::for_slot(self.scope, &slot),
                slot,
                attachment: image.clone(),
            });
        });
        out
    }

    /// Keys and sizes of every pending payload, pre-order
    #[must_use]
    pub fn pending_attachments(&self, tree: &SectionTree) -> Vec<(AttachmentKey, u64)> {
        self.slots(tree)
            .into_iter()
            .filter_map(|slot| {
                let size = slot.attachment.as_pending()?.size_bytes();
                Some((slot.key, size))
            })
            .collect()
    }
}

/// Visit every attachment slot pre-order, in key order
fn visit_slots(tree: &SectionTree, f: &mut dyn FnMut(KeySlot, &AttachmentRef)) {
    for (path, node) in tree.walk() {
        match &node.body {
            SectionBody::Image { image }
            | SectionBody::ImageLeft { image }
            | SectionBody::ImageRight { image } => f(KeySlot { path, block: None }, image),
            SectionBody::BlockCollection { blocks } => {
                for (bi, block) in blocks.iter().enumerate() {
                    let slot = KeySlot {
                        path: path.clone(),
                        block: Some(bi),
                    };
                    f(slot, &block.image);
                }
            }
            SectionBody::Text { .. }
            | SectionBody::RichText { .. }
            | SectionBody::List { .. }
            | SectionBody::Table { .. }
            | SectionBody::TabContainer { .. } => {}
        }
    }
}

fn count_strings(value: &Value, counts: &mut IndexMap<String, usize>) {
    match value {
        Value::String(s) => *counts.entry(s.clone()).or_default() += 1,
        Value::Array(items) => items.iter().for_each(|v| count_strings(v, counts)),
        Value::Object(map) => map.values().for_each(|v| count_strings(v, counts)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

type Rewrite<'f> =
    dyn FnMut(KeySlot, &AttachmentRef) -> Result<Option<AttachmentRef>, SectionError> + 'f;

/// Visit every attachment slot pre-order; `f` may return a replacement
///
/// Nodes without replacements are shared with the input tree.
fn rewrite_attachments(
    tree: &SectionTree,
    f: &mut Rewrite<'_>,
) -> Result<SectionTree, SectionError> {
    let mut sections = tree.sections().clone();
    for (index, node) in tree.sections().iter().enumerate() {
        if let Some(replacement) = rewrite_node(&SectionPath::top(index), node, f)? {
            sections.set(index, replacement);
        }
    }
    Ok(SectionTree::from_list(sections))
}

fn rewrite_node(
    path: &SectionPath,
    node: &Arc<Section>,
    f: &mut Rewrite<'_>,
) -> Result<Option<Arc<Section>>, SectionError> {
    let body = match &node.body {
        SectionBody::Image { image }
        | SectionBody::ImageLeft { image }
        | SectionBody::ImageRight { image } => {
            let slot = KeySlot {
                path: path.clone(),
                block: None,
            };
            let Some(replacement) = f(slot, image)? else {
                return Ok(None);
            };
            let mut body = node.body.clone();
            if let Some(image) = body.image_mut() {
                *image = replacement;
            }
            body
        }
        SectionBody::BlockCollection { blocks } => {
            let mut rewritten = None;
            for (bi, block) in blocks.iter().enumerate() {
                let slot = KeySlot {
                    path: path.clone(),
                    block: Some(bi),
                };
                if let Some(replacement) = f(slot, &block.image)? {
                    rewritten.get_or_insert_with(|| blocks.clone())[bi].image = replacement;
                }
            }
            match rewritten {
                Some(blocks) => SectionBody::BlockCollection { blocks },
                None => return Ok(None),
            }
        }
        SectionBody::TabContainer { tabs } => {
            let mut rewritten = None;
            for (ti, tab) in tabs.iter().enumerate() {
                for (si, child) in tab.sections.iter().enumerate() {
                    if let Some(replacement) = rewrite_node(&path.nested(ti, si), child, f)? {
                        rewritten.get_or_insert_with(|| tabs.clone())[ti]
                            .sections
                            .set(si, replacement);
                    }
                }
            }
            match rewritten {
                Some(tabs) => SectionBody::TabContainer { tabs },
                None => return Ok(None),
            }
        }
        SectionBody::Text { .. }
        | SectionBody::RichText { .. }
        | SectionBody::List { .. }
        | SectionBody::Table { .. } => return Ok(None),
    };

    Ok(Some(Arc::new(Section {
        id: node.id.clone(),
        body,
    })))
}
