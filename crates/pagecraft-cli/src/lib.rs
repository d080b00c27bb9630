//! Pagecraft CLI - inspect and package page documents
//!
//! Commands operate on page JSON as stored by the backend (attachments are
//! URLs or empty). Local files are attached at the slots named by their
//! extraction keys before packaging.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{bail, Context, Result};
use pagecraft_sections::{AttachmentExtractor, AttachmentRef, EditorConfig, PageDocument};
use pagecraft_transport::{EditSession, LoopbackApi, PackageSummary};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One local file to attach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attach {
    pub key: String,
    pub file: PathBuf,
}

impl Attach {
    /// Parse `KEY=FILE`
    ///
    /// # Errors
    /// Fails if there is no `=` or either side is empty
    pub fn parse(arg: &str) -> Result<Self> {
        let Some((key, file)) = arg.split_once('=') else {
            bail!("expected KEY=FILE, got '{arg}'");
        };
        if key.is_empty() || file.is_empty() {
            bail!("expected KEY=FILE, got '{arg}'");
        }
        Ok(Self {
            key: key.to_string(),
            file: PathBuf::from(file),
        })
    }
}

/// Slot listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyLine {
    pub group: String,
    pub key: String,
    pub state: &'static str,
    pub value: String,
}

/// Load a page from JSON
///
/// # Errors
/// Fails if the file cannot be read or is not a page document
pub fn load_page(path: &Path) -> Result<PageDocument> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading page {}", path.display()))?;
    PageDocument::from_json(&source).with_context(|| format!("parsing page {}", path.display()))
}

/// Load editor config from TOML, or defaults
///
/// # Errors
/// Fails if the file cannot be read or parsed
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let source =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    EditorConfig::from_toml_str(&source)
        .with_context(|| format!("parsing config {}", path.display()))
}

/// MIME type guessed from a file extension
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// Every attachment slot of every group
#[must_use]
pub fn key_lines(document: &PageDocument, config: &EditorConfig) -> Vec<KeyLine> {
    let mut lines = Vec::new();
    for (group, tree) in &document.groups {
        let extractor = if config.group_key_prefix {
            AttachmentExtractor::scoped(group)
        } else {
            AttachmentExtractor::new()
        };
        for slot in extractor.slots(tree) {
            let (state, value) = match &slot.attachment {
                AttachmentRef::Pending(p) => ("pending", format!("{} bytes", p.size_bytes())),
                AttachmentRef::Remote(url) if url.is_empty() => ("empty", String::new()),
                AttachmentRef::Remote(url) => ("remote", url.clone()),
            };
            lines.push(KeyLine {
                group: group.clone(),
                key: slot.key.into_string(),
                state,
                value,
            });
        }
    }
    lines
}

/// Render a slot listing as text or JSON
///
/// # Errors
/// Fails only if JSON encoding fails
pub fn render_key_lines(lines: &[KeyLine], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(lines)?);
    }
    Ok(lines
        .iter()
        .map(|line| format!("{}\t{}\t{}\t{}", line.group, line.key, line.state, line.value))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Open a session and attach local files by key
///
/// # Errors
/// Fails if a file cannot be read or a key does not name a slot
pub fn open_session(
    document: PageDocument,
    config: EditorConfig,
    attachments: &[Attach],
) -> Result<EditSession> {
    let mut session = EditSession::new(document, config);
    for attach in attachments {
        let bytes = fs::read(&attach.file)
            .with_context(|| format!("reading attachment {}", attach.file.display()))?;
        session
            .attach_by_key(&attach.key, bytes, mime_for_path(&attach.file))
            .with_context(|| format!("attaching {} at {}", attach.file.display(), attach.key))?;
    }
    Ok(session)
}

/// Package a session and write the multipart body to `out`
///
/// # Errors
/// Fails on validation errors or if `out` cannot be written
pub fn pack(session: &EditSession, out: &Path) -> Result<PackageSummary> {
    let package = session.package().context("packaging page")?;
    fs::write(out, package.payload.encode())
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(out = %out.display(), parts = package.payload.len(), "body written");
    Ok(package.summary)
}

/// Submit a session to an in-process backend and write the saved page
///
/// # Errors
/// Fails on validation errors or if `out` cannot be written
pub async fn save(mut session: EditSession, base_url: &str, out: &Path) -> Result<PageDocument> {
    let saved = session
        .submit(&LoopbackApi::new(base_url))
        .await
        .context("saving page")?
        .clone();
    let json = serde_json::to_string_pretty(&saved)?;
    fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
    Ok(saved)
}

/// Install the tracing subscriber
///
/// Logs go to stderr; `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
