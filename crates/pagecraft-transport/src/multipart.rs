//! `multipart/form-data` payloads (RFC 7578)
//!
//! Parts keep insertion order: scalar fields, then group skeletons, then
//! binary attachments. Part names are unique within one payload.

use crate::error::TransportError;
use std::sync::Arc;

const CRLF: &[u8] = b"\r\n";

/// Content of one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Plain text value, sent verbatim
    Text(String),
    /// JSON-encoded value
    Json(String),
    /// Raw bytes with declared MIME type
    Binary {
        bytes: Arc<[u8]>,
        mime_type: String,
        filename: String,
    },
}

/// Named part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub body: PartBody,
}

impl Part {
    /// Check if this part carries binary content
    #[inline]
    #[must_use]
    pub fn is_binary(&self) -> bool {
        matches!(self.body, PartBody::Binary { .. })
    }

    /// Body as text, if it is not binary
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            PartBody::Text(value) | PartBody::Json(value) => Some(value),
            PartBody::Binary { .. } => None,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        let name = escape_quoted(&self.name);
        match &self.body {
            PartBody::Text(value) => {
                push_line(out, &format!("Content-Disposition: form-data; name=\"{name}\""));
                out.extend_from_slice(CRLF);
                out.extend_from_slice(value.as_bytes());
            }
            PartBody::Json(value) => {
                push_line(out, &format!("Content-Disposition: form-data; name=\"{name}\""));
                push_line(out, "Content-Type: application/json");
                out.extend_from_slice(CRLF);
                out.extend_from_slice(value.as_bytes());
            }
            PartBody::Binary {
                bytes,
                mime_type,
                filename,
            } => {
                push_line(
                    out,
                    &format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"",
                        escape_quoted(filename)
                    ),
                );
                push_line(out, &format!("Content-Type: {mime_type}"));
                out.extend_from_slice(CRLF);
                out.extend_from_slice(bytes);
            }
        }
        out.extend_from_slice(CRLF);
    }
}

/// Ordered multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPayload {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartPayload {
    /// Empty payload with a random boundary
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("pagecraft-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Empty payload with a fixed boundary
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Boundary delimiter
    #[inline]
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Parts in order
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Part named `name`
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Number of parts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if no part was added
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append a part
    ///
    /// # Errors
    /// Returns `DuplicatePart` if the name is taken
    pub fn push(&mut self, part: Part) -> Result<(), TransportError> {
        if self.part(&part.name).is_some() {
            return Err(TransportError::DuplicatePart(part.name));
        }
        self.parts.push(part);
        Ok(())
    }

    /// Append a plain text part
    ///
    /// # Errors
    /// Returns `DuplicatePart` if the name is taken
    pub fn push_text(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TransportError> {
        self.push(Part {
            name: name.into(),
            body: PartBody::Text(value.into()),
        })
    }

    /// Append a JSON part
    ///
    /// # Errors
    /// Returns `Json` if encoding fails or `DuplicatePart` if the name is taken
    pub fn push_json<T: serde::Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<(), TransportError> {
        let encoded = serde_json::to_string(value)?;
        self.push(Part {
            name: name.into(),
            body: PartBody::Json(encoded),
        })
    }

    /// Append a binary part named `name` with filename `{name}.{ext}`
    ///
    /// # Errors
    /// Returns `DuplicatePart` if the name is taken
    pub fn push_binary(
        &mut self,
        name: impl Into<String>,
        bytes: Arc<[u8]>,
        mime_type: impl Into<String>,
    ) -> Result<(), TransportError> {
        let name = name.into();
        let mime_type = mime_type.into();
        let filename = format!("{name}.{}", extension_for(&mime_type));
        self.push(Part {
            name,
            body: PartBody::Binary {
                bytes,
                mime_type,
                filename,
            },
        })
    }

    /// Names of the binary parts
    pub fn binary_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts
            .iter()
            .filter(|p| p.is_binary())
            .map(|p| p.name.as_str())
    }

    /// Encode the body
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_hint());
        for part in &self.parts {
            push_line(&mut out, &format!("--{}", self.boundary));
            part.write_to(&mut out);
        }
        push_line(&mut out, &format!("--{}--", self.boundary));
        out
    }

    fn encoded_hint(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match &p.body {
                PartBody::Text(v) | PartBody::Json(v) => v.len(),
                PartBody::Binary { bytes, .. } => bytes.len(),
            })
            .sum::<usize>()
            + self.parts.len() * (self.boundary.len() + 128)
    }
}

impl Default for MultipartPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// File extension for a MIME type
#[must_use]
pub fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "application/pdf" => "pdf",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(CRLF);
}

/// Percent-encode characters that would break a quoted header parameter
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
