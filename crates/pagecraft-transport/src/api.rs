//! Backend boundary
//!
//! [`PageApi`] is the single asynchronous seam of the editor. The backend is
//! expected to substitute every JSON string equal to a binary part name with
//! the stored location of that part; [`LoopbackApi`] does exactly that in
//! process, which is enough for dry runs and tests.

use crate::error::{TransportError, TransportResult};
use crate::multipart::{extension_for, MultipartPayload, PartBody};
use pagecraft_sections::{PageDocument, PageField, SectionTree};
use serde_json::Value;
use std::collections::HashMap;

/// Page persistence backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PageApi: Send + Sync {
    /// Persist a packaged page and return its canonical form
    async fn save_page(&self, payload: MultipartPayload) -> TransportResult<PageDocument>;
}

/// In-process backend storing attachments under `{base_url}/{key}.{ext}`
#[derive(Debug, Clone)]
pub struct LoopbackApi {
    base_url: String,
}

impl LoopbackApi {
    /// Create loopback backend
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Decode a payload the way a backend would
    ///
    /// JSON arrays become section groups; every other JSON part becomes a
    /// field. Plain text parts from other form clients are kept verbatim.
    ///
    /// # Errors
    /// Returns `Json` if a JSON part does not decode, or `Api` with status 422
    /// for an array that is not a section list
    pub fn decode(&self, payload: &MultipartPayload) -> TransportResult<PageDocument> {
        let stored: HashMap<&str, String> = payload
            .parts()
            .iter()
            .filter_map(|part| match &part.body {
                PartBody::Binary { mime_type, .. } => Some((
                    part.name.as_str(),
                    format!("{}/{}.{}", self.base_url, part.name, extension_for(mime_type)),
                )),
                _ => None,
            })
            .collect();

        let mut document = PageDocument::default();
        for part in payload.parts() {
            match &part.body {
                PartBody::Binary { .. } => {}
                PartBody::Text(text) => {
                    document.fields.insert(part.name.clone(), PageField::Text(text.clone()));
                }
                PartBody::Json(encoded) => {
                    let mut value: Value = serde_json::from_str(encoded)?;
                    if value.is_array() {
                        substitute(&mut value, &stored);
                        let tree: SectionTree =
                            serde_json::from_value(value).map_err(|err| TransportError::Api {
                                status: 422,
                                message: format!("group '{}': {err}", part.name),
                            })?;
                        document.groups.insert(part.name.clone(), tree);
                    } else {
                        let field: PageField = serde_json::from_value(value)?;
                        document.fields.insert(part.name.clone(), field);
                    }
                }
            }
        }
        Ok(document)
    }
}

#[async_trait::async_trait]
impl PageApi for LoopbackApi {
    async fn save_page(&self, payload: MultipartPayload) -> TransportResult<PageDocument> {
        let document = self.decode(&payload)?;
        tracing::debug!(
            parts = payload.len(),
            groups = document.groups.len(),
            "loopback save"
        );
        Ok(document)
    }
}

/// Replace every string equal to a stored part name with its location
fn substitute(value: &mut Value, stored: &HashMap<&str, String>) {
    match value {
        Value::String(s) => {
            if let Some(url) = stored.get(s.as_str()) {
                *s = url.clone();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| substitute(v, stored)),
        Value::Object(map) => map.values_mut().for_each(|v| substitute(v, stored)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn payload() -> MultipartPayload {
        let mut payload = MultipartPayload::with_boundary("b");
        payload.push_json("slug", &"cotton").unwrap();
        payload.push_json("published", &true).unwrap();
        payload.push_text("note", "plain form field").unwrap();
        payload
            .push_json(
                "sections",
                &serde_json::json!([
                    {"id": "a", "type": "image", "image": "section_0"},
                    {"id": "b", "type": "text", "title": {"en": "section_0", "ar": "x"}}
                ]),
            )
            .unwrap();
        payload
            .push_binary("section_0", Arc::from(&b"png"[..]), "image/png")
            .unwrap();
        payload
    }

    #[tokio::test]
    async fn loopback_substitutes_keys() {
        let api = LoopbackApi::new("https://cdn.example/");
        let saved = api.save_page(payload()).await.unwrap();

        assert_eq!(saved.fields["slug"], PageField::Text("cotton".into()));
        assert_eq!(saved.fields["published"], PageField::Flag(true));
        assert_eq!(saved.fields["note"], PageField::Text("plain form field".into()));
        let json = serde_json::to_value(&saved.groups["sections"]).unwrap();
        assert_eq!(json[0]["image"], "https://cdn.example/section_0.png");
        // The consumer contract substitutes every matching string
        assert_eq!(json[1]["title"]["en"], "https://cdn.example/section_0.png");
    }

    #[tokio::test]
    async fn malformed_group_is_unprocessable() {
        let mut payload = MultipartPayload::with_boundary("b");
        payload
            .push_json("sections", &serde_json::json!([{"type": "carousel"}]))
            .unwrap();
        let err = LoopbackApi::new("u").save_page(payload).await.unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 422, .. }));
    }
}
