use async_trait::async_trait;
use pagecraft_sections::{
    AttachmentRef, EditorConfig, PageDocument, PageField, SectionBody, SectionError, SectionKind,
    SectionPath, DEFAULT_GROUP,
};
use pagecraft_test_utils::{
    arb_submittable_tree, complete_text, sample_page, scenario_nested_tree,
};
use pagecraft_transport::{
    EditSession, LoopbackApi, MultipartPayload, PageApi, Packager, TransportError,
    TransportResult,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

/// Backend that never answers in time
struct SlowApi;

#[async_trait]
impl PageApi for SlowApi {
    async fn save_page(&self, _payload: MultipartPayload) -> TransportResult<PageDocument> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(PageDocument::default())
    }
}

fn count_strings(value: &serde_json::Value, counts: &mut HashMap<String, usize>) {
    match value {
        serde_json::Value::String(s) => *counts.entry(s.clone()).or_default() += 1,
        serde_json::Value::Array(items) => items.iter().for_each(|v| count_strings(v, counts)),
        serde_json::Value::Object(map) => map.values().for_each(|v| count_strings(v, counts)),
        _ => {}
    }
}

/// Split an encoded body into `(headers, content)` pairs
fn split_parts(body: &[u8], boundary: &str) -> Vec<(String, Vec<u8>)> {
    let delimiter = format!("--{boundary}");
    let text = String::from_utf8_lossy(body).into_owned();
    text.split(&delimiter)
        .skip(1)
        .filter(|chunk| !chunk.starts_with("--"))
        .map(|chunk| {
            let chunk = chunk.strip_prefix("\r\n").unwrap();
            let (headers, content) = chunk.split_once("\r\n\r\n").unwrap();
            let content = content.strip_suffix("\r\n").unwrap();
            (headers.to_string(), content.as_bytes().to_vec())
        })
        .collect()
}

#[test]
fn test_encoded_body_follows_wire_contract() {
    let config = EditorConfig::default();
    let package = Packager::new(&config)
        .package_with(&sample_page(), MultipartPayload::with_boundary("BOUNDARY"))
        .unwrap();
    let parts = split_parts(&package.payload.encode(), "BOUNDARY");

    let names: Vec<&str> = parts
        .iter()
        .map(|(headers, _)| {
            let start = headers.find("name=\"").unwrap() + 6;
            let end = start + headers[start..].find('"').unwrap();
            &headers[start..end]
        })
        .collect();
    assert_eq!(names, ["title", "slug", "published", "sections", "section_2_block_1"]);

    let (headers, content) = &parts[4];
    assert!(headers.contains("filename=\"section_2_block_1.png\""));
    assert!(headers.contains("Content-Type: image/png"));
    assert_eq!(content.as_slice(), b"block-one");

    let skeleton: serde_json::Value = serde_json::from_slice(&parts[3].1).unwrap();
    assert_eq!(skeleton[2]["blocks"][1]["image"], "section_2_block_1");
    assert_eq!(skeleton[1]["image"], "https://cdn.example/hero.png");
}

#[tokio::test]
async fn test_loopback_round_trip_replaces_pending_with_urls() {
    let mut session = EditSession::new(sample_page(), EditorConfig::default());
    assert_eq!(session.pending_attachments().len(), 1);

    let saved = session
        .submit(&LoopbackApi::new("https://cdn.example/uploads"))
        .await
        .unwrap()
        .clone();

    let tree = saved.group(DEFAULT_GROUP).unwrap();
    let SectionBody::BlockCollection { blocks } = &tree.sections()[2].body else {
        panic!("expected block collection");
    };
    assert_eq!(
        blocks[1].image,
        AttachmentRef::remote("https://cdn.example/uploads/section_2_block_1.png")
    );
    assert!(session.pending_attachments().is_empty());
    assert_eq!(saved.fields["title"], PageField::Bilingual(complete_text("Cotton")));
}

#[tokio::test]
async fn test_nested_upload_through_session() {
    let page = PageDocument::new()
        .with_field("title", complete_text("Care"))
        .with_group(DEFAULT_GROUP, scenario_nested_tree());
    let mut session = EditSession::new(page, EditorConfig::default());

    let nested: SectionPath = "2/1:0".parse().unwrap();
    session
        .insert(
            DEFAULT_GROUP,
            &nested,
            pagecraft_test_utils::image_section(AttachmentRef::none()),
        )
        .unwrap();
    session
        .attach_by_key("section_2_tab_1_section_0", vec![5u8; 5], "image/webp")
        .unwrap();

    let keys: Vec<String> = session
        .pending_attachments()
        .into_iter()
        .map(|(key, _)| key.into_string())
        .collect();
    assert_eq!(keys, ["section_2_tab_0_section_3", "section_2_tab_1_section_0"]);

    let saved = session.submit(&LoopbackApi::new("https://cdn")).await.unwrap();
    let image = saved
        .group(DEFAULT_GROUP)
        .unwrap()
        .get(&nested)
        .unwrap()
        .body
        .image()
        .cloned()
        .unwrap();
    assert_eq!(image, AttachmentRef::remote("https://cdn/section_2_tab_1_section_0.webp"));
}

#[tokio::test]
async fn test_group_scoped_keys() {
    let page = PageDocument::default()
        .with_field("title", complete_text("Two groups"))
        .with_group("hero", scenario_nested_tree())
        .with_group("body", scenario_nested_tree());

    let err = Packager::new(&EditorConfig::default())
        .package(&page)
        .unwrap_err();
    assert!(matches!(err, TransportError::Section(SectionError::KeyCollision(_))));

    let config = EditorConfig::default().with_group_key_prefix(true);
    let mut session = EditSession::new(page, config);
    session
        .attach_by_key("body_section_2_tab_0_section_3", vec![1u8, 2], "image/png")
        .unwrap();
    let package = session.package().unwrap();
    assert_eq!(
        package.summary.attachments,
        ["hero_section_2_tab_0_section_3", "body_section_2_tab_0_section_3"]
    );
    assert_eq!(package.summary.attachment_bytes, 6 + 2);
}

#[tokio::test]
async fn test_submit_timeout() {
    let mut session = EditSession::new(sample_page(), EditorConfig::default())
        .with_submit_timeout(Duration::from_millis(50));
    let before = session.document().clone();

    let err = session.submit(&SlowApi).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)));
    assert_eq!(session.document(), &before);
}

#[test]
fn test_depth_limit_from_config_blocks_package() {
    let config = EditorConfig::from_toml_str("max_depth = 0").unwrap();
    let page = PageDocument::new()
        .with_field("title", complete_text("Deep"))
        .with_group(DEFAULT_GROUP, scenario_nested_tree());
    let err = Packager::new(&config).package(&page).unwrap_err();
    assert!(matches!(
        err,
        TransportError::Section(SectionError::DepthExceeded { depth: 1, max: 0 })
    ));

    let mut session = EditSession::new(PageDocument::new(), config);
    let err = session
        .add_section(DEFAULT_GROUP, &SectionPath::top(0), SectionKind::TabContainer)
        .unwrap_err();
    assert!(!err.is_user_recoverable());
}

proptest! {
    #[test]
    fn prop_every_binary_part_is_named_once_in_skeleton(tree in arb_submittable_tree()) {
        let page = PageDocument::new()
            .with_field("title", complete_text("Generated"))
            .with_group(DEFAULT_GROUP, tree);
        let package = Packager::new(&EditorConfig::default()).package(&page).unwrap();

        let skeleton: serde_json::Value = serde_json::from_str(
            package.payload.part(DEFAULT_GROUP).unwrap().as_text().unwrap(),
        )
        .unwrap();
        let mut counts = HashMap::new();
        count_strings(&skeleton, &mut counts);

        let names: Vec<&str> = package.payload.binary_names().collect();
        prop_assert_eq!(names.len(), package.summary.attachments.len());
        for name in names {
            prop_assert_eq!(counts.get(name).copied(), Some(1), "part {}", name);
        }
    }
}
