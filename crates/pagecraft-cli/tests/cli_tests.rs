use pagecraft_cli::{
    key_lines, load_config, load_page, open_session, pack, render_key_lines, save, Attach,
};
use pagecraft_sections::{AttachmentRef, SectionBody, DEFAULT_GROUP};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PAGE: &str = r#"{
  "fields": {
    "title": { "en": "Cotton", "ar": "قطن" },
    "slug": "cotton"
  },
  "groups": {
    "sections": [
      { "id": "hero", "type": "image", "image": "https://cdn.example/hero.png" },
      {
        "id": "cards",
        "type": "block_collection",
        "blocks": [
          { "title": { "en": "Soft", "ar": "ناعم" }, "image": "" },
          { "title": { "en": "Warm", "ar": "دافئ" } }
        ]
      },
      {
        "id": "tabs",
        "type": "tab_container",
        "tabs": [
          { "label": { "en": "Care", "ar": "عناية" }, "sections": [
            { "id": "care-img", "type": "image_left", "image": null }
          ] }
        ]
      }
    ]
  }
}"#;

fn write_page(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("page.json");
    fs::write(&path, PAGE).unwrap();
    path
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_keys_lists_every_slot() {
    let dir = TempDir::new().unwrap();
    let page = load_page(&write_page(&dir)).unwrap();
    let lines = key_lines(&page, &load_config(None).unwrap());

    let keys: Vec<(&str, &str)> = lines.iter().map(|l| (l.key.as_str(), l.state)).collect();
    assert_eq!(
        keys,
        [
            ("section_0", "remote"),
            ("section_1_block_0", "empty"),
            ("section_1_block_1", "empty"),
            ("section_2_tab_0_section_0", "empty"),
        ]
    );

    let text = render_key_lines(&lines, false).unwrap();
    assert!(text.starts_with("sections\tsection_0\tremote\thttps://cdn.example/hero.png"));
    let json: serde_json::Value =
        serde_json::from_str(&render_key_lines(&lines, true).unwrap()).unwrap();
    assert_eq!(json[3]["key"], "section_2_tab_0_section_0");
}

#[test]
fn test_pack_writes_multipart_body() {
    let dir = TempDir::new().unwrap();
    let page = load_page(&write_page(&dir)).unwrap();
    let image = write_file(&dir, "care.jpg", b"jpeg-bytes");
    let attach = Attach::parse(&format!("section_2_tab_0_section_0={}", image.display())).unwrap();

    let session = open_session(page, load_config(None).unwrap(), &[attach]).unwrap();
    let out = dir.path().join("body.bin");
    let summary = pack(&session, &out).unwrap();

    assert_eq!(summary.attachments, ["section_2_tab_0_section_0"]);
    assert!(summary.content_type.starts_with("multipart/form-data; boundary="));

    let body = fs::read(&out).unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains(
        "name=\"section_2_tab_0_section_0\"; filename=\"section_2_tab_0_section_0.jpg\""
    ));
    assert!(text.contains("Content-Type: image/jpeg"));
    assert!(text.contains("jpeg-bytes"));
    assert!(text.contains("\"image\":\"section_2_tab_0_section_0\""));
}

#[test]
fn test_pack_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let page = load_page(&write_page(&dir)).unwrap();
    let image = write_file(&dir, "x.png", b"png");
    let attach = Attach::parse(&format!("section_9={}", image.display())).unwrap();

    let err = open_session(page, load_config(None).unwrap(), &[attach]).unwrap_err();
    assert!(format!("{err:#}").contains("section_9"));
}

#[test]
fn test_config_limit_applies_to_attach() {
    let dir = TempDir::new().unwrap();
    let page = load_page(&write_page(&dir)).unwrap();
    let config_path = write_file(
        &dir,
        "editor.toml",
        b"[attachment_limits]\nblock_collection = 4\n",
    );
    let config = load_config(Some(&config_path)).unwrap();
    let image = write_file(&dir, "big.png", b"too big");
    let attach = Attach::parse(&format!("section_1_block_1={}", image.display())).unwrap();

    let err = open_session(page, config, &[attach]).unwrap_err();
    assert!(format!("{err:#}").contains("exceeds the 4 byte limit"));
}

#[tokio::test]
async fn test_save_writes_canonical_page() {
    let dir = TempDir::new().unwrap();
    let page = load_page(&write_page(&dir)).unwrap();
    let image = write_file(&dir, "card.webp", b"webp");
    let attach = Attach::parse(&format!("section_1_block_0={}", image.display())).unwrap();
    let session = open_session(page, load_config(None).unwrap(), &[attach]).unwrap();

    let out = dir.path().join("saved.json");
    save(session, "https://cdn.test", &out).await.unwrap();

    let saved = load_page(Path::new(&out)).unwrap();
    let tree = saved.group(DEFAULT_GROUP).unwrap();
    let SectionBody::BlockCollection { blocks } = &tree.sections()[1].body else {
        panic!("expected block collection");
    };
    assert_eq!(
        blocks[0].image,
        AttachmentRef::remote("https://cdn.test/section_1_block_0.webp")
    );
    assert!(blocks[1].image.is_empty());
}

#[test]
fn test_malformed_page_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.json", br#"{"groups": {"sections": [{"type": "carousel"}]}}"#);
    let err = load_page(&path).unwrap_err();
    assert!(format!("{err:#}").contains("bad.json"));
}
