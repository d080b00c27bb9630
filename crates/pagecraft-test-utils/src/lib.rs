//! Testing utilities for Pagecraft workspace
//!
//! Shared fixtures and proptest strategies.

#![allow(missing_docs)]

use pagecraft_sections::{
    AttachmentRef, BilingualText, Block, PageDocument, PendingAttachment, Section, SectionBody,
    SectionTree, Tab, DEFAULT_GROUP,
};
use proptest::prelude::*;

pub fn bilingual(primary: &str, secondary: &str) -> BilingualText {
    BilingualText::new(primary, secondary)
}

pub fn complete_text(title: &str) -> BilingualText {
    bilingual(title, &format!("{title}-ar"))
}

pub fn pending_png(bytes: &[u8]) -> AttachmentRef {
    AttachmentRef::pending(PendingAttachment::new(bytes, "image/png"))
}

pub fn text_section(title: &str) -> Section {
    Section::new(SectionBody::Text {
        title: complete_text(title),
        description: BilingualText::default(),
    })
}

pub fn image_section(image: AttachmentRef) -> Section {
    Section::new(SectionBody::Image { image })
}

pub fn block(title: &str, image: AttachmentRef) -> Block {
    Block {
        title: complete_text(title),
        description: BilingualText::default(),
        image,
    }
}

pub fn blocks_section(blocks: Vec<Block>) -> Section {
    Section::new(SectionBody::BlockCollection { blocks })
}

pub fn tabs_section(tabs: Vec<(&str, Vec<Section>)>) -> Section {
    Section::new(SectionBody::TabContainer {
        tabs: tabs
            .into_iter()
            .map(|(label, sections)| Tab::new(complete_text(label), sections))
            .collect(),
    })
}

/// `[Text, Image(remote), BlockCollection([remote, pending])]`
pub fn scenario_blocks_tree() -> SectionTree {
    SectionTree::from_sections([
        text_section("Intro"),
        image_section(AttachmentRef::remote("https://cdn.example/hero.png")),
        blocks_section(vec![
            block("First", AttachmentRef::remote("https://cdn.example/b0.png")),
            block("Second", pending_png(b"block-one")),
        ]),
    ])
}

/// Tab container at index 2 whose first tab holds a pending image at index 3
pub fn scenario_nested_tree() -> SectionTree {
    SectionTree::from_sections([
        text_section("Intro"),
        text_section("Body"),
        tabs_section(vec![
            (
                "Specs",
                vec![
                    text_section("a"),
                    text_section("b"),
                    text_section("c"),
                    image_section(pending_png(b"nested")),
                ],
            ),
            ("Care", vec![text_section("wash")]),
        ]),
    ])
}

pub fn sample_page() -> PageDocument {
    PageDocument::new()
        .with_field("title", complete_text("Cotton"))
        .with_field("slug", "cotton")
        .with_field("published", true)
        .with_group(DEFAULT_GROUP, scenario_blocks_tree())
}

pub fn arb_bilingual() -> impl Strategy<Value = BilingualText> {
    ("[a-z ]{0,8}", "[\u{0621}-\u{064A} ]{0,8}")
        .prop_map(|(primary, secondary)| BilingualText::new(primary, secondary))
}

/// Both locales non-empty
pub fn arb_complete_bilingual() -> impl Strategy<Value = BilingualText> {
    ("[a-z]{1,8}", "[\u{0621}-\u{064A}]{1,8}")
        .prop_map(|(primary, secondary)| BilingualText::new(primary, secondary))
}

pub fn arb_remote() -> impl Strategy<Value = AttachmentRef> {
    prop_oneof![
        Just(AttachmentRef::none()),
        "[a-z]{1,6}"
            .prop_map(|name| AttachmentRef::remote(format!("https://cdn.example/{name}.png"))),
    ]
}

pub fn arb_attachment() -> impl Strategy<Value = AttachmentRef> {
    prop_oneof![
        arb_remote(),
        prop::collection::vec(any::<u8>(), 1..32)
            .prop_map(|bytes| AttachmentRef::pending(PendingAttachment::new(bytes, "image/png"))),
    ]
}

fn arb_leaf(
    text: BoxedStrategy<BilingualText>,
    image: BoxedStrategy<AttachmentRef>,
) -> impl Strategy<Value = Section> {
    let block = (text.clone(), text.clone(), image.clone()).prop_map(
        |(title, description, image)| Block {
            title,
            description,
            image,
        },
    );
    prop_oneof![
        (text.clone(), text.clone())
            .prop_map(|(title, description)| SectionBody::Text { title, description }),
        text.clone().prop_map(|body| SectionBody::RichText { body }),
        prop::collection::vec(text, 0..3).prop_map(|items| SectionBody::List { items }),
        prop::collection::vec(block, 0..3)
            .prop_map(|blocks| SectionBody::BlockCollection { blocks }),
        (
            "[a-z]{0,5}",
            prop::collection::vec(prop::collection::vec("[a-z0-9]{0,4}", 0..3), 0..3)
        )
            .prop_map(|(header, rows)| SectionBody::Table { header, rows }),
        image.clone().prop_map(|image| SectionBody::Image { image }),
        image.clone().prop_map(|image| SectionBody::ImageLeft { image }),
        image.prop_map(|image| SectionBody::ImageRight { image }),
    ]
    .prop_map(Section::new)
}

fn arb_section_with(
    text: BoxedStrategy<BilingualText>,
    image: BoxedStrategy<AttachmentRef>,
) -> impl Strategy<Value = Section> {
    arb_leaf(text.clone(), image).prop_recursive(3, 32, 4, move |inner| {
        prop::collection::vec((text.clone(), prop::collection::vec(inner, 0..4)), 0..3)
            .prop_map(|tabs| {
                Section::new(SectionBody::TabContainer {
                    tabs: tabs
                        .into_iter()
                        .map(|(label, sections)| Tab::new(label, sections))
                        .collect(),
                })
            })
    })
}

/// Arbitrary nesting, remote images only
pub fn arb_tree() -> impl Strategy<Value = SectionTree> {
    prop::collection::vec(arb_section_with(arb_bilingual().boxed(), arb_remote().boxed()), 0..5)
        .prop_map(SectionTree::from_sections)
}

/// Arbitrary nesting with pending images mixed in
pub fn arb_tree_with_pending() -> impl Strategy<Value = SectionTree> {
    let section = arb_section_with(arb_bilingual().boxed(), arb_attachment().boxed());
    prop::collection::vec(section, 0..5).prop_map(SectionTree::from_sections)
}

/// Pending images mixed in, every text filled in both locales
pub fn arb_submittable_tree() -> impl Strategy<Value = SectionTree> {
    let section = arb_section_with(arb_complete_bilingual().boxed(), arb_attachment().boxed());
    prop::collection::vec(section, 0..5).prop_map(SectionTree::from_sections)
}
