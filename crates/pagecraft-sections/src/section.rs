//! Section nodes
//!
//! [`Section`] is a closed tagged union over [`SectionKind`]. The only
//! recursion point is [`SectionBody::TabContainer`], whose tabs each own a
//! full [`SectionList`].
//!
//! Section lists are persistent vectors of `Arc<Section>`: cloning a list is
//! cheap and unchanged nodes stay reference-identical across edits.

use crate::attachment::AttachmentRef;
use crate::bilingual::BilingualText;
use crate::error::SectionError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Ordered, structurally shared list of sections
pub type SectionList = im::Vector<Arc<Section>>;

/// Discriminant of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Text,
    RichText,
    List,
    BlockCollection,
    Table,
    Image,
    ImageLeft,
    ImageRight,
    TabContainer,
}

impl SectionKind {
    /// Every kind, in registry order
    pub const ALL: [Self; 9] = [
        Self::Text,
        Self::RichText,
        Self::List,
        Self::BlockCollection,
        Self::Table,
        Self::Image,
        Self::ImageLeft,
        Self::ImageRight,
        Self::TabContainer,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::RichText => "rich_text",
            Self::List => "list",
            Self::BlockCollection => "block_collection",
            Self::Table => "table",
            Self::Image => "image",
            Self::ImageLeft => "image_left",
            Self::ImageRight => "image_right",
            Self::TabContainer => "tab_container",
        }
    }

    /// Kinds whose payload is a single image
    #[inline]
    #[must_use]
    pub const fn is_single_image(self) -> bool {
        matches!(self, Self::Image | Self::ImageLeft | Self::ImageRight)
    }

    /// Kinds that may hold attachments
    #[inline]
    #[must_use]
    pub const fn holds_attachments(self) -> bool {
        self.is_single_image() || matches!(self, Self::BlockCollection)
    }
}

impl Display for SectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = SectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SectionError::UnknownVariant(s.to_string()))
    }
}

/// List key of a section, stable within one tree instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Identifier as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for SectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One typed node of the content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// List key; regenerated when absent from fetched JSON
    #[serde(default = "SectionId::generate")]
    pub id: SectionId,
    /// Kind-specific payload, tagged by `type`
    #[serde(flatten)]
    pub body: SectionBody,
}

impl Section {
    /// Create with a fresh id
    #[inline]
    #[must_use]
    pub fn new(body: SectionBody) -> Self {
        Self {
            id: SectionId::generate(),
            body,
        }
    }

    /// Create with an explicit id
    #[inline]
    #[must_use]
    pub fn with_id(id: impl Into<SectionId>, body: SectionBody) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// Discriminant
    #[inline]
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.body.kind()
    }

    /// Nested tab containers below and including this node
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        match &self.body {
            SectionBody::TabContainer { tabs } => {
                1 + tabs
                    .iter()
                    .flat_map(|tab| tab.sections.iter())
                    .map(|child| child.nesting_depth())
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// Kind-specific payload of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionBody {
    /// Title and description
    Text {
        #[serde(default)]
        title: BilingualText,
        #[serde(default)]
        description: BilingualText,
    },
    /// Markup in both locales
    RichText {
        #[serde(default)]
        body: BilingualText,
    },
    /// Bullet items
    List {
        #[serde(default)]
        items: Vec<BilingualText>,
    },
    /// Cards with title, description and image
    BlockCollection {
        #[serde(default)]
        blocks: Vec<Block>,
    },
    /// Header plus jagged rows
    Table {
        #[serde(default)]
        header: String,
        #[serde(default)]
        rows: Vec<Vec<String>>,
    },
    /// Full-width image
    Image {
        #[serde(default)]
        image: AttachmentRef,
    },
    /// Image rendered on the left
    ImageLeft {
        #[serde(default)]
        image: AttachmentRef,
    },
    /// Image rendered on the right
    ImageRight {
        #[serde(default)]
        image: AttachmentRef,
    },
    /// Labelled tabs, each a nested section list
    TabContainer {
        #[serde(default)]
        tabs: Vec<Tab>,
    },
}

impl SectionBody {
    /// Discriminant of this payload
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Text { .. } => SectionKind::Text,
            Self::RichText { .. } => SectionKind::RichText,
            Self::List { .. } => SectionKind::List,
            Self::BlockCollection { .. } => SectionKind::BlockCollection,
            Self::Table { .. } => SectionKind::Table,
            Self::Image { .. } => SectionKind::Image,
            Self::ImageLeft { .. } => SectionKind::ImageLeft,
            Self::ImageRight { .. } => SectionKind::ImageRight,
            Self::TabContainer { .. } => SectionKind::TabContainer,
        }
    }

    /// Image field of single-image kinds
    #[must_use]
    pub fn image(&self) -> Option<&AttachmentRef> {
        match self {
            Self::Image { image } | Self::ImageLeft { image } | Self::ImageRight { image } => {
                Some(image)
            }
            _ => None,
        }
    }

    /// Mutable image field of single-image kinds
    pub fn image_mut(&mut self) -> Option<&mut AttachmentRef> {
        match self {
            Self::Image { image } | Self::ImageLeft { image } | Self::ImageRight { image } => {
                Some(image)
            }
            _ => None,
        }
    }
}

/// Card inside a block collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub title: BilingualText,
    #[serde(default)]
    pub description: BilingualText,
    #[serde(default)]
    pub image: AttachmentRef,
}

/// Labelled tab owning a nested section list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub label: BilingualText,
    #[serde(default)]
    pub sections: SectionList,
}

impl Tab {
    /// Create tab with label and sections
    #[must_use]
    pub fn new(label: BilingualText, sections: impl IntoIterator<Item = Section>) -> Self {
        Self {
            label,
            sections: sections.into_iter().map(Arc::new).collect(),
        }
    }
}
