//! Leaf field edits
//!
//! [`FieldEdit`] is the closed set of pure edits the section editor performs
//! on a single node. Each edit checks that it fits the node's kind and that
//! any index it carries exists, failing with `InvalidField` otherwise.

use crate::attachment::AttachmentRef;
use crate::bilingual::{BilingualText, Locale};
use crate::error::SectionError;
use crate::section::{Block, Section, SectionBody, SectionKind, Tab};

/// Bilingual field addressed by a text edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    /// Title of a text section
    Title,
    /// Description of a text section
    Description,
    /// Markup of a rich-text section
    Body,
    /// Item of a list section
    ListItem(usize),
    /// Title of a block
    BlockTitle(usize),
    /// Description of a block
    BlockDescription(usize),
    /// Label of a tab
    TabLabel(usize),
}

/// Pure edit of one leaf field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    /// Replace one locale of a bilingual field
    SetText {
        field: TextField,
        locale: Locale,
        value: String,
    },
    /// Replace the table header
    SetTableHeader(String),
    /// Replace a cell; `column` may equal the row length to append
    SetCell {
        row: usize,
        column: usize,
        value: String,
    },
    /// Append an empty table row
    AddRow,
    /// Remove a table row
    RemoveRow(usize),
    /// Append an empty list item
    AddItem,
    /// Remove a list item
    RemoveItem(usize),
    /// Append an empty block
    AddBlock,
    /// Remove a block
    RemoveBlock(usize),
    /// Append an empty tab with a label
    AddTab(BilingualText),
    /// Remove a tab and everything under it
    RemoveTab(usize),
    /// Replace the image of an image section
    SetImage(AttachmentRef),
    /// Replace the image of a block
    SetBlockImage { block: usize, image: AttachmentRef },
}

impl FieldEdit {
    /// Text edit shorthand
    #[inline]
    #[must_use]
    pub fn set_text(field: TextField, locale: Locale, value: impl Into<String>) -> Self {
        Self::SetText {
            field,
            locale,
            value: value.into(),
        }
    }

    /// Attachment assigned by this edit, if any
    #[must_use]
    pub fn attachment(&self) -> Option<&AttachmentRef> {
        match self {
            Self::SetImage(image) | Self::SetBlockImage { image, .. } => Some(image),
            _ => None,
        }
    }

    /// Apply to `section`
    ///
    /// # Errors
    /// Returns `InvalidField` if the edit does not fit the section's kind or
    /// an index is out of range
    pub fn apply(self, section: &mut Section) -> Result<(), SectionError> {
        let kind = section.kind();
        let field = self.field_name();
        let invalid = || SectionError::invalid_field(kind, field.clone());

        match (self, &mut section.body) {
            (Self::SetText { field: text_field, locale, value }, body) => {
                text_slot(body, text_field)
                    .ok_or_else(invalid)?
                    .set(locale, value);
            }
            (Self::SetTableHeader(value), SectionBody::Table { header, .. }) => *header = value,
            (Self::SetCell { row, column, value }, SectionBody::Table { rows, .. }) => {
                let cells = rows.get_mut(row).ok_or_else(invalid)?;
                match column.cmp(&cells.len()) {
                    std::cmp::Ordering::Less => cells[column] = value,
                    std::cmp::Ordering::Equal => cells.push(value),
                    std::cmp::Ordering::Greater => return Err(invalid()),
                }
            }
            (Self::AddRow, SectionBody::Table { rows, .. }) => rows.push(vec![String::new()]),
            (Self::RemoveRow(row), SectionBody::Table { rows, .. }) => {
                remove_index(rows, row).ok_or_else(invalid)?;
            }
            (Self::AddItem, SectionBody::List { items }) => items.push(BilingualText::default()),
            (Self::RemoveItem(item), SectionBody::List { items }) => {
                remove_index(items, item).ok_or_else(invalid)?;
            }
            (Self::AddBlock, SectionBody::BlockCollection { blocks }) => {
                blocks.push(Block::default());
            }
            (Self::RemoveBlock(block), SectionBody::BlockCollection { blocks }) => {
                remove_index(blocks, block).ok_or_else(invalid)?;
            }
            (Self::AddTab(label), SectionBody::TabContainer { tabs }) => {
                tabs.push(Tab {
                    label,
                    sections: im::Vector::new(),
                });
            }
            (Self::RemoveTab(tab), SectionBody::TabContainer { tabs }) => {
                remove_index(tabs, tab).ok_or_else(invalid)?;
            }
            (Self::SetImage(image), body) => *body.image_mut().ok_or_else(invalid)? = image,
            (Self::SetBlockImage { block, image }, SectionBody::BlockCollection { blocks }) => {
                blocks.get_mut(block).ok_or_else(invalid)?.image = image;
            }
            _ => return Err(invalid()),
        }
        Ok(())
    }

    /// Field name used in error reports
    #[must_use]
    pub fn field_name(&self) -> String {
        match self {
            Self::SetText { field, locale, .. } => match field {
                TextField::Title => format!("title.{locale}"),
                TextField::Description => format!("description.{locale}"),
                TextField::Body => format!("body.{locale}"),
                TextField::ListItem(i) => format!("items[{i}].{locale}"),
                TextField::BlockTitle(i) => format!("blocks[{i}].title.{locale}"),
                TextField::BlockDescription(i) => format!("blocks[{i}].description.{locale}"),
                TextField::TabLabel(i) => format!("tabs[{i}].label.{locale}"),
            },
            Self::SetTableHeader(_) => "header".to_string(),
            Self::SetCell { row, column, .. } => format!("rows[{row}][{column}]"),
            Self::AddRow => "rows".to_string(),
            Self::RemoveRow(row) => format!("rows[{row}]"),
            Self::AddItem => "items".to_string(),
            Self::RemoveItem(i) => format!("items[{i}]"),
            Self::AddBlock => "blocks".to_string(),
            Self::RemoveBlock(i) => format!("blocks[{i}]"),
            Self::AddTab(_) => "tabs".to_string(),
            Self::RemoveTab(i) => format!("tabs[{i}]"),
            Self::SetImage(_) => "image".to_string(),
            Self::SetBlockImage { block, .. } => format!("blocks[{block}].image"),
        }
    }

    /// Section kind whose size ceiling applies to the assigned attachment
    #[must_use]
    pub fn attachment_kind(&self, target: SectionKind) -> SectionKind {
        match self {
            Self::SetBlockImage { .. } => SectionKind::BlockCollection,
            _ => target,
        }
    }
}

fn text_slot(body: &mut SectionBody, field: TextField) -> Option<&mut BilingualText> {
    match (field, body) {
        (TextField::Title, SectionBody::Text { title, .. }) => Some(title),
        (TextField::Description, SectionBody::Text { description, .. }) => Some(description),
        (TextField::Body, SectionBody::RichText { body }) => Some(body),
        (TextField::ListItem(i), SectionBody::List { items }) => items.get_mut(i),
        (TextField::BlockTitle(i), SectionBody::BlockCollection { blocks }) => {
            blocks.get_mut(i).map(|b| &mut b.title)
        }
        (TextField::BlockDescription(i), SectionBody::BlockCollection { blocks }) => {
            blocks.get_mut(i).map(|b| &mut b.description)
        }
        (TextField::TabLabel(i), SectionBody::TabContainer { tabs }) => {
            tabs.get_mut(i).map(|t| &mut t.label)
        }
        _ => None,
    }
}

fn remove_index<T>(items: &mut Vec<T>, index: usize) -> Option<T> {
    (index < items.len()).then(|| items.remove(index))
}
