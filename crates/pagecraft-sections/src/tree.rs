//! Section tree and its path-addressed mutator
//!
//! Every operation returns a new [`SectionTree`]; the receiver is never
//! modified. Nodes on the path from the root to the target are copied, every
//! other node stays reference-identical to the previous tree.

use crate::edit::FieldEdit;
use crate::error::SectionError;
use crate::path::{SectionPath, TabHop};
use crate::section::{Section, SectionBody, SectionList, Tab};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ordered top-level sections of one page group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionTree {
    sections: SectionList,
}

impl SectionTree {
    /// Empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree from top-level sections
    #[must_use]
    pub fn from_sections(sections: impl IntoIterator<Item = Section>) -> Self {
        Self {
            sections: sections.into_iter().map(Arc::new).collect(),
        }
    }

    /// Tree over an existing section list
    #[inline]
    #[must_use]
    pub fn from_list(sections: SectionList) -> Self {
        Self { sections }
    }

    /// Top-level sections
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &SectionList {
        &self.sections
    }

    /// Number of top-level sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if tree has no sections
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Node at `path`
    #[must_use]
    pub fn get(&self, path: &SectionPath) -> Option<&Arc<Section>> {
        let mut list = &self.sections;
        let mut index = path.top_index();
        for hop in path.hops() {
            let SectionBody::TabContainer { tabs } = &list.get(index)?.body else {
                return None;
            };
            list = &tabs.get(hop.tab)?.sections;
            index = hop.section;
        }
        list.get(index)
    }

    /// Deepest tab nesting anywhere in the tree
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.nesting_depth())
            .max()
            .unwrap_or(0)
    }

    /// Insert `section` at the position named by the last path segment
    ///
    /// The position may equal the container length (append).
    ///
    /// # Errors
    /// Returns `PathNotFound` if an intermediate segment is not a tab
    /// container or the position is past the end of its list
    pub fn insert(&self, path: &SectionPath, section: Section) -> Result<Self, SectionError> {
        let sections = rebuild(&self.sections, path, path.top_index(), path.hops(), |list, index| {
            if index > list.len() {
                return Err(SectionError::path_not_found(path));
            }
            let mut list = list.clone();
            list.insert(index, Arc::new(section));
            Ok(list)
        })?;
        tracing::debug!(%path, "section inserted");
        Ok(Self { sections })
    }

    /// Append `section` to the end of the top-level list
    #[must_use]
    pub fn push(&self, section: Section) -> Self {
        let mut sections = self.sections.clone();
        sections.push_back(Arc::new(section));
        Self { sections }
    }

    /// Remove the node at `path` together with its whole subtree
    ///
    /// Previews held by the removed subtree are released once the last tree
    /// version referencing them drops; `self` still holds them.
    ///
    /// # Errors
    /// Returns `PathNotFound` if nothing lives at `path`
    pub fn remove_at(&self, path: &SectionPath) -> Result<Self, SectionError> {
        let sections = rebuild(&self.sections, path, path.top_index(), path.hops(), |list, index| {
            if index >= list.len() {
                return Err(SectionError::path_not_found(path));
            }
            let mut list = list.clone();
            list.remove(index);
            Ok(list)
        })?;
        tracing::debug!(%path, "section removed");
        Ok(Self { sections })
    }

    /// Replace the node at `path` with `f` applied to a copy of it
    ///
    /// The node id is kept even if `f` changes it.
    ///
    /// # Errors
    /// Returns `PathNotFound` if nothing lives at `path`, or whatever `f`
    /// returns
    pub fn update_at<F>(&self, path: &SectionPath, f: F) -> Result<Self, SectionError>
    where
        F: FnOnce(&mut Section) -> Result<(), SectionError>,
    {
        let sections = rebuild(&self.sections, path, path.top_index(), path.hops(), |list, index| {
            let current = list
                .get(index)
                .ok_or_else(|| SectionError::path_not_found(path))?;
            let mut updated = Section::clone(current);
            f(&mut updated)?;
            updated.id = current.id.clone();
            let mut list = list.clone();
            list.set(index, Arc::new(updated));
            Ok(list)
        })?;
        Ok(Self { sections })
    }

    /// Apply a leaf field edit to the node at `path`
    ///
    /// # Errors
    /// Returns `PathNotFound` for a dangling path and `InvalidField` if the
    /// edit does not fit the node's kind
    pub fn update_field(&self, path: &SectionPath, edit: FieldEdit) -> Result<Self, SectionError> {
        tracing::trace!(%path, ?edit, "applying field edit");
        self.update_at(path, |section| edit.apply(section))
    }

    /// Move the node at `path` to `new_index` within the same list
    ///
    /// # Errors
    /// Returns `PathNotFound` if either position is out of range
    pub fn move_to(&self, path: &SectionPath, new_index: usize) -> Result<Self, SectionError> {
        let sections = rebuild(&self.sections, path, path.top_index(), path.hops(), |list, index| {
            if index >= list.len() || new_index >= list.len() {
                return Err(SectionError::path_not_found(path));
            }
            let mut list = list.clone();
            let node = list.remove(index);
            list.insert(new_index, node);
            Ok(list)
        })?;
        Ok(Self { sections })
    }

    /// Every node with its path, pre-order
    #[must_use]
    pub fn walk(&self) -> Vec<(SectionPath, Arc<Section>)> {
        let mut out = Vec::new();
        for (index, section) in self.sections.iter().enumerate() {
            walk_node(SectionPath::top(index), section, &mut out);
        }
        out
    }
}

fn walk_node(
    path: SectionPath,
    section: &Arc<Section>,
    out: &mut Vec<(SectionPath, Arc<Section>)>,
) {
    out.push((path.clone(), Arc::clone(section)));
    if let SectionBody::TabContainer { tabs } = &section.body {
        for (ti, tab) in tabs.iter().enumerate() {
            for (si, child) in tab.sections.iter().enumerate() {
                walk_node(path.nested(ti, si), child, out);
            }
        }
    }
}

/// Rebuild `list` with `leaf` applied to the list that holds the target
///
/// `index` is the node position in `list`. While hops remain, that node must
/// be a tab container and the walk descends into it; the container and its
/// ancestors are copied, their siblings shared.
fn rebuild<F>(
    list: &SectionList,
    target: &SectionPath,
    index: usize,
    hops: &[TabHop],
    leaf: F,
) -> Result<SectionList, SectionError>
where
    F: FnOnce(&SectionList, usize) -> Result<SectionList, SectionError>,
{
    let Some((hop, rest)) = hops.split_first() else {
        return leaf(list, index);
    };

    let not_found = || SectionError::path_not_found(target);
    let container = list.get(index).ok_or_else(not_found)?;
    let SectionBody::TabContainer { tabs } = &container.body else {
        return Err(not_found());
    };
    let tab = tabs.get(hop.tab).ok_or_else(not_found)?;

    let nested = rebuild(&tab.sections, target, hop.section, rest, leaf)?;

    let mut new_tabs = tabs.clone();
    new_tabs[hop.tab] = Tab {
        label: tab.label.clone(),
        sections: nested,
    };
    let new_container = Section {
        id: container.id.clone(),
        body: SectionBody::TabContainer { tabs: new_tabs },
    };

    let mut list = list.clone();
    list.set(index, Arc::new(new_container));
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilingual::{BilingualText, Locale};
    use crate::edit::TextField;
    use crate::registry::VariantRegistry;
    use crate::section::SectionKind;

    fn text(id: &str) -> Section {
        Section::with_id(
            id,
            SectionBody::Text {
                title: BilingualText::new(id, id),
                description: BilingualText::default(),
            },
        )
    }

    fn tabs(id: &str, children: Vec<Section>) -> Section {
        Section::with_id(
            id,
            SectionBody::TabContainer {
                tabs: vec![Tab::new(BilingualText::new("t", "t"), children)],
            },
        )
    }

    fn sample() -> SectionTree {
        SectionTree::from_sections([
            text("a"),
            tabs("b", vec![text("b0"), text("b1")]),
            text("c"),
        ])
    }

    #[test]
    fn get_resolves_nested() {
        let tree = sample();
        let node = tree.get(&SectionPath::top(1).nested(0, 1)).unwrap();
        assert_eq!(node.id.as_str(), "b1");
        assert!(tree.get(&SectionPath::top(0).nested(0, 0)).is_none());
    }

    #[test]
    fn insert_top_level_and_append() {
        let tree = sample();
        let tree = tree.insert(&SectionPath::top(3), text("d")).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.sections()[3].id.as_str(), "d");
    }

    #[test]
    fn insert_nested() {
        let tree = sample()
            .insert(&SectionPath::top(1).nested(0, 0), text("new"))
            .unwrap();
        let node = tree.get(&SectionPath::top(1).nested(0, 0)).unwrap();
        assert_eq!(node.id.as_str(), "new");
        assert_eq!(
            tree.get(&SectionPath::top(1).nested(0, 2)).unwrap().id.as_str(),
            "b1"
        );
    }

    #[test]
    fn insert_through_text_section_fails() {
        let result = sample().insert(&SectionPath::top(0).nested(0, 0), text("x"));
        assert!(matches!(result, Err(SectionError::PathNotFound { .. })));
    }

    #[test]
    fn insert_past_end_fails() {
        let result = sample().insert(&SectionPath::top(9), text("x"));
        assert!(matches!(result, Err(SectionError::PathNotFound { .. })));
    }

    #[test]
    fn remove_discards_subtree() {
        let tree = sample().remove_at(&SectionPath::top(1)).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.walk().iter().all(|(_, n)| !n.id.as_str().starts_with('b')));
    }

    #[test]
    fn remove_twice_fails() {
        let tree = sample();
        let path = SectionPath::top(1).nested(0, 1);
        let once = tree.remove_at(&path).unwrap();
        assert!(matches!(
            once.remove_at(&path),
            Err(SectionError::PathNotFound { .. })
        ));
    }

    #[test]
    fn operations_leave_previous_tree_untouched() {
        let before = sample();
        let snapshot = before.clone();
        let _ = before.remove_at(&SectionPath::top(0)).unwrap();
        let _ = before
            .update_field(
                &SectionPath::top(1).nested(0, 0),
                FieldEdit::set_text(TextField::Title, Locale::Primary, "changed"),
            )
            .unwrap();
        assert_eq!(before, snapshot);
    }

    #[test]
    fn update_shares_unrelated_nodes() {
        let before = sample();
        let after = before
            .update_field(
                &SectionPath::top(1).nested(0, 0),
                FieldEdit::set_text(TextField::Title, Locale::Secondary, "x"),
            )
            .unwrap();

        assert!(Arc::ptr_eq(&before.sections()[0], &after.sections()[0]));
        assert!(Arc::ptr_eq(&before.sections()[2], &after.sections()[2]));
        assert!(!Arc::ptr_eq(&before.sections()[1], &after.sections()[1]));

        let sibling = SectionPath::top(1).nested(0, 1);
        assert!(Arc::ptr_eq(
            before.get(&sibling).unwrap(),
            after.get(&sibling).unwrap()
        ));
    }

    #[test]
    fn update_keeps_id() {
        let tree = sample()
            .update_at(&SectionPath::top(0), |section| {
                *section = VariantRegistry::new().create(SectionKind::Image);
                Ok(())
            })
            .unwrap();
        let node = tree.get(&SectionPath::top(0)).unwrap();
        assert_eq!(node.id.as_str(), "a");
        assert_eq!(node.kind(), SectionKind::Image);
    }

    #[test]
    fn move_within_container() {
        let tree = sample().move_to(&SectionPath::top(0), 2).unwrap();
        let ids: Vec<_> = tree.sections().iter().map(|s| s.id.as_str().to_string()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert!(sample().move_to(&SectionPath::top(0), 3).is_err());
    }

    #[test]
    fn walk_is_pre_order() {
        let ids: Vec<_> = sample()
            .walk()
            .into_iter()
            .map(|(path, node)| format!("{path}={}", node.id))
            .collect();
        assert_eq!(ids, ["0=a", "1=b", "1/0:0=b0", "1/0:1=b1", "2=c"]);
    }

    #[test]
    fn nesting_depth_counts_tab_levels() {
        let tree = SectionTree::from_sections([tabs("x", vec![tabs("y", vec![text("z")])])]);
        assert_eq!(tree.nesting_depth(), 2);
        assert_eq!(sample().nesting_depth(), 1);
    }
}
