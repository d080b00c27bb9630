//! Section paths for addressing nodes at any depth
//!
//! A [`SectionPath`] names a top-level index followed by zero or more
//! `(tab, section)` hops, one per nested tab container.
//!
//! # Examples
//! - `2` → top-level section 2
//! - `2/1:0` → top-level section 2, tab 1, section 0
//! - `0/0:3/2:1` → two levels of tab nesting

use crate::error::SectionError;
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One descent into a tab container: tab index, then section index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TabHop {
    pub tab: usize,
    pub section: usize,
}

/// Path to a section within a tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionPath {
    top: usize,
    hops: SmallVec<[TabHop; 2]>,
}

impl SectionPath {
    /// Path to a top-level section
    #[inline]
    #[must_use]
    pub fn top(index: usize) -> Self {
        Self {
            top: index,
            hops: SmallVec::new(),
        }
    }

    /// Descend into tab `tab` of the addressed container, at section `section`
    #[inline]
    #[must_use]
    pub fn nested(&self, tab: usize, section: usize) -> Self {
        let mut new = self.clone();
        new.hops.push(TabHop { tab, section });
        new
    }

    /// Top-level index
    #[inline]
    #[must_use]
    pub fn top_index(&self) -> usize {
        self.top
    }

    /// Hops below the top level
    #[inline]
    #[must_use]
    pub fn hops(&self) -> &[TabHop] {
        &self.hops
    }

    /// Number of tab containers crossed
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.hops.len()
    }

    /// Index of the addressed node within its own list
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.hops.last().map_or(self.top, |hop| hop.section)
    }

    /// Same container, different index
    #[must_use]
    pub fn with_index(&self, index: usize) -> Self {
        let mut new = self.clone();
        match new.hops.last_mut() {
            Some(hop) => hop.section = index,
            None => new.top = index,
        }
        new
    }

    /// Path of the enclosing tab container (if nested)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.hops.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.hops.pop();
        Some(parent)
    }

    /// Check if this path is a strict ancestor of another
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.top == other.top
            && self.hops.len() < other.hops.len()
            && self.hops[..] == other.hops[..self.hops.len()]
    }
}

impl Display for SectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.top)?;
        for hop in &self.hops {
            write!(f, "/{}:{}", hop.tab, hop.section)?;
        }
        Ok(())
    }
}

impl FromStr for SectionPath {
    type Err = SectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SectionError::InvalidPath(s.to_string());
        let mut parts = s.split('/');
        let top = parts
            .next()
            .and_then(|seg| seg.parse::<usize>().ok())
            .ok_or_else(invalid)?;

        let mut path = Self::top(top);
        for seg in parts {
            let (tab, section) = seg.split_once(':').ok_or_else(invalid)?;
            let tab = tab.parse::<usize>().map_err(|_| invalid())?;
            let section = section.parse::<usize>().map_err(|_| invalid())?;
            path.hops.push(TabHop { tab, section });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_path() {
        let path = SectionPath::top(2);
        assert_eq!(path.top_index(), 2);
        assert_eq!(path.index(), 2);
        assert_eq!(path.depth(), 0);
        assert!(path.parent().is_none());
    }

    #[test]
    fn nested_path_index_is_last_hop() {
        let path = SectionPath::top(2).nested(0, 3);
        assert_eq!(path.index(), 3);
        assert_eq!(path.depth(), 1);
        assert_eq!(path.parent(), Some(SectionPath::top(2)));
    }

    #[test]
    fn with_index_keeps_container() {
        let path = SectionPath::top(1).nested(0, 4).with_index(0);
        assert_eq!(path, SectionPath::top(1).nested(0, 0));
        assert_eq!(SectionPath::top(1).with_index(5), SectionPath::top(5));
    }

    #[test]
    fn ancestor_check() {
        let outer = SectionPath::top(1);
        let inner = outer.nested(0, 2);
        assert!(outer.is_ancestor_of(&inner));
        assert!(!inner.is_ancestor_of(&outer));
        assert!(!outer.is_ancestor_of(&outer));
        assert!(!SectionPath::top(0).is_ancestor_of(&inner));
    }

    #[test]
    fn display_and_parse() {
        let path = SectionPath::top(0).nested(0, 3).nested(2, 1);
        assert_eq!(path.to_string(), "0/0:3/2:1");
        assert_eq!("0/0:3/2:1".parse::<SectionPath>().unwrap(), path);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "a", "1/2", "1/2:x", "1//0:0"] {
            assert!(
                matches!(bad.parse::<SectionPath>(), Err(SectionError::InvalidPath(_))),
                "{bad} should not parse"
            );
        }
    }
}
