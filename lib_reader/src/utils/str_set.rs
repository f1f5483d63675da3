//! # String Set
//!
//! A thin wrapper around `HashSet<String>` that owns copies of everything
//! inserted into it.

use std::collections::hash_set;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrSet {
    inner: HashSet<String>,
}

impl StrSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a copy of `val`. Returns true if it was not already present.
    pub fn insert(&mut self, val: &str) -> bool {
        if self.inner.contains(val) {
            return false;
        }
        self.inner.insert(val.to_string())
    }

    /// Removes `val`. Returns true if it was present.
    pub fn remove(&mut self, val: &str) -> bool {
        self.inner.remove(val)
    }

    pub fn contains(&self, val: &str) -> bool {
        self.inner.contains(val)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Adds every string of `other` to this set.
    pub fn merge(&mut self, other: &StrSet) {
        for val in other.iter() {
            self.insert(val);
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for StrSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = StrSet::new();
        for val in iter {
            set.insert(val);
        }
        set
    }
}

impl IntoIterator for StrSet {
    type Item = String;
    type IntoIter = hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_new_entries_only() {
        let mut set = StrSet::new();
        assert!(set.insert("rrc00"));
        assert!(!set.insert("rrc00"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("rrc00"));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut set: StrSet = ["a", "b", "c"].into_iter().collect();
        assert!(set.remove("b"));
        assert!(!set.remove("b"));
        assert_eq!(set.len(), 2);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_merge_copies_source() {
        let mut dst: StrSet = ["a"].into_iter().collect();
        let src: StrSet = ["a", "b"].into_iter().collect();
        dst.merge(&src);
        assert_eq!(dst.len(), 2);
        assert!(dst.contains("b"));
        // the source is untouched
        assert_eq!(src.len(), 2);
    }
}
