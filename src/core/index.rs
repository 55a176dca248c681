//! Uid -> node handle index
//!
//! Mirrors the tree: every payload attached to the tree has exactly one entry
//! here. [`Guide`](crate::Guide) keeps the two in step; this type only stores
//! the mapping.

use crate::core::error::{GuideError, Result};
use crate::core::tree::NodeId;
use ahash::AHashMap;
use std::collections::hash_map::Entry;

#[derive(Debug, Default)]
pub struct UidIndex {
    map: AHashMap<u32, NodeId>,
}

impl UidIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `uid`, refusing to alias an existing entry
    pub fn register(&mut self, uid: u32, node: NodeId) -> Result<()> {
        match self.map.entry(uid) {
            Entry::Occupied(_) => Err(GuideError::DuplicateUid(uid)),
            Entry::Vacant(slot) => {
                slot.insert(node);
                Ok(())
            }
        }
    }

    pub fn unregister(&mut self, uid: u32) -> Option<NodeId> {
        self.map.remove(&uid)
    }

    pub fn lookup(&self, uid: u32) -> Option<NodeId> {
        self.map.get(&uid).copied()
    }

    pub fn contains(&self, uid: u32) -> bool {
        self.map.contains_key(&uid)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::Tree;

    #[test]
    fn test_register_lookup_unregister() {
        let tree = Tree::with_root(());
        let root = tree.root();

        let mut index = UidIndex::new();
        index.register(7, root).unwrap();
        assert_eq!(index.lookup(7), Some(root));
        assert!(matches!(index.register(7, root), Err(GuideError::DuplicateUid(7))));

        assert_eq!(index.unregister(7), Some(root));
        assert_eq!(index.lookup(7), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_rejected_register_keeps_first_mapping() {
        let mut tree = Tree::with_root(());
        let root = tree.root();
        let other = tree.add_child(root, (), None).unwrap();

        let mut index = UidIndex::new();
        index.register(3, root).unwrap();
        assert!(matches!(index.register(3, other), Err(GuideError::DuplicateUid(3))));
        assert_eq!(index.lookup(3), Some(root));
        assert_eq!(index.len(), 1);
    }
}
