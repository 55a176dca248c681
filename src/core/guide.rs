//! The guide document: one tree of node payloads plus its uid allocator,
//! uid index and selection cursor.
//!
//! Every structural edit goes through [`Guide`] so the uid index can never
//! drift from the tree: insertion registers the new handle before returning
//! it, and subtree deletion unregisters every uid it removes.

use crate::core::config::{LoadOptions, StoreOptions};
use crate::core::error::{GuideError, Result};
use crate::core::header::ArchBits;
use crate::core::index::UidIndex;
use crate::core::node::NodeData;
use crate::core::tree::{Children, NodeId, Preorder, Tree};
use crate::core::uid::UidAllocator;
use crate::core::{decode, encode, io};
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub struct Guide {
    tree: Tree<NodeData>,
    uids: UidAllocator,
    index: UidIndex,
    selected: Option<NodeId>,
}

impl Guide {
    /// Create an empty guide holding a single root node with empty content
    pub fn create() -> Result<Self> {
        let mut uids = UidAllocator::new();
        let root = NodeData::new(uids.next()?);
        Self::with_root(root, uids)
    }

    /// Create a guide whose root starts with the given title and body
    pub fn create_with_root(title: impl Into<String>, text: &str) -> Result<Self> {
        let mut uids = UidAllocator::new();
        let mut root = NodeData::new(uids.next()?);
        root.set_title(title);
        root.set_text(text);
        Self::with_root(root, uids)
    }

    pub(crate) fn with_root(root: NodeData, uids: UidAllocator) -> Result<Self> {
        let uid = root.uid();
        let tree = Tree::with_root(root);
        let mut index = UidIndex::new();
        index.register(uid, tree.root())?;
        Ok(Guide {
            tree,
            uids,
            index,
            selected: None,
        })
    }

    /// Load a guide written on a machine with `origin` pointer width
    pub fn load<P: AsRef<Path>>(path: P, origin: ArchBits) -> Result<Self> {
        io::load(path.as_ref(), &LoadOptions { origin_arch: origin })
    }

    pub fn load_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        io::load(path.as_ref(), options)
    }

    /// Decode an in-memory file image
    pub fn decode(bytes: &[u8], origin: ArchBits) -> Result<Self> {
        decode::decode(bytes, origin)
    }

    /// Write the guide with default options (8-byte references, atomic replace)
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        io::store(path.as_ref(), self, &StoreOptions::default())
    }

    pub fn store_with<P: AsRef<Path>>(&self, path: P, options: &StoreOptions) -> Result<()> {
        io::store(path.as_ref(), self, options)
    }

    /// Encode to a complete file image
    pub fn encode(&self, ref_width: ArchBits) -> Result<Vec<u8>> {
        encode::encode(self, ref_width)
    }

    /// Tear the guide down, releasing every payload exactly once
    pub fn destroy(self) {
        let Guide {
            tree, mut index, ..
        } = self;
        let mut released = 0usize;
        tree.delete_tree(|_, data| {
            index.unregister(data.uid());
            released += 1;
        });
        debug!("Destroyed guide with {} nodes", released);
    }

    // ---- payloads ----

    /// Create a detached payload with empty content and a fresh uid
    pub fn new_node(&mut self) -> Result<NodeData> {
        Ok(NodeData::new(self.uids.next()?))
    }

    /// Create a detached payload with the given content and a fresh uid
    pub fn new_node_with(&mut self, title: impl Into<String>, text: &str) -> Result<NodeData> {
        let mut data = self.new_node()?;
        data.set_title(title);
        data.set_text(text);
        Ok(data)
    }

    /// Copy a payload under a fresh uid
    pub fn clone_node(&mut self, source: &NodeData) -> Result<NodeData> {
        Ok(source.duplicate(self.uids.next()?))
    }

    /// Copy the payload attached to `node` under a fresh uid
    pub fn duplicate_node(&mut self, node: NodeId) -> Result<NodeData> {
        let uid = self.uids.peek().ok_or(GuideError::UidExhausted)?;
        let copy = self
            .tree
            .get(node)
            .ok_or(GuideError::InvalidNode(node))?
            .duplicate(uid);
        self.uids.next()?;
        Ok(copy)
    }

    pub(crate) fn allocate_uid(&mut self) -> Result<u32> {
        self.uids.next()
    }

    // ---- structure ----

    /// Attach `data` under `parent`, after `after` or as the last child
    pub fn add_child(
        &mut self,
        parent: NodeId,
        data: NodeData,
        after: Option<NodeId>,
    ) -> Result<NodeId> {
        self.check_uid_free(&data)?;
        let uid = data.uid();
        let node = self.tree.add_child(parent, data, after)?;
        self.index.register(uid, node)?;
        Ok(node)
    }

    pub fn add_sibling_before(&mut self, node: NodeId, data: NodeData) -> Result<NodeId> {
        self.check_uid_free(&data)?;
        let uid = data.uid();
        let new = self.tree.add_sibling_before(node, data)?;
        self.index.register(uid, new)?;
        Ok(new)
    }

    pub fn add_sibling_after(&mut self, node: NodeId, data: NodeData) -> Result<NodeId> {
        self.check_uid_free(&data)?;
        let uid = data.uid();
        let new = self.tree.add_sibling_after(node, data)?;
        self.index.register(uid, new)?;
        Ok(new)
    }

    /// Remove `node` and all its descendants, returning how many were removed
    ///
    /// Clears the selection when it pointed into the removed subtree.
    pub fn delete_subtree(&mut self, node: NodeId) -> Result<usize> {
        let index = &mut self.index;
        let removed = self.tree.delete_subtree(node, |_, data| {
            index.unregister(data.uid());
        })?;

        if let Some(selected) = self.selected {
            if !self.tree.contains(selected) {
                self.selected = None;
            }
        }
        debug!("Deleted subtree {} ({} nodes)", node, removed);
        Ok(removed)
    }

    fn check_uid_free(&self, data: &NodeData) -> Result<()> {
        if self.index.contains(data.uid()) {
            return Err(GuideError::DuplicateUid(data.uid()));
        }
        Ok(())
    }

    // ---- navigation ----

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn node(&self, node: NodeId) -> Option<&NodeData> {
        self.tree.get(node)
    }

    /// Mutable access to a payload's content
    ///
    /// The uid has no setter, so edits here cannot desynchronize the index.
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.tree.get_mut(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    pub fn children(&self, node: NodeId) -> Children<'_, NodeData> {
        self.tree.children(node)
    }

    pub fn preorder(&self) -> Preorder<'_, NodeData> {
        self.tree.preorder()
    }

    pub fn node_by_uid(&self, uid: u32) -> Option<NodeId> {
        self.index.lookup(uid)
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &Tree<NodeData> {
        &self.tree
    }

    // ---- selection and counters ----

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn set_selected(&mut self, node: Option<NodeId>) -> Result<()> {
        if let Some(node) = node {
            if !self.tree.contains(node) {
                return Err(GuideError::InvalidNode(node));
            }
        }
        self.selected = node;
        Ok(())
    }

    /// Last uid handed out, as persisted in the file header
    pub fn uid_counter(&self) -> u32 {
        self.uids.counter()
    }

    /// Uid the next created payload will receive
    pub fn next_uid_preview(&self) -> Option<u32> {
        self.uids.peek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_has_empty_root() {
        let guide = Guide::create().unwrap();
        let root = guide.root();
        let data = guide.node(root).unwrap();
        assert_eq!(data.title, "");
        assert!(data.text.is_empty());
        assert_eq!(data.uid(), 1);
        assert_eq!(guide.node_by_uid(1), Some(root));
        assert_eq!(guide.parent(root), None);
        assert_eq!(guide.selected(), None);
        assert_eq!(guide.len(), 1);
    }

    #[test]
    fn test_create_with_root_content() {
        let mut guide = Guide::create_with_root("The Beginning", "Text of the root node").unwrap();
        let root = guide.root();
        let data = guide.node(root).unwrap();
        assert_eq!(data.title, "The Beginning");
        assert_eq!(data.text, b"Text of the root node");
        assert_eq!(data.uid(), 1);
        assert_eq!(guide.node_by_uid(1), Some(root));

        let child = guide.new_node().unwrap();
        assert_eq!(child.uid(), 2);
    }

    #[test]
    fn test_insertions_are_indexed() {
        let mut guide = Guide::create().unwrap();
        let root = guide.root();

        let a = guide.new_node_with("a", "").unwrap();
        let a_uid = a.uid();
        let a = guide.add_child(root, a, None).unwrap();

        let before = guide.new_node_with("before", "").unwrap();
        let before_uid = before.uid();
        let before = guide.add_sibling_before(a, before).unwrap();

        let after = guide.new_node_with("after", "").unwrap();
        let after_uid = after.uid();
        let after = guide.add_sibling_after(a, after).unwrap();

        assert_eq!(guide.node_by_uid(a_uid), Some(a));
        assert_eq!(guide.node_by_uid(before_uid), Some(before));
        assert_eq!(guide.node_by_uid(after_uid), Some(after));
        assert_eq!(guide.children(root).collect::<Vec<_>>(), vec![before, a, after]);
    }

    #[test]
    fn test_delete_unregisters_whole_subtree() {
        let mut guide = Guide::create().unwrap();
        let root = guide.root();
        let a = guide.new_node().unwrap();
        let a = guide.add_child(root, a, None).unwrap();
        let a1 = guide.new_node().unwrap();
        let a1_uid = a1.uid();
        let a1 = guide.add_child(a, a1, None).unwrap();
        let a_uid = guide.node(a).unwrap().uid();

        guide.set_selected(Some(a1)).unwrap();
        assert_eq!(guide.delete_subtree(a).unwrap(), 2);

        assert_eq!(guide.node_by_uid(a_uid), None);
        assert_eq!(guide.node_by_uid(a1_uid), None);
        assert_eq!(guide.selected(), None);
        assert_eq!(guide.len(), 1);
    }

    #[test]
    fn test_uids_not_reused_after_delete() {
        let mut guide = Guide::create().unwrap();
        let root = guide.root();
        let a = guide.new_node().unwrap();
        let a_uid = a.uid();
        let a = guide.add_child(root, a, None).unwrap();
        guide.delete_subtree(a).unwrap();

        let b = guide.new_node().unwrap();
        assert!(b.uid() > a_uid);
    }

    #[test]
    fn test_clone_gets_fresh_uid() {
        let mut guide = Guide::create().unwrap();
        let root = guide.root();
        guide.node_mut(root).unwrap().set_title("Root");

        let copy = guide.duplicate_node(root).unwrap();
        assert_eq!(copy.title, "Root");
        assert_ne!(copy.uid(), 1);

        let second = guide.clone_node(&copy).unwrap();
        assert_eq!(second.title, "Root");
        assert_ne!(second.uid(), copy.uid());
    }

    #[test]
    fn test_foreign_duplicate_uid_rejected() {
        let mut other = Guide::create().unwrap();
        let foreign = other.new_node().unwrap();

        let mut guide = Guide::create().unwrap();
        let root = guide.root();
        let own = guide.new_node().unwrap();
        guide.add_child(root, own, None).unwrap();

        // Both guides handed out uid 2.
        assert!(matches!(
            guide.add_child(root, foreign, None),
            Err(GuideError::DuplicateUid(2))
        ));
        assert_eq!(guide.len(), 2);
    }

    #[test]
    fn test_set_selected_validates_handle() {
        let mut guide = Guide::create().unwrap();
        let root = guide.root();
        let a = guide.new_node().unwrap();
        let a = guide.add_child(root, a, None).unwrap();
        guide.delete_subtree(a).unwrap();
        assert!(matches!(
            guide.set_selected(Some(a)),
            Err(GuideError::InvalidNode(_))
        ));
    }
}
