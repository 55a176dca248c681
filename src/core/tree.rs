//! Ordered n-ary tree backed by an arena
//!
//! Nodes live in a `Vec` of slots and link to each other by index. A handle
//! ([`NodeId`]) carries the slot index plus the slot generation at the time the
//! node was inserted, so a handle to a deleted node never resolves to whatever
//! node later reuses the slot.

use crate::core::error::{GuideError, Result};
use std::fmt;

/// Handle to a node in a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Arena slot index
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Links {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Links {
    fn detached(parent: Option<NodeId>) -> Self {
        Links {
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<(T, Links)>,
}

/// Arena-backed ordered tree with a single root
#[derive(Debug)]
pub struct Tree<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    root: NodeId,
    len: usize,
}

impl<T> Tree<T> {
    /// Create a tree whose root carries `data`
    pub fn with_root(data: T) -> Self {
        let root = NodeId {
            index: 0,
            generation: 0,
        };
        Tree {
            slots: vec![Slot {
                generation: 0,
                entry: Some((data, Links::detached(None))),
            }],
            free: Vec::new(),
            root,
            len: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.entry(id).map(|(data, _)| data)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.entry_mut(id).map(|(data, _)| data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.last_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.next_sibling)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.prev_sibling)
    }

    /// Iterate the direct children of `id` in sibling order
    pub fn children(&self, id: NodeId) -> Children<'_, T> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Iterate the whole tree in preorder, yielding `(node, depth)`
    pub fn preorder(&self) -> Preorder<'_, T> {
        Preorder {
            tree: self,
            top: self.root,
            next: Some((self.root, 0)),
        }
    }

    /// Iterate the subtree rooted at `id` in preorder
    pub fn preorder_from(&self, id: NodeId) -> Preorder<'_, T> {
        Preorder {
            tree: self,
            top: id,
            next: self.contains(id).then_some((id, 0)),
        }
    }

    /// Insert `data` as a child of `parent`
    ///
    /// With `after == None` the node becomes the last child; otherwise it is
    /// placed directly after the given child.
    pub fn add_child(&mut self, parent: NodeId, data: T, after: Option<NodeId>) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(GuideError::InvalidNode(parent));
        }
        let prev = match after {
            Some(after) => {
                if self.parent(after) != Some(parent) {
                    return Err(GuideError::NotAChild { parent, after });
                }
                Some(after)
            }
            None => self.last_child(parent),
        };
        Ok(self.link(parent, prev, data))
    }

    /// Insert `data` as the sibling directly before `node`
    pub fn add_sibling_before(&mut self, node: NodeId, data: T) -> Result<NodeId> {
        let parent = self.sibling_parent(node)?;
        let prev = self.prev_sibling(node);
        Ok(self.link(parent, prev, data))
    }

    /// Insert `data` as the sibling directly after `node`
    pub fn add_sibling_after(&mut self, node: NodeId, data: T) -> Result<NodeId> {
        let parent = self.sibling_parent(node)?;
        Ok(self.link(parent, Some(node), data))
    }

    /// Remove the subtree rooted at `node`
    ///
    /// Every payload in the subtree is handed to `on_delete` exactly once,
    /// descendants before their ancestors. Returns the number of removed nodes.
    pub fn delete_subtree<F>(&mut self, node: NodeId, mut on_delete: F) -> Result<usize>
    where
        F: FnMut(NodeId, T),
    {
        if !self.contains(node) {
            return Err(GuideError::InvalidNode(node));
        }
        if node == self.root {
            return Err(GuideError::CannotDeleteRoot);
        }

        let doomed: Vec<NodeId> = self.preorder_from(node).map(|(id, _)| id).collect();
        self.unlink(node);

        for &id in doomed.iter().rev() {
            if let Some(data) = self.release(id) {
                on_delete(id, data);
            }
        }
        Ok(doomed.len())
    }

    /// Tear the tree down, handing every payload to `on_delete`
    pub fn delete_tree<F>(mut self, mut on_delete: F)
    where
        F: FnMut(NodeId, T),
    {
        let all: Vec<NodeId> = self.preorder().map(|(id, _)| id).collect();
        for &id in all.iter().rev() {
            if let Some(data) = self.release(id) {
                on_delete(id, data);
            }
        }
    }

    fn sibling_parent(&self, node: NodeId) -> Result<NodeId> {
        if !self.contains(node) {
            return Err(GuideError::InvalidNode(node));
        }
        self.parent(node).ok_or(GuideError::RootHasNoSiblings)
    }

    /// Allocate a slot for `data` and splice it under `parent` after `prev`
    /// (or at the front when `prev` is `None`).
    fn link(&mut self, parent: NodeId, prev: Option<NodeId>, data: T) -> NodeId {
        let next = match prev {
            Some(prev) => self.next_sibling(prev),
            None => self.first_child(parent),
        };

        let mut links = Links::detached(Some(parent));
        links.prev_sibling = prev;
        links.next_sibling = next;
        let id = self.alloc(data, links);

        match prev {
            Some(prev) => self.links_mut(prev).next_sibling = Some(id),
            None => self.links_mut(parent).first_child = Some(id),
        }
        match next {
            Some(next) => self.links_mut(next).prev_sibling = Some(id),
            None => self.links_mut(parent).last_child = Some(id),
        }
        id
    }

    fn unlink(&mut self, node: NodeId) {
        let (parent, prev, next) = match self.links(node) {
            Some(l) => (l.parent, l.prev_sibling, l.next_sibling),
            None => return,
        };
        let Some(parent) = parent else { return };

        match prev {
            Some(prev) => self.links_mut(prev).next_sibling = next,
            None => self.links_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.links_mut(next).prev_sibling = prev,
            None => self.links_mut(parent).last_child = prev,
        }
    }

    fn alloc(&mut self, data: T, links: Links) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some((data, links));
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some((data, links)),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn release(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let (data, _) = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(data)
    }

    fn entry(&self, id: NodeId) -> Option<&(T, Links)> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut (T, Links)> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    fn links(&self, id: NodeId) -> Option<&Links> {
        self.entry(id).map(|(_, links)| links)
    }

    // Only called on handles already known to be live.
    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        match self.entry_mut(id) {
            Some((_, links)) => links,
            None => unreachable!("stale link {id} inside tree"),
        }
    }
}

/// Iterator over the direct children of a node
pub struct Children<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Children<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Preorder walk without an explicit stack: descend to the first child,
/// otherwise climb until a next sibling exists below `top`.
pub struct Preorder<'a, T> {
    tree: &'a Tree<T>,
    top: NodeId,
    next: Option<(NodeId, usize)>,
}

impl<'a, T> Iterator for Preorder<'a, T> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<(NodeId, usize)> {
        let (current, depth) = self.next?;

        self.next = if let Some(child) = self.tree.first_child(current) {
            Some((child, depth + 1))
        } else {
            let mut node = current;
            let mut depth = depth;
            loop {
                if node == self.top {
                    break None;
                }
                if let Some(sibling) = self.tree.next_sibling(node) {
                    break Some((sibling, depth));
                }
                match self.tree.parent(node) {
                    Some(parent) => {
                        node = parent;
                        depth -= 1;
                    }
                    None => break None,
                }
            }
        };

        Some((current, depth))
    }
}
