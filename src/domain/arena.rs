use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::record::{FieldValue, Fields};

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode<R> {
    /// Primary key of the wrapped record, None for the sentinel root
    pub key: Option<FieldValue>,
    /// Wrapped source record, None for the sentinel root
    pub record: Option<R>,
    /// Index of parent node in the arena, None for the sentinel root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in link order
    pub children: Vec<Index>,
}

/// Arena storage with a synthetic sentinel root.
///
/// Parent links are plain indices, so removing a node never leaves a dangling
/// reference: a stale index simply resolves to `None`.
#[derive(Debug)]
pub struct TreeArena<R> {
    arena: Arena<TreeNode<R>>,
    root: Index,
}

impl<R> Default for TreeArena<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TreeArena<R> {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            key: None,
            record: None,
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    /// Stores a record as a detached node. Linking is the caller's job.
    #[instrument(level = "trace", skip(self, record))]
    pub fn insert_node(&mut self, key: FieldValue, record: R) -> Index {
        self.arena.insert(TreeNode {
            key: Some(key),
            record: Some(record),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Detaches a node from its parent and drops it from the arena.
    ///
    /// Its children keep their stale parent index until they are re-bound.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_node(&mut self, idx: Index) -> Option<TreeNode<R>> {
        if idx == self.root {
            return None;
        }
        self.detach(idx);
        self.arena.remove(idx)
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode<R>> {
        self.arena.get(idx)
    }

    /// Moves `child` under `parent`, appending it to the end of the parent's children.
    #[instrument(level = "trace", skip(self))]
    pub fn bind_parent(&mut self, child: Index, parent: Index) {
        self.detach(child);
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(child);
        }
    }

    /// Drops every parent and child link, leaving all nodes detached.
    pub fn clear_links(&mut self) {
        for (_, node) in self.arena.iter_mut() {
            node.parent = None;
            node.children.clear();
        }
    }

    fn detach(&mut self, child: Index) {
        let old_parent = self.arena.get(child).and_then(|n| n.parent);
        if let Some(old) = old_parent {
            if let Some(parent_node) = self.arena.get_mut(old) {
                parent_node.children.retain(|&c| c != child);
            }
        }
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = None;
        }
    }

    /// Depth of a node: 0 for the root, parent level + 1 otherwise.
    ///
    /// Walks parent links iteratively; the builder never links a cycle.
    pub fn level(&self, idx: Index) -> usize {
        let mut level = 0;
        let mut current = self.arena.get(idx).and_then(|n| n.parent);
        while let Some(parent_idx) = current {
            level += 1;
            current = self.arena.get(parent_idx).and_then(|n| n.parent);
        }
        level
    }

    /// Pre-order walk over the subtree below `start` (start excluded).
    pub fn descendants(&self, start: Index) -> TreeIterator<'_, R> {
        TreeIterator::new(self, start)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_, R> {
        PostOrderIterator::new(self)
    }

    /// Number of levels below the root; 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.descendants(self.root)
            .map(|(_, level, _)| level)
            .max()
            .unwrap_or(0)
    }

    pub fn root_ref(&self) -> NodeRef<'_, R> {
        NodeRef {
            arena: self,
            idx: self.root,
            node: &self.arena[self.root],
        }
    }

    /// Handle on a node for read-only navigation.
    pub fn node_ref(&self, idx: Index) -> Option<NodeRef<'_, R>> {
        self.arena.get(idx).map(|node| NodeRef {
            arena: self,
            idx,
            node,
        })
    }
}

pub struct TreeIterator<'a, R> {
    arena: &'a TreeArena<R>,
    stack: Vec<(Index, usize)>,
}

impl<'a, R> TreeIterator<'a, R> {
    fn new(arena: &'a TreeArena<R>, start: Index) -> Self {
        let mut stack = Vec::new();
        if let Some(node) = arena.get_node(start) {
            let child_level = arena.level(start) + 1;
            for &child in node.children.iter().rev() {
                stack.push((child, child_level));
            }
        }
        Self { arena, stack }
    }
}

impl<'a, R> Iterator for TreeIterator<'a, R> {
    type Item = (Index, usize, &'a TreeNode<R>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, level)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, level + 1));
                }
                return Some((current_idx, level, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, R> {
    arena: &'a TreeArena<R>,
    stack: Vec<(Index, bool)>,
}

impl<'a, R> PostOrderIterator<'a, R> {
    fn new(arena: &'a TreeArena<R>) -> Self {
        Self {
            arena,
            stack: vec![(arena.root(), false)],
        }
    }
}

impl<'a, R> Iterator for PostOrderIterator<'a, R> {
    type Item = (Index, &'a TreeNode<R>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

/// Borrowed view of one node.
pub struct NodeRef<'a, R> {
    arena: &'a TreeArena<R>,
    idx: Index,
    node: &'a TreeNode<R>,
}

impl<'a, R> Clone for NodeRef<'a, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, R> Copy for NodeRef<'a, R> {}

impl<'a, R> std::fmt::Debug for NodeRef<'a, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", &self.node.key)
            .field("level", &self.level())
            .field("children", &self.node.children.len())
            .finish()
    }
}

impl<'a, R> NodeRef<'a, R> {
    pub fn index(&self) -> Index {
        self.idx
    }

    pub fn key(&self) -> Option<&'a FieldValue> {
        self.node.key.as_ref()
    }

    pub fn record(&self) -> Option<&'a R> {
        self.node.record.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.idx == self.arena.root()
    }

    pub fn level(&self) -> usize {
        self.arena.level(self.idx)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, R>> {
        self.node.parent.and_then(|p| self.arena.node_ref(p))
    }

    pub fn has_children(&self) -> bool {
        !self.node.children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, R>> + 'a {
        let arena = self.arena;
        let node = self.node;
        node.children
            .iter()
            .filter_map(move |&c| arena.node_ref(c))
    }

    /// Pre-order walk over everything below this node.
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'a, R>> + 'a {
        let arena = self.arena;
        let start = self.idx;
        arena
            .descendants(start)
            .map(move |(idx, _, node)| NodeRef { arena, idx, node })
    }
}

impl<'a, R: Fields> NodeRef<'a, R> {
    /// Named field of the wrapped record; always None for the root.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.record().and_then(|r| r.field(name))
    }
}
