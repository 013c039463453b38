//! Record hierarchy: configuration, key index and read-only queries.
//!
//! Construction lives in [`crate::domain::builder`].

use generational_arena::Index;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::arena::{NodeRef, TreeArena};
use crate::domain::record::{FieldValue, Fields};

pub const DEFAULT_KEY_FIELD: &str = "id";
pub const DEFAULT_PARENT_KEY_FIELD: &str = "parent_id";
pub const DEFAULT_PREFIX: &str = "- ";

/// Which record fields carry identity and hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub key_field: String,
    pub parent_key_field: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            key_field: DEFAULT_KEY_FIELD.to_string(),
            parent_key_field: DEFAULT_PARENT_KEY_FIELD.to_string(),
        }
    }
}

impl TreeConfig {
    pub fn new(key_field: impl Into<String>, parent_key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            parent_key_field: parent_key_field.into(),
        }
    }
}

/// Options for flattened listings.
///
/// `since` and `till` are carried for callers that set them but do not
/// filter the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Indentation unit, repeated `level - 1` times before each label
    pub prefix: Option<String>,
    pub since: Option<usize>,
    pub till: Option<usize>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            prefix: Some(DEFAULT_PREFIX.to_string()),
            since: None,
            till: None,
        }
    }
}

impl ListOptions {
    /// No indentation; the default for value collection.
    pub fn plain() -> Self {
        Self {
            prefix: None,
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_since(mut self, since: usize) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_till(mut self, till: usize) -> Self {
        self.till = Some(till);
        self
    }

    fn indent(&self, level: usize, label: String) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => {
                format!("{}{}", prefix.repeat(level.saturating_sub(1)), label)
            }
            _ => label,
        }
    }
}

/// Hierarchy built from flat parent-keyed records.
///
/// Every record becomes one node, indexed by its primary key in insertion
/// order. Records whose parent key does not resolve hang off a synthetic
/// root at level 0.
#[derive(Debug)]
pub struct Tree<R> {
    pub(crate) config: TreeConfig,
    pub(crate) arena: TreeArena<R>,
    pub(crate) nodes: IndexMap<FieldValue, Index>,
}

impl<R> Default for Tree<R> {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl<R> Tree<R> {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            arena: TreeArena::new(),
            nodes: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The sentinel root; it has no record and level 0.
    pub fn root(&self) -> NodeRef<'_, R> {
        self.arena.root_ref()
    }

    /// Number of record nodes (the root is not counted).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All record nodes in key insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_, R>> {
        self.nodes.values().filter_map(|&idx| self.node(idx))
    }

    /// All record nodes in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_, R>> {
        self.root().descendants()
    }

    /// Node for a primary key; `"7"` and `7` name the same key.
    pub fn find_by_pk(&self, pk: &FieldValue) -> Option<NodeRef<'_, R>> {
        self.nodes
            .get(&pk.clone().into_key())
            .and_then(|&idx| self.node(idx))
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        self.arena.depth()
    }

    /// Nodes without children, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeRef<'_, R>> {
        self.iter().filter(|n| !n.has_children()).collect()
    }

    /// All nodes at exactly depth `level`, in depth-first child order.
    ///
    /// Level 0 and levels deeper than the tree yield nothing.
    #[instrument(level = "debug", skip(self))]
    pub fn level_roots(&self, level: usize) -> Vec<NodeRef<'_, R>> {
        let mut found = Vec::new();
        if level == 0 {
            return found;
        }

        let mut stack = vec![(self.arena.root(), 0usize)];
        while let Some((idx, current)) = stack.pop() {
            let Some(node) = self.node(idx) else {
                continue;
            };
            if current + 1 == level {
                found.extend(node.children());
            } else {
                let children: Vec<_> = node.children().collect();
                for child in children.into_iter().rev() {
                    stack.push((child.index(), current + 1));
                }
            }
        }
        found
    }

    pub(crate) fn node(&self, idx: Index) -> Option<NodeRef<'_, R>> {
        self.arena.node_ref(idx)
    }
}

impl<R: Fields> Tree<R> {
    pub fn find_by_key_field(&self, record: &R) -> Option<NodeRef<'_, R>> {
        record
            .field(&self.config.key_field)
            .and_then(|pk| self.find_by_pk(&pk))
    }

    /// Values of `value_field` for every node below the root.
    pub fn values(&self, value_field: &str, options: &ListOptions) -> Vec<FieldValue> {
        self.values_by_node(&self.root(), value_field, options)
    }

    /// Values of `value_field` for every node below `node`, in pre-order.
    pub fn values_by_node(
        &self,
        node: &NodeRef<'_, R>,
        value_field: &str,
        options: &ListOptions,
    ) -> Vec<FieldValue> {
        self.collect(node.index(), value_field, value_field, options)
            .into_keys()
            .collect()
    }

    /// Flattened `value → label` listing of the whole tree.
    pub fn list(
        &self,
        value_field: &str,
        label_field: &str,
        options: &ListOptions,
    ) -> IndexMap<FieldValue, String> {
        self.list_by_node(&self.root(), value_field, label_field, options)
    }

    /// Flattened `value → label` listing of the subtree below `node`.
    pub fn list_by_node(
        &self,
        node: &NodeRef<'_, R>,
        value_field: &str,
        label_field: &str,
        options: &ListOptions,
    ) -> IndexMap<FieldValue, String> {
        self.collect(node.index(), value_field, label_field, options)
    }

    #[instrument(level = "debug", skip(self, options))]
    fn collect(
        &self,
        start: Index,
        value_field: &str,
        label_field: &str,
        options: &ListOptions,
    ) -> IndexMap<FieldValue, String> {
        if options.since.is_some() || options.till.is_some() {
            debug!(since = ?options.since, till = ?options.till, "range options are not applied");
        }

        let mut list = IndexMap::new();
        for (_, level, node) in self.arena.descendants(start) {
            let Some(record) = node.record.as_ref() else {
                continue;
            };
            let Some(value) = record.field(value_field) else {
                trace!(key = ?node.key, value_field, "record without value field skipped");
                continue;
            };
            let label = record
                .field(label_field)
                .map(|l| l.to_string())
                .unwrap_or_default();
            // later entries overwrite earlier ones but keep the first position
            list.insert(value.into_key(), options.indent(level, label));
        }
        list
    }
}
