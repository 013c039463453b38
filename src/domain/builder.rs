//! Tree construction from flat parent-keyed records.

use std::collections::HashMap;

use generational_arena::Index;
use indexmap::IndexMap;
use tracing::{debug, instrument, trace};

use crate::domain::arena::TreeArena;
use crate::domain::error::{DomainError, TreeResult};
use crate::domain::record::{FieldValue, Fields};
use crate::domain::tree::Tree;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl<R: Fields> Tree<R> {
    /// Discards all nodes and starts over with a fresh sentinel root.
    pub fn reset(&mut self) -> &mut Self {
        self.arena = TreeArena::new();
        self.nodes.clear();
        self
    }

    /// Replaces the tree contents with `records`.
    ///
    /// On error the tree is left as it was.
    #[instrument(level = "debug", skip(self, records))]
    pub fn set<I>(&mut self, records: I) -> TreeResult<&mut Self>
    where
        I: IntoIterator<Item = R>,
    {
        let incoming = self.prepare(records, false)?;
        self.reset();
        self.commit(incoming);
        Ok(self)
    }

    /// Adds records and re-links every node to its parent.
    ///
    /// A key that is already present replaces the earlier record at the same
    /// index position. A parent key that matches no record attaches the node
    /// to the sentinel root. Records that would close a parent cycle are
    /// rejected and the tree is left unchanged.
    #[instrument(level = "debug", skip(self, records))]
    pub fn add<I>(&mut self, records: I) -> TreeResult<&mut Self>
    where
        I: IntoIterator<Item = R>,
    {
        let incoming = self.prepare(records, true)?;
        self.commit(incoming);
        Ok(self)
    }

    pub fn add_one(&mut self, record: R) -> TreeResult<&mut Self> {
        self.add(std::iter::once(record))
    }

    /// Extracts keys and validates the resulting parent graph without touching the tree.
    fn prepare<I>(&self, records: I, keep_existing: bool) -> TreeResult<Vec<(FieldValue, R)>>
    where
        I: IntoIterator<Item = R>,
    {
        let key_field = &self.config.key_field;
        let parent_field = &self.config.parent_key_field;

        let mut incoming = Vec::new();
        for record in records {
            let key = record
                .field(key_field)
                .map(FieldValue::into_key)
                .ok_or_else(|| DomainError::MissingKey {
                    field: key_field.clone(),
                })?;
            incoming.push((key, record));
        }

        let mut graph: IndexMap<FieldValue, Option<FieldValue>> = IndexMap::new();
        if keep_existing {
            for node in self.nodes() {
                if let Some(key) = node.key() {
                    let parent = node.field(parent_field).map(FieldValue::into_key);
                    graph.insert(key.clone(), parent);
                }
            }
        }
        for (key, record) in &incoming {
            let parent = record.field(parent_field).map(FieldValue::into_key);
            graph.insert(key.clone(), parent);
        }
        find_cycle(&graph)?;

        Ok(incoming)
    }

    fn commit(&mut self, incoming: Vec<(FieldValue, R)>) {
        for (key, record) in incoming {
            let idx = self.arena.insert_node(key.clone(), record);
            if let Some(replaced) = self.nodes.insert(key.clone(), idx) {
                debug!(%key, "duplicate key, replacing earlier record");
                self.arena.remove_node(replaced);
            }
        }
        self.relink();
    }

    /// Binds every indexed node to its parent, or to the root when the parent is unknown.
    fn relink(&mut self) {
        let root = self.arena.root();
        let parent_field = &self.config.parent_key_field;

        let links: Vec<(Index, Index)> = self
            .nodes
            .values()
            .map(|&idx| {
                let parent_key = self
                    .arena
                    .get_node(idx)
                    .and_then(|n| n.record.as_ref())
                    .and_then(|r| r.field(parent_field))
                    .map(FieldValue::into_key);
                let parent = match parent_key {
                    Some(pk) => self.nodes.get(&pk).copied().unwrap_or_else(|| {
                        debug!(parent = %pk, "parent not found, attaching to root");
                        root
                    }),
                    None => root,
                };
                (idx, parent)
            })
            .collect();

        trace!(count = links.len(), "re-linking nodes");
        self.arena.clear_links();
        for (child, parent) in links {
            self.arena.bind_parent(child, parent);
        }
    }
}

/// Walks each parent chain once; reaching a node already on the current
/// chain means the chain loops.
fn find_cycle(graph: &IndexMap<FieldValue, Option<FieldValue>>) -> TreeResult<()> {
    let mut marks: HashMap<&FieldValue, Mark> = HashMap::with_capacity(graph.len());

    for start in graph.keys() {
        let mut chain = Vec::new();
        let mut current = Some(start);

        while let Some(key) = current {
            match marks.get(key) {
                Some(Mark::Done) => break,
                Some(Mark::Visiting) => return Err(DomainError::CycleDetected(key.clone())),
                None => {}
            }
            marks.insert(key, Mark::Visiting);
            chain.push(key);

            // unresolved parents end the chain at the root
            current = graph
                .get(key)
                .and_then(|parent| parent.as_ref())
                .and_then(|parent| graph.get_key_value(parent).map(|(k, _)| k));
        }

        for key in chain {
            marks.insert(key, Mark::Done);
        }
    }
    Ok(())
}
