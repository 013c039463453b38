use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::error::{DomainError, TreeResult};
use crate::domain::record::Fields;
use crate::domain::tree::Tree;

pub const ROOT_LABEL: &str = ".";

/// Deepest hierarchy that will be drawn.
///
/// `termtree` formats and drops its nodes recursively, one stack frame per
/// level, and indentation grows quadratically with depth.
pub const MAX_RENDER_DEPTH: usize = 256;

pub trait TreeNodeConvert {
    fn to_tree_string(&self, label_field: &str) -> TreeResult<TermTree<String>>;
}

impl<R: Fields> TreeNodeConvert for Tree<R> {
    /// Builds the display tree bottom-up.
    ///
    /// Fails with [`DomainError::TooDeep`] above [`MAX_RENDER_DEPTH`] levels.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, label_field: &str) -> TreeResult<TermTree<String>> {
        let depth = self.depth();
        if depth > MAX_RENDER_DEPTH {
            return Err(DomainError::TooDeep {
                depth,
                limit: MAX_RENDER_DEPTH,
            });
        }

        let mut built: HashMap<Index, TermTree<String>> = HashMap::new();

        for (idx, node) in self.arena.iter_postorder() {
            let label = match (&node.key, node.record.as_ref()) {
                (Some(key), Some(record)) => match record.field(label_field) {
                    Some(label) => format!("{} [{}]", label, key),
                    None => key.to_string(),
                },
                _ => ROOT_LABEL.to_string(),
            };
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(idx, TermTree::new(label).with_leaves(leaves));
        }

        Ok(built
            .remove(&self.arena.root())
            .unwrap_or_else(|| TermTree::new(ROOT_LABEL.to_string())))
    }
}
