//! Option models for selection controls built on a [`Tree`].
//!
//! The rendering layer receives plain data: flattened labels, the set of
//! keys that must not be selectable, or nested option groups.

use std::collections::HashMap;

use clap::ValueEnum;
use generational_arena::Index;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{FieldValue, Fields, ListOptions, NodeRef, Tree};

/// Attributes attached to a single option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionAttrs {
    pub disabled: bool,
}

impl OptionAttrs {
    pub const DISABLED: OptionAttrs = OptionAttrs { disabled: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Nested option tree: parents become groups, leaves become selectable items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OptionEntry {
    Group {
        label: String,
        options: Vec<OptionEntry>,
    },
    Item {
        value: FieldValue,
        label: String,
    },
}

impl OptionEntry {
    pub fn label(&self) -> &str {
        match self {
            OptionEntry::Group { label, .. } | OptionEntry::Item { label, .. } => label,
        }
    }
}

/// Keys that may not be chosen as the new parent of `pk`: the node itself
/// and its whole subtree. Unknown keys yield an empty map.
#[instrument(level = "debug", skip(tree))]
pub fn disabled_options<R: Fields>(
    tree: &Tree<R>,
    pk: &FieldValue,
) -> IndexMap<FieldValue, OptionAttrs> {
    let Some(node) = tree.find_by_pk(pk) else {
        debug!(%pk, "no node for key, nothing to disable");
        return IndexMap::new();
    };

    let key_field = tree.config().key_field.as_str();
    node.key()
        .cloned()
        .into_iter()
        .chain(tree.values_by_node(&node, key_field, &ListOptions::plain()))
        .map(|key| (key, OptionAttrs::DISABLED))
        .collect()
}

/// Groups children under their parent's label, optionally sorting siblings by label.
#[instrument(level = "debug", skip(tree))]
pub fn grouped_options<R: Fields>(
    tree: &Tree<R>,
    label_field: &str,
    sort: Option<SortDirection>,
) -> Vec<OptionEntry> {
    let mut built: HashMap<Index, OptionEntry> = HashMap::new();
    let root = tree.root();

    // reverse pre-order: every child entry exists before its parent needs it
    let order: Vec<NodeRef<'_, R>> = tree.iter().collect();
    for node in order.iter().rev() {
        let label = node
            .field(label_field)
            .map(|l| l.to_string())
            .unwrap_or_default();
        let entry = if node.has_children() {
            OptionEntry::Group {
                label,
                options: sorted_children(node, &mut built, sort),
            }
        } else {
            let Some(value) = node.key().cloned() else {
                continue;
            };
            OptionEntry::Item { value, label }
        };
        built.insert(node.index(), entry);
    }

    sorted_children(&root, &mut built, sort)
}

fn sorted_children<R>(
    node: &NodeRef<'_, R>,
    built: &mut HashMap<Index, OptionEntry>,
    sort: Option<SortDirection>,
) -> Vec<OptionEntry> {
    let entries = node.children().filter_map(|c| built.remove(&c.index()));
    match sort {
        None => entries.collect(),
        Some(direction) => entries
            .sorted_by(|a, b| {
                let ord = a.label().cmp(b.label());
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            })
            .collect(),
    }
}

/// One row of a flattened select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: FieldValue,
    pub label: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

/// Everything a rendering layer needs for a "choose parent" drop-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectControl {
    pub prompt: String,
    pub options: Vec<SelectOption>,
}

impl SelectControl {
    /// Flattened, indented options keyed by the tree's key field.
    ///
    /// When `current` is set, that record and its descendants are disabled.
    pub fn build<R: Fields>(
        tree: &Tree<R>,
        label_field: &str,
        current: Option<&FieldValue>,
        list_options: &ListOptions,
        prompt: impl Into<String>,
    ) -> Self {
        let key_field = tree.config().key_field.as_str();
        let disabled = current
            .map(|pk| disabled_options(tree, pk))
            .unwrap_or_default();

        let options = tree
            .list(key_field, label_field, list_options)
            .into_iter()
            .map(|(value, label)| SelectOption {
                disabled: disabled.get(&value).is_some_and(|attrs| attrs.disabled),
                value,
                label,
            })
            .collect();

        Self {
            prompt: prompt.into(),
            options,
        }
    }

    pub fn disabled_values(&self) -> impl Iterator<Item = &FieldValue> {
        self.options.iter().filter(|o| o.disabled).map(|o| &o.value)
    }
}
