//! Record source: JSON arrays of objects.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{Tree, TreeConfig};

/// Reads a JSON array of record objects.
#[instrument(level = "debug")]
pub fn load_records(path: &Path) -> ApplicationResult<Vec<Value>> {
    let content = fs::read_to_string(path).with_path_context("read records", path)?;
    parse_records(&content, path)
}

/// Loads records and builds a tree over them in one step.
pub fn load_tree(path: &Path, config: TreeConfig) -> ApplicationResult<Tree<Value>> {
    let records = load_records(path)?;
    let mut tree = Tree::new(config);
    tree.set(records)?;
    debug!(nodes = tree.len(), depth = tree.depth(), "tree loaded");
    Ok(tree)
}

fn parse_records(content: &str, path: &Path) -> ApplicationResult<Vec<Value>> {
    let parse_err = |message: String| ApplicationError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let value: Value = serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(parse_err("expected a JSON array of objects".to_string()));
    };
    if let Some(pos) = items.iter().position(|item| !item.is_object()) {
        return Err(parse_err(format!("element {} is not an object", pos)));
    }
    Ok(items)
}
