//! hiertree: hierarchies from flat parent-keyed records.
//!
//! Records reference their parent through a key field. [`domain::Tree`]
//! links them into an arena-backed hierarchy under a synthetic root and
//! answers the usual questions: which nodes sit at a given level, what the
//! indented listing of a subtree looks like, and which keys must be
//! excluded when choosing a new parent for a record.
//!
//! ```
//! use hiertree::domain::{FieldValue, ListOptions, Tree};
//! use serde_json::json;
//!
//! let mut tree = Tree::default();
//! tree.set(vec![
//!     json!({"id": 1, "parent_id": null, "title": "A"}),
//!     json!({"id": 2, "parent_id": 1, "title": "B"}),
//! ])?;
//!
//! let list = tree.list("id", "title", &ListOptions::default());
//! assert_eq!(list[&FieldValue::Int(2)], "- B");
//! # Ok::<(), hiertree::domain::DomainError>(())
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;
