//! Domain layer: the record hierarchy and its invariants
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod error;
pub mod record;
pub mod render;
pub mod tree;

pub use arena::{NodeRef, TreeArena, TreeNode};
pub use error::{DomainError, TreeResult};
pub use record::{FieldValue, Fields};
pub use render::{TreeNodeConvert, MAX_RENDER_DEPTH};
pub use tree::{ListOptions, Tree, TreeConfig, DEFAULT_KEY_FIELD, DEFAULT_PARENT_KEY_FIELD, DEFAULT_PREFIX};
