//! Application layer: record loading and selection-control helpers
//!
//! This layer orchestrates domain logic for the rendering and record-source boundaries.

pub mod error;
pub mod error_ext;
pub mod loader;
pub mod options;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use loader::{load_records, load_tree};
pub use options::{
    disabled_options, grouped_options, OptionAttrs, OptionEntry, SelectControl, SelectOption,
    SortDirection,
};
