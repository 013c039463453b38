//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::record::FieldValue;

/// Domain errors represent violations of the hierarchy invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("record has no value for key field '{field}'")]
    MissingKey { field: String },

    #[error("cycle detected in hierarchy at key: {0}")]
    CycleDetected(FieldValue),

    #[error("hierarchy is {depth} levels deep, drawing is limited to {limit}")]
    TooDeep { depth: usize, limit: usize },
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;
