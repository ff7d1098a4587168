//! Structured error types for tablegrid.
//!
//! Argument and consistency errors are programming errors and always
//! propagate. Cell conflicts are the only recoverable kind; see
//! [`crate::config::TableConfig::fail_on_cell_conflicts`].

use crate::types::BoxId;

/// All errors that can occur while building or filling a table grid.
#[derive(Debug, thiserror::Error)]
pub enum TableGridError {
    /// A required input was missing or referred to something that does not exist.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An invariant of the layout tree or of the grid was violated.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// A content box was placed over a cell that already holds other content,
    /// or over a row that has already been finished.
    #[error("Cell conflict at row {row}, column {column}: {incoming} collides with {existing}")]
    CellConflict {
        row: usize,
        column: usize,
        existing: String,
        incoming: BoxId,
    },

    /// A configuration, tree or page document could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TableGridError>;

impl TableGridError {
    /// True for the only error kind that has a degrade-and-continue policy.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::CellConflict { .. })
    }
}

pub(crate) fn missing_box(id: BoxId) -> TableGridError {
    TableGridError::InvalidArgument(format!("no box with id {id} in the layout tree"))
}
