//! Error types for schema validation and layout runs.

use std::time::Duration;

use thiserror::Error;

/// Malformed schema input. Fatal to the run that saw it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Duplicate entity id: {id}")]
    DuplicateEntity { id: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Layout exceeded its {budget:?} budget during {phase}")]
    Timeout { phase: &'static str, budget: Duration },

    /// The run was superseded by a newer schema snapshot.
    #[error("Layout run cancelled")]
    Cancelled,
}

impl LayoutError {
    /// Whether the error should reach the user. Cancellation is internal.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}
