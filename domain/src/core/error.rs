//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("All retrieval strategies exhausted")]
    ExhaustedFallback,

    #[error("Retrieval budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("Orchestration error: {0}")]
    OrchestrationError(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents fallback exhaustion
    pub fn is_exhausted(&self) -> bool {
        matches!(self, DomainError::ExhaustedFallback)
    }
}
