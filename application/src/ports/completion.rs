//! Completion service port
//!
//! Defines the interface for text completion against a model provider.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during completion operations
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Text completion against a model provider.
///
/// Used for filter extraction, relevance judging, synthesis, critique, and
/// clarification. Callers treat malformed output as recoverable: the
/// parsers in the domain layer substitute conservative defaults, so a
/// completion that "succeeds" with garbage never fails a run.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send a prompt and get the completion text. Implementations carry
    /// their own request deadline.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
