//! Infrastructure layer for finsight
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading,
//! model backends, and in-memory corpus backends.

pub mod config;
pub mod memory;
pub mod providers;

// Re-export commonly used types
pub use config::{BackendConfig, ConfigLoader, ConfigValidationError, FileConfig};
pub use memory::index::IndexedPassage;
pub use memory::{
    CorpusError, HashEmbedder, InMemoryStructuredStore, InMemoryVectorIndex, load_corpus,
};
pub use providers::{OpenAiCompletion, OpenAiEmbedding};
