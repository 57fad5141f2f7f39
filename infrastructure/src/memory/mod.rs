//! In-memory backends.
//!
//! A structured store, vector index, and deterministic embedder that hold
//! an indexed corpus entirely in memory. Suitable for small corpora,
//! demos, and integration tests; the ports keep a swap to a real database
//! or vector service local to this module.

pub mod corpus;
pub mod embedder;
pub mod index;
pub mod store;

pub use corpus::{CorpusError, load_corpus};
pub use embedder::HashEmbedder;
pub use index::InMemoryVectorIndex;
pub use store::InMemoryStructuredStore;
