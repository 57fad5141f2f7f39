//! Ports - interfaces the application layer depends on
//!
//! Adapters implementing these live in the infrastructure layer
//! (backends) and the presentation layer (progress).

pub mod completion;
pub mod embedding;
pub mod progress;
pub mod structured_store;
pub mod vector_index;

pub use completion::{CompletionError, CompletionService};
pub use embedding::{EmbeddingError, EmbeddingService};
pub use progress::{NoProgress, RunProgress};
pub use structured_store::{StoreError, StoredPassage, StructuredStore};
pub use vector_index::{IndexError, MetadataFilter, VectorHit, VectorIndex};
