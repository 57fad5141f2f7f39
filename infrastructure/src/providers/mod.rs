//! Backend providers - adapters for model services.

pub mod openai;

pub use openai::{OpenAiCompletion, OpenAiEmbedding};
