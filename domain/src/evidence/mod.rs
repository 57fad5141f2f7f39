//! Evidence value objects produced by retrieval and consumed by
//! validation and synthesis.

pub mod chunk;
pub mod verdict;
