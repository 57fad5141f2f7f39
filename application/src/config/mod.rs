//! Application configuration - parameter objects for the orchestrators.

pub mod params;

pub use params::{OrchestratorParams, RetrievalParams, ValidatorParams};
