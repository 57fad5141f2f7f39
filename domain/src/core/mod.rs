//! Core value objects: queries, filter sets, and domain errors.

pub mod error;
pub mod filters;
pub mod query;
