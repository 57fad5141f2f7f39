//! Domain layer for finsight
//!
//! This crate contains the core business logic for query orchestration:
//! queries and filter sets, evidence chunks, routing plans and fallback
//! chains, multi-topic decomposition, citation handling, and the parsers
//! that recover structure from free-form completion-service output.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Routing
//!
//! Every incoming query is classified and assigned a retrieval route plus
//! an ordered [`FallbackChain`] of backup strategies. The orchestrators in
//! the application layer walk that chain until validation passes or the
//! chain is exhausted.
//!
//! ## Evidence
//!
//! Retrieval strategies produce immutable [`EvidenceChunk`]s. A run's
//! accumulated chunk list only grows, de-duplicated by id.

pub mod agent;
pub mod citations;
pub mod core;
pub mod critique;
pub mod decompose;
pub mod evidence;
pub mod parsing;
pub mod prompt;
pub mod routing;

// Re-export commonly used types
pub use agent::run_state::{AgentRunState, QueryResponse, RunStage};
pub use citations::{offset_markers, order_by_topic_priority, renumber_citations};
pub use core::{
    error::DomainError,
    filters::FilterSet,
    query::Query,
};
pub use critique::{CritiqueResult, QualityTier, refine_query};
pub use decompose::{SubTask, SubTaskStatus, route_for_topic, split_topics};
pub use evidence::{
    chunk::{ChunkMetadata, EvidenceChunk, StrategyKind},
    verdict::ValidationVerdict,
};
pub use parsing::{
    parse_critique, parse_filter_extraction, parse_relevance_score, strip_markdown_fences,
};
pub use routing::{FallbackChain, QueryClass, RouteKind, RoutePlan, classify_query, plan_route};
