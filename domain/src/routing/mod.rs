//! Routing policy: query classification, route planning, and the fallback
//! chain the orchestrator walks when validation rejects a result set.
//!
//! All of this is pure domain logic. The planner's decisions are
//! deterministic given the same query text and filter set, which is what
//! makes the routing state machine re-entrant and testable.

pub mod chain;
pub mod plan;

pub use chain::FallbackChain;
pub use plan::{QueryClass, RoutePlan, classify_query, plan_route};

use crate::evidence::chunk::StrategyKind;
use serde::{Deserialize, Serialize};

/// The route a planner assigns to a query.
///
/// `Multi` is not a retrieval strategy: it hands the query to the task
/// decomposer and parallel runner instead of a single-strategy pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Structured,
    Hybrid,
    Semantic,
    Multi,
}

impl RouteKind {
    /// The strategy this route starts with, if it is a single-strategy route.
    pub fn strategy(&self) -> Option<StrategyKind> {
        match self {
            RouteKind::Structured => Some(StrategyKind::Structured),
            RouteKind::Hybrid => Some(StrategyKind::Hybrid),
            RouteKind::Semantic => Some(StrategyKind::Semantic),
            RouteKind::Multi => None,
        }
    }
}

impl From<StrategyKind> for RouteKind {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Structured => RouteKind::Structured,
            StrategyKind::Hybrid => RouteKind::Hybrid,
            StrategyKind::Semantic => RouteKind::Semantic,
        }
    }
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RouteKind::Structured => "structured",
            RouteKind::Hybrid => "hybrid",
            RouteKind::Semantic => "semantic",
            RouteKind::Multi => "multi",
        };
        write!(f, "{s}")
    }
}

/// Fixed rotation tried when a strategy returns zero results in the
/// iterative planner: the other two strategies, in a deterministic order.
pub fn rotation_after(current: StrategyKind) -> [StrategyKind; 2] {
    match current {
        StrategyKind::Structured => [StrategyKind::Semantic, StrategyKind::Hybrid],
        StrategyKind::Semantic => [StrategyKind::Hybrid, StrategyKind::Structured],
        StrategyKind::Hybrid => [StrategyKind::Structured, StrategyKind::Semantic],
    }
}
