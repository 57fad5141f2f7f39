//! Query classification and initial route planning.
//!
//! The planner's keyword classification is deliberately coarse: it only has
//! to pick a sensible starting strategy and fallback order. Validation and
//! the fallback chain correct for misclassification downstream.

use crate::core::filters::FilterSet;
use crate::evidence::chunk::StrategyKind;
use crate::routing::{FallbackChain, RouteKind};
use serde::{Deserialize, Serialize};

/// Coarse query category driving the initial routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    /// One specific figure or extract, e.g. "What is BAC's CET1 ratio?"
    SingleFact,
    /// Explanation, summary, or multi-section reasoning
    Explanation,
    /// Multiple entities or topics side by side
    Comparison,
    /// No strong signal; broad semantic search
    OpenEnded,
}

const SINGLE_FACT_KEYWORDS: &[&str] = &[
    "total",
    "amount",
    "value",
    "ratio",
    "percentage",
    "rate",
    "net income",
    "how much",
    "number of",
];

const EXPLANATION_KEYWORDS: &[&str] = &[
    "explain",
    "describe",
    "discuss",
    "analyze",
    "analysis",
    "summarize",
    "why",
    "how has",
    "how does",
    "strategy",
    "approach",
];

const COMPARISON_KEYWORDS: &[&str] = &["compare", "comparison", "versus", " vs ", "difference"];

/// Classify a query by keyword evidence. Comparison wins over explanation,
/// explanation over single-fact, so broader intents are not mistaken for
/// fact lookups.
pub fn classify_query(text: &str) -> QueryClass {
    let lower = text.to_ascii_lowercase();
    let hits = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if hits(COMPARISON_KEYWORDS) {
        QueryClass::Comparison
    } else if hits(EXPLANATION_KEYWORDS) {
        QueryClass::Explanation
    } else if hits(SINGLE_FACT_KEYWORDS) {
        QueryClass::SingleFact
    } else {
        QueryClass::OpenEnded
    }
}

/// The planner's output: a route, its fallback chain, and the
/// classification it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub route: RouteKind,
    pub chain: FallbackChain,
    pub class: QueryClass,
}

/// Decide the initial route and fallback order for a query.
///
/// Structured-first when exact entity+period filters back a fact lookup;
/// semantic-first for open-ended questions; comparisons go to the
/// multi-topic path. Deterministic: identical inputs produce an identical
/// plan.
pub fn plan_route(text: &str, filters: &FilterSet) -> RoutePlan {
    let class = classify_query(text);
    let completeness = filters.completeness();

    let (route, backups): (RouteKind, &[StrategyKind]) = match class {
        QueryClass::Comparison => (
            RouteKind::Multi,
            &[StrategyKind::Hybrid, StrategyKind::Semantic],
        ),
        QueryClass::SingleFact if filters.has_entity_and_period() => (
            RouteKind::Structured,
            &[StrategyKind::Hybrid, StrategyKind::Semantic],
        ),
        QueryClass::SingleFact if completeness < 0.3 => (
            RouteKind::Semantic,
            &[StrategyKind::Hybrid, StrategyKind::Structured],
        ),
        QueryClass::SingleFact => (
            RouteKind::Hybrid,
            &[StrategyKind::Structured, StrategyKind::Semantic],
        ),
        QueryClass::Explanation if !filters.is_empty() => (
            RouteKind::Hybrid,
            &[StrategyKind::Semantic, StrategyKind::Structured],
        ),
        QueryClass::Explanation | QueryClass::OpenEnded => (
            RouteKind::Semantic,
            &[StrategyKind::Hybrid, StrategyKind::Structured],
        ),
    };

    // Multi still carries a chain: the parallel runner's sub-tasks start
    // from hybrid when they inherit this plan's backups.
    let initial = route.strategy().unwrap_or(StrategyKind::Hybrid);
    RoutePlan {
        route,
        chain: FallbackChain::new(initial, backups),
        class,
    }
}
