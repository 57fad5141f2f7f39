//! Multi-topic query decomposition.
//!
//! A compound query ("business lines and risk factors") is split into
//! independently-resolvable sub-topics at conjunction and punctuation
//! boundaries. Fragments too short to carry meaning are discarded, and if
//! nothing usable remains the whole query becomes a single sub-task.

use crate::core::filters::FilterSet;
use crate::evidence::chunk::StrategyKind;
use serde::{Deserialize, Serialize};

/// Separators that delimit sub-topics, matched case-insensitively.
const SEPARATORS: &[&str] = &[" and ", " & ", " + ", ", ", ";"];

/// Fragments at or below this length are discarded as noise.
const MIN_TOPIC_LEN: usize = 10;

/// Lifecycle of a sub-task. A sub-task is immutable once its status
/// leaves `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTaskStatus {
    Pending,
    Completed,
    Failed,
    Errored,
}

/// One independently-resolvable fragment of a multi-topic query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTask {
    pub id: usize,
    pub topic: String,
    pub filters: FilterSet,
    pub status: SubTaskStatus,
    /// Set if and only if `status == Completed`
    pub answer: Option<String>,
    pub citations: Vec<String>,
    pub confidence: f64,
}

impl SubTask {
    pub fn pending(id: usize, topic: impl Into<String>, filters: FilterSet) -> Self {
        Self {
            id,
            topic: topic.into(),
            filters,
            status: SubTaskStatus::Pending,
            answer: None,
            citations: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn complete(mut self, answer: String, citations: Vec<String>, confidence: f64) -> Self {
        self.status = SubTaskStatus::Completed;
        self.answer = Some(answer);
        self.citations = citations;
        self.confidence = confidence;
        self
    }

    pub fn fail(mut self) -> Self {
        self.status = SubTaskStatus::Failed;
        self
    }

    pub fn error(mut self) -> Self {
        self.status = SubTaskStatus::Errored;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == SubTaskStatus::Completed
    }
}

/// Split a query into sub-topics.
///
/// Splits at every separator in [`SEPARATORS`], trims fragments, discards
/// those shorter than [`MIN_TOPIC_LEN`] + 1 characters, and de-duplicates
/// case-insensitively preserving first occurrence. Falls back to the whole
/// query when decomposition yields nothing usable.
pub fn split_topics(query: &str) -> Vec<String> {
    let mut topics = vec![query.trim().to_string()];

    for separator in SEPARATORS {
        let mut next = Vec::new();
        for topic in topics {
            if topic.to_ascii_lowercase().contains(separator) {
                split_insensitive(&topic, separator, &mut next);
            } else {
                next.push(topic);
            }
        }
        topics = next;
    }

    let mut seen: Vec<String> = Vec::new();
    let mut filtered = Vec::new();
    for topic in topics {
        let lower = topic.to_ascii_lowercase();
        if topic.len() > MIN_TOPIC_LEN && !seen.contains(&lower) {
            seen.push(lower);
            filtered.push(topic);
        }
    }

    if filtered.is_empty() {
        vec![query.trim().to_string()]
    } else {
        filtered
    }
}

fn split_insensitive(text: &str, separator: &str, out: &mut Vec<String>) {
    let lower = text.to_ascii_lowercase();
    let mut start = 0;
    for (pos, _) in lower.match_indices(separator) {
        let piece = text[start..pos].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        start = pos + separator.len();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
}

const NUMERIC_KEYWORDS: &[&str] = &[
    "total",
    "amount",
    "value",
    "ratio",
    "percentage",
    "number of",
];

const EXPLANATORY_KEYWORDS: &[&str] = &["explain", "describe", "analysis"];

/// Pick the single retrieval strategy for a sub-topic.
///
/// Numeric or metric language with filters present points at the
/// structured store; explanatory language with partial filters suits
/// hybrid; everything else goes to semantic search.
pub fn route_for_topic(topic: &str, filters: &FilterSet) -> StrategyKind {
    let lower = topic.to_ascii_lowercase();

    if !filters.is_empty() && NUMERIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        StrategyKind::Structured
    } else if !filters.is_empty() && EXPLANATORY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        StrategyKind::Hybrid
    } else {
        StrategyKind::Semantic
    }
}
