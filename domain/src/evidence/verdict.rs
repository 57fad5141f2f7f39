//! Validation verdicts.

use serde::{Deserialize, Serialize};

/// Outcome of validating a retrieval result set against a query.
///
/// A verdict is derived state: it is recomputed each time validation runs
/// and never cached across chunk sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Whether the evidence is good enough to synthesize from
    pub passed: bool,
    /// Weighted aggregate quality in [0, 1] (observability/testing)
    pub quality_score: f64,
    /// Model-judged usefulness in 0..=10
    pub judged_score: u8,
    /// Hard failures and soft warnings, human-readable
    pub reasons: Vec<String>,
}

impl ValidationVerdict {
    /// The verdict for an empty chunk list: always a failure.
    pub fn empty() -> Self {
        Self {
            passed: false,
            quality_score: 0.0,
            judged_score: 0,
            reasons: vec!["No retrieval results".to_string()],
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }
}
