//! Mutable state carried across one query run.
//!
//! [`AgentRunState`] is the single root aggregate threaded through a run:
//! the working query and filters, the fallback chain, accumulated evidence,
//! the latest verdict and critique, sub-tasks for multi-topic runs, and the
//! diagnostic trace. It is created per run and dropped at completion.

use crate::core::filters::FilterSet;
use crate::critique::CritiqueResult;
use crate::decompose::SubTask;
use crate::evidence::chunk::{EvidenceChunk, StrategyKind};
use crate::evidence::verdict::ValidationVerdict;
use crate::routing::{FallbackChain, RouteKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Stage of the routing state machine, reported for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Planning,
    Retrieving,
    Validating,
    Synthesizing,
    Critiquing,
    Complete,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Planning => "planning",
            RunStage::Retrieving => "retrieving",
            RunStage::Validating => "validating",
            RunStage::Synthesizing => "synthesizing",
            RunStage::Critiquing => "critiquing",
            RunStage::Complete => "complete",
        }
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final response of a query run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    /// Cited source identifiers, in citation-number order
    pub citations: Vec<String>,
    pub strategy_used: RouteKind,
    /// Named confidence scores gathered along the run (validation quality,
    /// critique confidence, ...), keyed for stable display order
    pub confidence: BTreeMap<String, f64>,
    /// Human-readable diagnostic trace of the stages visited
    pub trace: Vec<String>,
    /// Set when the run stopped to ask the user a question instead of
    /// answering; `answer` then holds the clarification request.
    pub needs_clarification: bool,
}

impl QueryResponse {
    pub fn clarification(question: impl Into<String>, strategy_used: RouteKind) -> Self {
        Self {
            answer: question.into(),
            citations: Vec::new(),
            strategy_used,
            confidence: BTreeMap::new(),
            trace: vec!["clarification requested".to_string()],
            needs_clarification: true,
        }
    }

    /// The headline confidence: the lowest recorded score, or 0.0 when
    /// nothing scored the run.
    pub fn overall_confidence(&self) -> f64 {
        if self.confidence.is_empty() {
            return 0.0;
        }
        self.confidence
            .values()
            .copied()
            .fold(1.0_f64, f64::min)
            .clamp(0.0, 1.0)
    }
}

/// Accumulated state of one query run.
///
/// The chunk list only grows and is de-duplicated by id; refinements are
/// recorded so a refinement loop that stops making progress can be
/// detected.
#[derive(Debug, Clone)]
pub struct AgentRunState {
    /// Query text as originally asked
    pub original_query: String,
    /// Current (possibly refined) query text
    pub query: String,
    pub filters: FilterSet,
    pub route: RouteKind,
    pub chain: FallbackChain,
    pub strategy: StrategyKind,
    /// Pagination offset into the current strategy's results
    pub offset: usize,
    pub iteration: usize,
    pub stage: RunStage,
    pub last_verdict: Option<ValidationVerdict>,
    pub last_critique: Option<CritiqueResult>,
    pub sub_tasks: Vec<SubTask>,
    pub answer: Option<String>,
    chunks: Vec<EvidenceChunk>,
    seen_ids: HashSet<String>,
    refinements: Vec<String>,
    strategies_attempted: Vec<StrategyKind>,
    confidence: BTreeMap<String, f64>,
    trace: Vec<String>,
}

impl AgentRunState {
    pub fn new(query: impl Into<String>, filters: FilterSet, route: RouteKind) -> Self {
        let query = query.into();
        let strategy = route.strategy().unwrap_or(StrategyKind::Hybrid);
        Self {
            original_query: query.clone(),
            query,
            filters,
            route,
            chain: FallbackChain::default(),
            strategy,
            offset: 0,
            iteration: 0,
            stage: RunStage::Planning,
            last_verdict: None,
            last_critique: None,
            sub_tasks: Vec::new(),
            answer: None,
            chunks: Vec::new(),
            seen_ids: HashSet::new(),
            refinements: Vec::new(),
            strategies_attempted: Vec::new(),
            confidence: BTreeMap::new(),
            trace: Vec::new(),
        }
    }

    pub fn chunks(&self) -> &[EvidenceChunk] {
        &self.chunks
    }

    /// Append new chunks, skipping ids already absorbed. Returns how many
    /// were actually added.
    pub fn absorb(&mut self, batch: Vec<EvidenceChunk>) -> usize {
        let mut added = 0;
        for chunk in batch {
            if self.seen_ids.insert(chunk.id.clone()) {
                self.chunks.push(chunk);
                added += 1;
            }
        }
        added
    }

    /// Record entering a stage, for the diagnostic trace.
    pub fn enter_stage(&mut self, stage: RunStage) {
        self.stage = stage;
        self.trace.push(stage.as_str().to_string());
    }

    pub fn push_trace(&mut self, line: impl Into<String>) {
        self.trace.push(line.into());
    }

    pub fn record_confidence(&mut self, key: impl Into<String>, score: f64) {
        self.confidence.insert(key.into(), score.clamp(0.0, 1.0));
    }

    /// Record the strategy used for a retrieval attempt.
    pub fn record_strategy(&mut self, strategy: StrategyKind) {
        self.strategy = strategy;
        if !self.strategies_attempted.contains(&strategy) {
            self.strategies_attempted.push(strategy);
        }
    }

    pub fn strategies_attempted(&self) -> &[StrategyKind] {
        &self.strategies_attempted
    }

    /// Apply a refined query. Returns false when the refinement is
    /// identical to the current query (no progress); the caller should
    /// advance the offset instead. A changed query resets the offset.
    pub fn apply_refinement(&mut self, refined: String) -> bool {
        if refined == self.query {
            return false;
        }
        self.refinements.push(refined.clone());
        self.query = refined;
        self.offset = 0;
        true
    }

    pub fn refinement_count(&self) -> usize {
        self.refinements.len()
    }

    /// Consume the run state into the final response.
    pub fn into_response(mut self, answer: String, citations: Vec<String>) -> QueryResponse {
        self.trace.push(RunStage::Complete.as_str().to_string());
        QueryResponse {
            answer,
            citations,
            strategy_used: self.route,
            confidence: self.confidence,
            trace: self.trace,
            needs_clarification: false,
        }
    }
}
