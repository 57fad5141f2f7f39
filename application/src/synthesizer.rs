//! Answer synthesis from validated evidence.

use crate::ports::{CompletionError, CompletionService};
use finsight_domain::{
    EvidenceChunk, StrategyKind,
    prompt::{citation_context, synthesis_prompt},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// A synthesized answer with its citation list in marker order.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub answer: String,
    pub citations: Vec<String>,
    /// Mean relevance of the evidence the answer was built from
    pub confidence: f64,
}

pub struct Synthesizer {
    completion: Arc<dyn CompletionService>,
}

impl Synthesizer {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Synthesize an answer from the chunks. The numbered citation context
    /// fixes marker `[n]` to `chunks[n-1]`, and a deterministic
    /// data-coverage footer summarizes what the evidence actually spans.
    pub async fn synthesize(
        &self,
        query: &str,
        chunks: &[EvidenceChunk],
    ) -> Result<Synthesis, CompletionError> {
        let context = citation_context(chunks);
        let prompt = synthesis_prompt(query, &context);
        let mut answer = self.completion.complete(&prompt).await?;

        if let Some(footer) = coverage_footer(chunks) {
            answer.push_str(&footer);
        }

        let citations = chunks
            .iter()
            .map(|chunk| {
                chunk
                    .metadata
                    .source_file
                    .clone()
                    .unwrap_or_else(|| chunk.id.clone())
            })
            .collect();

        debug!(chunks = chunks.len(), "synthesis complete");
        Ok(Synthesis {
            answer,
            citations,
            confidence: EvidenceChunk::mean_relevance(chunks),
        })
    }
}

/// Deterministic footer summarizing the evidence's coverage: entities,
/// years, quarters, and per-strategy source counts. None when there is no
/// metadata worth reporting.
pub fn coverage_footer(chunks: &[EvidenceChunk]) -> Option<String> {
    if chunks.is_empty() {
        return None;
    }

    let entities: BTreeSet<&str> = chunks
        .iter()
        .filter_map(|c| c.metadata.entity.as_deref())
        .collect();
    let years: BTreeSet<i32> = chunks.iter().filter_map(|c| c.metadata.year).collect();
    let quarters: BTreeSet<&str> = chunks
        .iter()
        .filter_map(|c| c.metadata.quarter.as_deref())
        .collect();

    let mut parts = Vec::new();
    if !entities.is_empty() {
        parts.push(format!(
            "entities: {}",
            entities.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    if !years.is_empty() {
        parts.push(format!(
            "years: {}",
            years
                .into_iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if !quarters.is_empty() {
        parts.push(format!(
            "quarters: {}",
            quarters.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    let mut counts = Vec::new();
    for kind in StrategyKind::all() {
        let n = chunks.iter().filter(|c| c.source == kind).count();
        if n > 0 {
            counts.push(format!("{kind} {n}"));
        }
    }
    parts.push(format!("passages: {}", counts.join(", ")));

    Some(format!("\n\nData coverage - {}.", parts.join("; ")))
}
