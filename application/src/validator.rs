//! Evidence validation.
//!
//! Decides whether a strategy's result set is good enough to synthesize
//! from. Cheap heuristics (count, relevance, diversity, filter agreement)
//! combine with a model-judged relevance score over the top passages.
//! Heuristic mismatches are warnings; the hard failure conditions are an
//! empty set, a judged score under the threshold, and similarity results
//! whose mean relevance sits under the floor.

use crate::config::ValidatorParams;
use crate::ports::CompletionService;
use finsight_domain::{
    EvidenceChunk, FilterSet, StrategyKind, ValidationVerdict, parse_relevance_score,
    prompt::relevance_prompt,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EvidenceValidator {
    completion: Arc<dyn CompletionService>,
    params: ValidatorParams,
}

impl EvidenceValidator {
    pub fn new(completion: Arc<dyn CompletionService>, params: ValidatorParams) -> Self {
        Self { completion, params }
    }

    pub async fn validate(
        &self,
        query: &str,
        filters: &FilterSet,
        strategy: StrategyKind,
        chunks: &[EvidenceChunk],
    ) -> ValidationVerdict {
        if chunks.is_empty() {
            return ValidationVerdict::empty();
        }

        let mut reasons = Vec::new();

        let count_factor = (chunks.len() as f64 / 5.0).min(1.0);
        let mean_relevance = EvidenceChunk::mean_relevance(chunks);
        let diversity_factor = EvidenceChunk::source_diversity(chunks) as f64 / 3.0;
        let entity_factor = filter_agreement(chunks, |c| {
            match (&filters.entity, &c.metadata.entity) {
                (Some(wanted), Some(got)) => got.eq_ignore_ascii_case(wanted),
                (Some(_), None) => false,
                (None, _) => true,
            }
        });
        let temporal_factor = filter_agreement(chunks, |c| match (filters.year, c.metadata.year) {
            (Some(wanted), Some(got)) => wanted == got,
            (Some(_), None) => false,
            (None, _) => true,
        });

        if filters.entity.is_some() && entity_factor < 0.5 {
            reasons.push(format!(
                "Most results are not about the requested entity ({:.0}% match)",
                entity_factor * 100.0
            ));
        }
        if filters.year.is_some() && temporal_factor < 0.5 {
            reasons.push(format!(
                "Most results fall outside the requested period ({:.0}% match)",
                temporal_factor * 100.0
            ));
        }

        let judged_score = self.judge(query, chunks).await;
        let quality_score = (count_factor
            + mean_relevance
            + diversity_factor
            + entity_factor
            + temporal_factor)
            / 5.0;

        let mut passed = true;
        if judged_score < self.params.pass_threshold {
            passed = false;
            reasons.push(format!(
                "Judged relevance {judged_score}/10 is below the acceptance threshold"
            ));
        }
        if strategy.is_similarity_based() && mean_relevance < self.params.similarity_floor {
            passed = false;
            reasons.push(format!(
                "Mean similarity {mean_relevance:.2} is below the floor"
            ));
        }

        debug!(
            strategy = %strategy,
            judged_score,
            quality = quality_score,
            passed,
            "validation verdict"
        );

        ValidationVerdict {
            passed,
            quality_score: quality_score.clamp(0.0, 1.0),
            judged_score,
            reasons,
        }
    }

    /// Judge the top passages with a single completion call: the top-N
    /// texts joined with a separator, truncated to the prompt's character
    /// budget. A failed completion counts as zero: evidence the model
    /// could not vouch for is not evidence.
    async fn judge(&self, query: &str, chunks: &[EvidenceChunk]) -> u8 {
        let mut ranked: Vec<&EvidenceChunk> = chunks.iter().collect();
        ranked.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        ranked.truncate(self.params.judge_top_n);

        let joined = ranked
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n");

        let prompt = relevance_prompt(query, &joined);
        match self.completion.complete(&prompt).await {
            Ok(text) => parse_relevance_score(&text),
            Err(e) => {
                warn!("relevance judge failed: {e}");
                0
            }
        }
    }
}

fn filter_agreement<F>(chunks: &[EvidenceChunk], matches: F) -> f64
where
    F: Fn(&EvidenceChunk) -> bool,
{
    chunks.iter().filter(|c| matches(c)).count() as f64 / chunks.len() as f64
}
