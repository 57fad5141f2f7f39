//! The routed orchestrator - a single-pass state machine with fallback.
//!
//! Planning extracts filters and picks a route; retrieval and validation
//! then alternate, walking the fallback chain, until a strategy's evidence
//! passes and is synthesized. Comparison queries route to the parallel
//! runner and master synthesizer instead.

use super::parallel::ParallelRunner;
use super::{OrchestrateError, Orchestrator, extract_filters};
use crate::config::OrchestratorParams;
use crate::master_synth::MasterSynthesizer;
use crate::ports::{CompletionService, RunProgress};
use crate::retrieval::{RetrievalRequest, StrategySet};
use crate::synthesizer::{Synthesis, Synthesizer};
use crate::validator::EvidenceValidator;
use async_trait::async_trait;
use finsight_domain::{
    AgentRunState, Query, QueryResponse, RouteKind, RunStage, StrategyKind, plan_route,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one single-strategy pass.
pub enum PassOutcome {
    Answered(Synthesis),
    /// All strategies in the chain failed validation; holds the
    /// explanatory answer.
    Exhausted(String),
}

/// Runs one query (or sub-query) through retrieve → validate → fall back
/// → synthesize. Shared between the routed orchestrator and the parallel
/// runner's sub-tasks.
pub struct SinglePassEngine {
    strategies: StrategySet,
    validator: Arc<EvidenceValidator>,
    synthesizer: Arc<Synthesizer>,
    params: OrchestratorParams,
    cancel: CancellationToken,
}

impl SinglePassEngine {
    pub fn new(
        strategies: StrategySet,
        validator: Arc<EvidenceValidator>,
        synthesizer: Arc<Synthesizer>,
        params: OrchestratorParams,
    ) -> Self {
        Self {
            strategies,
            validator,
            synthesizer,
            params,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub async fn run(
        &self,
        state: &mut AgentRunState,
        progress: &dyn RunProgress,
    ) -> Result<PassOutcome, OrchestrateError> {
        let mut strategy = state.route.strategy().unwrap_or(StrategyKind::Hybrid);
        let mut attempt = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(OrchestrateError::Cancelled);
            }
            attempt += 1;

            state.enter_stage(RunStage::Retrieving);
            progress.on_stage(RunStage::Retrieving);
            progress.on_strategy_attempt(strategy, attempt);
            state.record_strategy(strategy);
            info!(%strategy, attempt, "retrieving");

            let request = RetrievalRequest::new(state.query.clone(), state.filters.clone())
                .with_limit(self.params.batch_size);
            let chunks = self.strategies.get(strategy).retrieve(&request).await;

            state.enter_stage(RunStage::Validating);
            progress.on_stage(RunStage::Validating);
            let verdict = self
                .validator
                .validate(&state.query, &state.filters, strategy, &chunks)
                .await;
            state.record_confidence(format!("validation_{strategy}"), verdict.quality_score);
            let passed = verdict.passed;
            state.last_verdict = Some(verdict);

            if passed {
                state.absorb(chunks);
                state.enter_stage(RunStage::Synthesizing);
                progress.on_stage(RunStage::Synthesizing);
                let synthesis = self.synthesizer.synthesize(&state.query, state.chunks()).await?;
                return Ok(PassOutcome::Answered(synthesis));
            }

            match state.chain.pop_next() {
                Some(next) => {
                    debug!(failed = %strategy, next = %next, "validation failed, falling back");
                    state.push_trace(format!("{strategy} failed validation, trying {next}"));
                    strategy = next;
                }
                None => {
                    warn!("fallback chain exhausted");
                    return Ok(PassOutcome::Exhausted(exhausted_answer(state)));
                }
            }
        }
    }
}

/// The user-facing answer when every strategy failed: what was searched,
/// with what filters, and what to try instead. Never an empty response.
fn exhausted_answer(state: &AgentRunState) -> String {
    let attempted: Vec<String> = state
        .strategies_attempted()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut answer = format!(
        "I could not find evidence that answers this question. I searched \
         using {} retrieval scoped to {}, but nothing passed the relevance \
         checks.",
        attempted.join(", "),
        state.filters,
    );
    answer.push_str(
        "\n\nSuggestions: name the company explicitly, specify a year or \
         quarter covered by the loaded filings, or broaden the question to \
         a topic rather than a specific figure.",
    );
    answer
}

/// The routed orchestrator: filter extraction, deterministic route
/// planning, then either one single-strategy pass or the multi-topic
/// parallel path.
pub struct RoutedOrchestrator {
    completion: Arc<dyn CompletionService>,
    engine: Arc<SinglePassEngine>,
    runner: ParallelRunner,
    master: MasterSynthesizer,
}

impl RoutedOrchestrator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        engine: Arc<SinglePassEngine>,
        runner: ParallelRunner,
        master: MasterSynthesizer,
    ) -> Self {
        Self {
            completion,
            engine,
            runner,
            master,
        }
    }
}

#[async_trait]
impl Orchestrator for RoutedOrchestrator {
    async fn run_query(
        &self,
        query: &Query,
        progress: &dyn RunProgress,
    ) -> Result<QueryResponse, OrchestrateError> {
        progress.on_stage(RunStage::Planning);
        let filters = extract_filters(self.completion.as_ref(), query.text()).await;
        let plan = plan_route(query.text(), &filters);
        info!(route = %plan.route, %filters, "planned route");

        if plan.route == RouteKind::Multi {
            let tasks = self.runner.run(query.text(), &filters, progress).await?;
            let completed = tasks.iter().filter(|t| t.is_completed()).count();
            if completed == 0 {
                let mut state = AgentRunState::new(query.text(), filters, RouteKind::Multi);
                for task in &tasks {
                    state.push_trace(format!("sub-task '{}' produced no answer", task.topic));
                }
                let answer = exhausted_answer(&state);
                return Ok(state.into_response(answer, Vec::new()));
            }

            let merged = self.master.merge(query.text(), tasks).await;
            let mut confidence = BTreeMap::new();
            confidence.insert("merged_sub_answers".to_string(), merged.confidence);
            return Ok(QueryResponse {
                answer: merged.answer,
                citations: merged.citations,
                strategy_used: RouteKind::Multi,
                confidence,
                trace: vec![
                    "planning".to_string(),
                    format!("parallel run, {completed} sub-answers merged"),
                    "complete".to_string(),
                ],
                needs_clarification: false,
            });
        }

        let mut state = AgentRunState::new(query.text(), filters, plan.route);
        state.chain = plan.chain;
        state.enter_stage(RunStage::Planning);

        match self.engine.run(&mut state, progress).await? {
            PassOutcome::Answered(synthesis) => {
                state.record_confidence("evidence_relevance", synthesis.confidence);
                progress.on_stage(RunStage::Complete);
                Ok(state.into_response(synthesis.answer, synthesis.citations))
            }
            PassOutcome::Exhausted(answer) => Ok(state.into_response(answer, Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorParams;
    use crate::ports::{CompletionError, NoProgress};
    use crate::retrieval::RetrievalStrategy;
    use finsight_domain::{ChunkMetadata, EvidenceChunk, FilterSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Completion that answers by prompt shape: relevance judgements get a
    /// fixed score, everything else a fixed answer.
    struct RoleCompletion {
        judge_score: String,
    }

    #[async_trait]
    impl CompletionService for RoleCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            if prompt.starts_with("Rate how useful") {
                Ok(self.judge_score.clone())
            } else if prompt.starts_with("Extract document metadata") {
                Ok(r#"{"entity": "BAC", "year": 2023}"#.to_string())
            } else {
                Ok("synthesized [1]".to_string())
            }
        }
    }

    /// Strategy returning scripted chunks and counting invocations.
    struct CountingStrategy {
        kind: StrategyKind,
        chunks: Mutex<Vec<EvidenceChunk>>,
        calls: AtomicUsize,
    }

    impl CountingStrategy {
        fn with_chunks(kind: StrategyKind, chunks: Vec<EvidenceChunk>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                chunks: Mutex::new(chunks),
                calls: AtomicUsize::new(0),
            })
        }

        fn empty(kind: StrategyKind) -> Arc<Self> {
            Self::with_chunks(kind, Vec::new())
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RetrievalStrategy for CountingStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn retrieve(&self, _request: &RetrievalRequest) -> Vec<EvidenceChunk> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.chunks.lock().unwrap().clone()
        }
    }

    fn chunk(id: &str, source: StrategyKind) -> EvidenceChunk {
        EvidenceChunk::new(
            id,
            format!("text for {id}"),
            0.9,
            source,
            ChunkMetadata {
                entity: Some("BAC".to_string()),
                year: Some(2023),
                ..ChunkMetadata::default()
            },
        )
    }

    fn engine(
        structured: Arc<CountingStrategy>,
        hybrid: Arc<CountingStrategy>,
        semantic: Arc<CountingStrategy>,
        judge_score: &str,
    ) -> SinglePassEngine {
        let completion: Arc<dyn CompletionService> = Arc::new(RoleCompletion {
            judge_score: judge_score.to_string(),
        });
        SinglePassEngine::new(
            StrategySet::new(structured, hybrid, semantic),
            Arc::new(EvidenceValidator::new(
                Arc::clone(&completion),
                ValidatorParams::default(),
            )),
            Arc::new(Synthesizer::new(completion)),
            OrchestratorParams::default(),
        )
    }

    fn filters() -> FilterSet {
        FilterSet {
            entity: Some("BAC".to_string()),
            year: Some(2023),
            ..FilterSet::default()
        }
    }

    #[tokio::test]
    async fn test_passing_structured_run_never_touches_other_strategies() {
        let structured = CountingStrategy::with_chunks(
            StrategyKind::Structured,
            vec![chunk("a_chunk_1", StrategyKind::Structured)],
        );
        let hybrid = CountingStrategy::empty(StrategyKind::Hybrid);
        let semantic = CountingStrategy::empty(StrategyKind::Semantic);
        let engine = engine(
            Arc::clone(&structured),
            Arc::clone(&hybrid),
            Arc::clone(&semantic),
            "8",
        );

        let plan = plan_route("What is the total revenue for BAC in 2023?", &filters());
        assert_eq!(plan.route, RouteKind::Structured);
        let mut state = AgentRunState::new("What is the total revenue?", filters(), plan.route);
        state.chain = plan.chain;

        let outcome = engine.run(&mut state, &NoProgress).await.unwrap();
        assert!(matches!(outcome, PassOutcome::Answered(_)));
        assert_eq!(structured.call_count(), 1);
        assert_eq!(hybrid.call_count(), 0);
        assert_eq!(semantic.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_validation_walks_the_chain() {
        // Structured returns nothing, hybrid returns good evidence
        let structured = CountingStrategy::empty(StrategyKind::Structured);
        let hybrid = CountingStrategy::with_chunks(
            StrategyKind::Hybrid,
            vec![chunk("a_chunk_1", StrategyKind::Hybrid)],
        );
        let semantic = CountingStrategy::empty(StrategyKind::Semantic);
        let engine = engine(
            Arc::clone(&structured),
            Arc::clone(&hybrid),
            Arc::clone(&semantic),
            "8",
        );

        let plan = plan_route("What is the total revenue for BAC in 2023?", &filters());
        let mut state = AgentRunState::new("What is the total revenue?", filters(), plan.route);
        state.chain = plan.chain;

        let outcome = engine.run(&mut state, &NoProgress).await.unwrap();
        assert!(matches!(outcome, PassOutcome::Answered(_)));
        assert_eq!(structured.call_count(), 1);
        assert_eq!(hybrid.call_count(), 1);
        assert_eq!(semantic.call_count(), 0);
        assert_eq!(
            state.strategies_attempted(),
            &[StrategyKind::Structured, StrategyKind::Hybrid]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_names_what_was_searched() {
        let structured = CountingStrategy::empty(StrategyKind::Structured);
        let hybrid = CountingStrategy::empty(StrategyKind::Hybrid);
        let semantic = CountingStrategy::empty(StrategyKind::Semantic);
        let engine = engine(structured, hybrid, semantic, "8");

        let plan = plan_route("What is the total revenue for BAC in 2023?", &filters());
        let mut state = AgentRunState::new("What is the total revenue?", filters(), plan.route);
        state.chain = plan.chain;

        let outcome = engine.run(&mut state, &NoProgress).await.unwrap();
        let PassOutcome::Exhausted(answer) = outcome else {
            panic!("expected exhaustion");
        };
        assert!(answer.contains("structured"));
        assert!(answer.contains("hybrid"));
        assert!(answer.contains("semantic"));
        assert!(answer.contains("entity=BAC"));
        assert!(answer.contains("Suggestions"));
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_run() {
        let structured = CountingStrategy::empty(StrategyKind::Structured);
        let hybrid = CountingStrategy::empty(StrategyKind::Hybrid);
        let semantic = CountingStrategy::empty(StrategyKind::Semantic);
        let token = CancellationToken::new();
        token.cancel();
        let engine = engine(structured, hybrid, semantic, "8").with_cancellation(token);

        let mut state = AgentRunState::new("query", filters(), RouteKind::Structured);
        let result = engine.run(&mut state, &NoProgress).await;
        assert!(matches!(result, Err(OrchestrateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_routed_end_to_end_structured_pass() {
        let structured = CountingStrategy::with_chunks(
            StrategyKind::Structured,
            vec![chunk("a_chunk_1", StrategyKind::Structured)],
        );
        let hybrid = CountingStrategy::empty(StrategyKind::Hybrid);
        let semantic = CountingStrategy::empty(StrategyKind::Semantic);
        let completion: Arc<dyn CompletionService> = Arc::new(RoleCompletion {
            judge_score: "8".to_string(),
        });
        let engine = Arc::new(SinglePassEngine::new(
            StrategySet::new(
                Arc::clone(&structured) as Arc<dyn RetrievalStrategy>,
                Arc::clone(&hybrid) as Arc<dyn RetrievalStrategy>,
                Arc::clone(&semantic) as Arc<dyn RetrievalStrategy>,
            ),
            Arc::new(EvidenceValidator::new(
                Arc::clone(&completion),
                ValidatorParams::default(),
            )),
            Arc::new(Synthesizer::new(Arc::clone(&completion))),
            OrchestratorParams::default(),
        ));
        let orchestrator = RoutedOrchestrator::new(
            Arc::clone(&completion),
            Arc::clone(&engine),
            ParallelRunner::new(engine, OrchestratorParams::default()),
            MasterSynthesizer::new(completion),
        );

        let query = Query::new("What is the total revenue for BAC in 2023?");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();

        assert_eq!(response.strategy_used, RouteKind::Structured);
        assert!(response.answer.starts_with("synthesized [1]"));
        assert_eq!(response.citations, vec!["a_chunk_1"]);
        assert!(!response.needs_clarification);
        assert_eq!(semantic.call_count(), 0);
        assert_eq!(hybrid.call_count(), 0);
    }
}
