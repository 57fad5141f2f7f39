//! The iterative orchestrator - critique-driven retrieval refinement.
//!
//! Instead of one validated pass, this planner accumulates evidence over
//! several batches, synthesizes after each, and asks the model to critique
//! its own draft. Incomplete critiques refine the working query with the
//! missing aspects; a refinement that changes nothing advances the
//! pagination offset instead. The loop stops on a complete critique, an
//! exhausted corpus, or the iteration/chunk budget - budget stops return
//! the best draft with a coverage caveat.

use super::{OrchestrateError, Orchestrator, extract_filters};
use crate::config::OrchestratorParams;
use crate::ports::{CompletionService, RunProgress, StructuredStore};
use crate::retrieval::{RetrievalRequest, StrategySet};
use crate::synthesizer::{Synthesis, Synthesizer};
use async_trait::async_trait;
use finsight_domain::{
    AgentRunState, CritiqueResult, Query, QueryResponse, RouteKind, RunStage, StrategyKind,
    agent::{introspection_answer, is_introspection},
    parse_critique,
    prompt::{coverage_caveat, critique_prompt},
    refine_query,
    routing::rotation_after,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct IterativeOrchestrator {
    completion: Arc<dyn CompletionService>,
    strategies: StrategySet,
    synthesizer: Arc<Synthesizer>,
    store: Arc<dyn StructuredStore>,
    params: OrchestratorParams,
    cancel: CancellationToken,
}

impl IterativeOrchestrator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        strategies: StrategySet,
        synthesizer: Arc<Synthesizer>,
        store: Arc<dyn StructuredStore>,
        params: OrchestratorParams,
    ) -> Self {
        Self {
            completion,
            strategies,
            synthesizer,
            store,
            params,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Answer a question about the system itself from the store's
    /// discovery interface, without any retrieval.
    async fn introspect(&self) -> QueryResponse {
        let mut answer = introspection_answer();
        match self.store.available_years(None).await {
            Ok(years) if !years.is_empty() => {
                let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
                answer.push_str(&format!(
                    "\n\nThe loaded corpus covers these years: {}.",
                    listed.join(", ")
                ));
            }
            Ok(_) => {}
            Err(e) => warn!("inventory lookup failed during introspection: {e}"),
        }
        QueryResponse {
            answer,
            citations: Vec::new(),
            strategy_used: RouteKind::Structured,
            confidence: Default::default(),
            trace: vec!["introspection".to_string()],
            needs_clarification: false,
        }
    }

    /// Structured mode without a year: look at what years the store
    /// actually has. Too many candidates means guessing would likely be
    /// wrong, so ask instead; a few means take the most recent.
    async fn discover_year(
        &self,
        entity: &str,
        state: &mut AgentRunState,
    ) -> Option<QueryResponse> {
        let years = match self.store.available_years(Some(entity)).await {
            Ok(years) => years,
            Err(e) => {
                warn!("metadata discovery failed: {e}");
                return None;
            }
        };
        if years.is_empty() {
            return None;
        }
        if years.len() > self.params.clarification_year_threshold {
            let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
            info!(candidates = years.len(), "asking for a year instead of guessing");
            return Some(QueryResponse::clarification(
                format!(
                    "I have data for {entity} across {} years ({}). Which year \
                     should I use?",
                    years.len(),
                    listed.join(", ")
                ),
                RouteKind::Structured,
            ));
        }
        let recent = years[0];
        debug!(year = recent, "auto-selected most recent year");
        state.filters.year = Some(recent);
        state.push_trace(format!("auto-selected year {recent}"));
        None
    }

    /// One retrieval attempt: the current strategy at the current offset,
    /// rotating through the other two strategies when a batch comes back
    /// empty. Never retries a strategy within the same attempt.
    async fn retrieve_batch(&self, state: &mut AgentRunState) -> Vec<finsight_domain::EvidenceChunk> {
        let current = state.strategy;
        let mut order = vec![current];
        order.extend(rotation_after(current));

        for strategy in order {
            let request = RetrievalRequest::new(state.query.clone(), state.filters.clone())
                .with_limit(self.params.batch_size)
                .with_offset(state.offset);
            let batch = self.strategies.get(strategy).retrieve(&request).await;
            state.record_strategy(strategy);
            if !batch.is_empty() {
                return batch;
            }
            debug!(%strategy, offset = state.offset, "empty batch, rotating");
        }
        Vec::new()
    }

    async fn critique(&self, query: &str, draft: &str) -> CritiqueResult {
        match self.completion.complete(&critique_prompt(query, draft)).await {
            Ok(text) => parse_critique(&text),
            Err(e) => {
                warn!("critique failed, treating draft as incomplete: {e}");
                CritiqueResult::incomplete()
            }
        }
    }

    fn finish(
        &self,
        mut state: AgentRunState,
        best: Option<Synthesis>,
        reason: &str,
    ) -> QueryResponse {
        state.push_trace(format!("stopped: {reason}"));
        match best {
            Some(synthesis) => {
                let mut answer = synthesis.answer;
                if let Some(critique) = &state.last_critique
                    && let Some(caveat) = coverage_caveat(critique)
                {
                    answer.push_str(&caveat);
                }
                state.record_confidence("evidence_relevance", synthesis.confidence);
                state.into_response(answer, synthesis.citations)
            }
            None => {
                let answer = format!(
                    "I could not find any evidence for this question. I tried {} \
                     retrieval scoped to {}.\n\nSuggestions: name the company \
                     explicitly, specify a year covered by the loaded filings, \
                     or broaden the question.",
                    state
                        .strategies_attempted()
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    state.filters,
                );
                state.into_response(answer, Vec::new())
            }
        }
    }
}

#[async_trait]
impl Orchestrator for IterativeOrchestrator {
    async fn run_query(
        &self,
        query: &Query,
        progress: &dyn RunProgress,
    ) -> Result<QueryResponse, OrchestrateError> {
        if is_introspection(query.text()) {
            info!("introspection query, skipping retrieval");
            return Ok(self.introspect().await);
        }

        progress.on_stage(RunStage::Planning);
        let filters = extract_filters(self.completion.as_ref(), query.text()).await;

        // Mode detection: explicit metadata means the structured store is
        // the richer starting point, otherwise go semantic.
        let structured_mode =
            filters.entity.is_some() || filters.year.is_some() || filters.section.is_some();
        let route = if structured_mode {
            RouteKind::Structured
        } else {
            RouteKind::Semantic
        };
        info!(%route, %filters, "iterative mode selected");

        let mut state = AgentRunState::new(query.text(), filters, route);
        state.enter_stage(RunStage::Planning);

        if structured_mode
            && state.filters.year.is_none()
            && let Some(entity) = state.filters.entity.clone()
            && let Some(clarification) = self.discover_year(&entity, &mut state).await
        {
            return Ok(clarification);
        }

        let mut best: Option<Synthesis> = None;

        loop {
            if self.cancel.is_cancelled() {
                return Err(OrchestrateError::Cancelled);
            }
            if state.iteration >= self.params.max_iterations {
                return Ok(self.finish(state, best, "iteration budget reached"));
            }
            if state.chunks().len() >= self.params.max_total_chunks {
                return Ok(self.finish(state, best, "chunk budget reached"));
            }
            state.iteration += 1;

            state.enter_stage(RunStage::Retrieving);
            progress.on_stage(RunStage::Retrieving);
            let batch = self.retrieve_batch(&mut state).await;
            let added = state.absorb(batch);
            debug!(iteration = state.iteration, added, total = state.chunks().len(), "batch absorbed");

            if added == 0 {
                return Ok(self.finish(state, best, "no further evidence available"));
            }

            state.enter_stage(RunStage::Synthesizing);
            progress.on_stage(RunStage::Synthesizing);
            let draft = self.synthesizer.synthesize(&state.query, state.chunks()).await?;

            state.enter_stage(RunStage::Critiquing);
            progress.on_stage(RunStage::Critiquing);
            let critique = self.critique(&state.original_query, &draft.answer).await;
            state.record_confidence("critique", critique.confidence_score);
            progress.on_iteration(state.iteration, state.chunks().len());

            if critique.is_complete {
                state.last_critique = Some(critique);
                state.record_confidence("evidence_relevance", draft.confidence);
                return Ok(state.into_response(draft.answer, draft.citations));
            }

            if critique.missing_aspects.is_empty() {
                state.offset += self.params.batch_size;
            } else {
                let refined = refine_query(&state.query, &critique.missing_aspects);
                if state.apply_refinement(refined) {
                    debug!(query = %state.query, "refined working query");
                } else {
                    state.offset += self.params.batch_size;
                }
            }

            state.last_critique = Some(critique);
            best = Some(draft);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorParams;
    use crate::ports::{
        CompletionError, NoProgress, StoreError, StoredPassage, StructuredStore,
    };
    use crate::retrieval::RetrievalStrategy;
    use finsight_domain::{ChunkMetadata, EvidenceChunk, FilterSet};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Completion that scripts critiques and answers other prompts by role.
    struct RoleCompletion {
        extraction: String,
        critiques: Mutex<VecDeque<String>>,
    }

    impl RoleCompletion {
        fn new(extraction: &str, critiques: Vec<&str>) -> Self {
            Self {
                extraction: extraction.to_string(),
                critiques: Mutex::new(critiques.into_iter().map(String::from).collect()),
            }
        }
    }

    #[async_trait]
    impl CompletionService for RoleCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            if prompt.starts_with("Extract document metadata") {
                Ok(self.extraction.clone())
            } else if prompt.starts_with("Critique the draft") {
                Ok(self
                    .critiques
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| r#"{"is_complete": true, "confidence_score": 0.9, "missing_aspects": [], "quality": "good"}"#.to_string()))
            } else {
                Ok("draft answer [1]".to_string())
            }
        }
    }

    /// Strategy replaying scripted batches and recording each request.
    struct ScriptedStrategy {
        kind: StrategyKind,
        batches: Mutex<VecDeque<Vec<EvidenceChunk>>>,
        requests: Mutex<Vec<(String, usize)>>,
        calls: AtomicUsize,
    }

    impl ScriptedStrategy {
        fn new(kind: StrategyKind, batches: Vec<Vec<EvidenceChunk>>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                batches: Mutex::new(batches.into()),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn empty(kind: StrategyKind) -> Arc<Self> {
            Self::new(kind, Vec::new())
        }

        fn requests(&self) -> Vec<(String, usize)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RetrievalStrategy for ScriptedStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn retrieve(&self, request: &RetrievalRequest) -> Vec<EvidenceChunk> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((request.query.clone(), request.offset));
            self.batches.lock().unwrap().pop_front().unwrap_or_default()
        }
    }

    struct MockStore {
        years: Vec<i32>,
    }

    #[async_trait]
    impl StructuredStore for MockStore {
        async fn query(
            &self,
            _filters: &FilterSet,
            _limit: usize,
            _offset: usize,
        ) -> Result<Vec<StoredPassage>, StoreError> {
            Ok(Vec::new())
        }

        async fn search_text(
            &self,
            _entity: Option<&str>,
            _term: &str,
            _limit: usize,
        ) -> Result<Vec<StoredPassage>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_by_ids(&self, _ids: &[String]) -> Result<Vec<StoredPassage>, StoreError> {
            Ok(Vec::new())
        }

        async fn available_years(&self, _entity: Option<&str>) -> Result<Vec<i32>, StoreError> {
            Ok(self.years.clone())
        }

        async fn available_sections(
            &self,
            _entity: &str,
            _year: i32,
        ) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn chunk(id: &str) -> EvidenceChunk {
        EvidenceChunk::new(
            id,
            format!("text for {id}"),
            0.8,
            StrategyKind::Semantic,
            ChunkMetadata::default(),
        )
    }

    fn orchestrator(
        extraction: &str,
        critiques: Vec<&str>,
        structured: Arc<ScriptedStrategy>,
        hybrid: Arc<ScriptedStrategy>,
        semantic: Arc<ScriptedStrategy>,
        years: Vec<i32>,
        params: OrchestratorParams,
    ) -> IterativeOrchestrator {
        let completion: Arc<dyn CompletionService> =
            Arc::new(RoleCompletion::new(extraction, critiques));
        IterativeOrchestrator::new(
            Arc::clone(&completion),
            StrategySet::new(structured, hybrid, semantic),
            Arc::new(Synthesizer::new(completion)),
            Arc::new(MockStore { years }),
            params,
        )
    }

    const INCOMPLETE_EXPENSES: &str = r#"{"is_complete": false, "confidence_score": 0.4, "missing_aspects": ["expense trends"], "quality": "fair"}"#;
    const COMPLETE: &str = r#"{"is_complete": true, "confidence_score": 0.9, "missing_aspects": [], "quality": "good"}"#;

    #[tokio::test]
    async fn test_refinement_appends_missing_aspects_and_resets_offset() {
        let semantic = ScriptedStrategy::new(
            StrategyKind::Semantic,
            vec![vec![chunk("a_chunk_1")], vec![chunk("a_chunk_2")]],
        );
        let orchestrator = orchestrator(
            "{}",
            vec![INCOMPLETE_EXPENSES, COMPLETE],
            ScriptedStrategy::empty(StrategyKind::Structured),
            ScriptedStrategy::empty(StrategyKind::Hybrid),
            Arc::clone(&semantic),
            vec![],
            OrchestratorParams::default(),
        );

        let query = Query::new("summarize cost management performance");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();
        assert!(!response.needs_clarification);

        let requests = semantic.requests();
        assert_eq!(requests.len(), 2);
        // First batch: original query at offset 0
        assert_eq!(requests[0].1, 0);
        // Second batch: refined query carrying the missing aspect, offset
        // reset to 0
        assert!(requests[1].0.contains("expense trends"));
        assert_eq!(requests[1].1, 0);
    }

    #[tokio::test]
    async fn test_identical_refinement_advances_offset() {
        // The missing aspect is already in the query, so refinement is a
        // no-op and the planner must page forward instead
        let semantic = ScriptedStrategy::new(
            StrategyKind::Semantic,
            vec![vec![chunk("a_chunk_1")], vec![chunk("a_chunk_2")]],
        );
        let critique =
            r#"{"is_complete": false, "confidence_score": 0.4, "missing_aspects": ["cost management"], "quality": "fair"}"#;
        let orchestrator = orchestrator(
            "{}",
            vec![critique, COMPLETE],
            ScriptedStrategy::empty(StrategyKind::Structured),
            ScriptedStrategy::empty(StrategyKind::Hybrid),
            Arc::clone(&semantic),
            vec![],
            OrchestratorParams::default(),
        );

        let query = Query::new("cost management overview");
        orchestrator.run_query(&query, &NoProgress).await.unwrap();

        let requests = semantic.requests();
        assert_eq!(requests[1].1, OrchestratorParams::default().batch_size);
        assert_eq!(requests[0].0, requests[1].0);
    }

    #[tokio::test]
    async fn test_empty_batch_rotates_strategies() {
        // Structured mode (entity extracted) but the store has nothing;
        // the rotation reaches semantic which does
        let structured = ScriptedStrategy::empty(StrategyKind::Structured);
        let semantic =
            ScriptedStrategy::new(StrategyKind::Semantic, vec![vec![chunk("a_chunk_1")]]);
        let hybrid = ScriptedStrategy::empty(StrategyKind::Hybrid);
        let orchestrator = orchestrator(
            r#"{"entity": "BAC", "year": 2023}"#,
            vec![COMPLETE],
            Arc::clone(&structured),
            Arc::clone(&hybrid),
            Arc::clone(&semantic),
            vec![2023],
            OrchestratorParams::default(),
        );

        let query = Query::new("BAC capital position in 2023");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();

        assert_eq!(structured.calls.load(Ordering::SeqCst), 1);
        assert_eq!(semantic.calls.load(Ordering::SeqCst), 1);
        assert!(!response.answer.is_empty());
    }

    #[tokio::test]
    async fn test_budget_stop_appends_coverage_caveat() {
        let params = OrchestratorParams::default().with_max_iterations(1);
        let semantic =
            ScriptedStrategy::new(StrategyKind::Semantic, vec![vec![chunk("a_chunk_1")]]);
        let orchestrator = orchestrator(
            "{}",
            vec![INCOMPLETE_EXPENSES],
            ScriptedStrategy::empty(StrategyKind::Structured),
            ScriptedStrategy::empty(StrategyKind::Hybrid),
            semantic,
            vec![],
            params,
        );

        let query = Query::new("summarize cost management performance");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();

        assert!(response.answer.contains("did not fully cover"));
        assert!(response.answer.contains("expense trends"));
        assert!(response.trace.iter().any(|t| t.contains("budget")));
    }

    #[tokio::test]
    async fn test_many_candidate_years_ask_for_clarification() {
        let orchestrator = orchestrator(
            r#"{"entity": "BAC"}"#,
            vec![],
            ScriptedStrategy::empty(StrategyKind::Structured),
            ScriptedStrategy::empty(StrategyKind::Hybrid),
            ScriptedStrategy::empty(StrategyKind::Semantic),
            vec![2025, 2024, 2023, 2022, 2021],
            OrchestratorParams::default(),
        );

        let query = Query::new("BAC total deposits");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();

        assert!(response.needs_clarification);
        assert!(response.answer.contains("Which year"));
        assert!(response.answer.contains("2025"));
    }

    #[tokio::test]
    async fn test_few_candidate_years_auto_select_recent() {
        let structured = ScriptedStrategy::new(
            StrategyKind::Structured,
            vec![vec![chunk("a_chunk_1")]],
        );
        let orchestrator = orchestrator(
            r#"{"entity": "BAC"}"#,
            vec![COMPLETE],
            Arc::clone(&structured),
            ScriptedStrategy::empty(StrategyKind::Hybrid),
            ScriptedStrategy::empty(StrategyKind::Semantic),
            vec![2025, 2024],
            OrchestratorParams::default(),
        );

        let query = Query::new("BAC total deposits");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();

        assert!(!response.needs_clarification);
        assert!(response.trace.iter().any(|t| t.contains("2025")));
    }

    #[tokio::test]
    async fn test_introspection_skips_retrieval() {
        let semantic = ScriptedStrategy::empty(StrategyKind::Semantic);
        let orchestrator = orchestrator(
            "{}",
            vec![],
            ScriptedStrategy::empty(StrategyKind::Structured),
            ScriptedStrategy::empty(StrategyKind::Hybrid),
            Arc::clone(&semantic),
            vec![2024, 2023],
            OrchestratorParams::default(),
        );

        let query = Query::new("What can you do?");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();

        assert_eq!(semantic.calls.load(Ordering::SeqCst), 0);
        assert!(response.answer.contains("2024"));
        assert_eq!(response.trace, vec!["introspection"]);
    }

    #[tokio::test]
    async fn test_no_evidence_anywhere_is_explanatory() {
        let orchestrator = orchestrator(
            "{}",
            vec![],
            ScriptedStrategy::empty(StrategyKind::Structured),
            ScriptedStrategy::empty(StrategyKind::Hybrid),
            ScriptedStrategy::empty(StrategyKind::Semantic),
            vec![],
            OrchestratorParams::default(),
        );

        let query = Query::new("something entirely uncovered");
        let response = orchestrator.run_query(&query, &NoProgress).await.unwrap();

        assert!(response.citations.is_empty());
        assert!(response.answer.contains("Suggestions"));
    }
}
