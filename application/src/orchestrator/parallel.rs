//! Parallel runner - bounded concurrent execution of sub-tasks.

use super::OrchestrateError;
use super::state_machine::{PassOutcome, SinglePassEngine};
use crate::ports::{NoProgress, RunProgress};
use finsight_domain::{
    AgentRunState, FallbackChain, FilterSet, RouteKind, SubTask, route_for_topic, routing,
    split_topics,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Runs each sub-topic of a decomposed query through its own
/// single-strategy pass, at most `max_concurrent_subtasks` at a time.
/// Every outcome is collected; a sub-task timing out or failing never
/// aborts its siblings.
pub struct ParallelRunner {
    engine: Arc<SinglePassEngine>,
    params: crate::config::OrchestratorParams,
}

impl ParallelRunner {
    pub fn new(engine: Arc<SinglePassEngine>, params: crate::config::OrchestratorParams) -> Self {
        Self { engine, params }
    }

    pub async fn run(
        &self,
        query: &str,
        filters: &FilterSet,
        progress: &dyn RunProgress,
    ) -> Result<Vec<SubTask>, OrchestrateError> {
        let topics = split_topics(query);
        info!(sub_tasks = topics.len(), "decomposed query");

        let semaphore = Arc::new(Semaphore::new(self.params.max_concurrent_subtasks.max(1)));
        let mut join_set = JoinSet::new();

        for (id, topic) in topics.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let filters = filters.clone();
            let deadline = self.params.subtask_timeout;

            join_set.spawn(async move {
                let task = SubTask::pending(id, topic.clone(), filters.clone());
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return task.error();
                };

                let strategy = route_for_topic(&topic, &filters);
                let mut state =
                    AgentRunState::new(topic, filters, RouteKind::from(strategy));
                state.chain = FallbackChain::new(strategy, &routing::rotation_after(strategy));

                let pass = engine.run(&mut state, &NoProgress);
                let outcome = match deadline {
                    Some(limit) => match tokio::time::timeout(limit, pass).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(id, "sub-task deadline exceeded");
                            return task.error();
                        }
                    },
                    None => pass.await,
                };

                match outcome {
                    Ok(PassOutcome::Answered(synthesis)) => task.complete(
                        synthesis.answer,
                        synthesis.citations,
                        synthesis.confidence,
                    ),
                    Ok(PassOutcome::Exhausted(_)) => task.fail(),
                    Err(e) => {
                        warn!(id, "sub-task errored: {e}");
                        task.error()
                    }
                }
            });
        }

        let mut tasks = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(task) => {
                    progress.on_subtask_complete(task.id, &task.topic, task.is_completed());
                    tasks.push(task);
                }
                Err(e) => warn!("sub-task join error: {e}"),
            }
        }

        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }
}
