//! Master synthesis - merging completed sub-answers into one response.

use crate::ports::CompletionService;
use finsight_domain::{
    SubTask, offset_markers, order_by_topic_priority,
    prompt::{comprehensive_merge_prompt, simple_merge_prompt},
    renumber_citations,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Sub-answer counts at or below this use the simple combine prompt.
const SIMPLE_MERGE_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct MasterSynthesis {
    pub answer: String,
    pub citations: Vec<String>,
    /// Mean confidence over the merged sub-answers
    pub confidence: f64,
}

/// Merges completed sub-task answers: orders them by topic priority,
/// renumbers citation markers into one consecutive sequence, and asks the
/// completion service to write the combined answer. A completion failure
/// degrades to the deterministic labeled concatenation of the sections.
pub struct MasterSynthesizer {
    completion: Arc<dyn CompletionService>,
}

impl MasterSynthesizer {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn merge(&self, query: &str, tasks: Vec<SubTask>) -> MasterSynthesis {
        let completed: Vec<SubTask> = tasks.into_iter().filter(|t| t.is_completed()).collect();
        let completed_count = completed.len();
        let confidence = if completed_count == 0 {
            0.0
        } else {
            completed.iter().map(|t| t.confidence).sum::<f64>() / completed_count as f64
        };

        let ordered = order_by_topic_priority(completed);

        let mut all_citations: Vec<String> = Vec::new();
        let mut sections = String::new();
        for task in &ordered {
            let Some(answer) = &task.answer else { continue };
            let shifted = offset_markers(answer, all_citations.len());
            all_citations.extend(task.citations.iter().cloned());
            sections.push_str(&format!("### {}\n{}\n\n", task.topic, shifted.trim()));
        }

        let (sections, citations) = renumber_citations(&sections, &all_citations);

        let prompt = if completed_count <= SIMPLE_MERGE_LIMIT {
            simple_merge_prompt(query, &sections)
        } else {
            comprehensive_merge_prompt(query, &sections)
        };

        let answer = match self.completion.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("master synthesis failed, falling back to concatenation: {e}");
                sections.trim_end().to_string()
            }
        };

        info!(
            sub_answers = completed_count,
            citations = citations.len(),
            "merged sub-answers"
        );
        MasterSynthesis {
            answer,
            citations,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CompletionError;
    use async_trait::async_trait;
    use finsight_domain::FilterSet;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockCompletion {
        responses: Mutex<VecDeque<Result<String, CompletionError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockCompletion {
        fn scripted(responses: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionService for MockCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok("merged".to_string()))
        }
    }

    fn completed(id: usize, topic: &str, answer: &str, citations: &[&str]) -> SubTask {
        SubTask::pending(id, topic, FilterSet::default()).complete(
            answer.to_string(),
            citations.iter().map(|c| c.to_string()).collect(),
            0.8,
        )
    }

    #[tokio::test]
    async fn test_markers_renumbered_across_sections() {
        let completion: Arc<dyn CompletionService> = Arc::new(MockCompletion::scripted(vec![Err(
            CompletionError::Timeout,
        )]));
        let synth = MasterSynthesizer::new(completion);

        // Both sections cite their own local [1]; merged they must become
        // [1] and [2]
        let tasks = vec![
            completed(1, "market risk outlook", "var rose [1]", &["mr.txt"]),
            completed(2, "credit quality", "losses fell [1]", &["cq.txt"]),
        ];

        let result = synth.merge("risks", tasks).await;
        assert!(result.answer.contains("var rose [1]"));
        assert!(result.answer.contains("losses fell [2]"));
        assert_eq!(result.citations, vec!["mr.txt", "cq.txt"]);
    }

    #[tokio::test]
    async fn test_sections_follow_topic_priority() {
        let completion = Arc::new(MockCompletion::scripted(vec![Err(
            CompletionError::Timeout,
        )]));
        let synth = MasterSynthesizer::new(completion);

        let tasks = vec![
            completed(1, "liquidity position", "liquid [1]", &["l.txt"]),
            completed(2, "market risk exposure", "exposed [1]", &["m.txt"]),
        ];

        let result = synth.merge("risks", tasks).await;
        let market = result.answer.find("market risk exposure").unwrap();
        let liquidity = result.answer.find("liquidity position").unwrap();
        assert!(market < liquidity);
        // Renumbering follows the reordered sections
        assert_eq!(result.citations, vec!["m.txt", "l.txt"]);
    }

    #[tokio::test]
    async fn test_simple_prompt_for_few_sections() {
        let mock = Arc::new(MockCompletion::scripted(vec![Ok("merged".to_string())]));
        let completion: Arc<dyn CompletionService> = mock.clone();
        let synth = MasterSynthesizer::new(completion);

        let tasks = vec![
            completed(1, "credit quality", "a [1]", &["a.txt"]),
            completed(2, "liquidity position", "b [1]", &["b.txt"]),
        ];
        synth.merge("risks", tasks).await;

        let prompts = mock.prompts.lock().unwrap();
        assert!(prompts[0].contains("Combine the sub-answers"));
    }

    #[tokio::test]
    async fn test_comprehensive_prompt_for_many_sections() {
        let mock = Arc::new(MockCompletion::scripted(vec![Ok("merged".to_string())]));
        let completion: Arc<dyn CompletionService> = mock.clone();
        let synth = MasterSynthesizer::new(completion);

        let tasks = (0..4)
            .map(|i| completed(i, &format!("distinct topic number {i}"), "x [1]", &["s.txt"]))
            .collect();
        synth.merge("risks", tasks).await;

        let prompts = mock.prompts.lock().unwrap();
        assert!(prompts[0].contains("comprehensive answer"));
    }

    #[tokio::test]
    async fn test_incomplete_tasks_excluded() {
        let completion = Arc::new(MockCompletion::scripted(vec![Err(
            CompletionError::Timeout,
        )]));
        let synth = MasterSynthesizer::new(completion);

        let tasks = vec![
            completed(1, "credit quality", "good [1]", &["c.txt"]),
            SubTask::pending(2, "market risk", FilterSet::default()).fail(),
        ];

        let result = synth.merge("risks", tasks).await;
        assert!(result.answer.contains("good [1]"));
        assert!(!result.answer.contains("market risk"));
        assert_eq!(result.citations, vec!["c.txt"]);
    }
}
