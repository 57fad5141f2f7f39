//! Console output formatter for query responses

use colored::Colorize;
use finsight_domain::QueryResponse;

/// Formats query responses for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete response
    pub fn format(question: &str, response: &QueryResponse) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Finsight"));
        output.push('\n');

        output.push_str(&format!("{} {}\n\n", "Question:".cyan().bold(), question));

        if response.needs_clarification {
            output.push_str(&format!(
                "{}\n{}\n",
                "Clarification needed:".yellow().bold(),
                response.answer
            ));
            output.push_str(&Self::footer());
            return output;
        }

        output.push_str(&format!(
            "{} {}\n\n",
            "Strategy:".cyan().bold(),
            response.strategy_used
        ));

        output.push_str(&Self::section_header("Answer"));
        output.push_str(&format!("\n{}\n", response.answer));

        if !response.citations.is_empty() {
            output.push_str(&Self::section_header("Sources"));
            for (i, id) in response.citations.iter().enumerate() {
                output.push_str(&format!("  [{}] {}\n", i + 1, id));
            }
        }

        if !response.confidence.is_empty() {
            output.push_str(&Self::section_header("Confidence"));
            for (key, score) in &response.confidence {
                output.push_str(&format!("  {key}: {score:.2}\n"));
            }
            output.push_str(&format!(
                "  {} {:.2}\n",
                "overall:".bold(),
                response.overall_confidence()
            ));
        }

        if !response.trace.is_empty() {
            output.push_str(&Self::section_header("Trace"));
            for line in &response.trace {
                output.push_str(&format!("  {}\n", line.dimmed()));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(response: &QueryResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the answer only (concise output)
    pub fn format_answer_only(response: &QueryResponse) -> String {
        let mut output = String::new();
        if response.needs_clarification {
            output.push_str(&format!("{} ", "Clarification needed:".yellow().bold()));
        }
        output.push_str(&response.answer);
        output.push('\n');
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_domain::RouteKind;
    use std::collections::BTreeMap;

    fn response() -> QueryResponse {
        QueryResponse {
            answer: "Net interest income rose in 2023 [1].".to_string(),
            citations: vec!["bac_2023_chunk_4".to_string()],
            strategy_used: RouteKind::Hybrid,
            confidence: BTreeMap::from([("validation_quality".to_string(), 0.8)]),
            trace: vec!["planning".to_string(), "complete".to_string()],
            needs_clarification: false,
        }
    }

    #[test]
    fn test_full_format_includes_sections() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format("What happened to NII?", &response());
        assert!(text.contains("Answer"));
        assert!(text.contains("[1] bac_2023_chunk_4"));
        assert!(text.contains("validation_quality: 0.80"));
        assert!(text.contains("planning"));
    }

    #[test]
    fn test_clarification_short_circuits() {
        colored::control::set_override(false);
        let mut resp = response();
        resp.needs_clarification = true;
        resp.answer = "Which year should I use?".to_string();
        let text = ConsoleFormatter::format("revenue?", &resp);
        assert!(text.contains("Clarification needed:"));
        assert!(!text.contains("Sources"));
    }

    #[test]
    fn test_json_round_trips() {
        let text = ConsoleFormatter::format_json(&response());
        let parsed: QueryResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.citations, vec!["bac_2023_chunk_4"]);
    }
}
