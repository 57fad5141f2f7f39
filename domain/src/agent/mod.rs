//! Agent run state and capability introspection.

pub mod run_state;

pub use run_state::{AgentRunState, QueryResponse, RunStage};

const INTROSPECTION_PHRASES: &[&str] = &[
    "who are you",
    "what are you",
    "what can you do",
    "what do you do",
    "how do you work",
    "what are your capabilities",
    "help me understand what you",
];

/// Whether a query asks about the system itself rather than the corpus.
/// Such queries are answered directly without any retrieval.
pub fn is_introspection(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    INTROSPECTION_PHRASES.iter().any(|p| lower.contains(p))
}

/// The canned capability answer for introspection queries.
pub fn introspection_answer() -> String {
    "I answer questions about financial filings by retrieving evidence from \
     an indexed document corpus. I can look up specific figures, explain and \
     summarize disclosures, and compare entities or topics across filings. \
     Ask me about a company, period, or topic covered by the loaded documents."
        .to_string()
}
