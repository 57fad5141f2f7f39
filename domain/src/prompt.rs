//! Prompt construction for the completion service.
//!
//! All prompts are built here so the application layer never concatenates
//! prompt text inline. Templates ask for strict output shapes (bare JSON,
//! a single integer) and the parsers in [`crate::parsing`] tolerate the
//! ways models deviate from them anyway.

use crate::critique::CritiqueResult;
use crate::evidence::chunk::EvidenceChunk;

/// Character budget for the evidence text shown to the relevance judge.
pub const JUDGE_PASSAGE_CHAR_BUDGET: usize = 3000;

/// Truncate on a char boundary at most `max_chars` characters in.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Prompt asking the model to extract metadata filters from a query.
pub fn filter_extraction_prompt(query: &str) -> String {
    format!(
        "Extract document metadata filters from this financial research question.\n\
         Respond with only a JSON object with these keys (use null when absent):\n\
         {{\"entity\": string, \"year\": number, \"quarter\": string, \
         \"doc_type\": string, \"section\": string, \"terms\": [string]}}\n\n\
         Question: {query}"
    )
}

/// Prompt asking the model to judge a passage's usefulness for a query.
/// Expects a single integer 0-10 back.
pub fn relevance_prompt(query: &str, passage: &str) -> String {
    let passage = truncate_chars(passage, JUDGE_PASSAGE_CHAR_BUDGET);
    format!(
        "Rate how useful the passage below is for answering the question, \
         on a scale of 0 (useless) to 10 (directly answers it). \
         Respond with only the integer.\n\n\
         Question: {query}\n\nPassage:\n{passage}"
    )
}

/// Format validated chunks into a numbered citation context block.
pub fn citation_context(chunks: &[EvidenceChunk]) -> String {
    let mut context = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        context.push_str(&format!("[{}] {}\n\n", i + 1, chunk.text.trim()));
    }
    context
}

/// Prompt for synthesizing an answer from a numbered evidence context.
pub fn synthesis_prompt(query: &str, context: &str) -> String {
    format!(
        "Answer the question using only the numbered evidence passages below. \
         Cite passages inline as [n]. If the evidence does not cover part of \
         the question, say so rather than guessing.\n\n\
         Question: {query}\n\nEvidence:\n{context}"
    )
}

/// Prompt merging a small number of sub-answers (simple form).
pub fn simple_merge_prompt(query: &str, sections: &str) -> String {
    format!(
        "Combine the sub-answers below into one coherent answer to the \
         question, at most 8 sentences long. Keep every inline citation \
         marker exactly as written.\n\n\
         Question: {query}\n\nSub-answers:\n{sections}"
    )
}

/// Prompt merging many sub-answers (comprehensive form, with structure).
pub fn comprehensive_merge_prompt(query: &str, sections: &str) -> String {
    format!(
        "Synthesize the sub-answers below into a comprehensive answer to the \
         question. Organize by topic with at most 6 sentences per topic, \
         preserve every inline citation marker exactly as written, and note \
         any topics the sub-answers could not cover.\n\n\
         Question: {query}\n\nSub-answers:\n{sections}"
    )
}

/// Prompt asking the model to critique a draft answer.
pub fn critique_prompt(query: &str, draft: &str) -> String {
    format!(
        "Critique the draft answer against the question. Respond with only a \
         JSON object:\n\
         {{\"is_complete\": bool, \"confidence_score\": number in [0,1], \
         \"missing_aspects\": [string], \
         \"quality\": \"poor\"|\"fair\"|\"good\"|\"excellent\"}}\n\n\
         Question: {query}\n\nDraft answer:\n{draft}"
    )
}

/// Footer appended to a synthesis when the critique says coverage is
/// partial, listing what the answer could not establish.
pub fn coverage_caveat(critique: &CritiqueResult) -> Option<String> {
    if critique.is_complete || critique.missing_aspects.is_empty() {
        return None;
    }
    Some(format!(
        "\n\nNote: available documents did not fully cover: {}.",
        critique.missing_aspects.join("; ")
    ))
}
