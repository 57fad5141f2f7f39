//! Lenient parsing of model output.
//!
//! Models wrap JSON in markdown fences, add prose around scores, or return
//! fields with the wrong shape. Every parser here degrades to a
//! conservative value instead of failing: an empty filter set, an
//! incomplete critique, a zero score. The orchestrators never see a parse
//! error from this module.

use crate::core::filters::FilterSet;
use crate::critique::{CritiqueResult, QualityTier};
use serde_json::Value;

/// Strip a surrounding markdown code fence (```json ... ``` or ``` ... ```)
/// if present, returning the inner text.
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract a 0..=10 relevance score from model output.
///
/// Takes the first integer found in the text and clamps it into range.
/// Output with no digits scores 0.
pub fn parse_relevance_score(text: &str) -> u8 {
    let cleaned = strip_markdown_fences(text);
    let mut digits = String::new();
    for ch in cleaned.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !digits.is_empty() {
            break;
        }
    }
    digits.parse::<u32>().map_or(0, |n| n.min(10) as u8)
}

/// Parse a filter-extraction response into a [`FilterSet`].
///
/// Malformed JSON yields an empty filter set, which downstream routing
/// treats as "no metadata known".
pub fn parse_filter_extraction(text: &str) -> FilterSet {
    let cleaned = strip_markdown_fences(text);
    let Ok(value) = serde_json::from_str::<Value>(cleaned) else {
        return FilterSet::default();
    };
    let Some(map) = value.as_object() else {
        return FilterSet::default();
    };

    let string_field = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
            .map(str::to_string)
    };

    let year = map.get("year").and_then(|v| match v {
        Value::Number(n) => n.as_i64().map(|y| y as i32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    let terms = map
        .get("terms")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    FilterSet {
        entity: string_field("entity"),
        year,
        quarter: string_field("quarter"),
        doc_type: string_field("doc_type"),
        section: string_field("section"),
        terms,
    }
}

/// Parse a critique response. Anything unparseable becomes the
/// conservative incomplete critique so the planner keeps iterating.
pub fn parse_critique(text: &str) -> CritiqueResult {
    let cleaned = strip_markdown_fences(text);
    let Ok(value) = serde_json::from_str::<Value>(cleaned) else {
        return CritiqueResult::incomplete();
    };
    let Some(map) = value.as_object() else {
        return CritiqueResult::incomplete();
    };

    let is_complete = map
        .get("is_complete")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let confidence_score = map
        .get("confidence_score")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let missing_aspects = map
        .get("missing_aspects")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let quality = map
        .get("quality")
        .and_then(Value::as_str)
        .and_then(QualityTier::from_label)
        .unwrap_or(QualityTier::Poor);

    CritiqueResult {
        is_complete,
        confidence_score,
        missing_aspects,
        quality,
    }
}
