//! Citation renumbering and topic-priority ordering for merged answers.
//!
//! When sub-answers are merged, their local citation markers (`[1]`, `[2]`)
//! collide. Renumbering assigns fresh numbers in first-appearance order over
//! the merged text so the final answer reads top to bottom.

use crate::decompose::SubTask;
use std::collections::HashMap;

/// Risk-domain topics ranked by reporting convention. Lower ranks first;
/// topics not listed sort after all ranked ones, in their original order.
const TOPIC_PRIORITY: &[(&str, usize)] = &[
    ("market risk", 1),
    ("credit", 2),
    ("operational", 3),
    ("liquidity", 4),
    ("regulatory", 5),
    ("business strategy", 6),
    ("financial performance", 7),
    ("competitive position", 8),
];

fn topic_rank(topic: &str) -> usize {
    let lower = topic.to_ascii_lowercase();
    TOPIC_PRIORITY
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, rank)| *rank)
        .unwrap_or(usize::MAX)
}

/// Stable-sort sub-tasks into risk-reporting order.
pub fn order_by_topic_priority(mut tasks: Vec<SubTask>) -> Vec<SubTask> {
    tasks.sort_by_key(|task| topic_rank(&task.topic));
    tasks
}

/// Rewrite `[n]` markers in `text` to consecutive numbers in first-seen
/// order, returning the rewritten text and the cited sources in their new
/// order. Markers referencing nothing in `citations` pass through
/// untouched. The mapping is a bijection: each distinct old marker maps to
/// exactly one new number.
pub fn renumber_citations(text: &str, citations: &[String]) -> (String, Vec<String>) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let mut ordered: Vec<String> = Vec::new();
    let mut out = String::with_capacity(text.len());

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'[' {
            if let Some((old, end)) = parse_marker(bytes, i) {
                if old >= 1 && old <= citations.len() {
                    let new = *mapping.entry(old).or_insert_with(|| {
                        ordered.push(citations[old - 1].clone());
                        ordered.len()
                    });
                    out.push_str(&format!("[{new}]"));
                    i = end;
                    continue;
                }
            }
        }
        // Markers are ASCII; anything else copies byte-for-byte on char
        // boundaries because we only enter the branch at '['.
        let ch = text[i..].chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        i += ch.len_utf8();
    }

    (out, ordered)
}

/// Shift every `[n]` marker in `text` by `offset`. Used before merging
/// sub-answers so their locally-numbered markers index into one combined
/// citation list.
pub fn offset_markers(text: &str, offset: usize) -> String {
    if offset == 0 {
        return text.to_string();
    }
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'['
            && let Some((old, end)) = parse_marker(bytes, i)
        {
            out.push_str(&format!("[{}]", old + offset));
            i = end;
            continue;
        }
        let ch = text[i..].chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Parse `[123]` at byte offset `start`. Returns the number and the offset
/// just past the closing bracket.
fn parse_marker(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    let mut i = start + 1;
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start || i >= bytes.len() || bytes[i] != b']' {
        return None;
    }
    let number = std::str::from_utf8(&bytes[digits_start..i])
        .ok()?
        .parse()
        .ok()?;
    Some((number, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::FilterSet;

    fn sources(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("doc_{i}")).collect()
    }

    #[test]
    fn test_first_seen_order() {
        let (text, cited) = renumber_citations("see [2] then [5] then [2]", &sources(5));
        assert_eq!(text, "see [1] then [2] then [1]");
        assert_eq!(cited, vec!["doc_2", "doc_5"]);
    }

    #[test]
    fn test_mapping_is_bijective() {
        let (text, cited) = renumber_citations("[3] [1] [3] [2] [1]", &sources(3));
        assert_eq!(text, "[1] [2] [1] [3] [2]");
        assert_eq!(cited.len(), 3);
        // Three distinct old markers, three distinct new ones
        let distinct: std::collections::HashSet<_> = cited.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_out_of_range_marker_untouched() {
        let (text, cited) = renumber_citations("known [1], unknown [9]", &sources(2));
        assert_eq!(text, "known [1], unknown [9]");
        assert_eq!(cited, vec!["doc_1"]);
    }

    #[test]
    fn test_non_marker_brackets_pass_through() {
        let (text, cited) = renumber_citations("[not a marker] and [1]", &sources(1));
        assert_eq!(text, "[not a marker] and [1]");
        assert_eq!(cited.len(), 1);
    }

    #[test]
    fn test_offset_markers() {
        assert_eq!(offset_markers("see [1] and [2]", 3), "see [4] and [5]");
        assert_eq!(offset_markers("see [1]", 0), "see [1]");
        assert_eq!(offset_markers("[none]", 5), "[none]");
    }

    #[test]
    fn test_topic_priority_ordering() {
        let tasks = vec![
            SubTask::pending(1, "liquidity coverage", FilterSet::default()),
            SubTask::pending(2, "emerging themes", FilterSet::default()),
            SubTask::pending(3, "market risk exposure", FilterSet::default()),
            SubTask::pending(4, "credit quality", FilterSet::default()),
        ];
        let ordered = order_by_topic_priority(tasks);
        let topics: Vec<_> = ordered.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "market risk exposure",
                "credit quality",
                "liquidity coverage",
                "emerging themes"
            ]
        );
    }

    #[test]
    fn test_unranked_topics_keep_relative_order() {
        let tasks = vec![
            SubTask::pending(1, "alpha subject matter", FilterSet::default()),
            SubTask::pending(2, "beta subject matter", FilterSet::default()),
        ];
        let ordered = order_by_topic_priority(tasks);
        assert_eq!(ordered[0].topic, "alpha subject matter");
        assert_eq!(ordered[1].topic, "beta subject matter");
    }
}
