//! Critique results and query refinement for the iterative planner.

use serde::{Deserialize, Serialize};

/// Qualitative tier a critique assigns to a draft answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityTier {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "poor" => Some(Self::Poor),
            "fair" => Some(Self::Fair),
            "good" => Some(Self::Good),
            "excellent" => Some(Self::Excellent),
            _ => None,
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        };
        write!(f, "{s}")
    }
}

/// Self-critique of a draft synthesis.
///
/// When the model's critique cannot be parsed, [`CritiqueResult::incomplete`]
/// is the conservative stand-in: it keeps the loop running rather than
/// accepting an answer nothing vouched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueResult {
    pub is_complete: bool,
    /// Model-reported confidence in [0, 1]
    pub confidence_score: f64,
    /// Aspects of the question the draft does not yet cover
    pub missing_aspects: Vec<String>,
    pub quality: QualityTier,
}

impl CritiqueResult {
    /// Conservative default for an unparseable critique.
    pub fn incomplete() -> Self {
        Self {
            is_complete: false,
            confidence_score: 0.0,
            missing_aspects: Vec::new(),
            quality: QualityTier::Poor,
        }
    }
}

/// Refine a query by appending words drawn from the missing aspects.
///
/// Words already present in the query (case-insensitively) are skipped, as
/// are duplicates across aspects, so refinement converges: once every
/// aspect word is in the query, the refined text equals the input.
pub fn refine_query(query: &str, missing_aspects: &[String]) -> String {
    let lower_query = query.to_ascii_lowercase();
    let mut additions: Vec<&str> = Vec::new();

    for aspect in missing_aspects {
        for word in aspect.split_whitespace() {
            let lower = word.to_ascii_lowercase();
            if !lower_query.contains(&lower)
                && !additions.iter().any(|w| w.eq_ignore_ascii_case(word))
            {
                additions.push(word);
            }
        }
    }

    if additions.is_empty() {
        query.to_string()
    } else {
        format!("{} {}", query.trim(), additions.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_appends_missing_words() {
        let refined = refine_query(
            "summarize cost management",
            &["expense trends".to_string()],
        );
        assert_eq!(refined, "summarize cost management expense trends");
    }

    #[test]
    fn test_refine_skips_words_already_present() {
        let refined = refine_query(
            "expense trends overview",
            &["expense trends".to_string(), "quarterly trends".to_string()],
        );
        assert_eq!(refined, "expense trends overview quarterly");
    }

    #[test]
    fn test_refine_dedupes_across_aspects() {
        let refined = refine_query(
            "capital position",
            &["buffer levels".to_string(), "Buffer ratios".to_string()],
        );
        assert_eq!(refined, "capital position buffer levels ratios");
    }

    #[test]
    fn test_refine_converges() {
        let aspects = vec!["expense trends".to_string()];
        let once = refine_query("cost outlook", &aspects);
        let twice = refine_query(&once, &aspects);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_incomplete_default_is_conservative() {
        let critique = CritiqueResult::incomplete();
        assert!(!critique.is_complete);
        assert_eq!(critique.quality, QualityTier::Poor);
        assert_eq!(critique.confidence_score, 0.0);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(QualityTier::from_label(" Good "), Some(QualityTier::Good));
        assert_eq!(QualityTier::from_label("stellar"), None);
    }
}
