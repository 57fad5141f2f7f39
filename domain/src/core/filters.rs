//! Filter set extracted from a query.
//!
//! A [`FilterSet`] scopes retrieval to an entity (company ticker), a time
//! period (year + quarter), a document type, a section, and free-text terms.
//! All fields are optional so filters can be discovered progressively.

use serde::{Deserialize, Serialize};

/// Metadata filters scoping a retrieval request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Entity (company ticker) the query is about, e.g. "BAC"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Fiscal year, e.g. 2024
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Quarter label, e.g. "Q1"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
    /// Document type, e.g. "10-K"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Named section within a document, e.g. "Risk Factors"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Free-text terms to search for
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.entity.is_none()
            && self.year.is_none()
            && self.quarter.is_none()
            && self.doc_type.is_none()
            && self.section.is_none()
            && self.terms.is_empty()
    }

    /// True when the filters pin down both an entity and a time period.
    pub fn has_entity_and_period(&self) -> bool {
        self.entity.is_some() && (self.year.is_some() || self.quarter.is_some())
    }

    pub fn has_temporal(&self) -> bool {
        self.year.is_some() || self.quarter.is_some()
    }

    /// Weighted completeness score in [0, 1].
    ///
    /// Entity carries the most weight, then year, doc type, and quarter.
    pub fn completeness(&self) -> f64 {
        let mut score: f64 = 0.0;
        if self.entity.is_some() {
            score += 0.4;
        }
        if self.year.is_some() {
            score += 0.3;
        }
        if self.doc_type.is_some() {
            score += 0.2;
        }
        if self.quarter.is_some() {
            score += 0.1;
        }
        score.min(1.0)
    }

    /// A copy keeping only the entity filter. Used by the hybrid strategy's
    /// relaxation ladder.
    pub fn entity_only(&self) -> FilterSet {
        FilterSet {
            entity: self.entity.clone(),
            ..FilterSet::default()
        }
    }

    /// Merge fields from `other`, keeping already-present values.
    pub fn merge_missing(&mut self, other: FilterSet) {
        if self.entity.is_none() {
            self.entity = other.entity;
        }
        if self.year.is_none() {
            self.year = other.year;
        }
        if self.quarter.is_none() {
            self.quarter = other.quarter;
        }
        if self.doc_type.is_none() {
            self.doc_type = other.doc_type;
        }
        if self.section.is_none() {
            self.section = other.section;
        }
        for term in other.terms {
            if !self.terms.iter().any(|t| t.eq_ignore_ascii_case(&term)) {
                self.terms.push(term);
            }
        }
    }

    /// Lexical scan for the filter fields that simple token patterns can
    /// recover: a four-digit year in the 2020s/2030s, a quarter label, and a
    /// handful of known document-type tokens. Entity extraction is left to
    /// the completion service, which is far better at name resolution.
    pub fn from_lexical_scan(query: &str) -> FilterSet {
        let mut filters = FilterSet::default();

        for token in query.split(|c: char| !c.is_ascii_alphanumeric() && c != '-') {
            if filters.year.is_none()
                && token.len() == 4
                && (token.starts_with("202") || token.starts_with("203"))
                && let Ok(year) = token.parse::<i32>()
            {
                filters.year = Some(year);
            }

            if filters.quarter.is_none()
                && token.len() == 2
                && let Some(rest) = token.strip_prefix(['Q', 'q'])
                && matches!(rest, "1" | "2" | "3" | "4")
            {
                filters.quarter = Some(format!("Q{rest}"));
            }

            if filters.doc_type.is_none() {
                let upper = token.to_ascii_uppercase();
                if matches!(upper.as_str(), "10-K" | "10-Q" | "8-K") {
                    filters.doc_type = Some(upper);
                }
            }
        }

        // "Quarter 3" spelled out
        if filters.quarter.is_none() {
            let lower = query.to_ascii_lowercase();
            if let Some(pos) = lower.find("quarter ") {
                let digit = lower[pos + 8..].chars().next();
                if let Some(d) = digit
                    && ('1'..='4').contains(&d)
                {
                    filters.quarter = Some(format!("Q{d}"));
                }
            }
        }

        filters
    }
}

impl std::fmt::Display for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(entity) = &self.entity {
            parts.push(format!("entity={entity}"));
        }
        if let Some(year) = self.year {
            parts.push(format!("year={year}"));
        }
        if let Some(quarter) = &self.quarter {
            parts.push(format!("quarter={quarter}"));
        }
        if let Some(doc_type) = &self.doc_type {
            parts.push(format!("doc_type={doc_type}"));
        }
        if let Some(section) = &self.section {
            parts.push(format!("section={section}"));
        }
        if parts.is_empty() {
            write!(f, "(unfiltered)")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_scan_year_and_quarter() {
        let filters = FilterSet::from_lexical_scan("What were BAC's top risks in 2025 Q1?");
        assert_eq!(filters.year, Some(2025));
        assert_eq!(filters.quarter, Some("Q1".to_string()));
        assert!(filters.entity.is_none());
    }

    #[test]
    fn test_lexical_scan_doc_type() {
        let filters = FilterSet::from_lexical_scan("From the 2024 10-K filing, summarize the MD&A");
        assert_eq!(filters.doc_type, Some("10-K".to_string()));
        assert_eq!(filters.year, Some(2024));
    }

    #[test]
    fn test_lexical_scan_spelled_out_quarter() {
        let filters = FilterSet::from_lexical_scan("revenue in quarter 3 of 2024");
        assert_eq!(filters.quarter, Some("Q3".to_string()));
    }

    #[test]
    fn test_lexical_scan_ignores_old_years() {
        let filters = FilterSet::from_lexical_scan("results since 1999");
        assert!(filters.year.is_none());
    }

    #[test]
    fn test_completeness_weights() {
        let mut filters = FilterSet::default();
        assert_eq!(filters.completeness(), 0.0);

        filters.entity = Some("JPM".to_string());
        assert!((filters.completeness() - 0.4).abs() < 1e-9);

        filters.year = Some(2024);
        filters.quarter = Some("Q2".to_string());
        filters.doc_type = Some("10-Q".to_string());
        assert!((filters.completeness() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_entity_only_drops_everything_else() {
        let filters = FilterSet {
            entity: Some("WFC".to_string()),
            year: Some(2024),
            quarter: Some("Q4".to_string()),
            doc_type: Some("10-K".to_string()),
            section: None,
            terms: vec!["liquidity".to_string()],
        };
        let relaxed = filters.entity_only();
        assert_eq!(relaxed.entity, Some("WFC".to_string()));
        assert!(relaxed.year.is_none());
        assert!(relaxed.terms.is_empty());
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut filters = FilterSet {
            entity: Some("BAC".to_string()),
            ..FilterSet::default()
        };
        filters.merge_missing(FilterSet {
            entity: Some("JPM".to_string()),
            year: Some(2025),
            ..FilterSet::default()
        });
        assert_eq!(filters.entity, Some("BAC".to_string()));
        assert_eq!(filters.year, Some(2025));
    }
}
