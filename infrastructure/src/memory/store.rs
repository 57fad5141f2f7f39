//! In-memory structured store.

use async_trait::async_trait;
use finsight_application::ports::{StoreError, StoredPassage, StructuredStore};
use finsight_domain::FilterSet;
use std::collections::BTreeSet;

/// Passage store backed by a sorted in-memory list.
///
/// Query results are recent-first (year descending, then id ascending),
/// which keeps pagination deterministic for identical contents.
pub struct InMemoryStructuredStore {
    passages: Vec<StoredPassage>,
}

impl InMemoryStructuredStore {
    pub fn new(mut passages: Vec<StoredPassage>) -> Self {
        passages.sort_by(|a, b| {
            b.metadata
                .year
                .cmp(&a.metadata.year)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { passages }
    }

    fn matches(passage: &StoredPassage, filters: &FilterSet) -> bool {
        let meta = &passage.metadata;
        let eq_opt = |wanted: &Option<String>, got: &Option<String>| match (wanted, got) {
            (Some(w), Some(g)) => w.eq_ignore_ascii_case(g),
            (Some(_), None) => false,
            (None, _) => true,
        };
        eq_opt(&filters.entity, &meta.entity)
            && filters.year.is_none_or(|y| meta.year == Some(y))
            && eq_opt(&filters.quarter, &meta.quarter)
            && eq_opt(&filters.doc_type, &meta.doc_type)
            && eq_opt(&filters.section, &meta.section)
    }
}

#[async_trait]
impl StructuredStore for InMemoryStructuredStore {
    async fn query(
        &self,
        filters: &FilterSet,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredPassage>, StoreError> {
        Ok(self
            .passages
            .iter()
            .filter(|p| Self::matches(p, filters))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_text(
        &self,
        entity: Option<&str>,
        term: &str,
        limit: usize,
    ) -> Result<Vec<StoredPassage>, StoreError> {
        let term = term.to_ascii_lowercase();
        Ok(self
            .passages
            .iter()
            .filter(|p| match entity {
                Some(wanted) => p
                    .metadata
                    .entity
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .filter(|p| p.text.to_ascii_lowercase().contains(&term))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<StoredPassage>, StoreError> {
        Ok(self
            .passages
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn available_years(&self, entity: Option<&str>) -> Result<Vec<i32>, StoreError> {
        let years: BTreeSet<i32> = self
            .passages
            .iter()
            .filter(|p| match entity {
                Some(wanted) => p
                    .metadata
                    .entity
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .filter_map(|p| p.metadata.year)
            .collect();
        Ok(years.into_iter().rev().collect())
    }

    async fn available_sections(
        &self,
        entity: &str,
        year: i32,
    ) -> Result<Vec<String>, StoreError> {
        let sections: BTreeSet<String> = self
            .passages
            .iter()
            .filter(|p| {
                p.metadata
                    .entity
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(entity))
                    && p.metadata.year == Some(year)
            })
            .filter_map(|p| p.metadata.section.clone())
            .collect();
        Ok(sections.into_iter().collect())
    }
}
