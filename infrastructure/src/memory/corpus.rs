//! Corpus loading from JSONL files.
//!
//! One JSON object per line, holding a passage and its filing metadata:
//!
//! ```jsonl
//! {"id": "bac_10k_2023_chunk_1", "text": "...", "entity": "BAC", "year": 2023,
//!  "doc_type": "10-K", "section": "Risk Factors", "source_file": "bac_10k_2023.txt"}
//! ```
//!
//! Only `id` and `text` are required; blank lines are skipped.

use finsight_application::ports::StoredPassage;
use finsight_domain::ChunkMetadata;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed corpus record on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct CorpusRecord {
    id: String,
    text: String,
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    quarter: Option<String>,
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    source_file: Option<String>,
}

/// Load a JSONL corpus file into stored passages.
pub fn load_corpus(path: &Path) -> Result<Vec<StoredPassage>, CorpusError> {
    let contents = fs::read_to_string(path)?;
    let mut passages = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CorpusRecord = serde_json::from_str(line).map_err(|source| {
            CorpusError::Parse {
                line: index + 1,
                source,
            }
        })?;
        passages.push(StoredPassage {
            id: record.id,
            text: record.text,
            metadata: ChunkMetadata {
                entity: record.entity,
                year: record.year,
                quarter: record.quarter,
                doc_type: record.doc_type,
                section: record.section,
                source_file: record.source_file,
                merged_neighbors: 0,
            },
        });
    }

    info!(path = %path.display(), passages = passages.len(), "corpus loaded");
    Ok(passages)
}
