//! Labeled dataset access: tab-separated files with `article` and `summary`
//! columns, plus the text cleaning applied to every cell.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SumAiError};
use crate::interfaces::{DatasetRow, DatasetSource};

/// Scrub dataset text: drop the `[n]` line-break marker, turn zero-width
/// non-joiners and non-breaking spaces into plain spaces, collapse runs of
/// whitespace.
pub fn clean_dataset_text(text: &str) -> String {
    let replaced = text
        .replace("[n]", " ")
        .replace('\u{200c}', " ")
        .replace('\u{00a0}', " ");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reads evaluation rows from a TSV file via its header row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TsvDatasetSource {
    /// Column holding the source document.
    pub source_column: String,
    /// Column holding the reference summary.
    pub reference_column: String,
}

impl Default for TsvDatasetSource {
    fn default() -> Self {
        Self {
            source_column: "article".to_string(),
            reference_column: "summary".to_string(),
        }
    }
}

impl DatasetSource for TsvDatasetSource {
    fn rows(&self, path: &Path) -> Result<Vec<DatasetRow>> {
        if !path.exists() {
            return Err(SumAiError::DatasetNotFound(path.display().to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let source_idx = headers
            .iter()
            .position(|h| h == self.source_column)
            .ok_or_else(|| {
                SumAiError::Dataset(format!("missing column '{}'", self.source_column))
            })?;
        let reference_idx = headers
            .iter()
            .position(|h| h == self.reference_column)
            .ok_or_else(|| {
                SumAiError::Dataset(format!("missing column '{}'", self.reference_column))
            })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(DatasetRow {
                source_text: record.get(source_idx).unwrap_or("").to_string(),
                reference_text: record.get(reference_idx).unwrap_or("").to_string(),
            });
        }
        Ok(rows)
    }
}
