use std::path::PathBuf;

use serde::Deserialize;

/// Columns every dataset CSV must carry.
pub const REQUIRED_COLUMNS: &[&str] = &["cancer_indication", "gene", "median_value"];

/// One dataset row: a gene targeted in a cancer indication with its median expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cancer: String,
    pub gene: String,
    /// `None` when the CSV cell is blank or not a number.
    pub median_value: Option<f64>,
}

impl Record {
    #[cfg(test)]
    pub fn new(cancer: &str, gene: &str, median_value: f64) -> Self {
        Self {
            cancer: cancer.to_string(),
            gene: gene.to_string(),
            median_value: Some(median_value),
        }
    }
}

/// CSV row as written on disk. Extra columns are ignored by header matching.
#[derive(Debug, Deserialize)]
pub(super) struct CsvRow {
    pub cancer_indication: Option<String>,
    pub gene: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub median_value: Option<f64>,
}

impl CsvRow {
    /// Rows without a cancer type or gene carry nothing to look up.
    pub fn into_record(self) -> Option<Record> {
        let cancer = self.cancer_indication.filter(|c| !c.trim().is_empty())?;
        let gene = self.gene.filter(|g| !g.trim().is_empty())?;
        Some(Record {
            cancer,
            gene,
            median_value: self.median_value.filter(|v| !v.is_nan()),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("CSV not found: {file} (tried {tried:?})")]
    NotFound { file: String, tried: Vec<PathBuf> },

    #[error("dataset {path} is missing required column(s): {}", missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("failed to read dataset {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
