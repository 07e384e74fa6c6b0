pub mod types;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use types::{DataError, Record};

/// File name looked up in the working directory and project root.
pub const DEFAULT_CSV: &str = "owkin_take_home_data.csv";

/// In-memory, read-only view of the cancer/gene dataset.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Find the dataset using the standard search order and load it.
    pub fn locate() -> Result<Self, DataError> {
        let cwd = std::env::current_dir().ok();
        let env_path = dotenv::var("OWKIN_CSV_PATH").ok();
        let path = find_csv(&candidate_paths(cwd.as_deref(), env_path))?;
        Self::load(&path)
    }

    /// Parse a CSV with `cancer_indication`, `gene` and `median_value` columns.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let csv_err = |source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?;
        let missing: Vec<String> = types::REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for row in reader.deserialize::<types::CsvRow>() {
            match row.map_err(csv_err)?.into_record() {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        info!(path = %path.display(), rows = records.len(), dropped, "dataset loaded");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct cancer types, sorted.
    pub fn available_cancers(&self) -> Vec<String> {
        let result: Vec<String> = self
            .records
            .iter()
            .map(|r| r.cancer.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        debug!(
            count = result.len(),
            sample = ?&result[..result.len().min(12)],
            "available_cancers"
        );
        result
    }

    /// Distinct gene symbols, sorted.
    pub fn all_genes(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.gene.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Genes listed for a cancer type, in file order.
    pub fn targets(&self, cancer: &str) -> Vec<String> {
        let result: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.cancer == cancer)
            .map(|r| r.gene.clone())
            .collect();
        debug!(cancer, count = result.len(), "targets");
        result
    }

    /// Median values for the given genes across all cancers; the last row for a gene wins.
    pub fn expressions(&self, genes: &[String]) -> Vec<(String, f64)> {
        let result = collect_values(self.records.iter(), genes);
        debug!(genes = ?&genes[..genes.len().min(10)], count = result.len(), "expressions");
        result
    }

    /// Median values for the given genes within one cancer type.
    pub fn expressions_for_cancer(&self, cancer: &str, genes: &[String]) -> Vec<(String, f64)> {
        let result = collect_values(self.records.iter().filter(|r| r.cancer == cancer), genes);
        debug!(
            cancer,
            genes = ?&genes[..genes.len().min(10)],
            count = result.len(),
            "expressions_for_cancer"
        );
        result
    }
}

/// Gene -> value pairs keyed by first appearance, value taken from the last matching row.
fn collect_values<'a>(
    records: impl Iterator<Item = &'a Record>,
    genes: &[String],
) -> Vec<(String, f64)> {
    let wanted: HashSet<&str> = genes.iter().map(String::as_str).collect();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut result: Vec<(String, f64)> = Vec::new();

    for record in records {
        if !wanted.contains(record.gene.as_str()) {
            continue;
        }
        let Some(value) = record.median_value else {
            continue;
        };
        match slots.get(record.gene.as_str()) {
            Some(&i) => result[i].1 = value,
            None => {
                slots.insert(record.gene.as_str(), result.len());
                result.push((record.gene.clone(), value));
            }
        }
    }
    result
}

/// Working directory, then project root, then `OWKIN_CSV_PATH`.
fn candidate_paths(cwd: Option<&Path>, env_path: Option<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(cwd) = cwd {
        paths.push(cwd.join(DEFAULT_CSV));
    }
    paths.push(Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CSV));
    if let Some(env_path) = env_path.filter(|p| !p.trim().is_empty()) {
        paths.push(PathBuf::from(env_path));
    }
    paths
}

fn find_csv(candidates: &[PathBuf]) -> Result<PathBuf, DataError> {
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| DataError::NotFound {
            file: DEFAULT_CSV.to_string(),
            tried: candidates.to_vec(),
        })
}
