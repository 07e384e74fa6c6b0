use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

const LOG_FILE: &str = "query_answers.jsonl";

/// A logged exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub request_id: String,
    pub timestamp: String,
    pub model: String,
    pub query: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

impl LogEntry {
    pub fn new(
        request_id: Uuid,
        model: &str,
        query: &str,
        answer: &str,
        latency: Option<Duration>,
    ) -> Self {
        Self {
            request_id: request_id.to_string(),
            timestamp: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.6fZ")
                .to_string(),
            model: model.to_string(),
            query: query.to_string(),
            answer: answer.to_string(),
            latency_ms: latency.map(|d| (d.as_secs_f64() * 1000.0 * 100.0).round() / 100.0),
        }
    }
}

pub struct QueryLog {
    path: PathBuf,
}

impl QueryLog {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
        Ok(Self {
            path: dir.join(LOG_FILE),
        })
    }

    pub fn from_env() -> Result<Self> {
        let dir = dotenv::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        Self::new(Path::new(&dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open, append one line, close. Single writer only.
    pub async fn append(&self, entry: &LogEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry).context("serialize LogEntry")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(request_id = %entry.request_id, "exchange logged");
        Ok(())
    }

    /// The newest `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        let mut results = Vec::new();
        for line in text.lines().rev().filter(|l| !l.trim().is_empty()) {
            if results.len() == limit {
                break;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => results.push(entry),
                Err(e) => warn!("Skipping malformed log line: {}", e),
            }
        }
        Ok(results)
    }
}
