use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::agent::Agent;
use crate::data::Dataset;
use crate::qalog::QueryLog;

/// Answering knobs (admins can modify at runtime).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    /// Wall-clock limit for one answer, model call included.
    pub timeout: Duration,
    /// Characters per streamed piece.
    pub chunk_size: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            chunk_size: 15,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = dotenv::var("INVOKE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let chunk_size = dotenv::var("STREAM_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.chunk_size);
        Self {
            timeout,
            chunk_size,
        }
    }
}

pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub agent: Arc<Agent>,
    pub log: Arc<QueryLog>,
    pub admin_ids: HashSet<u64>,
    pub agent_config: Arc<RwLock<AgentConfig>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
