use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::{describe_failure, Agent};
use crate::qalog::{LogEntry, QueryLog};
use crate::state::AgentConfig;

pub const GREETING: &str =
    "Hello! Ask me about cancer gene targets and expression (e.g. lung, breast).";

pub const EMPTY_QUERY_REPLY: &str = "Please enter a question.";

/// A finished, logged turn.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request_id: Uuid,
    pub answer: String,
    pub latency: Duration,
}

/// Answer `query`, pushing the growing answer through `on_update` after every
/// chunk, then append exactly one log entry.
///
/// A blank query gets [`EMPTY_QUERY_REPLY`] and is not logged (`Ok(None)`).
/// If `on_update` fails, its error replaces the answer and streaming stops;
/// the exchange is still logged.
pub async fn run_exchange<F, Fut>(
    agent: &Agent,
    log: &QueryLog,
    config: &AgentConfig,
    query: &str,
    mut on_update: F,
) -> Result<Option<Exchange>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let query = query.trim();
    if query.is_empty() {
        on_update(EMPTY_QUERY_REPLY.to_string()).await?;
        return Ok(None);
    }

    let request_id = Uuid::new_v4();
    let start = Instant::now();
    info!(%request_id, query, "exchange started");

    let mut answer = String::new();
    let mut chunks = agent.invoke_stream(query, config).boxed();
    while let Some(chunk) = chunks.next().await {
        answer.push_str(&chunk);
        if let Err(e) = on_update(answer.clone()).await {
            warn!(%request_id, error = %e, "failed to deliver partial answer");
            answer = describe_failure(&e, agent.model_name());
            if let Err(e) = on_update(answer.clone()).await {
                warn!(%request_id, error = %e, "failed to deliver error message");
            }
            break;
        }
    }

    let latency = start.elapsed();
    log.append(&LogEntry::new(
        request_id,
        agent.model_name(),
        query,
        &answer,
        Some(latency),
    ))
    .await?;

    info!(
        %request_id,
        answer_len = answer.len(),
        latency_ms = latency.as_millis() as u64,
        "exchange complete"
    );

    Ok(Some(Exchange {
        request_id,
        answer,
        latency,
    }))
}
