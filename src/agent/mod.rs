//! Retrieval-augmented answering over the dataset.
//!
//! Flow: query -> retrieve context -> build prompt -> model -> answer.
//! The model writes every answer from the retrieved rows; when nothing in the
//! dataset matches, the context says so and the model relays it.

pub mod prompts;
pub mod retriever;

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, Stream, StreamExt};
use tracing::{info, warn};

use crate::data::Dataset;
use crate::llm::ChatModel;
use crate::state::AgentConfig;

/// Substituted for a blank question.
const DEFAULT_QUERY: &str = "How can you help me?";

pub const EMPTY_ANSWER_REPLY: &str =
    "I couldn't generate an answer. Please try rephrasing your question.";

pub const TIMEOUT_REPLY: &str = "The request took too long. Please try a simpler question.";

pub struct Agent {
    dataset: Arc<Dataset>,
    model: Arc<dyn ChatModel>,
}

impl Agent {
    pub fn new(dataset: Arc<Dataset>, model: Arc<dyn ChatModel>) -> Self {
        Self { dataset, model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Retrieve context, call the model once, return the trimmed answer.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let q = match query.trim() {
            "" => DEFAULT_QUERY,
            q => q,
        };

        let messages = prompts::build_prompt(&self.dataset, q);
        let response = self.model.chat(&messages).await?;
        let answer = response.trim();

        if answer.is_empty() {
            warn!(model = self.model_name(), "model returned an empty answer");
            return Ok(EMPTY_ANSWER_REPLY.to_string());
        }

        info!(answer_len = answer.len(), "LLM answered");
        Ok(answer.to_string())
    }

    /// Answer under a deadline. Never fails: timeouts and backend errors come
    /// back as user-facing text.
    pub async fn invoke(&self, query: &str, config: &AgentConfig) -> String {
        match tokio::time::timeout(config.timeout, self.answer(query)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(error = %e, "answer pipeline failed");
                describe_failure(&e, self.model_name())
            }
            Err(_) => {
                warn!(timeout_secs = config.timeout.as_secs_f64(), "LLM call timed out");
                TIMEOUT_REPLY.to_string()
            }
        }
    }

    /// Same answer as [`Agent::invoke`], delivered in fixed-size pieces.
    ///
    /// The backend call is not incremental: the whole answer is produced first
    /// and then sliced into `config.chunk_size`-character chunks.
    pub fn invoke_stream<'a>(
        &'a self,
        query: &'a str,
        config: &'a AgentConfig,
    ) -> impl Stream<Item = String> + Send + 'a {
        let chunk_size = config.chunk_size;
        stream::once(self.invoke(query, config))
            .flat_map(move |answer| stream::iter(chunk_text(&answer, chunk_size)))
    }
}

/// Turn a pipeline error into text shown in place of an answer.
pub fn describe_failure(err: &anyhow::Error, model: &str) -> String {
    if is_connection_error(err) {
        format!(
            "Cannot reach the language model. Ensure the model server is running \
             and the model `{}` is pulled.",
            model
        )
    } else {
        format!("Error: {:#}", err)
    }
}

fn is_connection_error(err: &anyhow::Error) -> bool {
    let connect = err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_connect())
    });
    let text = format!("{:#}", err).to_lowercase();
    connect || text.contains("connection") || text.contains("refused")
}

/// Split on character boundaries into pieces of at most `size` characters.
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::Record;
    use crate::llm::testing::ScriptedModel;

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::from_records(vec![
            Record::new("lung", "TP53", 12.3),
            Record::new("lung", "EGFR", 8.0),
        ]))
    }

    fn config() -> AgentConfig {
        AgentConfig {
            timeout: Duration::from_secs(5),
            chunk_size: 15,
        }
    }

    #[tokio::test]
    async fn test_invoke_returns_trimmed_model_answer() {
        let model = Arc::new(ScriptedModel::replying("  Lung targets: TP53, EGFR.\n"));
        let agent = Agent::new(dataset(), model.clone());

        let answer = agent.invoke("Which genes for lung?", &config()).await;
        assert_eq!(answer, "Lung targets: TP53, EGFR.");

        let sent = model.last_messages.lock().unwrap().clone();
        assert!(sent[0].content.contains("Gene targets (2): TP53, EGFR"));
        assert_eq!(sent[1].content, "Which genes for lung?");
    }

    #[tokio::test]
    async fn test_blank_query_becomes_default_question() {
        let model = Arc::new(ScriptedModel::replying("I answer questions about the dataset."));
        let agent = Agent::new(dataset(), model.clone());

        agent.invoke("   ", &config()).await;
        let sent = model.last_messages.lock().unwrap().clone();
        assert_eq!(sent[1].content, "How can you help me?");
    }

    #[tokio::test]
    async fn test_empty_model_answer_gets_fallback() {
        let agent = Agent::new(dataset(), Arc::new(ScriptedModel::replying(" \n ")));
        assert_eq!(agent.invoke("lung?", &config()).await, EMPTY_ANSWER_REPLY);
    }

    #[tokio::test]
    async fn test_slow_model_yields_timeout_reply() {
        let model = ScriptedModel::replying("too late").with_delay(Duration::from_secs(30));
        let agent = Agent::new(dataset(), Arc::new(model));
        let config = AgentConfig {
            timeout: Duration::from_millis(50),
            chunk_size: 15,
        };

        assert_eq!(agent.invoke("lung?", &config).await, TIMEOUT_REPLY);
    }

    #[tokio::test]
    async fn test_backend_error_becomes_text() {
        let agent = Agent::new(dataset(), Arc::new(ScriptedModel::failing("bad gateway")));
        assert_eq!(agent.invoke("lung?", &config()).await, "Error: bad gateway");
    }

    #[tokio::test]
    async fn test_connection_error_becomes_hint() {
        let model = ScriptedModel::failing("tcp connect error: Connection refused (os error 111)");
        let agent = Agent::new(dataset(), Arc::new(model));

        let answer = agent.invoke("lung?", &config()).await;
        assert!(answer.starts_with("Cannot reach the language model."));
        assert!(answer.contains("`scripted`"));
    }

    #[tokio::test]
    async fn test_answer_propagates_errors() {
        let agent = Agent::new(dataset(), Arc::new(ScriptedModel::failing("boom")));
        assert!(agent.answer("lung?").await.is_err());
    }

    #[tokio::test]
    async fn test_stream_concatenates_to_invoke_answer() {
        let reply = "TP53 (12.3) and EGFR (8.0) are the lung targets in this dataset.";
        let agent = Agent::new(dataset(), Arc::new(ScriptedModel::replying(reply)));
        let config = config();

        let chunks: Vec<String> = agent.invoke_stream("lung genes?", &config).collect().await;
        assert!(chunks.len() > 1);
        assert!(chunks[..chunks.len() - 1]
            .iter()
            .all(|c| c.chars().count() == 15));
        assert_eq!(chunks.concat(), agent.invoke("lung genes?", &config).await);
    }

    #[tokio::test]
    async fn test_stream_of_failure_is_the_failure_text() {
        let agent = Agent::new(dataset(), Arc::new(ScriptedModel::failing("bad gateway")));
        let chunks: Vec<String> = agent.invoke_stream("lung?", &config()).collect().await;
        assert_eq!(chunks.concat(), "Error: bad gateway");
    }

    #[tokio::test]
    async fn test_stream_of_connection_failure_is_the_hint() {
        let model = ScriptedModel::failing("tcp connect error: Connection refused (os error 111)");
        let agent = Agent::new(dataset(), Arc::new(model));

        let chunks: Vec<String> = agent.invoke_stream("lung?", &config()).collect().await;
        let streamed = chunks.concat();
        assert!(streamed.starts_with("Cannot reach the language model."));
        assert_eq!(streamed, agent.invoke("lung?", &config()).await);
    }

    #[test]
    fn test_chunk_text_respects_char_boundaries() {
        assert_eq!(chunk_text("αβγδε", 2), vec!["αβ", "γδ", "ε"]);
        assert!(chunk_text("", 15).is_empty());
        assert_eq!(chunk_text("abc", 0), vec!["a", "b", "c"]);
    }
}
