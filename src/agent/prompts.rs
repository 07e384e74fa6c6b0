use tracing::info;

use super::retriever::retrieve_context;
use crate::data::Dataset;
use crate::llm::Message;

/// System instructions for the answer model; `context` is the retrieved data block.
pub fn system_prompt(context: &str) -> String {
    format!(
        r#"You are a cancer gene research assistant. You have access to a dataset of cancer types, their gene targets, and median expression values.

RETRIEVED DATA:
{context}

INSTRUCTIONS:
- Answer the user's question using ONLY the data above.
- If the data says "No data found", tell the user their cancer type is not in the dataset and list the available cancer types.
- When the user asks about genes for a cancer, list the gene names from the data.
- When the user asks about expression values, list gene names with their values from the data.
- Be concise and accurate. Do not invent data."#
    )
}

/// Retrieve context for `query` and wrap it as a system + user message pair.
pub fn build_prompt(dataset: &Dataset, query: &str) -> Vec<Message> {
    let context = retrieve_context(dataset, query);
    let preview: String = query.chars().take(80).collect();
    info!(context_len = context.len(), query = %preview, "retrieved context");

    vec![Message::system(system_prompt(&context)), Message::user(query)]
}
