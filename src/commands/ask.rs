use std::time::{Duration, Instant};

use poise::CreateReply;
use tracing::{error, info};

use super::{send_chunked, split_point};
use crate::session::run_exchange;
use crate::state::Context;

/// Discord rate-limits message edits; partial answers refresh at most this often.
const EDIT_INTERVAL: Duration = Duration::from_secs(1);

/// Ask about cancer gene targets and expression values
#[poise::command(slash_command, guild_only)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question"] question: String,
) -> Result<(), anyhow::Error> {
    // Placeholder reply; edited in place as the answer arrives.
    let handle = ctx.say("Looking that up…").await?;

    let config = *ctx.data().agent_config.read().await;
    info!(user = %ctx.author().name, question = %question, "question received");

    let mut last_edit: Option<Instant> = None;
    let mut latest = String::new();
    let handle_ref = &handle;

    let outcome = run_exchange(
        &ctx.data().agent,
        &ctx.data().log,
        &config,
        &question,
        |text| {
            let due = last_edit.map_or(true, |t| t.elapsed() >= EDIT_INTERVAL);
            if due {
                last_edit = Some(Instant::now());
            }
            latest.clone_from(&text);
            async move {
                if due {
                    let shown = &text[..split_point(&text)];
                    handle_ref
                        .edit(ctx, CreateReply::default().content(shown))
                        .await?;
                }
                Ok::<(), anyhow::Error>(())
            }
        },
    )
    .await;

    let answer = match outcome {
        Ok(Some(exchange)) => {
            info!(
                request_id = %exchange.request_id,
                latency_ms = exchange.latency.as_millis() as u64,
                "answer delivered"
            );
            exchange.answer
        }
        Ok(None) => return Ok(()),
        Err(e) => {
            error!(error = %e, "exchange could not be logged");
            latest
        }
    };

    // Final state, whatever the throttle skipped.
    let split_at = split_point(&answer);
    handle
        .edit(ctx, CreateReply::default().content(&answer[..split_at]))
        .await?;

    let rest = answer[split_at..].trim_start();
    if !rest.is_empty() {
        send_chunked(&ctx, rest).await?;
    }
    Ok(())
}
