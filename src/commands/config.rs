use std::time::Duration;

use crate::state::{AgentConfig, Context};

/// Configure answering parameters (admin only)
#[poise::command(slash_command, guild_only)]
pub async fn config(
    ctx: Context<'_>,
    #[description = "timeout_secs | chunk_size"] param: Option<String>,
    #[description = "New value"] value: Option<u32>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    match (param.as_deref(), value) {
        // Show current config
        (None, _) => {
            let config = *ctx.data().agent_config.read().await;
            ctx.say(describe(&config)).await?;
        }
        // Set a parameter
        (Some(key), Some(val)) => {
            let mut config = ctx.data().agent_config.write().await;
            let reply = apply(&mut config, key, val);
            drop(config);
            ctx.say(reply).await?;
        }
        (Some(_), None) => {
            ctx.say("Provide both `param` and `value`. Example: `/onco config timeout_secs 120`")
                .await?;
        }
    }

    Ok(())
}

fn describe(config: &AgentConfig) -> String {
    format!(
        "**Answer Configuration:**\n\
         `timeout_secs`: {}\n\
         `chunk_size`: {}",
        config.timeout.as_secs(),
        config.chunk_size
    )
}

/// Update one field and return the reply text.
fn apply(config: &mut AgentConfig, key: &str, val: u32) -> String {
    match key {
        "timeout_secs" if val > 0 => {
            config.timeout = Duration::from_secs(val as u64);
            format!("`timeout_secs` set to {}", val)
        }
        "chunk_size" if val > 0 => {
            config.chunk_size = val as usize;
            format!("`chunk_size` set to {}", val)
        }
        "timeout_secs" | "chunk_size" => format!("`{}` must be greater than 0", key),
        _ => format!(
            "Unknown param `{}`. Valid: `timeout_secs`, `chunk_size`",
            key
        ),
    }
}
