mod ask;
mod cancers;
mod config;
mod manage;

use crate::state::Context;

/// Discord's hard message limit is 2000; leave room for markdown.
pub(crate) const MESSAGE_LIMIT: usize = 1990;

/// Onco - cancer gene target assistant
#[poise::command(
    slash_command,
    subcommands(
        "manage::hello",
        "ask::ask",
        "cancers::cancers",
        "manage::history",
        "config::config"
    )
)]
pub async fn onco(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Byte index of the largest prefix of `text` that fits one message,
/// preferring a line break, then a space.
pub(crate) fn split_point(text: &str) -> usize {
    if text.len() <= MESSAGE_LIMIT {
        return text.len();
    }
    let mut end = MESSAGE_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end]
        .rfind('\n')
        .or_else(|| text[..end].rfind(' '))
        .map(|i| i + 1)
        .unwrap_or(end)
}

/// Send a message in Discord-safe chunks.
/// Every chunk goes through ctx.say() so follow-ups use the interaction
/// webhook and need no Send Messages channel permission.
pub(crate) async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    let mut remaining = text;
    while !remaining.is_empty() {
        let split_at = split_point(remaining);
        ctx.say(&remaining[..split_at]).await?;
        remaining = &remaining[split_at..];
    }
    Ok(())
}
