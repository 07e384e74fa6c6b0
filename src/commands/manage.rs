use super::send_chunked;
use crate::qalog::LogEntry;
use crate::session::GREETING;
use crate::state::Context;

/// Say hello and explain what can be asked
#[poise::command(slash_command, guild_only)]
pub async fn hello(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.say(GREETING).await?;
    Ok(())
}

/// Show recently logged questions and answers (admin only)
#[poise::command(slash_command, guild_only)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Max exchanges to show"] limit: Option<u32>,
) -> Result<(), anyhow::Error> {
    if !ctx.data().is_admin(ctx.author().id.get()) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    let limit = limit.unwrap_or(5).clamp(1, 50) as usize;
    let entries = ctx.data().log.recent(limit).await?;
    send_chunked(&ctx, &render_history(&entries)).await
}

fn render_history(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No exchanges logged yet.".to_string();
    }

    let mut output = String::from("**Recent exchanges**\n\n");
    for entry in entries {
        let latency = entry
            .latency_ms
            .map(|ms| format!("{:.0} ms", ms))
            .unwrap_or_else(|| "n/a".to_string());
        output.push_str(&format!(
            "`{}` {} | {} | {}\n**Q:** {}\n**A:** {}\n\n",
            short_id(&entry.request_id),
            entry.timestamp,
            entry.model,
            latency,
            preview(&entry.query, 200),
            preview(&entry.answer, 300),
        ));
    }
    output
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(query: &str, answer: &str, latency_ms: Option<f64>) -> LogEntry {
        LogEntry {
            request_id: "0f8fad5b-d9cb-469f-a165-70867728950e".to_string(),
            timestamp: "2026-10-18T09:15:02.123456Z".to_string(),
            model: "llama3.2:3b".to_string(),
            query: query.to_string(),
            answer: answer.to_string(),
            latency_ms,
        }
    }

    #[test]
    fn test_render_history_entry() {
        let out = render_history(&[entry("lung genes?", "TP53\nEGFR", Some(1834.26))]);
        assert_eq!(
            out,
            "**Recent exchanges**\n\n\
             `0f8fad5b` 2026-10-18T09:15:02.123456Z | llama3.2:3b | 1834 ms\n\
             **Q:** lung genes?\n**A:** TP53 EGFR\n\n"
        );
    }

    #[test]
    fn test_render_history_empty() {
        assert_eq!(render_history(&[]), "No exchanges logged yet.");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("αβγδ", 2), "αβ…");
        assert_eq!(preview("ok", 2), "ok");
    }
}
