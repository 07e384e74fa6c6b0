use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use crate::agent::Agent;
use crate::qalog::QueryLog;
use crate::session::{run_exchange, GREETING};
use crate::state::AgentConfig;

const PROMPT: &str = "\n> ";

pub async fn run(agent: &Agent, log: &QueryLog, config: &AgentConfig) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(GREETING.as_bytes()).await?;
    stdout.write_all(PROMPT.as_bytes()).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if is_exit(&line) {
            break;
        }

        let mut printed = String::new();
        let outcome = run_exchange(agent, log, config, &line, |text| {
            let delta = unseen_suffix(&printed, &text);
            printed = text;
            async move {
                let mut out = tokio::io::stdout();
                out.write_all(delta.as_bytes()).await?;
                out.flush().await?;
                Ok::<(), anyhow::Error>(())
            }
        })
        .await;

        if let Err(e) = outcome {
            error!(error = %e, "exchange could not be logged");
        }
        stdout.write_all(b"\n").await?;
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("console session ended");
    Ok(())
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim(), "exit" | "quit")
}

/// What to print so the terminal shows `next`, given it already shows `shown`.
/// A replaced answer (not an extension) is printed on a fresh line.
fn unseen_suffix(shown: &str, next: &str) -> String {
    match next.strip_prefix(shown) {
        Some(rest) => rest.to_string(),
        None => format!("\n{}", next),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_suffix_extends() {
        assert_eq!(unseen_suffix("TP53 is ", "TP53 is listed"), "listed");
        assert_eq!(unseen_suffix("", "TP53"), "TP53");
    }

    #[test]
    fn test_unseen_suffix_replaced_answer() {
        assert_eq!(
            unseen_suffix("TP53 is", "Error: stream closed"),
            "\nError: stream closed"
        );
    }

    #[test]
    fn test_exit_words() {
        assert!(is_exit(" quit "));
        assert!(is_exit("exit"));
        assert!(!is_exit("exit codes for lung?"));
    }
}
