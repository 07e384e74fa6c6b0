mod agent;
mod commands;
mod console;
mod data;
mod llm;
mod qalog;
mod session;
mod state;

use std::collections::HashSet;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use agent::Agent;
use data::Dataset;
use llm::LlmClient;
use qalog::QueryLog;
use state::{AgentConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Dataset is required; a missing CSV ends startup here.
    let dataset = Arc::new(Dataset::locate()?);
    if dataset.is_empty() {
        warn!("Dataset has no usable rows; every question will get a \"No data found\" context");
    }
    info!(rows = dataset.len(), "Dataset ready");

    // Init LLM client
    let llm_client = Arc::new(LlmClient::from_env()?);
    info!(
        base_url = llm_client.base_url(),
        model = llm::ChatModel::model_name(llm_client.as_ref()),
        "LLM client initialized"
    );

    let log = Arc::new(QueryLog::from_env()?);
    info!("Query log at {:?}", log.path());

    let agent = Arc::new(Agent::new(dataset.clone(), llm_client));
    let agent_config = AgentConfig::from_env();

    let Some(token) = dotenv::var("DISCORD_TOKEN").ok().filter(|t| !t.is_empty()) else {
        info!("DISCORD_TOKEN not set, starting console chat");
        return console::run(&agent, &log, &agent_config).await;
    };

    // Parse admin user IDs from env
    let admin_ids: HashSet<u64> = dotenv::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect();
    if !admin_ids.is_empty() {
        info!(count = admin_ids.len(), "Admin users configured");
    }

    let app_state = AppState {
        dataset,
        agent,
        log,
        admin_ids,
        agent_config: Arc::new(RwLock::new(agent_config)),
    };

    run_discord(&token, app_state).await
}

async fn run_discord(token: &str, app_state: AppState) -> anyhow::Result<()> {
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::onco()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        gid,
                    )
                    .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, &framework.options().commands)
                        .await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting Onco Discord bot...");

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
