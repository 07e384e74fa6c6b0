use super::send_chunked;
use crate::data::Dataset;
use crate::state::Context;

/// List the cancer types in the dataset
#[poise::command(slash_command, guild_only)]
pub async fn cancers(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let output = render_cancer_list(&ctx.data().dataset);
    send_chunked(&ctx, &output).await
}

fn render_cancer_list(dataset: &Dataset) -> String {
    let cancers = dataset.available_cancers();
    if cancers.is_empty() {
        return "The dataset has no cancer types loaded.".to_string();
    }

    let mut output = format!("**Cancer types in the dataset ({})**\n\n", cancers.len());
    for cancer in &cancers {
        let count = dataset.targets(cancer).len();
        let noun = if count == 1 { "target" } else { "targets" };
        output.push_str(&format!("- {} ({} gene {})\n", cancer, count, noun));
    }
    output
}
