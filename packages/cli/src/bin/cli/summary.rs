// ABOUTME: CLI command producing AI insights for a storage account or S3 bucket
// ABOUTME: Works from the stored snapshot; generation failures fall back to offline advice

use cloudlens_ai::SummarySource;
use cloudlens_cli::{app::summary_target, App};
use cloudlens_client::ResourceKind;
use colored::*;

pub async fn summary_command(
    app: &App,
    kind: ResourceKind,
    params: &[String],
    refresh: bool,
    login: bool,
) -> anyhow::Result<()> {
    summary_target(kind)?;
    if refresh {
        super::inventory::refresh_command(app, kind, params, login, false).await?;
    }

    println!("{}", "Generating insights...".cyan());
    let Some((target, summary)) = app.summarize(kind, params).await? else {
        println!(
            "{}",
            format!(
                "No snapshot for {}. Re-run with --refresh to fetch the details.",
                app.inventory().entry(kind, params).key
            )
            .yellow()
        );
        return Ok(());
    };

    println!();
    println!("{}", format!("{} insights", target.label()).blue().bold());
    for (index, insight) in summary.insights.iter().enumerate() {
        println!("  {}. {}", index + 1, insight);
    }
    if summary.source == SummarySource::Fallback {
        println!();
        println!(
            "{}",
            "Generated offline; the summary service was unavailable.".dimmed()
        );
    }
    Ok(())
}
