// ABOUTME: CLI commands for listing and clearing stored snapshots
// ABOUTME: Clearing is the only way to drop a snapshot before the retention ceiling

use chrono::Utc;
use clap::Subcommand;
use cloudlens_cli::{render, App};
use cloudlens_client::{Inventory, ResourceKind};
use colored::*;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List stored snapshots and their status
    List,
    /// Remove one snapshot, or all of them
    Clear {
        /// Dataset id; omit to clear everything
        resource: Option<String>,
        params: Vec<String>,
    },
}

pub async fn handle_cache_command(app: &App, command: CacheCommands) -> anyhow::Result<()> {
    match command {
        CacheCommands::List => list_command(app),
        CacheCommands::Clear { resource, params } => clear_command(app, resource, params).await,
    }
}

fn list_command(app: &App) -> anyhow::Result<()> {
    let keys = app.cache().keys();
    if keys.is_empty() {
        println!("{}", "No snapshots stored".yellow());
        println!("{}", "Use 'cloudlens refresh <resource>' to fetch one".dimmed());
        return Ok(());
    }

    let now = Utc::now();
    let mut table = render::new_table();
    table.set_header(vec!["Snapshot", "Items", "Status"]);
    for key in keys {
        let entry = app.cache().get(&key);
        table.add_row(vec![
            key.to_string(),
            entry
                .payload
                .as_ref()
                .map(|p| render::item_count(p).to_string())
                .unwrap_or_else(|| "—".to_string()),
            render::status_text(&entry.status(), now),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn clear_command(
    app: &App,
    resource: Option<String>,
    params: Vec<String>,
) -> anyhow::Result<()> {
    match resource {
        Some(resource) => {
            let kind: ResourceKind = resource.parse()?;
            kind.check_params(&params)?;
            let key = Inventory::key(kind, &params);
            if app.cache().remove(&key).await? {
                println!("{} Removed {}", "✓".green().bold(), key);
            } else {
                println!("{}", format!("Nothing stored for {}", key).yellow());
            }
        }
        None => {
            let removed = app.cache().clear().await?;
            println!("{} Cleared {} snapshot(s)", "✓".green().bold(), removed);
        }
    }
    Ok(())
}
