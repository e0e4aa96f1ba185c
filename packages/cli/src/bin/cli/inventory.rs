// ABOUTME: CLI commands for refreshing and viewing inventory snapshots
// ABOUTME: Reads never fetch; refresh is the only command that contacts the backend

use chrono::Utc;
use cloudlens_cache::{CacheEntry, ErrorKind, RefreshOutcome};
use cloudlens_cli::{render, App};
use cloudlens_client::ResourceKind;
use colored::*;

pub fn resources_command() {
    let mut table = render::new_table();
    table.set_header(vec!["Resource", "Description", "Parameters", "Endpoint", "Sign-in"]);
    for kind in ResourceKind::ALL {
        table.add_row(vec![
            kind.id().to_string(),
            kind.label().to_string(),
            kind.param_names().join(", "),
            kind.path().to_string(),
            if kind.requires_auth() { "required" } else { "—" }.to_string(),
        ]);
    }
    println!("{table}");
}

pub async fn refresh_command(
    app: &App,
    kind: ResourceKind,
    params: &[String],
    login: bool,
    json: bool,
) -> anyhow::Result<()> {
    if login {
        super::auth::login_command(app).await?;
    }

    println!("{} {}...", "Refreshing".cyan(), kind.label());
    let outcome = app.inventory().refresh(kind, params).await?;
    report_outcome(kind, &outcome);

    print_entry(kind, &app.inventory().entry(kind, params), json)
}

fn report_outcome(kind: ResourceKind, outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Updated => {
            println!("{} {} updated", "✓".green().bold(), kind.label())
        }
        RefreshOutcome::Failed(error) => {
            eprintln!("{} Refresh failed: {}", "✗".red().bold(), error.message);
            if error.kind == ErrorKind::NoActiveIdentity {
                eprintln!("{}", "Re-run with --login to sign in first.".dimmed());
            }
        }
        RefreshOutcome::Abandoned => println!(
            "{} Sign-in was required and has completed; run the refresh again.",
            "!".yellow().bold()
        ),
        RefreshOutcome::AlreadyInFlight => {
            println!("{}", "A refresh is already running".yellow())
        }
        RefreshOutcome::Discarded => {
            println!("{}", "Cache was cleared during the refresh".yellow())
        }
    }
}

pub fn show_command(
    app: &App,
    kind: ResourceKind,
    params: &[String],
    json: bool,
) -> anyhow::Result<()> {
    kind.check_params(params)?;
    let entry = app.inventory().entry(kind, params);
    if !entry.has_data() && !json {
        let command = std::iter::once(kind.id().to_string())
            .chain(params.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{}",
            format!(
                "No snapshot for {} yet. Run `cloudlens refresh {}` to fetch it.",
                entry.key, command
            )
            .yellow()
        );
        return Ok(());
    }
    print_entry(kind, &entry, json)
}

fn print_entry(kind: ResourceKind, entry: &CacheEntry, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }

    let Some(payload) = &entry.payload else {
        return Ok(());
    };

    println!();
    println!(
        "{} ({} item(s), {})",
        kind.label().blue().bold(),
        render::item_count(payload),
        render::status_text(&entry.status(), Utc::now())
    );
    match render::payload_table(payload) {
        Some(table) => println!("{table}"),
        None => println!("{}", payload),
    }
    Ok(())
}
