// ABOUTME: CLI commands for signing in and reporting session status
// ABOUTME: Sessions live in memory, so a login only lasts for the running command

use chrono::Utc;
use cloudlens_cli::{render, App};
use colored::*;

pub async fn login_command(app: &App) -> anyhow::Result<()> {
    println!("{}", "Opening browser for Microsoft sign-in...".cyan());

    match app.login().await? {
        Some(identity) => {
            println!("{} Signed in as {}", "✓".green().bold(), identity.username.bold());
            if let Some(tenant) = &identity.tenant_id {
                println!("  Tenant: {}", tenant);
            }
            println!(
                "{}",
                "Sessions are held in memory; use --login on refresh to sign in for that command."
                    .dimmed()
            );
        }
        None => println!("{}", "Sign-in finished without an active identity".yellow()),
    }
    Ok(())
}

pub fn status_command(app: &App) -> anyhow::Result<()> {
    let config = app.config();

    println!("{}", "cloudlens status".blue().bold());
    println!();
    println!("  API:        {}", config.api_url);
    println!(
        "  Sign-in:    {}",
        match &config.client_id {
            Some(id) => format!("Entra ID client {} (tenant {})", id, config.tenant_id),
            None => "not configured".yellow().to_string(),
        }
    );
    println!("  Scope:      {}", app.scope());
    println!(
        "  Identity:   {}",
        app.credentials()
            .active_identity()
            .map(|identity| identity.username)
            .unwrap_or_else(|| "none".to_string())
    );
    println!("  Data:       {}", config.database_path().display());
    println!(
        "  Retention:  {} days",
        config.retention.as_secs() / (24 * 60 * 60)
    );
    println!(
        "  Summaries:  {}",
        if config.gemini_api_key.is_some() {
            config.gemini_model.clone()
        } else {
            "offline advice only".to_string()
        }
    );

    let now = Utc::now();
    let keys = app.cache().keys();
    println!();
    println!("  {} stored snapshot(s)", keys.len());
    for key in keys {
        println!(
            "    {} {}",
            key.to_string().bold(),
            render::status_text(&app.cache().status(&key), now).dimmed()
        );
    }
    Ok(())
}
