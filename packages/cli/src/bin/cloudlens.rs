use clap::{Parser, Subcommand};
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::cache::CacheCommands;
use cloudlens_cli::App;
use cloudlens_client::ResourceKind;
use cloudlens_config::Config;

#[derive(Parser)]
#[command(name = "cloudlens")]
#[command(about = "cloudlens - offline-first cloud inventory snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with Microsoft Entra ID
    Login,
    /// Show configuration, identity and cache status
    Status,
    /// List the datasets the backend serves
    Resources,
    /// Fetch a dataset now and store the snapshot
    Refresh {
        /// Dataset id (see `cloudlens resources`)
        #[arg(value_parser = parse_kind)]
        resource: ResourceKind,
        /// Parameters such as a bucket name, or account and resource group
        params: Vec<String>,
        /// Sign in before refreshing
        #[arg(long)]
        login: bool,
        /// Print the payload as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the stored snapshot without fetching
    Show {
        #[arg(value_parser = parse_kind)]
        resource: ResourceKind,
        params: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// AI insights for a storage account or S3 bucket snapshot
    Summary {
        /// azure-details or s3-details
        #[arg(value_parser = parse_kind)]
        resource: ResourceKind,
        /// Account and resource group, or bucket name
        params: Vec<String>,
        /// Refresh the account details first
        #[arg(long)]
        refresh: bool,
        /// Sign in before refreshing
        #[arg(long)]
        login: bool,
    },
    /// Inspect or clear stored snapshots
    #[command(subcommand)]
    Cache(CacheCommands),
}

fn parse_kind(raw: &str) -> Result<ResourceKind, String> {
    raw.parse::<ResourceKind>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    if let Commands::Resources = command {
        cli::inventory::resources_command();
        return Ok(());
    }

    let config = Config::from_env()?;
    let app = App::bootstrap(config).await?;
    app.rehydrate().await?;

    let result = match command {
        Commands::Login => cli::auth::login_command(&app).await,
        Commands::Status => cli::auth::status_command(&app),
        Commands::Resources => Ok(()),
        Commands::Refresh {
            resource,
            params,
            login,
            json,
        } => cli::inventory::refresh_command(&app, resource, &params, login, json).await,
        Commands::Show {
            resource,
            params,
            json,
        } => cli::inventory::show_command(&app, resource, &params, json),
        Commands::Summary {
            resource,
            params,
            refresh,
            login,
        } => cli::summary::summary_command(&app, resource, &params, refresh, login).await,
        Commands::Cache(command) => cli::cache::handle_cache_command(&app, command).await,
    };

    app.shutdown();
    result
}
