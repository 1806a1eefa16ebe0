mod commands;
mod config;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

const DEFAULT_LOG_FILTER: &str = "shiftsync=info,shiftsync_core=info,shiftsync_provider_google=info";

#[derive(Parser)]
#[command(name = "shiftsync")]
#[command(about = "Turn your work-schedule email into calendar events")]
struct Cli {
    /// Config file (defaults to ~/.config/shiftsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize Gmail and Calendar access and print a credentials bundle
    Auth {
        /// OAuth client ID of a "Desktop app" client
        #[arg(long)]
        client_id: Option<String>,

        #[arg(long)]
        client_secret: Option<String>,
    },
    /// Parse a saved schedule email and show what was understood
    Parse {
        file: PathBuf,

        /// Day the email was received, YYYY-MM-DD; dates written without a
        /// year are placed nearest to it (defaults to today)
        #[arg(long)]
        received: Option<NaiveDate>,

        /// Print the parsed schedule as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what a sync would change, without writing
    Status,
    /// Sync the latest schedule email to the calendar
    Sync,
    /// Show the config file and effective settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Auth {
            client_id,
            client_secret,
        } => commands::auth::run(&Settings::load(config)?, client_id, client_secret).await,
        Commands::Parse {
            file,
            received,
            json,
        } => commands::parse::run(&file, received, json),
        Commands::Status => commands::status::run(&Settings::load(config)?).await,
        Commands::Sync => commands::sync::run(&Settings::load(config)?).await,
        Commands::Config => commands::config::run(config),
    }
}

fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
