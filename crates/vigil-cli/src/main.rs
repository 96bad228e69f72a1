mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, watch::WatchSubcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "vigil",
    about = "Watch files, inboxes and feeds; turn each new event into a vault action record",
    version,
    propagate_version = true
)]
struct Cli {
    /// Vault root (default: auto-detect from Needs_Action/ upward, else cwd)
    #[arg(long, global = true, env = "VIGIL_VAULT")]
    vault: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Also append the process log to this file
    #[arg(long, global = true, env = "VIGIL_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vault folders and a default .vigil.yaml
    Init,

    /// Run a watcher
    Watch {
        #[command(subcommand)]
        subcommand: WatchSubcommand,
    },

    /// Show audit log entries for one UTC day
    Log {
        /// Day to show, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },

    /// List action records waiting in Needs_Action
    Pending,

    /// Inspect and validate .vigil.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn init_tracing(default_level: tracing::Level, log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("cannot open log file {}: {e}", path.display()))?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    if let Err(e) = init_tracing(default_level, cli.log_file.as_deref()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    let vault = root::resolve_vault(cli.vault.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&vault, cli.json),
        Commands::Watch { subcommand } => cmd::watch::run(&vault, subcommand, cli.json),
        Commands::Log { date } => cmd::log::run(&vault, date, cli.json),
        Commands::Pending => cmd::pending::run(&vault, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&vault, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
