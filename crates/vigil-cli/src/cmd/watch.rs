use crate::output::print_json;
use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use vigil_core::config::Config;
use vigil_core::registry::{self, ConnectorKind, Overrides};
use vigil_core::watcher::{Poll, TickReport};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum WatchSubcommand {
    /// Watch a drop folder for new files
    Files {
        /// Folder to watch (default: files.watch in .vigil.yaml)
        #[arg(long)]
        watch: Option<PathBuf>,
        /// Skip file names containing this pattern (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
        #[command(flatten)]
        mode: RunArgs,
    },

    /// Watch an unread-mail spool
    Inbox {
        /// Spool directory of envelope JSON files
        #[arg(long)]
        spool: Option<PathBuf>,
        /// Messages considered per check
        #[arg(long)]
        max_results: Option<usize>,
        #[command(flatten)]
        mode: RunArgs,
    },

    /// Watch a chat-feed spool for urgent messages
    Chat {
        /// Spool directory of chat message JSON files
        #[arg(long)]
        spool: Option<PathBuf>,
        /// Urgent keyword (repeatable, replaces the configured list)
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[command(flatten)]
        mode: RunArgs,
    },

    /// Watch a professional-network notification spool
    Network {
        /// Spool directory of network event JSON files
        #[arg(long)]
        spool: Option<PathBuf>,
        #[command(flatten)]
        mode: RunArgs,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Seconds between checks (default: per-watcher value in .vigil.yaml)
    #[arg(long)]
    interval: Option<u64>,

    /// Show what would be recorded without writing anything
    #[arg(long, conflicts_with = "once")]
    demo: bool,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(vault: &Path, subcmd: WatchSubcommand, json: bool) -> anyhow::Result<()> {
    let (kind, overrides, mode) = match subcmd {
        WatchSubcommand::Files { watch, exclude, mode } => (
            ConnectorKind::Filesystem,
            Overrides {
                interval_secs: mode.interval,
                target: watch,
                exclude: non_empty(exclude),
                ..Default::default()
            },
            mode,
        ),
        WatchSubcommand::Inbox {
            spool,
            max_results,
            mode,
        } => (
            ConnectorKind::Inbox,
            Overrides {
                interval_secs: mode.interval,
                target: spool,
                max_results,
                ..Default::default()
            },
            mode,
        ),
        WatchSubcommand::Chat {
            spool,
            keywords,
            mode,
        } => (
            ConnectorKind::ChatFeed,
            Overrides {
                interval_secs: mode.interval,
                target: spool,
                keywords: non_empty(keywords),
                ..Default::default()
            },
            mode,
        ),
        WatchSubcommand::Network { spool, mode } => (
            ConnectorKind::ProfessionalNetwork,
            Overrides {
                interval_secs: mode.interval,
                target: spool,
                ..Default::default()
            },
            mode,
        ),
    };

    let config = Config::load(vault).context("failed to load config")?;
    let poller = registry::build(kind, vault, &config, overrides)
        .with_context(|| format!("failed to start {kind} watcher"))?;

    if mode.demo {
        demo(poller, json)
    } else if mode.once {
        once(poller, json)
    } else {
        run_until_interrupted(poller)
    }
}

// ---------------------------------------------------------------------------
// --demo
// ---------------------------------------------------------------------------

fn demo(mut poller: Box<dyn Poll>, json: bool) -> anyhow::Result<()> {
    let items = poller
        .preview()
        .with_context(|| format!("{} check failed", poller.name()))?;

    if json {
        return print_json(&serde_json::json!({
            "watcher": poller.name(),
            "items": items,
        }));
    }

    println!("[demo] Would create {} action files", items.len());
    for item in &items {
        println!("  - {item}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// --once
// ---------------------------------------------------------------------------

fn once(mut poller: Box<dyn Poll>, json: bool) -> anyhow::Result<()> {
    let report = poller.tick();
    if json {
        print_json(&report)?;
    } else {
        print_report(poller.name(), &report);
    }
    if let Some(e) = report.error {
        anyhow::bail!("{} check failed: {e}", poller.name());
    }
    Ok(())
}

fn print_report(name: &str, report: &TickReport) {
    println!(
        "{name}: {} new, {} created, {} failed",
        report.new_items,
        report.created.len(),
        report.failed.len()
    );
    for handle in &report.created {
        println!("  created: {}", handle.path.display());
    }
    for id in &report.failed {
        println!("  failed:  {id}");
    }
}

// ---------------------------------------------------------------------------
// Continuous polling
// ---------------------------------------------------------------------------

/// Poll on a blocking thread until Ctrl+C or SIGTERM. Either is a clean exit.
fn run_until_interrupted(mut poller: Box<dyn Poll>) -> anyhow::Result<()> {
    let name = poller.name().to_string();
    println!(
        "Starting {name} (checking every {}s). Press Ctrl+C to stop.",
        poller.interval().as_secs()
    );

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    let result = rt.block_on(async move {
        let polling = tokio::task::spawn_blocking::<_, ()>(move || poller.run());
        tokio::select! {
            joined = polling => joined.context("watcher loop stopped unexpectedly"),
            signal = shutdown_signal() => {
                let signal = signal?;
                tracing::info!(watcher = %name, signal, "stopped");
                Ok(())
            }
        }
    });

    // The polling thread is parked in sleep or a tick; do not wait for it.
    rt.shutdown_background();
    result
}

/// Resolves with the name of the first shutdown signal received.
#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).context("failed to listen for SIGTERM")?;
    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => {
            interrupted.context("failed to listen for Ctrl+C")?;
            Ok("interrupt")
        }
        _ = terminate.recv() => Ok("terminate"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    Ok("interrupt")
}
