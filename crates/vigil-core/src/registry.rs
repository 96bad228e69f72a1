use crate::config::Config;
use crate::connectors::{ChatConnector, FilesystemConnector, InboxConnector, NetworkConnector};
use crate::error::{Result, VigilError};
use crate::sources::SpoolSource;
use crate::watcher::{Poll, Watcher};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConnectorKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Filesystem,
    Inbox,
    ChatFeed,
    ProfessionalNetwork,
}

impl ConnectorKind {
    pub fn all() -> &'static [ConnectorKind] {
        &[
            ConnectorKind::Filesystem,
            ConnectorKind::Inbox,
            ConnectorKind::ChatFeed,
            ConnectorKind::ProfessionalNetwork,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectorKind::Filesystem => "files",
            ConnectorKind::Inbox => "inbox",
            ConnectorKind::ChatFeed => "chat",
            ConnectorKind::ProfessionalNetwork => "network",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConnectorKind {
    type Err = VigilError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "files" => Ok(ConnectorKind::Filesystem),
            "inbox" => Ok(ConnectorKind::Inbox),
            "chat" => Ok(ConnectorKind::ChatFeed),
            "network" => Ok(ConnectorKind::ProfessionalNetwork),
            _ => Err(VigilError::UnknownConnector(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Command-line overrides layered on top of `Config`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub interval_secs: Option<u64>,
    /// Watch folder (files) or spool directory (inbox, chat, network).
    pub target: Option<PathBuf>,
    pub exclude: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub max_results: Option<usize>,
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build the watcher for `kind`. Errors here are startup failures: missing
/// watch target, zero interval, or an unusable vault.
pub fn build(
    kind: ConnectorKind,
    vault: &Path,
    config: &Config,
    overrides: Overrides,
) -> Result<Box<dyn Poll>> {
    let interval_secs = overrides.interval_secs.unwrap_or(match kind {
        ConnectorKind::Filesystem => config.files.interval_secs,
        ConnectorKind::Inbox => config.inbox.interval_secs,
        ConnectorKind::ChatFeed => config.chat.interval_secs,
        ConnectorKind::ProfessionalNetwork => config.network.interval_secs,
    });
    if interval_secs == 0 {
        return Err(VigilError::InvalidConfig(
            "interval must be greater than zero".to_string(),
        ));
    }
    let interval = Duration::from_secs(interval_secs);

    let configured = match kind {
        ConnectorKind::Filesystem => config.files.watch.clone(),
        ConnectorKind::Inbox => config.inbox.spool.clone(),
        ConnectorKind::ChatFeed => config.chat.spool.clone(),
        ConnectorKind::ProfessionalNetwork => config.network.spool.clone(),
    };
    let target = overrides.target.or(configured).ok_or_else(|| {
        let what = match kind {
            ConnectorKind::Filesystem => "a watch folder (--watch or files.watch)",
            _ => "a spool directory (--spool or <kind>.spool)",
        };
        VigilError::InvalidConfig(format!("{kind} watcher needs {what}"))
    })?;

    tracing::debug!(%kind, target = %target.display(), interval_secs, "building watcher");

    let poller: Box<dyn Poll> = match kind {
        ConnectorKind::Filesystem => {
            let exclude = overrides
                .exclude
                .unwrap_or_else(|| config.files.exclude.clone());
            let connector = FilesystemConnector::new(target, exclude)?;
            Box::new(Watcher::new(vault, connector, interval)?)
        }
        ConnectorKind::Inbox => {
            if !target.is_dir() {
                return Err(VigilError::WatchTargetMissing(target));
            }
            let max = overrides.max_results.unwrap_or(config.inbox.max_results);
            let connector = InboxConnector::new(SpoolSource::new(target), max);
            Box::new(Watcher::new(vault, connector, interval)?)
        }
        ConnectorKind::ChatFeed => {
            if !target.is_dir() {
                return Err(VigilError::WatchTargetMissing(target));
            }
            let keywords = overrides
                .keywords
                .unwrap_or_else(|| config.chat.keywords.clone());
            let connector =
                ChatConnector::new(SpoolSource::new(target), keywords, config.chat.warmup);
            Box::new(Watcher::new(vault, connector, interval)?)
        }
        ConnectorKind::ProfessionalNetwork => {
            if !target.is_dir() {
                return Err(VigilError::WatchTargetMissing(target));
            }
            let connector = NetworkConnector::new(SpoolSource::new(target));
            Box::new(Watcher::new(vault, connector, interval)?)
        }
    };
    Ok(poller)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
