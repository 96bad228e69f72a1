use crate::error::Result;
use crate::{io, paths};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// AuditStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pending,
    Approved,
    Completed,
    Failed,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Pending => "pending",
            AuditStatus::Approved => "approved",
            AuditStatus::Completed => "completed",
            AuditStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

/// One lifecycle event. Entries are immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub watcher: String,
    pub action_type: String,
    pub description: String,
    pub status: AuditStatus,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl AuditEntry {
    pub fn new(
        watcher: impl Into<String>,
        action_type: impl Into<String>,
        description: impl Into<String>,
        status: AuditStatus,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            watcher: watcher.into(),
            action_type: action_type.into(),
            description: description.into(),
            status,
            details: Map::new(),
        }
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// AuditLog
// ---------------------------------------------------------------------------

/// Day-partitioned audit log: one JSON array per UTC date under `Logs/`.
///
/// Each append reads the whole day file, pushes the entry and rewrites the
/// file. This assumes a single writer per day file; two processes appending
/// on the same day can lose each other's entries (last writer wins).
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        paths::audit_file(&self.dir, date)
    }

    /// Append `entry` to the file for the UTC date of its timestamp.
    pub fn append(&self, entry: &AuditEntry) -> Result<()> {
        let date = entry.timestamp.date_naive();
        let path = self.file_for(date);
        let mut entries = self.read_day(date);
        entries.push(entry.clone());
        let data = serde_json::to_string_pretty(&entries)?;
        io::atomic_write(&path, data.as_bytes())
    }

    /// All entries for `date`. A missing or unparsable file reads as empty;
    /// the next append then overwrites it.
    pub fn read_day(&self, date: NaiveDate) -> Vec<AuditEntry> {
        let path = self.file_for(date);
        let text = match io::read_optional(&path) {
            Ok(Some(text)) => text,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "could not read audit log: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), "audit log unparsable, starting fresh: {e}");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
