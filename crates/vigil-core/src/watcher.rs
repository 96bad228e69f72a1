use crate::audit::{AuditEntry, AuditLog, AuditStatus};
use crate::dedup::ProcessedIds;
use crate::error::Result;
use crate::record::{ActionRecord, RecordHandle};
use crate::vault::VaultLayout;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Span;

pub const WATCHER_ERROR: &str = "watcher_error";
pub const RECORD_FAILED: &str = "record_failed";

// ---------------------------------------------------------------------------
// Connector contract
// ---------------------------------------------------------------------------

/// Audit entry content written after a record is created for an item.
#[derive(Debug, Clone)]
pub struct Detection {
    pub action_type: String,
    pub description: String,
    pub details: Map<String, Value>,
}

impl Detection {
    pub fn new(action_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            description: description.into(),
            details: Map::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// A source-specific adapter. The scheduler owns one connector value and
/// drives it; connectors get a read-only view of the dedup store and never
/// see the audit log.
pub trait Connector {
    type Item;

    /// Watcher name recorded in audit entries.
    fn name(&self) -> &str;

    /// Suffix of the dedup state file, e.g. `emails` for `.processed_emails`.
    fn source_key(&self) -> &str;

    /// Items currently visible at the source. Called once per tick; must not
    /// rely on the previous return value. `seen` holds the ids already
    /// consumed, for connectors that cap or sample their batch: the cap
    /// must apply to unseen items or a source that keeps returning old
    /// items starves new ones.
    fn fetch(&mut self, seen: &ProcessedIds) -> Result<Vec<Self::Item>>;

    /// Identifier that is stable across polls for the same real-world event.
    fn native_id(&self, item: &Self::Item) -> String;

    fn to_record(&self, item: &Self::Item) -> Result<ActionRecord>;

    fn detection(&self, item: &Self::Item) -> Detection;

    /// Runs after the record is on disk. Failures are logged only.
    fn after_record(&mut self, _item: &Self::Item, _handle: &RecordHandle) -> Result<()> {
        Ok(())
    }

    /// One-line description used by demo mode.
    fn describe(&self, item: &Self::Item) -> String {
        self.native_id(item)
    }
}

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub new_items: usize,
    pub created: Vec<RecordHandle>,
    /// Native ids whose record could not be created.
    pub failed: Vec<String>,
    /// Set when the connector call itself failed.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Watcher
// ---------------------------------------------------------------------------

/// Poll scheduler for one connector.
///
/// Each tick fetches a batch, drops already-processed ids, writes one action
/// record per surviving item in connector order and flushes the dedup store.
/// Nothing raised by the connector or by a single item escapes a tick.
pub struct Watcher<C: Connector> {
    connector: C,
    layout: VaultLayout,
    processed: ProcessedIds,
    audit: AuditLog,
    interval: Duration,
    span: Span,
}

impl<C: Connector> Watcher<C> {
    /// Prepare the vault and load the connector's dedup state. Fails only
    /// when the vault folders cannot be created.
    pub fn new(vault: impl Into<PathBuf>, connector: C, interval: Duration) -> Result<Self> {
        let layout = VaultLayout::new(vault);
        layout.ensure()?;

        let span = tracing::info_span!("watcher", name = %connector.name());
        let processed =
            span.in_scope(|| ProcessedIds::load(layout.processed_file(connector.source_key())));
        span.in_scope(|| {
            tracing::info!(
                interval_secs = interval.as_secs_f64(),
                known_ids = processed.len(),
                "initialized watcher"
            )
        });

        Ok(Self {
            audit: AuditLog::new(layout.logs()),
            connector,
            layout,
            processed,
            interval,
            span,
        })
    }

    pub fn processed(&self) -> &ProcessedIds {
        &self.processed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch from the connector and keep only unseen ids, first occurrence
    /// wins within a batch.
    pub fn check_for_updates(&mut self) -> Result<Vec<C::Item>> {
        let items = self.connector.fetch(&self.processed)?;
        let mut batch_ids = HashSet::new();
        let connector = &self.connector;
        let processed = &self.processed;
        Ok(items
            .into_iter()
            .filter(|item| {
                let id = connector.native_id(item);
                processed.should_process(&id) && batch_ids.insert(id)
            })
            .collect())
    }

    /// Write the action record for `item` and log its detection.
    pub fn create_action_file(&mut self, item: &C::Item) -> Result<RecordHandle> {
        let record = self.connector.to_record(item)?;
        let handle = record.write(&self.layout.needs_action())?;

        if let Err(e) = self.connector.after_record(item, &handle) {
            tracing::warn!(file = %handle.filename, "post-record step failed: {e}");
        }

        let detection = self.connector.detection(item);
        let entry = AuditEntry::new(
            self.connector.name(),
            detection.action_type,
            detection.description,
            AuditStatus::Pending,
        )
        .with_details(detection.details)
        .detail("file", handle.path.display().to_string());
        self.record_audit(&entry);

        Ok(handle)
    }

    /// Run one poll-check-dispatch sequence.
    pub fn tick(&mut self) -> TickReport {
        let span = self.span.clone();
        let _entered = span.enter();
        let mut report = TickReport::default();

        let items = match self.check_for_updates() {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("error in main loop: {e}");
                let entry = AuditEntry::new(
                    self.connector.name(),
                    WATCHER_ERROR,
                    format!("Error: {e}"),
                    AuditStatus::Failed,
                );
                self.record_audit(&entry);
                report.error = Some(e.to_string());
                return report;
            }
        };

        report.new_items = items.len();
        if !items.is_empty() {
            tracing::info!(count = items.len(), "found new items");
        }

        for item in &items {
            let id = self.connector.native_id(item);
            // Consumed once: a failed item is dropped, not retried next tick.
            self.processed.mark_processed(id.clone());
            match self.create_action_file(item) {
                Ok(handle) => report.created.push(handle),
                Err(e) => {
                    tracing::error!(native_id = %id, "failed to create action file: {e}");
                    let entry = AuditEntry::new(
                        self.connector.name(),
                        RECORD_FAILED,
                        format!("Failed to create action file: {e}"),
                        AuditStatus::Failed,
                    )
                    .detail("native_id", id.clone());
                    self.record_audit(&entry);
                    report.failed.push(id);
                }
            }
        }

        if let Err(e) = self.processed.flush() {
            tracing::warn!("could not save processed ids: {e}");
        }
        report
    }

    /// Run `count` ticks, sleeping the interval between them.
    pub fn run_ticks(&mut self, count: usize) -> Vec<TickReport> {
        let mut reports = Vec::with_capacity(count);
        for i in 0..count {
            reports.push(self.tick());
            if i + 1 < count {
                std::thread::sleep(self.interval);
            }
        }
        reports
    }

    /// Poll forever. Only process termination stops the loop.
    pub fn run(&mut self) -> ! {
        self.span.in_scope(|| tracing::info!("starting watcher"));
        loop {
            self.tick();
            std::thread::sleep(self.interval);
        }
    }

    /// What the next tick would pick up, without writing or marking anything.
    pub fn preview(&mut self) -> Result<Vec<String>> {
        let items = self.check_for_updates()?;
        Ok(items.iter().map(|item| self.connector.describe(item)).collect())
    }

    fn record_audit(&self, entry: &AuditEntry) {
        if let Err(e) = self.audit.append(entry) {
            tracing::error!("failed to write audit log: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Poll: type-erased watcher
// ---------------------------------------------------------------------------

/// Object-safe view of a `Watcher`, so the CLI can pick a connector at
/// startup and drive it without knowing its item type.
pub trait Poll: Send {
    fn name(&self) -> &str;
    fn interval(&self) -> Duration;
    fn tick(&mut self) -> TickReport;
    fn run_ticks(&mut self, count: usize) -> Vec<TickReport>;
    fn preview(&mut self) -> Result<Vec<String>>;
    fn run(&mut self) -> !;
}

impl<C> Poll for Watcher<C>
where
    C: Connector + Send,
{
    fn name(&self) -> &str {
        self.connector.name()
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self) -> TickReport {
        Watcher::tick(self)
    }

    fn run_ticks(&mut self, count: usize) -> Vec<TickReport> {
        Watcher::run_ticks(self, count)
    }

    fn preview(&mut self) -> Result<Vec<String>> {
        Watcher::preview(self)
    }

    fn run(&mut self) -> ! {
        Watcher::run(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
