use super::{iso, truncate_chars};
use crate::dedup::ProcessedIds;
use crate::error::Result;
use crate::record::{ActionRecord, RecordBody};
use crate::sources::Source;
use crate::watcher::{Connector, Detection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RESULTS: usize = 10;
const BODY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    #[serde(default = "unknown_sender")]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default = "no_subject")]
    pub subject: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

fn unknown_sender() -> String {
    "Unknown".to_string()
}

fn no_subject() -> String {
    "(No Subject)".to_string()
}

impl Envelope {
    /// Display part of the sender, `Ann Lee <ann@x.io>` -> `Ann Lee`.
    pub fn sender_name(&self) -> &str {
        self.from.split('<').next().unwrap_or("").trim()
    }
}

/// Unread-mail connector. At most `max_results` unseen envelopes are
/// returned per tick; the message id is the native id.
pub struct InboxConnector<S> {
    source: S,
    max_results: usize,
}

impl<S: Source<Envelope>> InboxConnector<S> {
    pub fn new(source: S, max_results: usize) -> Self {
        Self {
            source,
            max_results,
        }
    }
}

impl<S: Source<Envelope>> Connector for InboxConnector<S> {
    type Item = Envelope;

    fn name(&self) -> &str {
        "InboxWatcher"
    }

    fn source_key(&self) -> &str {
        "emails"
    }

    fn fetch(&mut self, seen: &ProcessedIds) -> Result<Vec<Envelope>> {
        let mut messages = self.source.poll()?;
        messages.retain(|m| seen.should_process(&m.id));
        messages.truncate(self.max_results);
        Ok(messages)
    }

    fn native_id(&self, item: &Envelope) -> String {
        item.id.clone()
    }

    fn to_record(&self, item: &Envelope) -> Result<ActionRecord> {
        let message = if item.body.is_empty() {
            "(No body)".to_string()
        } else {
            truncate_chars(&item.body, BODY_PREVIEW_CHARS)
        };
        let body = RecordBody::new(format!("Email from {}", item.from))
            .section("Subject", item.subject.as_str())
            .section("Message", message)
            .actions([
                "Read and analyze",
                "Draft response",
                "Request approval to send",
                "Move to Done when complete",
            ]);

        Ok(
            ActionRecord::new("email", &format!("EMAIL_{}_{}", item.id, item.sender_name()))
                .field("priority", "normal")
                .field("from", item.from.as_str())
                .field("to", item.to.as_str())
                .field("subject", item.subject.as_str())
                .field("date", item.date.as_str())
                .field("email_id", item.id.as_str())
                .field("received", iso(Utc::now()))
                .body(body.render()),
        )
    }

    fn detection(&self, item: &Envelope) -> Detection {
        Detection::new(
            "email_detected",
            format!("Email from {}: {}", item.from, item.subject),
        )
        .detail("email_id", item.id.as_str())
        .detail("from", item.from.as_str())
        .detail("subject", item.subject.as_str())
    }

    fn describe(&self, item: &Envelope) -> String {
        format!("{}: {}", item.from, item.subject)
    }
}
