use super::{iso, truncate_chars};
use crate::dedup::ProcessedIds;
use crate::error::Result;
use crate::record::{ActionRecord, RecordBody};
use crate::sources::Source;
use crate::watcher::{Connector, Detection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_KEYWORDS: [&str; 7] = [
    "urgent",
    "asap",
    "invoice",
    "payment",
    "help",
    "emergency",
    "critical",
];
pub const DEFAULT_WARMUP: usize = 5;
const PREVIEW_CHARS: usize = 200;

/// Latest unread message of one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat: String,
    #[serde(default)]
    pub preview: String,
    pub received: DateTime<Utc>,
}

/// Chat-feed connector. Keeps unseen messages matching an urgent keyword;
/// non-urgent ones are kept only while fewer than `warmup` ids have been
/// consumed, so a fresh install shows some activity.
///
/// The native id embeds the message's receive time, so the same chat seen
/// with a new timestamp is a new item.
pub struct ChatConnector<S> {
    source: S,
    keywords: Vec<String>,
    warmup: usize,
}

impl<S: Source<ChatMessage>> ChatConnector<S> {
    pub fn new(source: S, keywords: Vec<String>, warmup: usize) -> Self {
        Self {
            source,
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            warmup,
        }
    }

    pub fn is_urgent(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }
}

impl<S: Source<ChatMessage>> Connector for ChatConnector<S> {
    type Item = ChatMessage;

    fn name(&self) -> &str {
        "ChatWatcher"
    }

    fn source_key(&self) -> &str {
        "chat"
    }

    fn fetch(&mut self, seen: &ProcessedIds) -> Result<Vec<ChatMessage>> {
        let messages = self.source.poll()?;
        tracing::info!(count = messages.len(), "found unread chats");
        let mut kept = Vec::new();
        for msg in messages {
            if !seen.should_process(&self.native_id(&msg)) {
                continue;
            }
            if self.is_urgent(&msg.preview) || seen.len() + kept.len() < self.warmup {
                kept.push(msg);
            }
        }
        Ok(kept)
    }

    fn native_id(&self, item: &ChatMessage) -> String {
        format!("chat_{}_{}", item.chat, item.received.timestamp())
    }

    fn to_record(&self, item: &ChatMessage) -> Result<ActionRecord> {
        let urgent = self.is_urgent(&item.preview);
        let preview = if item.preview.is_empty() {
            "(message preview unavailable)".to_string()
        } else {
            truncate_chars(&item.preview, PREVIEW_CHARS)
        };

        let body = RecordBody::new(format!("Chat message from {}", item.chat))
            .section("Message Preview", preview)
            .section("Urgent", if urgent { "YES" } else { "No" })
            .section(
                "Response",
                "Write your response here before moving to approval.",
            )
            .actions([
                "Read full message",
                "Analyze request",
                "Draft response",
                "Request approval",
                "Send reply",
                "Mark as done",
            ])
            .notes("Add context or follow-up items here.");

        let filename = format!("CHAT_{}_{}", item.chat, item.received.timestamp());
        Ok(ActionRecord::new("chat_message", &filename)
            .field("priority", if urgent { "high" } else { "normal" })
            .field("from", item.chat.as_str())
            .field("received", iso(item.received))
            .field("urgent", urgent)
            .field("message_id", self.native_id(item))
            .body(body.render()))
    }

    fn detection(&self, item: &ChatMessage) -> Detection {
        Detection::new(
            "chat_message_detected",
            format!("Chat message from {}", item.chat),
        )
        .detail("message_id", self.native_id(item))
        .detail("from", item.chat.as_str())
        .detail("urgent", self.is_urgent(&item.preview))
    }

    fn describe(&self, item: &ChatMessage) -> String {
        format!("{}: {}...", item.chat, truncate_chars(&item.preview, 50))
    }
}
