use super::{iso, truncate_chars};
use crate::dedup::ProcessedIds;
use crate::error::Result;
use crate::record::{ActionRecord, RecordBody};
use crate::sources::Source;
use crate::watcher::{Connector, Detection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkEventKind {
    Mention,
    Message,
    Comment,
    ConnectionRequest,
    Reaction,
}

impl NetworkEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkEventKind::Mention => "mention",
            NetworkEventKind::Message => "message",
            NetworkEventKind::Comment => "comment",
            NetworkEventKind::ConnectionRequest => "connection_request",
            NetworkEventKind::Reaction => "reaction",
        }
    }

    fn title(self) -> &'static str {
        match self {
            NetworkEventKind::Mention => "Mention",
            NetworkEventKind::Message => "Message",
            NetworkEventKind::Comment => "Comment",
            NetworkEventKind::ConnectionRequest => "Connection request",
            NetworkEventKind::Reaction => "Reaction",
        }
    }

    /// Direct messages and connection requests wait on a reply.
    pub fn priority(self) -> &'static str {
        match self {
            NetworkEventKind::Message | NetworkEventKind::ConnectionRequest => "high",
            _ => "normal",
        }
    }
}

impl fmt::Display for NetworkEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification from the professional-network feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub id: String,
    pub kind: NetworkEventKind,
    pub actor: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    pub received: DateTime<Utc>,
}

pub struct NetworkConnector<S> {
    source: S,
}

impl<S: Source<NetworkEvent>> NetworkConnector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: Source<NetworkEvent>> Connector for NetworkConnector<S> {
    type Item = NetworkEvent;

    fn name(&self) -> &str {
        "NetworkWatcher"
    }

    fn source_key(&self) -> &str {
        "network"
    }

    fn fetch(&mut self, _seen: &ProcessedIds) -> Result<Vec<NetworkEvent>> {
        self.source.poll()
    }

    fn native_id(&self, item: &NetworkEvent) -> String {
        item.id.clone()
    }

    fn to_record(&self, item: &NetworkEvent) -> Result<ActionRecord> {
        let content = if item.text.is_empty() {
            "(no text)".to_string()
        } else {
            item.text.clone()
        };
        let mut body = RecordBody::new(format!("{} from {}", item.kind.title(), item.actor))
            .section("Content", content);
        if let Some(url) = &item.url {
            body = body.section("Link", url.as_str());
        }
        let body = body.actions([
            "Review",
            "Draft reply",
            "Request approval to respond",
            "Move to Done when complete",
        ]);

        let filename = format!("NETWORK_{}_{}", item.id, item.actor);
        let mut record = ActionRecord::new("network_event", &filename)
            .field("priority", item.kind.priority())
            .field("event_kind", item.kind.as_str())
            .field("actor", item.actor.as_str())
            .field("received", iso(item.received))
            .field("event_id", item.id.as_str());
        if let Some(url) = &item.url {
            record = record.field("url", url.as_str());
        }
        Ok(record.body(body.render()))
    }

    fn detection(&self, item: &NetworkEvent) -> Detection {
        Detection::new(
            "network_event_detected",
            format!("{} from {}", item.kind.title(), item.actor),
        )
        .detail("event_id", item.id.as_str())
        .detail("kind", item.kind.as_str())
        .detail("actor", item.actor.as_str())
    }

    fn describe(&self, item: &NetworkEvent) -> String {
        format!("{} {}: {}", item.kind, item.actor, truncate_chars(&item.text, 50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::sources::SpoolSource;
    use crate::watcher::Watcher;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn parses_spooled_event() {
        let text = r#"{"id":"urn:1","kind":"connection_request","actor":"Dana Cruz","received":"2026-03-01T08:00:00Z"}"#;
        let ev: NetworkEvent = serde_json::from_str(text).unwrap();
        assert_eq!(ev.kind, NetworkEventKind::ConnectionRequest);
        assert!(ev.url.is_none());
    }

    #[test]
    fn record_header_and_filename() {
        let conn = NetworkConnector::new(SpoolSource::<NetworkEvent>::new("unused"));
        let ev = NetworkEvent {
            id: "urn:li:1".to_string(),
            kind: NetworkEventKind::Message,
            actor: "Dana Cruz".to_string(),
            text: "Are you open to a call?".to_string(),
            url: Some("https://example.com/m/1".to_string()),
            received: "2026-03-01T08:00:00Z".parse().unwrap(),
        };
        let rec = conn.to_record(&ev).unwrap();
        assert_eq!(rec.filename(), "NETWORK_urn_li_1_Dana_Cruz");

        let parsed = record::parse(&rec.render()).unwrap();
        assert_eq!(parsed.kind(), Some("network_event"));
        assert_eq!(parsed.header.get_str("priority"), Some("high"));
        assert_eq!(parsed.header.get_str("event_kind"), Some("message"));
        assert_eq!(parsed.header.get_str("url"), Some("https://example.com/m/1"));
        assert!(parsed.body.contains("## Link\nhttps://example.com/m/1"));
    }

    #[test]
    fn watcher_dedups_events() {
        let spool = TempDir::new().unwrap();
        let vault = TempDir::new().unwrap();
        std::fs::write(
            spool.path().join("e1.json"),
            r#"{"id":"e1","kind":"mention","actor":"Eve","text":"nice post","received":"2026-03-01T08:00:00Z"}"#,
        )
        .unwrap();

        let conn = NetworkConnector::new(SpoolSource::new(spool.path()));
        let mut watcher = Watcher::new(vault.path(), conn, Duration::from_millis(1)).unwrap();
        let reports = watcher.run_ticks(2);
        assert_eq!(reports[0].created.len(), 1);
        assert_eq!(reports[1].new_items, 0);
    }
}
