//! Source-specific adapters plugged into [`Watcher`](crate::watcher::Watcher).

pub mod chat;
pub mod files;
pub mod inbox;
pub mod network;

pub use chat::{ChatConnector, ChatMessage};
pub use files::{FileDrop, FilesystemConnector};
pub use inbox::{Envelope, InboxConnector};
pub use network::{NetworkConnector, NetworkEvent, NetworkEventKind};

use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 UTC with microseconds and a trailing `Z`.
pub(crate) fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn iso_has_trailing_z() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(iso(ts), "2026-01-02T03:04:05.000000Z");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
