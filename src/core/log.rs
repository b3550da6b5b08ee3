//! Action log records.
//!
//! Every player-visible action appends one or more `LogRecord`s. Records
//! are immutable once created and travel to the peer alongside the board
//! snapshot they describe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::side::SheetSide;

/// Who may read a log line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogVisibility {
    /// Everyone at the table.
    #[default]
    Shown,
    /// Only the side that wrote it (e.g. names of drawn cards).
    OwnerOnly,
    /// Nobody; kept for replay tooling.
    Hidden,
}

/// One line of the action log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub body: String,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<SheetSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watcher_session_id: Option<String>,
    pub visibility: LogVisibility,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(body: impl Into<String>, side: Option<SheetSide>, visibility: LogVisibility) -> Self {
        Self {
            body: body.into(),
            time: Utc::now(),
            side,
            watcher_session_id: None,
            visibility,
        }
    }

    /// Can `reader` see this line?
    #[must_use]
    pub fn visible_to(&self, reader: SheetSide) -> bool {
        match self.visibility {
            LogVisibility::Shown => true,
            LogVisibility::OwnerOnly => self.side == Some(reader),
            LogVisibility::Hidden => false,
        }
    }
}

/// Caller-supplied log text, turned into a `LogRecord` when an action runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub visibility: LogVisibility,
}

impl LogEntry {
    pub fn new(text: impl Into<String>, visibility: LogVisibility) -> Self {
        Self {
            text: text.into(),
            visibility,
        }
    }
}

impl From<&str> for LogEntry {
    fn from(text: &str) -> Self {
        Self::new(text, LogVisibility::Shown)
    }
}

impl From<String> for LogEntry {
    fn from(text: String) -> Self {
        Self::new(text, LogVisibility::Shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        let shown = LogRecord::new("moved", Some(SheetSide::P1), LogVisibility::Shown);
        let private = LogRecord::new("-> card", Some(SheetSide::P1), LogVisibility::OwnerOnly);
        let hidden = LogRecord::new("debug", Some(SheetSide::P1), LogVisibility::Hidden);

        assert!(shown.visible_to(SheetSide::Watcher));
        assert!(private.visible_to(SheetSide::P1));
        assert!(!private.visible_to(SheetSide::P2));
        assert!(!hidden.visible_to(SheetSide::P1));
    }

    #[test]
    fn test_record_serde() {
        let record = LogRecord::new("drew 3 cards", Some(SheetSide::P2), LogVisibility::OwnerOnly);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["visibility"], "owner-only");
        assert_eq!(json["side"], "p2");
        assert!(json.get("watcherSessionId").is_none());

        let back: LogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
