//! Wire message exchanged between peers of one table.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{Board, LogRecord, Result, SheetSide};

/// Identifier of a table (one game between two sides plus watchers).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub String);

impl TableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full board snapshot plus the log lines the sender just appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    pub table_id: TableId,
    pub side: SheetSide,
    pub board: Board,
    pub appended_action_logs: Vector<LogRecord>,
}

impl SyncMessage {
    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// [`crate::BoardError::Snapshot`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// [`crate::BoardError::Snapshot`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Outbound half of a peer connection.
///
/// Fire-and-forget: delivery failures are the channel's concern and never
/// reach the action that triggered the send.
pub trait SyncChannel {
    fn send(&mut self, message: SyncMessage);
}
