//! Engine error taxonomy.
//!
//! Every error is raised before an action commits, so a failed action
//! leaves the board, the log and the history untouched.

use derive_more::{Display, Error};

use super::object::ObjectId;
use super::region::TokenRegion;

/// Which history stack an undo/redo request read from.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum HistoryDirection {
    #[display("undo")]
    Undo,
    #[display("redo")]
    Redo,
}

/// Error raised by a board operation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// A watcher tried to mutate, or a side-gated step was taken out of turn.
    #[display("Forbidden operation: {reason}")]
    ForbiddenOperation { reason: String },

    /// Malformed move bounds.
    #[display("Invalid range: {count} card(s) from index {from_index} of a region holding {size}")]
    InvalidRange { from_index: usize, count: usize, size: usize },

    /// The source pool holds fewer tokens than requested.
    #[display("Insufficient tokens: requested {requested}, available {available}")]
    InsufficientTokens { requested: usize, available: usize },

    /// The destination pool would overflow its capacity.
    #[display("Capacity exceeded: {region} holds {current}, adding {adding} exceeds {capacity}")]
    CapacityExceeded {
        region: TokenRegion,
        current: usize,
        adding: usize,
        capacity: usize,
    },

    /// Undo or redo with nothing to recover.
    #[display("No {direction} history")]
    EmptyHistory { direction: HistoryDirection },

    /// No object with this id, or not where the caller said it was.
    #[display("Object not found: {id}")]
    ObjectNotFound { id: ObjectId },

    /// No table with this id.
    #[display("Unknown table: {table_id}")]
    UnknownTable { table_id: String },

    /// A snapshot or message could not be (de)serialized.
    #[display("Snapshot error: {message}")]
    Snapshot { message: String },
}

impl BoardError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::ForbiddenOperation { reason: reason.into() }
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot {
            message: err.to_string(),
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T, E = BoardError> = std::result::Result<T, E>;
