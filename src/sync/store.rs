//! Durable snapshot storage keyed by table id.
//!
//! The relay keeps the latest board of every table so that a peer that
//! (re)joins starts from the current state. Only get/set by key is
//! required of a backend; `MemoryStore` is the in-process one.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::core::{Board, BoardError, Result, DATA_VERSION};

use super::message::TableId;

/// Key/value backend holding one serialized board per table.
pub trait SnapshotStore {
    fn get(&self, table_id: &TableId) -> Option<String>;
    fn set(&mut self, table_id: &TableId, snapshot: String);
}

/// Snapshot store backed by a hash map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    snapshots: FxHashMap<TableId, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, table_id: &TableId) -> Option<String> {
        self.snapshots.get(table_id).cloned()
    }

    fn set(&mut self, table_id: &TableId, snapshot: String) {
        self.snapshots.insert(table_id.clone(), snapshot);
    }
}

/// Serialize `board` and store it under `table_id`.
///
/// # Errors
///
/// [`BoardError::Snapshot`] if the board cannot be serialized.
pub fn save_board<S: SnapshotStore + ?Sized>(store: &mut S, table_id: &TableId, board: &Board) -> Result<()> {
    let json = serde_json::to_string(board)?;
    debug!(%table_id, bytes = json.len(), "Saving board snapshot");
    store.set(table_id, json);
    Ok(())
}

/// Load the board stored under `table_id`.
///
/// # Errors
///
/// - [`BoardError::UnknownTable`] if nothing is stored under `table_id`.
/// - [`BoardError::Snapshot`] on malformed JSON or a newer data version.
pub fn load_board<S: SnapshotStore + ?Sized>(store: &S, table_id: &TableId) -> Result<Board> {
    let json = store.get(table_id).ok_or_else(|| BoardError::UnknownTable {
        table_id: table_id.to_string(),
    })?;
    let board: Board = serde_json::from_str(&json)?;
    if board.data_version > DATA_VERSION {
        return Err(BoardError::Snapshot {
            message: format!(
                "snapshot data version {} is newer than supported {DATA_VERSION}",
                board.data_version
            ),
        });
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardId, CardRegion, PlayerSide};

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let id = TableId::new("table");
        let mut board = Board::new();
        board.add_card(CardId::new("x"), PlayerSide::P1, CardRegion::Hand);

        save_board(&mut store, &id, &board).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(load_board(&store, &id).unwrap(), board);
    }

    #[test]
    fn test_unknown_table() {
        let store = MemoryStore::new();
        let err = load_board(&store, &TableId::new("nope")).unwrap_err();
        assert_eq!(err, BoardError::UnknownTable { table_id: "nope".to_string() });
    }

    #[test]
    fn test_rejects_newer_data_version() {
        let mut store = MemoryStore::new();
        let id = TableId::new("future");
        let mut board = Board::new();
        board.data_version = DATA_VERSION + 1;
        save_board(&mut store, &id, &board).unwrap();

        assert!(matches!(load_board(&store, &id), Err(BoardError::Snapshot { .. })));
    }

    #[test]
    fn test_rejects_garbage() {
        let mut store = MemoryStore::new();
        let id = TableId::new("bad");
        store.set(&id, "not json".to_string());

        assert!(matches!(load_board(&store, &id), Err(BoardError::Snapshot { .. })));
    }
}
