//! In-process relay: the server side of table synchronization.
//!
//! A relay creates tables, persists the latest board of each one, and
//! forwards every published message to the other peers of the same
//! table. Peers talk to it through `RelayEndpoint`, which implements
//! `SyncChannel` and can be attached to a `Table`.
//!
//! Shared state sits behind one `Arc<Mutex<_>>`, so endpoints can be
//! moved to other threads. No ordering is imposed between peers: the
//! last published board wins.
//!
//! Watchers never publish. Their registry entry on the board is written
//! by the relay itself (`set_watcher_info`) and fanned out to every peer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::{Board, GameRng, LogRecord, LogVisibility, Result, SheetSide, WatcherInfo};

use super::message::{SyncChannel, SyncMessage, TableId};
use super::store::{load_board, save_board, MemoryStore, SnapshotStore};

/// Length of generated table ids.
pub const TABLE_ID_LEN: usize = 10;

/// Lowercase letters and digits without the look-alikes `0 1 l o`.
const READABLE_CHARS: &[u8] = b"abcdefghijkmnpqrstuvwxyz23456789";

/// Paths each seat uses to join a freshly created table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinUrls {
    pub p1: String,
    pub p2: String,
    pub watch: String,
}

impl JoinUrls {
    #[must_use]
    pub fn for_table(table_id: &TableId) -> Self {
        Self {
            p1: format!("/b/{table_id}/p1"),
            p2: format!("/b/{table_id}/p2"),
            watch: format!("/b/{table_id}/watch"),
        }
    }
}

struct PeerSlot {
    id: u64,
    side: SheetSide,
    inbox: VecDeque<SyncMessage>,
}

struct RelayInner<S> {
    store: S,
    rng: GameRng,
    next_peer: u64,
    peers: FxHashMap<TableId, Vec<PeerSlot>>,
}

impl<S: SnapshotStore> RelayInner<S> {
    fn readable_id(&mut self) -> TableId {
        let id = (0..TABLE_ID_LEN)
            .map(|_| char::from(READABLE_CHARS[self.rng.pick_index(READABLE_CHARS.len())]))
            .collect::<String>();
        TableId(id)
    }
}

fn lock<S>(inner: &Mutex<RelayInner<S>>) -> MutexGuard<'_, RelayInner<S>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Table registry and message fan-out shared by all peers.
pub struct TableRelay<S = MemoryStore> {
    inner: Arc<Mutex<RelayInner<S>>>,
}

impl<S> Clone for TableRelay<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl TableRelay<MemoryStore> {
    /// Relay over an in-memory store with an entropy-seeded id generator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), GameRng::from_entropy())
    }
}

impl Default for TableRelay<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SnapshotStore> TableRelay<S> {
    /// Relay over `store`, drawing table ids from `rng`.
    pub fn with_store(store: S, rng: GameRng) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RelayInner {
                store,
                rng,
                next_peer: 0,
                peers: FxHashMap::default(),
            })),
        }
    }

    /// Create a table with an empty board.
    ///
    /// # Errors
    ///
    /// [`crate::BoardError::Snapshot`] if the initial board cannot be stored.
    #[instrument(skip(self))]
    pub fn create_table(&self) -> Result<(TableId, JoinUrls)> {
        let mut inner = lock(&self.inner);
        let mut table_id = inner.readable_id();
        while inner.store.get(&table_id).is_some() {
            table_id = inner.readable_id();
        }

        save_board(&mut inner.store, &table_id, &Board::new())?;
        info!(%table_id, "Created table");
        let urls = JoinUrls::for_table(&table_id);
        Ok((table_id, urls))
    }

    /// Connect a peer to a table. Returns its endpoint and the stored board.
    ///
    /// # Errors
    ///
    /// [`crate::BoardError::UnknownTable`] if no such table exists.
    #[instrument(skip(self))]
    pub fn join(&self, table_id: &TableId, side: SheetSide) -> Result<(RelayEndpoint<S>, Board)> {
        let mut inner = lock(&self.inner);
        let board = load_board(&inner.store, table_id)?;

        inner.next_peer += 1;
        let peer_id = inner.next_peer;
        inner.peers.entry(table_id.clone()).or_default().push(PeerSlot {
            id: peer_id,
            side,
            inbox: VecDeque::new(),
        });
        info!(%table_id, %side, peer_id, "Peer joined");

        let endpoint = RelayEndpoint {
            relay: Arc::clone(&self.inner),
            table_id: table_id.clone(),
            peer_id,
            side,
        };
        Ok((endpoint, board))
    }

    /// Register (`Some`) or remove (`None`) a watcher session on a table's
    /// board, then push the updated board to every connected peer.
    ///
    /// # Errors
    ///
    /// [`crate::BoardError::UnknownTable`] if no such table exists.
    #[instrument(skip(self, info))]
    pub fn set_watcher_info(&self, table_id: &TableId, session_id: &str, info: Option<WatcherInfo>) -> Result<()> {
        let mut inner = lock(&self.inner);
        let mut board = load_board(&inner.store, table_id)?;
        let body = match &info {
            Some(info) => format!("{} started watching", info.name),
            None => "A watcher left".to_string(),
        };
        let mut record = LogRecord::new(body, Some(SheetSide::Watcher), LogVisibility::Shown);
        record.watcher_session_id = Some(session_id.to_string());

        match info {
            Some(info) => {
                board.watchers.insert(session_id.to_string(), info);
            }
            None => {
                board.watchers.remove(session_id);
            }
        }
        save_board(&mut inner.store, table_id, &board)?;

        let message = SyncMessage {
            table_id: table_id.clone(),
            side: SheetSide::Watcher,
            board,
            appended_action_logs: Vector::unit(record),
        };
        let mut delivered = 0;
        if let Some(peers) = inner.peers.get_mut(table_id) {
            for peer in peers.iter_mut() {
                peer.inbox.push_back(message.clone());
                delivered += 1;
            }
        }
        debug!(%table_id, session_id, delivered, "Updated watcher registry");
        Ok(())
    }

    /// Latest stored board of a table.
    ///
    /// # Errors
    ///
    /// [`crate::BoardError::UnknownTable`] if no such table exists.
    pub fn snapshot(&self, table_id: &TableId) -> Result<Board> {
        load_board(&lock(&self.inner).store, table_id)
    }

    /// Number of peers currently connected to a table.
    #[must_use]
    pub fn peer_count(&self, table_id: &TableId) -> usize {
        lock(&self.inner).peers.get(table_id).map_or(0, Vec::len)
    }
}

/// One peer's connection to the relay.
pub struct RelayEndpoint<S = MemoryStore> {
    relay: Arc<Mutex<RelayInner<S>>>,
    table_id: TableId,
    peer_id: u64,
    side: SheetSide,
}

impl<S> Clone for RelayEndpoint<S> {
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            table_id: self.table_id.clone(),
            peer_id: self.peer_id,
            side: self.side,
        }
    }
}

impl<S: SnapshotStore> RelayEndpoint<S> {
    #[must_use]
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    #[must_use]
    pub fn side(&self) -> SheetSide {
        self.side
    }

    /// Store the message's board and forward it to every other peer.
    ///
    /// Messages from watchers or for another table are dropped.
    pub fn publish(&self, message: SyncMessage) {
        if self.side.is_watcher() {
            warn!(table_id = %self.table_id, "Dropping update from watcher");
            return;
        }
        if message.table_id != self.table_id {
            warn!(
                expected = %self.table_id,
                got = %message.table_id,
                "Dropping update for another table"
            );
            return;
        }

        let mut inner = lock(&self.relay);
        if let Err(err) = save_board(&mut inner.store, &self.table_id, &message.board) {
            warn!(table_id = %self.table_id, error = %err, "Failed to persist board");
        }

        let mut delivered = 0;
        if let Some(peers) = inner.peers.get_mut(&self.table_id) {
            for peer in peers.iter_mut().filter(|p| p.id != self.peer_id) {
                peer.inbox.push_back(message.clone());
                delivered += 1;
            }
        }
        debug!(table_id = %self.table_id, from = %self.side, delivered, "Relayed board update");
    }

    /// Take every message waiting for this peer, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<SyncMessage> {
        let mut inner = lock(&self.relay);
        inner
            .peers
            .get_mut(&self.table_id)
            .and_then(|peers| peers.iter_mut().find(|p| p.id == self.peer_id))
            .map(|peer| peer.inbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Leave the table. Clones of this endpoint stop receiving too.
    pub fn disconnect(self) {
        let mut inner = lock(&self.relay);
        if let Some(peers) = inner.peers.get_mut(&self.table_id) {
            peers.retain(|p| p.id != self.peer_id);
        }
        info!(table_id = %self.table_id, side = %self.side, "Peer left");
    }
}

impl<S: SnapshotStore> SyncChannel for RelayEndpoint<S> {
    fn send(&mut self, message: SyncMessage) {
        self.publish(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BoardError, PlayerSide};

    fn message(table_id: &TableId, side: SheetSide, name: &str) -> SyncMessage {
        let mut board = Board::new();
        board.player_names[PlayerSide::P1] = name.to_string();
        SyncMessage {
            table_id: table_id.clone(),
            side,
            board,
            appended_action_logs: Vector::new(),
        }
    }

    #[test]
    fn test_create_table_ids_and_urls() {
        let relay = TableRelay::with_store(MemoryStore::new(), GameRng::new(7));

        let (id, urls) = relay.create_table().unwrap();

        assert_eq!(id.as_str().len(), TABLE_ID_LEN);
        assert!(id.as_str().bytes().all(|b| READABLE_CHARS.contains(&b)));
        assert_eq!(urls.p1, format!("/b/{id}/p1"));
        assert_eq!(urls.watch, format!("/b/{id}/watch"));
        assert_eq!(relay.snapshot(&id).unwrap(), Board::new());

        let (other, _) = relay.create_table().unwrap();
        assert_ne!(id, other);
    }

    #[test]
    fn test_join_unknown_table() {
        let relay = TableRelay::new();
        let err = relay.join(&TableId::new("missing"), SheetSide::P1).err();
        assert_eq!(err, Some(BoardError::UnknownTable { table_id: "missing".to_string() }));
    }

    #[test]
    fn test_publish_fans_out_and_persists() {
        let relay = TableRelay::new();
        let (id, _) = relay.create_table().unwrap();
        let (p1, _) = relay.join(&id, SheetSide::P1).unwrap();
        let (p2, _) = relay.join(&id, SheetSide::P2).unwrap();
        let (watcher, _) = relay.join(&id, SheetSide::Watcher).unwrap();
        assert_eq!(relay.peer_count(&id), 3);

        p1.publish(message(&id, SheetSide::P1, "Himika"));

        assert!(p1.drain().is_empty());
        assert_eq!(p2.drain().len(), 1);
        assert_eq!(watcher.drain().len(), 1);
        assert!(p2.drain().is_empty());
        assert_eq!(relay.snapshot(&id).unwrap().player_names[PlayerSide::P1], "Himika");

        let (late, board) = relay.join(&id, SheetSide::Watcher).unwrap();
        assert_eq!(board.player_names[PlayerSide::P1], "Himika");
        assert!(late.drain().is_empty());
    }

    #[test]
    fn test_watcher_and_foreign_updates_dropped() {
        let relay = TableRelay::new();
        let (id, _) = relay.create_table().unwrap();
        let (p1, _) = relay.join(&id, SheetSide::P1).unwrap();
        let (watcher, _) = relay.join(&id, SheetSide::Watcher).unwrap();

        watcher.publish(message(&id, SheetSide::Watcher, "Intruder"));
        p1.publish(message(&TableId::new("elsewhere"), SheetSide::P1, "Lost"));

        assert!(p1.drain().is_empty());
        assert!(watcher.drain().is_empty());
        assert_eq!(relay.snapshot(&id).unwrap(), Board::new());
    }

    #[test]
    fn test_watcher_registry_written_by_relay() {
        let relay = TableRelay::new();
        let (id, _) = relay.create_table().unwrap();
        let (p1, _) = relay.join(&id, SheetSide::P1).unwrap();
        let (watcher, _) = relay.join(&id, SheetSide::Watcher).unwrap();
        let info = WatcherInfo { name: "Kanae".to_string() };

        relay.set_watcher_info(&id, "s1", Some(info.clone())).unwrap();

        assert_eq!(relay.snapshot(&id).unwrap().watchers.get("s1"), Some(&info));
        let to_p1 = p1.drain();
        let to_watcher = watcher.drain();
        assert_eq!(to_p1.len(), 1);
        assert_eq!(to_p1, to_watcher);
        let log = &to_p1[0].appended_action_logs[0];
        assert_eq!(log.body, "Kanae started watching");
        assert_eq!(log.watcher_session_id.as_deref(), Some("s1"));

        relay.set_watcher_info(&id, "s1", None).unwrap();
        assert!(relay.snapshot(&id).unwrap().watchers.is_empty());

        let missing = relay.set_watcher_info(&TableId::new("missing"), "s1", None);
        assert!(matches!(missing, Err(BoardError::UnknownTable { .. })));
    }

    #[test]
    fn test_disconnect() {
        let relay = TableRelay::new();
        let (id, _) = relay.create_table().unwrap();
        let (p1, _) = relay.join(&id, SheetSide::P1).unwrap();
        let (p2, _) = relay.join(&id, SheetSide::P2).unwrap();
        let p2_clone = p2.clone();

        p2.disconnect();
        p1.publish(message(&id, SheetSide::P1, "Alone"));

        assert_eq!(relay.peer_count(&id), 1);
        assert!(p2_clone.drain().is_empty());
    }
}
