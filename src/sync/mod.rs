//! Peer synchronization: wire message, channel trait, snapshot store, relay.
//!
//! ## Key Types
//!
//! - `SyncMessage`: board snapshot plus appended log lines, JSON on the wire
//! - `SyncChannel`: outbound half of a peer connection
//! - `SnapshotStore`: durable latest-board storage (`MemoryStore` in process)
//! - `TableRelay`: creates tables, persists and fans out updates

pub mod message;
pub mod relay;
pub mod store;

pub use message::{SyncChannel, SyncMessage, TableId};
pub use relay::{JoinUrls, RelayEndpoint, TableRelay, TABLE_ID_LEN};
pub use store::{load_board, save_board, MemoryStore, SnapshotStore};
