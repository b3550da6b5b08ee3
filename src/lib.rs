//! # sakura-table
//!
//! Board state and synchronization engine for a two-player shared card
//! tabletop. Each peer holds a `Table`, a local replica of the board,
//! and exchanges full snapshots with the other peers through a relay.
//!
//! ## Design Principles
//!
//! 1. **Consistent After Every Action**: every mutation runs inside
//!    `Table::operate`, which re-indexes the board before committing.
//!    Indices within a region are always a contiguous `0..n`.
//!
//! 2. **All-or-Nothing**: a failing action commits nothing. The mutator
//!    works on a clone; errors discard it.
//!
//! 3. **Configuration Over Constants**: hand size, capacities, gauge caps,
//!    history depth and megami extras live in `BoardConfig`.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) board cloning via `im-rs`, so the
//!   undo history stores whole boards by structural sharing.
//!
//! - **Last Writer Wins**: peers replace their board with whatever they
//!   receive. Undo/redo history is local to each peer.
//!
//! - **Injected Randomness**: shuffles draw from the table's `GameRng`.
//!
//! ## Modules
//!
//! - `core`: Sides, pieces, regions, board, log records, RNG, configuration
//! - `zones`: Region indexer, shuffle/draw engine, token allocator
//! - `history`: `Table`, `operate`, undo/redo, free-play operations
//! - `setup`: Per-side setup state machine
//! - `sync`: Wire message, channel trait, snapshot store, relay

pub mod core;
pub mod zones;
pub mod history;
pub mod setup;
pub mod sync;

// Re-export commonly used types
pub use crate::core::{
    PlayerSide, SheetSide, SideMap,
    GameRng,
    BoardConfig, MegamiId, MegamiSetup, PlanState, UmbrellaState,
    CardOpenState, CardRegion, TokenGroup, TokenRegion,
    BoardObject, Card, CardId, ObjectId, ObjectKind, SakuraToken, TokenKind,
    LogEntry, LogRecord, LogVisibility,
    Board, BoardHistoryItem, Vigor, WatcherInfo, DATA_VERSION,
    BoardError, HistoryDirection, Result,
};

pub use crate::zones::{reindex, reindexed, RegionPosition, RegionRef, TokenPool};

pub use crate::history::{ActionContext, Gauge, Operation, Table, UndoMode};

pub use crate::setup::{DeckSelection, SetupStage};

pub use crate::sync::{
    JoinUrls, MemoryStore, RelayEndpoint, SnapshotStore, SyncChannel, SyncMessage, TableId, TableRelay,
};
