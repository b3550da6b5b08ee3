//! Core engine types: sides, pieces, regions, board, log, RNG, configuration.
//!
//! Everything else in the crate builds on these types. None of them
//! perform I/O.

pub mod side;
pub mod rng;
pub mod config;
pub mod region;
pub mod object;
pub mod log;
pub mod board;
pub mod error;

pub use side::{PlayerSide, SheetSide, SideMap};
pub use rng::GameRng;
pub use config::{BoardConfig, MegamiId, MegamiSetup, PlanState, UmbrellaState};
pub use region::{CardOpenState, CardRegion, TokenGroup, TokenRegion};
pub use object::{BoardObject, Card, CardId, ObjectId, ObjectKind, SakuraToken, TokenKind};
pub use log::{LogEntry, LogRecord, LogVisibility};
pub use board::{Board, BoardHistoryItem, Vigor, WatcherInfo, DATA_VERSION};
pub use error::{BoardError, HistoryDirection, Result};
