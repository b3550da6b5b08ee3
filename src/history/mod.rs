//! Action engine: the transactional `operate` wrapper, undo/redo history,
//! and the free-play operations built on it.
//!
//! ## Key Types
//!
//! - `Table`: one peer's replica (board, log, history, channel)
//! - `Operation` / `UndoMode`: how an action is logged and recorded
//! - `ActionContext`: what a mutator may touch while an action runs

pub mod ops;
pub mod table;

pub use ops::Gauge;
pub use table::{ActionContext, Operation, Table, UndoMode, UNDO_LOG};
