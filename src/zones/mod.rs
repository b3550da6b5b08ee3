//! Piece placement: region bookkeeping, card movement, token movement.
//!
//! ## Key Functions
//!
//! - `reindex`: restore every derived placement field after a mutation
//! - `shuffle` / `move_cards` / `draw`: ordered card movement
//! - `transfer` / `drag_tokens`: capacity-checked token movement
//!
//! All functions take the board by `&mut` and leave it re-indexed.

pub mod indexer;
pub mod shuffle;
pub mod tokens;

pub use indexer::{reindex, reindexed};
pub use shuffle::{draw, move_card, move_cards, region_ids, reshuffle, shuffle, RegionPosition, RegionRef};
pub use tokens::{
    drag_tokens, place_artificial_tokens, place_tokens, token_count, transfer, TokenPool,
};
