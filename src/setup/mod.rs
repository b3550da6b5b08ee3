//! Setup state machine: megami selection through mulligan.

pub mod machine;

pub use machine::{DeckSelection, SetupStage};
