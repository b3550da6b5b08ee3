//! Seat identification and per-side data storage.
//!
//! ## PlayerSide
//!
//! One of the two competing seats, `p1` or `p2`.
//!
//! ## SheetSide
//!
//! The seat a connected peer occupies: a player side or a watcher.
//! Watchers may read the board but never mutate it.
//!
//! ## SideMap
//!
//! Per-side data storage with one slot per player side, indexable by
//! `PlayerSide`. Serializes as `{"p1": .., "p2": ..}`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two competing players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    P1,
    P2,
}

impl PlayerSide {
    /// Both player sides, `p1` first.
    pub const ALL: [PlayerSide; 2] = [PlayerSide::P1, PlayerSide::P2];

    /// The other player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            PlayerSide::P1 => PlayerSide::P2,
            PlayerSide::P2 => PlayerSide::P1,
        }
    }

    /// Wire name of the side.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PlayerSide::P1 => "p1",
            PlayerSide::P2 => "p2",
        }
    }
}

impl std::fmt::Display for PlayerSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seat a peer occupies at a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetSide {
    P1,
    P2,
    Watcher,
}

impl SheetSide {
    /// The player side for this seat, `None` for watchers.
    #[must_use]
    pub const fn player(self) -> Option<PlayerSide> {
        match self {
            SheetSide::P1 => Some(PlayerSide::P1),
            SheetSide::P2 => Some(PlayerSide::P2),
            SheetSide::Watcher => None,
        }
    }

    /// Is this seat an observer?
    #[must_use]
    pub const fn is_watcher(self) -> bool {
        matches!(self, SheetSide::Watcher)
    }
}

impl From<PlayerSide> for SheetSide {
    fn from(side: PlayerSide) -> Self {
        match side {
            PlayerSide::P1 => SheetSide::P1,
            PlayerSide::P2 => SheetSide::P2,
        }
    }
}

impl std::fmt::Display for SheetSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetSide::P1 => f.write_str("p1"),
            SheetSide::P2 => f.write_str("p2"),
            SheetSide::Watcher => f.write_str("watcher"),
        }
    }
}

/// Per-side data storage with O(1) access.
///
/// ```
/// use sakura_table::core::{PlayerSide, SideMap};
///
/// let mut flags: SideMap<bool> = SideMap::default();
/// flags[PlayerSide::P2] = true;
///
/// assert!(!flags[PlayerSide::P1]);
/// assert!(flags[PlayerSide::P2]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    p1: T,
    p2: T,
}

impl<T> SideMap<T> {
    /// Create a map from explicit per-side values.
    pub const fn new(p1: T, p2: T) -> Self {
        Self { p1, p2 }
    }

    /// Create a map with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(value.clone(), value)
    }

    /// Get a reference to a side's data.
    #[must_use]
    pub fn get(&self, side: PlayerSide) -> &T {
        match side {
            PlayerSide::P1 => &self.p1,
            PlayerSide::P2 => &self.p2,
        }
    }

    /// Get a mutable reference to a side's data.
    pub fn get_mut(&mut self, side: PlayerSide) -> &mut T {
        match side {
            PlayerSide::P1 => &mut self.p1,
            PlayerSide::P2 => &mut self.p2,
        }
    }

    /// Iterate over (PlayerSide, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerSide, &T)> {
        [(PlayerSide::P1, &self.p1), (PlayerSide::P2, &self.p2)].into_iter()
    }
}

impl<T> Index<PlayerSide> for SideMap<T> {
    type Output = T;

    fn index(&self, side: PlayerSide) -> &Self::Output {
        self.get(side)
    }
}

impl<T> IndexMut<PlayerSide> for SideMap<T> {
    fn index_mut(&mut self, side: PlayerSide) -> &mut Self::Output {
        self.get_mut(side)
    }
}
