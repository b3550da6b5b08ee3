//! The board: aggregate root of a table's game state.
//!
//! ## Board
//!
//! A flat collection of `BoardObject`s plus per-side scalar and flag
//! state. Uses `im` persistent data structures so that cloning a board
//! is O(1); the history engine keeps every prior board by structural
//! sharing instead of deep copies.
//!
//! ## BoardHistoryItem
//!
//! An immutable undo/redo entry: the board before an action, plus the
//! log lines that action appended.

use im::{HashMap as ImHashMap, Vector};
use serde::{Deserialize, Serialize};

use super::config::{MegamiId, PlanState, UmbrellaState};
use super::log::LogRecord;
use super::object::{BoardObject, Card, CardId, ObjectId, SakuraToken, TokenKind};
use super::region::{CardRegion, TokenRegion};
use super::side::{PlayerSide, SideMap};

/// Snapshot format version carried for external migration tooling.
pub const DATA_VERSION: u32 = 1;

/// Tri-state per-side resource gauge (0, 1 or 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Vigor(u8);

impl Vigor {
    pub const MAX: u8 = 2;

    /// Create a vigor value, `None` when out of range.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Vigor {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("vigor must be 0..=2, got {value}"))
    }
}

impl From<Vigor> for u8 {
    fn from(vigor: Vigor) -> Self {
        vigor.0
    }
}

/// An observer connected to the table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatcherInfo {
    pub name: String,
}

/// Complete shared board state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub data_version: u32,
    pub objects: Vector<BoardObject>,
    pub player_names: SideMap<String>,
    pub watchers: ImHashMap<String, WatcherInfo>,
    pub megamis: SideMap<Option<[MegamiId; 2]>>,
    pub vigors: SideMap<Option<Vigor>>,
    pub wither_flags: SideMap<bool>,
    pub megami_open_flags: SideMap<bool>,
    pub first_draw_flags: SideMap<bool>,
    pub marigan_flags: SideMap<bool>,
    pub hand_open_flags: SideMap<bool>,
    /// Per-card overrides of `hand_open_flags`.
    pub hand_card_open_flags: SideMap<ImHashMap<ObjectId, bool>>,
    pub plan_status: SideMap<Option<PlanState>>,
    pub umbrella_status: SideMap<Option<UmbrellaState>>,
    pub wind_gauge: SideMap<Option<u32>>,
    pub thunder_gauge: SideMap<Option<u32>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board, before any side has set up.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_version: DATA_VERSION,
            objects: Vector::new(),
            player_names: SideMap::new("Player 1".to_string(), "Player 2".to_string()),
            watchers: ImHashMap::new(),
            megamis: SideMap::default(),
            vigors: SideMap::default(),
            wither_flags: SideMap::default(),
            megami_open_flags: SideMap::default(),
            first_draw_flags: SideMap::default(),
            marigan_flags: SideMap::default(),
            hand_open_flags: SideMap::default(),
            hand_card_open_flags: SideMap::default(),
            plan_status: SideMap::default(),
            umbrella_status: SideMap::default(),
            wind_gauge: SideMap::default(),
            thunder_gauge: SideMap::default(),
        }
    }

    /// A fresh board that keeps this board's player names.
    #[must_use]
    pub fn reset(&self) -> Self {
        Self {
            player_names: self.player_names.clone(),
            ..Self::new()
        }
    }

    // === Object lookup ===

    /// Get an object by id.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&BoardObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Get a card by id.
    #[must_use]
    pub fn card(&self, id: ObjectId) -> Option<&Card> {
        self.object(id).and_then(BoardObject::as_card)
    }

    /// Get a mutable card by id.
    pub fn card_mut(&mut self, id: ObjectId) -> Option<&mut Card> {
        self.objects.iter_mut().find_map(|o| match o {
            BoardObject::Card(card) if card.id == id => Some(card),
            _ => None,
        })
    }

    /// Get a token by id.
    #[must_use]
    pub fn token(&self, id: ObjectId) -> Option<&SakuraToken> {
        self.object(id).and_then(BoardObject::as_token)
    }

    /// Get a mutable token by id.
    pub fn token_mut(&mut self, id: ObjectId) -> Option<&mut SakuraToken> {
        self.objects.iter_mut().find_map(|o| match o {
            BoardObject::SakuraToken(token) if token.id == id => Some(token),
            _ => None,
        })
    }

    /// Resolve a card's weak link to its host card.
    ///
    /// Returns `None` when the card is unlinked or its host no longer exists.
    #[must_use]
    pub fn linked_card(&self, card: &Card) -> Option<&Card> {
        card.linked_card_id.and_then(|id| self.card(id))
    }

    /// Iterate over all cards.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.objects.iter().filter_map(BoardObject::as_card)
    }

    /// Iterate over all tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &SakuraToken> {
        self.objects.iter().filter_map(BoardObject::as_token)
    }

    /// All cards of a side.
    pub fn side_cards(&self, side: PlayerSide) -> impl Iterator<Item = &Card> {
        self.cards().filter(move |c| c.side == side)
    }

    /// Cards of a side's region, ordered by `index_of_region`.
    #[must_use]
    pub fn region_cards(&self, side: PlayerSide, region: CardRegion) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .side_cards(side)
            .filter(|c| c.region == region)
            .collect();
        cards.sort_by_key(|c| (c.index_of_region, c.id));
        cards
    }

    /// Ids of a side's region, ordered by `index_of_region`.
    #[must_use]
    pub fn region_card_ids(&self, side: PlayerSide, region: CardRegion) -> Vec<ObjectId> {
        self.region_cards(side, region).iter().map(|c| c.id).collect()
    }

    /// Number of tokens in a region for a side (`None` for shared regions).
    #[must_use]
    pub fn region_token_count(&self, side: Option<PlayerSide>, region: TokenRegion) -> usize {
        self.tokens()
            .filter(|t| t.region == region && t.side == side)
            .count()
    }

    // === Object creation ===

    /// Allocate an id no object on this board uses.
    #[must_use]
    pub fn next_object_id(&self) -> ObjectId {
        let max = self.objects.iter().map(|o| o.id().0).max();
        ObjectId(max.map_or(1, |m| m + 1))
    }

    /// Add a card at the back of its region. Returns its id.
    pub fn add_card(&mut self, card_id: CardId, side: PlayerSide, region: CardRegion) -> ObjectId {
        let id = self.next_object_id();
        let mut card = Card::new(id, card_id, region, side);
        card.index_of_region = self.region_cards(side, region).len();
        self.objects.push_back(BoardObject::Card(card));
        id
    }

    /// Add a token at the back of its pool. Returns its id.
    ///
    /// `host` links the token to a card when `region` is `on-card`.
    pub fn add_token(
        &mut self,
        region: TokenRegion,
        side: Option<PlayerSide>,
        host: Option<ObjectId>,
        kind: TokenKind,
    ) -> ObjectId {
        let id = self.next_object_id();
        let mut token = SakuraToken::new(id, region, side).with_kind(kind);
        token.linked_card_id = host;
        token.index_of_region = usize::MAX;
        self.objects.push_back(BoardObject::SakuraToken(token));
        id
    }

    /// Remove every card of a side (deck rebuild before the first draw).
    pub fn remove_side_cards(&mut self, side: PlayerSide) {
        self.objects.retain(|o| !matches!(o, BoardObject::Card(c) if c.side == side));
        self.hand_card_open_flags[side] = ImHashMap::new();
    }
}

/// Immutable undo/redo entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardHistoryItem {
    pub board: Board,
    pub appended_logs: Vector<LogRecord>,
}
