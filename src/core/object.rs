//! Board objects: cards and sakura tokens.
//!
//! Every movable piece on the table is a `BoardObject`, a closed union of
//! `Card` and `SakuraToken` tagged by a `type` discriminant. Objects are
//! created during setup and then only relocated between regions.
//!
//! ## Derived fields
//!
//! `index_of_region`, `Card::draggable`, `SakuraToken::group` and
//! `SakuraToken::group_token_dragging_count` are owned by the region
//! indexer (`zones::reindex`). Mutators may leave them stale; the indexer
//! restores them before an action completes.

use serde::{Deserialize, Serialize};

use super::region::{CardOpenState, CardRegion, TokenGroup, TokenRegion};
use super::side::PlayerSide;

/// Unique identifier for a board object, stable for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "object-{}", self.0)
    }
}

/// Opaque reference into the static card data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind discriminant shared by all board objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Card,
    Token,
}

/// A card on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: ObjectId,
    pub card_id: CardId,
    pub side: PlayerSide,
    pub region: CardRegion,
    pub index_of_region: usize,
    pub rotated: bool,
    pub open_state: CardOpenState,
    /// Trump card has been played.
    pub special_used: bool,
    /// Charge released (affects layout, gates `set_discharged`).
    pub discharged: bool,
    /// Host card when `region` is `on-card`. Weak: resolve with `Board::linked_card`.
    pub linked_card_id: Option<ObjectId>,
    pub owner_side: PlayerSide,
    /// Derived: can a player pick this card up?
    #[serde(default)]
    pub draggable: bool,
}

impl Card {
    /// Create a face-down card owned by `side`.
    #[must_use]
    pub fn new(id: ObjectId, card_id: CardId, region: CardRegion, side: PlayerSide) -> Self {
        Self {
            id,
            card_id,
            side,
            region,
            index_of_region: 0,
            rotated: false,
            open_state: CardOpenState::Closed,
            special_used: false,
            discharged: false,
            linked_card_id: None,
            owner_side: side,
            draggable: false,
        }
    }
}

/// What a newly created token is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenKind {
    #[default]
    Sakura,
    /// Artificial token owned by a player wherever it sits.
    Artificial(PlayerSide),
    /// Distance −1 overlay marker.
    DistanceMinus,
}

/// A sakura token (fungible counter) on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SakuraToken {
    pub id: ObjectId,
    /// `None` for tokens in shared regions.
    pub side: Option<PlayerSide>,
    pub region: TokenRegion,
    pub index_of_region: usize,
    /// Host card when `region` is `on-card`.
    pub linked_card_id: Option<ObjectId>,
    /// Artificial tokens belong to `owner_side` wherever they sit.
    pub artificial: bool,
    pub owner_side: Option<PlayerSide>,
    /// Distance −1 overlay marker.
    #[serde(default)]
    pub distance_minus: bool,
    /// Derived.
    #[serde(default)]
    pub group: TokenGroup,
    /// Derived: tokens picked up together when dragging this one.
    #[serde(default)]
    pub group_token_dragging_count: usize,
}

impl SakuraToken {
    /// Create a normal sakura token.
    #[must_use]
    pub fn new(id: ObjectId, region: TokenRegion, side: Option<PlayerSide>) -> Self {
        Self {
            id,
            side,
            region,
            index_of_region: 0,
            linked_card_id: None,
            artificial: false,
            owner_side: None,
            distance_minus: false,
            group: TokenGroup::Normal,
            group_token_dragging_count: 0,
        }
    }

    /// Apply the flags of `kind`.
    #[must_use]
    pub fn with_kind(mut self, kind: TokenKind) -> Self {
        match kind {
            TokenKind::Sakura => {}
            TokenKind::Artificial(owner) => {
                self.artificial = true;
                self.owner_side = Some(owner);
            }
            TokenKind::DistanceMinus => self.distance_minus = true,
        }
        self
    }

    /// Group this token belongs to, from its own flags.
    #[must_use]
    pub fn derive_group(&self) -> TokenGroup {
        if self.artificial {
            match self.owner_side {
                Some(PlayerSide::P1) => TokenGroup::ArtificialP1,
                Some(PlayerSide::P2) => TokenGroup::ArtificialP2,
                None => TokenGroup::Normal,
            }
        } else if self.distance_minus {
            TokenGroup::Inactive
        } else {
            TokenGroup::Normal
        }
    }
}

/// Any movable piece on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BoardObject {
    Card(Card),
    #[serde(rename = "token")]
    SakuraToken(SakuraToken),
}

impl BoardObject {
    #[must_use]
    pub fn id(&self) -> ObjectId {
        match self {
            BoardObject::Card(card) => card.id,
            BoardObject::SakuraToken(token) => token.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            BoardObject::Card(_) => ObjectKind::Card,
            BoardObject::SakuraToken(_) => ObjectKind::Token,
        }
    }

    /// Owning side, `None` for neutral pieces.
    #[must_use]
    pub fn side(&self) -> Option<PlayerSide> {
        match self {
            BoardObject::Card(card) => Some(card.side),
            BoardObject::SakuraToken(token) => token.side,
        }
    }

    #[must_use]
    pub fn index_of_region(&self) -> usize {
        match self {
            BoardObject::Card(card) => card.index_of_region,
            BoardObject::SakuraToken(token) => token.index_of_region,
        }
    }

    #[must_use]
    pub fn as_card(&self) -> Option<&Card> {
        match self {
            BoardObject::Card(card) => Some(card),
            BoardObject::SakuraToken(_) => None,
        }
    }

    #[must_use]
    pub fn as_token(&self) -> Option<&SakuraToken> {
        match self {
            BoardObject::Card(_) => None,
            BoardObject::SakuraToken(token) => Some(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_defaults() {
        let card = Card::new(ObjectId(1), CardId::new("01-yurina-o-n-1"), CardRegion::Library, PlayerSide::P1);

        assert_eq!(card.owner_side, PlayerSide::P1);
        assert_eq!(card.open_state, CardOpenState::Closed);
        assert!(!card.rotated);
        assert!(card.linked_card_id.is_none());
    }

    #[test]
    fn test_token_groups() {
        let normal = SakuraToken::new(ObjectId(1), TokenRegion::Aura, Some(PlayerSide::P1));
        assert_eq!(normal.derive_group(), TokenGroup::Normal);

        let artificial = SakuraToken::new(ObjectId(2), TokenRegion::Machine, Some(PlayerSide::P2))
            .with_kind(TokenKind::Artificial(PlayerSide::P2));
        assert!(artificial.artificial);
        assert_eq!(artificial.derive_group(), TokenGroup::ArtificialP2);

        let marker = SakuraToken::new(ObjectId(3), TokenRegion::Distance, None).with_kind(TokenKind::DistanceMinus);
        assert_eq!(marker.derive_group(), TokenGroup::Inactive);
    }

    #[test]
    fn test_object_accessors() {
        let card = BoardObject::Card(Card::new(ObjectId(4), CardId::new("x"), CardRegion::Hand, PlayerSide::P2));
        let token = BoardObject::SakuraToken(SakuraToken::new(ObjectId(5), TokenRegion::Dust, None));

        assert_eq!(card.id(), ObjectId(4));
        assert_eq!(card.kind(), ObjectKind::Card);
        assert_eq!(card.side(), Some(PlayerSide::P2));
        assert!(card.as_token().is_none());

        assert_eq!(token.kind(), ObjectKind::Token);
        assert_eq!(token.side(), None);
        assert!(token.as_card().is_none());
    }

    #[test]
    fn test_type_discriminant() {
        let token = BoardObject::SakuraToken(SakuraToken::new(ObjectId(5), TokenRegion::Dust, None));
        let json = serde_json::to_value(&token).unwrap();

        assert_eq!(json["type"], "token");
        assert_eq!(json["region"], "dust");

        let back: BoardObject = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }
}
