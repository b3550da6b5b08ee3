//! Region vocabulary for cards and sakura tokens.
//!
//! Regions are fixed by the game: every piece sits in exactly one of
//! them. Card regions are per side; token regions are per side except
//! `distance` and `dust`, which are shared by both players.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Where a card can sit.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardRegion {
    /// Face-down draw pile. Index 0 is the top.
    #[display("library")]
    Library,
    #[display("hand")]
    Hand,
    /// Played face-up.
    #[display("used")]
    Used,
    /// Discarded face-down. The last index is the top of the pile.
    #[display("hidden-used")]
    HiddenUsed,
    /// Trump cards set aside at deck build.
    #[display("special")]
    Special,
    /// Additional cards granted by a megami at setup.
    #[display("extra")]
    Extra,
    /// Attached to another card (see `linked_card_id`).
    #[display("on-card")]
    OnCard,
}

impl CardRegion {
    /// Is this region a face-down pile where only the top card is reachable?
    #[must_use]
    pub const fn is_face_down_pile(self) -> bool {
        matches!(self, CardRegion::Library | CardRegion::HiddenUsed)
    }
}

/// Where a sakura token can sit.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenRegion {
    #[display("aura")]
    Aura,
    #[display("life")]
    Life,
    #[display("flair")]
    Flair,
    /// Shared between both players.
    #[display("distance")]
    Distance,
    /// Shared between both players.
    #[display("dust")]
    Dust,
    /// Artificial tokens waiting to be used.
    #[display("machine")]
    Machine,
    /// Artificial tokens that have been spent.
    #[display("burned")]
    Burned,
    /// Placed on a card (see `linked_card_id`).
    #[display("on-card")]
    OnCard,
}

impl TokenRegion {
    /// Is this region shared by both players (tokens carry no side)?
    #[must_use]
    pub const fn is_shared(self) -> bool {
        matches!(self, TokenRegion::Distance | TokenRegion::Dust)
    }
}

/// Who can see a card's face.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardOpenState {
    /// Face-up to everyone.
    #[display("opened")]
    Opened,
    /// Face-up to its owner only.
    #[display("owner-only")]
    OwnerOnly,
    /// Face-down.
    #[display("closed")]
    Closed,
}

impl CardOpenState {
    /// Can the owner see the card face?
    #[must_use]
    pub const fn is_face_up(self) -> bool {
        !matches!(self, CardOpenState::Closed)
    }
}

/// Derived token grouping within a pool.
///
/// Groups are laid out in declaration order inside a pool.
#[derive(Clone, Copy, Debug, Display, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenGroup {
    #[default]
    #[display("normal")]
    Normal,
    /// Overlay markers that do not count as sakura (distance −1 tokens).
    #[display("inactive")]
    Inactive,
    #[display("artificial-p1")]
    ArtificialP1,
    #[display("artificial-p2")]
    ArtificialP2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_wire_names() {
        assert_eq!(serde_json::to_string(&CardRegion::HiddenUsed).unwrap(), r#""hidden-used""#);
        assert_eq!(serde_json::to_string(&TokenRegion::OnCard).unwrap(), r#""on-card""#);
        assert_eq!(serde_json::to_string(&TokenGroup::ArtificialP2).unwrap(), r#""artificial-p2""#);
        assert_eq!(CardRegion::HiddenUsed.to_string(), "hidden-used");
        assert_eq!(TokenRegion::Aura.to_string(), "aura");
    }

    #[test]
    fn test_region_properties() {
        assert!(CardRegion::Library.is_face_down_pile());
        assert!(CardRegion::HiddenUsed.is_face_down_pile());
        assert!(!CardRegion::Hand.is_face_down_pile());

        assert!(TokenRegion::Distance.is_shared());
        assert!(TokenRegion::Dust.is_shared());
        assert!(!TokenRegion::Aura.is_shared());
    }

    #[test]
    fn test_group_order() {
        assert!(TokenGroup::Normal < TokenGroup::Inactive);
        assert!(TokenGroup::Inactive < TokenGroup::ArtificialP1);
        assert!(TokenGroup::ArtificialP1 < TokenGroup::ArtificialP2);
    }
}
