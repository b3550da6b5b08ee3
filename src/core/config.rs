//! Table configuration.
//!
//! Tables are configured at startup via `BoardConfig`: hand size, region
//! capacities, gauge caps, history depth, and the per-megami extras placed
//! when a side draws its first hand. The engine reads limits from here
//! rather than hardcoding them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::object::CardId;
use super::region::TokenRegion;

/// Opaque megami (goddess) identifier chosen during setup.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MegamiId(pub String);

impl MegamiId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for MegamiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of the plan token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanState {
    BackBlue,
    BackRed,
    Blue,
    Red,
}

/// State of the umbrella card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UmbrellaState {
    Closed,
    Opened,
}

/// Extra pieces a megami brings to the board at first draw.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MegamiSetup {
    /// Cards placed in the side's `extra` region.
    pub extra_cards: SmallVec<[CardId; 5]>,
    /// Artificial tokens placed in the side's `machine` region.
    pub machine_tokens: usize,
    pub plan: Option<PlanState>,
    pub umbrella: Option<UmbrellaState>,
    /// Initialize wind and thunder gauges to zero.
    pub gauges: bool,
}

impl MegamiSetup {
    #[must_use]
    pub fn with_extra_cards<I, S>(mut self, cards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_cards.extend(cards.into_iter().map(CardId::new));
        self
    }

    #[must_use]
    pub fn with_machine_tokens(mut self, count: usize) -> Self {
        self.machine_tokens = count;
        self
    }

    #[must_use]
    pub fn with_plan(mut self, plan: PlanState) -> Self {
        self.plan = Some(plan);
        self
    }

    #[must_use]
    pub fn with_umbrella(mut self, umbrella: UmbrellaState) -> Self {
        self.umbrella = Some(umbrella);
        self
    }

    #[must_use]
    pub fn with_gauges(mut self) -> Self {
        self.gauges = true;
        self
    }
}

/// Complete table configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Cards drawn at first draw.
    pub initial_hand_size: usize,
    /// Tokens placed in each side's aura at first draw.
    pub initial_aura: usize,
    /// Tokens placed in each side's life at first draw.
    pub initial_life: usize,
    /// Tokens placed in the shared distance when it is empty.
    pub initial_distance: usize,
    pub aura_capacity: usize,
    pub distance_capacity: usize,
    /// Upper bound for wind and thunder gauges.
    pub gauge_cap: u32,
    /// Maximum undo entries retained; the oldest are dropped first.
    pub history_limit: usize,
    pub megami_setups: FxHashMap<MegamiId, MegamiSetup>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            initial_hand_size: 3,
            initial_aura: 3,
            initial_life: 10,
            initial_distance: 10,
            aura_capacity: 5,
            distance_capacity: 10,
            gauge_cap: 20,
            history_limit: 100,
            megami_setups: default_megami_setups(),
        }
    }
}

impl BoardConfig {
    /// Create the standard configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_initial_hand_size(mut self, size: usize) -> Self {
        self.initial_hand_size = size;
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub fn with_megami_setup(mut self, megami: MegamiId, setup: MegamiSetup) -> Self {
        self.megami_setups.insert(megami, setup);
        self
    }

    /// Hard capacity of a token region, `None` when unbounded.
    #[must_use]
    pub fn capacity(&self, region: TokenRegion) -> Option<usize> {
        match region {
            TokenRegion::Aura => Some(self.aura_capacity),
            TokenRegion::Distance => Some(self.distance_capacity),
            TokenRegion::Life
            | TokenRegion::Flair
            | TokenRegion::Dust
            | TokenRegion::Machine
            | TokenRegion::Burned
            | TokenRegion::OnCard => None,
        }
    }

    /// Setup extras for a megami, if it has any.
    #[must_use]
    pub fn megami_setup(&self, megami: &MegamiId) -> Option<&MegamiSetup> {
        self.megami_setups.get(megami)
    }
}

fn default_megami_setups() -> FxHashMap<MegamiId, MegamiSetup> {
    let mut setups = FxHashMap::default();
    setups.insert(MegamiId::new("shinra"), MegamiSetup::default().with_plan(PlanState::BackBlue));
    setups.insert(
        MegamiId::new("yukihi"),
        MegamiSetup::default().with_umbrella(UmbrellaState::Closed),
    );
    setups.insert(
        MegamiId::new("chikage"),
        MegamiSetup::default().with_extra_cards([
            "09-chikage-o-p-1",
            "09-chikage-o-p-2",
            "09-chikage-o-p-3",
            "09-chikage-o-p-4",
            "09-chikage-o-p-4",
        ]),
    );
    setups.insert(
        MegamiId::new("thallya"),
        MegamiSetup::default()
            .with_machine_tokens(5)
            .with_extra_cards(["transform-01", "transform-02", "transform-03"]),
    );
    setups.insert(
        MegamiId::new("kururu"),
        MegamiSetup::default().with_extra_cards(["10-kururu-o-s-3-ex1"; 3]),
    );
    setups.insert(
        MegamiId::new("raira"),
        MegamiSetup::default()
            .with_extra_cards(["12-raira-o-s-3-ex1", "12-raira-o-s-3-ex2", "12-raira-o-s-3-ex3"])
            .with_gauges(),
    );
    setups
}
