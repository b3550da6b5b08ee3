//! Pre-game setup state machine.
//!
//! Each side progresses independently and forward only:
//!
//! ```text
//! SelectingMegami -> MegamiOpen -> DeckBuilt -> FirstDrawn -> MariganResolved
//! ```
//!
//! The stage is never stored; it is derived from board flags so that a
//! board received from the peer always carries its own stage. Watchers
//! cannot take any step.

use derive_more::Display;
use smallvec::SmallVec;
use tracing::{info, instrument};

use crate::core::{
    Board, BoardConfig, BoardError, CardId, CardRegion, MegamiId, ObjectId, PlayerSide, Result, TokenRegion, Vigor,
};
use crate::history::ops::log_card_names;
use crate::history::{ActionContext, Operation, Table};
use crate::zones::{self, RegionPosition, RegionRef, TokenPool};

/// Where a side is in the setup sequence.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SetupStage {
    #[display("selecting megami")]
    SelectingMegami,
    #[display("megami open")]
    MegamiOpen,
    #[display("deck built")]
    DeckBuilt,
    #[display("first drawn")]
    FirstDrawn,
    #[display("marigan resolved")]
    MariganResolved,
}

impl SetupStage {
    /// Derive a side's stage from the board.
    #[must_use]
    pub fn of(board: &Board, side: PlayerSide) -> Self {
        if board.marigan_flags[side] {
            SetupStage::MariganResolved
        } else if board.first_draw_flags[side] {
            SetupStage::FirstDrawn
        } else if board.megami_open_flags[side] {
            let has_deck = board
                .side_cards(side)
                .any(|c| matches!(c.region, CardRegion::Library | CardRegion::Special));
            if has_deck {
                SetupStage::DeckBuilt
            } else {
                SetupStage::MegamiOpen
            }
        } else {
            SetupStage::SelectingMegami
        }
    }

    /// Has setup finished (free play)?
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, SetupStage::MariganResolved)
    }
}

/// Cards chosen at deck build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeckSelection {
    /// Go to the library.
    pub normal: Vec<CardId>,
    /// Trump cards; go to the special region.
    pub special: Vec<CardId>,
}

impl DeckSelection {
    pub fn new<N, S>(normal: N, special: S) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            normal: normal.into_iter().map(CardId::new).collect(),
            special: special.into_iter().map(CardId::new).collect(),
        }
    }
}

/// Acting side, provided it is in one of `allowed`.
fn require_stage(ctx: &ActionContext<'_>, step: &str, allowed: &[SetupStage]) -> Result<PlayerSide> {
    let side = ctx.acting_side()?;
    let stage = SetupStage::of(&*ctx.board, side);
    if allowed.contains(&stage) {
        Ok(side)
    } else {
        Err(BoardError::forbidden(format!("cannot {step} while {stage}")))
    }
}

impl Table {
    /// Current setup stage of a side.
    #[must_use]
    pub fn setup_stage(&self, side: PlayerSide) -> SetupStage {
        SetupStage::of(self.board(), side)
    }

    /// Choose the side's two megamis. Hidden from the opponent until opened.
    ///
    /// # Errors
    ///
    /// [`BoardError::ForbiddenOperation`] after the megamis are opened, or
    /// when both choices are the same.
    #[instrument(skip(self))]
    pub fn select_megamis(&mut self, first: MegamiId, second: MegamiId) -> Result<()> {
        self.operate(Operation::undoable().log("Selected megamis"), |ctx| {
            let side = require_stage(ctx, "select megamis", &[SetupStage::SelectingMegami])?;
            if first == second {
                return Err(BoardError::forbidden("the two megamis must differ"));
            }
            ctx.log_owner_only(format!("-> {first}, {second}"));
            ctx.board.megamis[side] = Some([first, second]);
            Ok(())
        })
    }

    /// Reveal the selected megamis. Cannot be undone.
    ///
    /// # Errors
    ///
    /// [`BoardError::ForbiddenOperation`] out of order or before selecting.
    #[instrument(skip(self))]
    pub fn open_megamis(&mut self) -> Result<()> {
        self.operate(Operation::irreversible(), |ctx| {
            let side = require_stage(ctx, "open megamis", &[SetupStage::SelectingMegami])?;
            let [first, second] = ctx.board.megamis[side]
                .clone()
                .ok_or_else(|| BoardError::forbidden("no megamis selected"))?;
            ctx.board.megami_open_flags[side] = true;
            ctx.log(format!("Revealed megamis: {first}, {second}"));
            info!(%side, "Megamis opened");
            Ok(())
        })
    }

    /// Replace the side's deck with `selection`.
    ///
    /// # Errors
    ///
    /// [`BoardError::ForbiddenOperation`] out of order or for an empty deck.
    #[instrument(skip(self))]
    pub fn build_deck(&mut self, selection: DeckSelection) -> Result<()> {
        self.operate(Operation::undoable().log("Built the deck"), |ctx| {
            let side = require_stage(ctx, "build a deck", &[SetupStage::MegamiOpen, SetupStage::DeckBuilt])?;
            if selection.normal.is_empty() {
                return Err(BoardError::forbidden("a deck needs at least one normal card"));
            }

            ctx.board.remove_side_cards(side);
            for card in selection.normal {
                ctx.board.add_card(card, side, CardRegion::Library);
            }
            for card in selection.special {
                ctx.board.add_card(card, side, CardRegion::Special);
            }
            Ok(())
        })
    }

    /// Place initial tokens and extras, shuffle, and draw the opening hand.
    ///
    /// # Errors
    ///
    /// - [`BoardError::ForbiddenOperation`] out of order.
    /// - [`BoardError::InvalidRange`] if the library is smaller than the opening hand.
    #[instrument(skip(self))]
    pub fn first_draw(&mut self) -> Result<Vec<ObjectId>> {
        self.operate(Operation::irreversible(), |ctx| {
            let side = require_stage(ctx, "draw the first hand", &[SetupStage::DeckBuilt])?;

            place_initial_pieces(ctx.board, ctx.config, side);
            ctx.log("Placed sakura tokens and vigor");

            zones::shuffle(ctx.board, side, CardRegion::Library, ctx.rng);
            let drawn = zones::draw(ctx.board, side, ctx.config.initial_hand_size)?;
            ctx.log(format!("Drew the first {} card(s)", drawn.len()));
            log_card_names(ctx, &drawn);

            ctx.board.first_draw_flags[side] = true;
            info!(%side, "First hand drawn");
            Ok(drawn)
        })
    }

    /// Put `returned` on the library bottom in order and draw as many.
    ///
    /// An empty selection keeps the opening hand.
    ///
    /// # Errors
    ///
    /// - [`BoardError::ForbiddenOperation`] out of order or for repeated cards.
    /// - [`BoardError::ObjectNotFound`] for a card not in the side's hand.
    #[instrument(skip(self))]
    pub fn resolve_marigan(&mut self, returned: Vec<ObjectId>) -> Result<Vec<ObjectId>> {
        self.operate(Operation::irreversible(), |ctx| {
            let side = require_stage(ctx, "resolve the marigan", &[SetupStage::FirstDrawn])?;

            let mut seen: SmallVec<[ObjectId; 8]> = SmallVec::new();
            for &id in &returned {
                if seen.contains(&id) {
                    return Err(BoardError::forbidden(format!("{id} returned twice")));
                }
                ctx.board
                    .card(id)
                    .filter(|c| c.side == side && c.region == CardRegion::Hand)
                    .ok_or(BoardError::ObjectNotFound { id })?;
                seen.push(id);
            }

            let library = RegionRef::new(side, CardRegion::Library);
            for &id in &returned {
                zones::move_card(ctx.board, id, library, RegionPosition::Back)?;
            }
            let drawn = zones::draw(ctx.board, side, returned.len())?;

            if returned.is_empty() {
                ctx.log("Kept the opening hand");
            } else {
                ctx.log(format!("Returned {} card(s) to the library bottom and drew again", returned.len()));
                log_card_names(ctx, &drawn);
            }
            ctx.board.marigan_flags[side] = true;
            info!(%side, returned = returned.len(), "Marigan resolved");
            Ok(drawn)
        })
    }
}

/// Tokens, vigor, shared distance and megami extras for a side's first draw.
fn place_initial_pieces(board: &mut Board, config: &BoardConfig, side: PlayerSide) {
    zones::place_tokens(board, TokenPool::new(side, TokenRegion::Aura), config.initial_aura);
    zones::place_tokens(board, TokenPool::new(side, TokenRegion::Life), config.initial_life);
    board.vigors[side] = Vigor::new(0);

    let distance = TokenPool::shared(TokenRegion::Distance);
    if zones::token_count(board, distance) == 0 {
        zones::place_tokens(board, distance, config.initial_distance);
    }

    let megamis: Vec<MegamiId> = board.megamis[side].iter().flatten().cloned().collect();
    for setup in megamis.iter().filter_map(|m| config.megami_setup(m)) {
        for card in &setup.extra_cards {
            board.add_card(card.clone(), side, CardRegion::Extra);
        }
        if setup.machine_tokens > 0 {
            let machine = TokenPool::new(side, TokenRegion::Machine);
            zones::place_artificial_tokens(board, machine, setup.machine_tokens, side);
        }
        if let Some(plan) = setup.plan {
            board.plan_status[side] = Some(plan);
        }
        if let Some(umbrella) = setup.umbrella {
            board.umbrella_status[side] = Some(umbrella);
        }
        if setup.gauges {
            board.wind_gauge[side] = Some(0);
            board.thunder_gauge[side] = Some(0);
        }
    }
}
