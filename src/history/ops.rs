//! Free-play board operations.
//!
//! Each method wraps one player gesture (drag a card, adjust vigor, flip
//! the plan token...) in `Table::operate` with the undo mode and log
//! lines that gesture calls for.

use tracing::instrument;

use crate::core::{
    Board, BoardError, CardRegion, ObjectId, PlanState, PlayerSide, Result, TokenRegion, UmbrellaState, Vigor,
};
use crate::zones::{self, RegionPosition, RegionRef, TokenPool};

use super::table::{ActionContext, Operation, Table};

/// One of the two per-side storm gauges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gauge {
    Wind,
    Thunder,
}

impl Gauge {
    fn label(self) -> &'static str {
        match self {
            Gauge::Wind => "wind",
            Gauge::Thunder => "thunder",
        }
    }
}

/// "`name`'s " when acting on the other player, empty otherwise.
fn target_prefix(ctx: &ActionContext<'_>, target: PlayerSide) -> String {
    match ctx.side().player() {
        Some(side) if side == target => String::new(),
        _ => format!("{}'s ", ctx.board.player_names[target]),
    }
}

fn gauge_slot(board: &mut Board, side: PlayerSide, gauge: Gauge) -> &mut Option<u32> {
    match gauge {
        Gauge::Wind => &mut board.wind_gauge[side],
        Gauge::Thunder => &mut board.thunder_gauge[side],
    }
}

impl Table {
    // === Player state ===

    /// Set a side's vigor. Either player may adjust either side.
    #[instrument(skip(self))]
    pub fn set_vigor(&mut self, target: PlayerSide, vigor: Vigor) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            ctx.acting_side()?;
            let old = ctx.board.vigors[target].map_or(0, Vigor::value);
            let new = vigor.value();
            let text = if new >= old {
                format!("{}Vigor increased by {}", target_prefix(ctx, target), new - old)
            } else {
                format!("{}Vigor decreased by {}", target_prefix(ctx, target), old - new)
            };
            ctx.board.vigors[target] = Some(vigor);
            ctx.log(text);
            Ok(())
        })
    }

    #[instrument(skip(self))]
    pub fn set_wither(&mut self, target: PlayerSide, withered: bool) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let me = ctx.acting_side()?;
            let name = &ctx.board.player_names[target];
            let text = match (withered, me == target) {
                (true, true) => "Withered".to_string(),
                (true, false) => format!("Made {name} wither"),
                (false, true) => "Recovered from wither".to_string(),
                (false, false) => format!("Released {name} from wither"),
            };
            ctx.board.wither_flags[target] = withered;
            ctx.log(text);
            Ok(())
        })
    }

    /// Open or close the whole hand. Clears per-card overrides.
    #[instrument(skip(self))]
    pub fn set_hand_open(&mut self, opened: bool) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            ctx.board.hand_open_flags[side] = opened;
            ctx.board.hand_card_open_flags[side] = im::HashMap::new();
            ctx.log(if opened { "Revealed hand" } else { "Hid hand" });
            Ok(())
        })
    }

    /// Reveal or hide a single hand card.
    ///
    /// # Errors
    ///
    /// [`BoardError::ObjectNotFound`] unless `card` is in the acting side's hand.
    #[instrument(skip(self))]
    pub fn set_hand_card_open(&mut self, card: ObjectId, opened: bool) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            let in_hand = ctx
                .board
                .card(card)
                .filter(|c| c.side == side && c.region == CardRegion::Hand)
                .ok_or(BoardError::ObjectNotFound { id: card })?;
            let text = if opened {
                format!("Revealed {} from hand", in_hand.card_id)
            } else {
                "Hid a revealed hand card".to_string()
            };
            ctx.board.hand_card_open_flags[side].insert(card, opened);
            ctx.log(text);
            Ok(())
        })
    }

    #[instrument(skip(self))]
    pub fn set_plan_state(&mut self, state: PlanState) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            ctx.board.plan_status[side] = Some(state);
            ctx.log("Changed plan state");
            Ok(())
        })
    }

    #[instrument(skip(self))]
    pub fn set_umbrella_state(&mut self, state: UmbrellaState) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            ctx.board.umbrella_status[side] = Some(state);
            ctx.log(match state {
                UmbrellaState::Opened => "Opened the umbrella",
                UmbrellaState::Closed => "Closed the umbrella",
            });
            Ok(())
        })
    }

    // === Gauges ===

    #[instrument(skip(self))]
    pub fn reset_gauge(&mut self, gauge: Gauge) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            *gauge_slot(ctx.board, side, gauge) = Some(0);
            ctx.log(format!("Reset {} gauge", gauge.label()));
            Ok(())
        })
    }

    /// Add one to a gauge, capped at `BoardConfig::gauge_cap`.
    ///
    /// # Errors
    ///
    /// [`BoardError::ForbiddenOperation`] if the gauge is not in play.
    #[instrument(skip(self))]
    pub fn increment_gauge(&mut self, gauge: Gauge) -> Result<()> {
        self.update_gauge(gauge, "Raised", |value| value.saturating_add(1))
    }

    /// Double a gauge, capped at `BoardConfig::gauge_cap`.
    ///
    /// # Errors
    ///
    /// [`BoardError::ForbiddenOperation`] if the gauge is not in play.
    #[instrument(skip(self))]
    pub fn double_gauge(&mut self, gauge: Gauge) -> Result<()> {
        self.update_gauge(gauge, "Doubled", |value| value.saturating_mul(2))
    }

    fn update_gauge(&mut self, gauge: Gauge, verb: &str, step: impl FnOnce(u32) -> u32) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            let cap = ctx.config.gauge_cap;
            let slot = gauge_slot(ctx.board, side, gauge);
            let Some(value) = *slot else {
                return Err(BoardError::forbidden(format!("{} gauge is not in play", gauge.label())));
            };
            let next = step(value).min(cap);
            *slot = Some(next);
            ctx.log(format!("{verb} {} gauge to {next}", gauge.label()));
            Ok(())
        })
    }

    // === Cards ===

    /// Drag one card to another region.
    #[instrument(skip(self))]
    pub fn move_card(&mut self, card: ObjectId, to: RegionRef, position: RegionPosition) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            ctx.acting_side()?;
            let moving = ctx.board.card(card).ok_or(BoardError::ObjectNotFound { id: card })?;
            let from = moving.region;
            let name = moving.card_id.clone();
            zones::move_card(ctx.board, card, to, position)?;

            if to.region == CardRegion::Used {
                ctx.log(format!("Moved {name} from {from} to {}", to.region));
            } else {
                ctx.log(format!("Moved a card from {from} to {}", to.region));
            }
            Ok(())
        })
    }

    /// Move a contiguous run of cards between regions.
    #[instrument(skip(self))]
    pub fn move_cards(
        &mut self,
        from: RegionRef,
        from_index: usize,
        to: RegionRef,
        count: usize,
        position: RegionPosition,
    ) -> Result<Vec<ObjectId>> {
        self.operate(Operation::undoable(), |ctx| {
            ctx.acting_side()?;
            let moved = zones::move_cards(ctx.board, from, from_index, to, count, position)?;
            ctx.log(format!("Moved {count} card(s) from {} to {}", from.region, to.region));
            Ok(moved)
        })
    }

    /// Draw cards from the top of the library.
    #[instrument(skip(self))]
    pub fn draw(&mut self, count: usize) -> Result<Vec<ObjectId>> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            let drawn = zones::draw(ctx.board, side, count)?;
            ctx.log(format!("Drew {count} card(s)"));
            log_card_names(ctx, &drawn);
            Ok(drawn)
        })
    }

    /// Shuffle the acting side's library. Cannot be undone.
    #[instrument(skip(self))]
    pub fn shuffle_library(&mut self) -> Result<()> {
        self.operate(Operation::irreversible().log("Shuffled the library"), |ctx| {
            let side = ctx.acting_side()?;
            zones::shuffle(ctx.board, side, CardRegion::Library, ctx.rng);
            Ok(())
        })
    }

    /// Return used and hidden-used cards to the library and shuffle.
    ///
    /// With `life_decrease`, one life token also moves to flair.
    #[instrument(skip(self))]
    pub fn reshuffle(&mut self, life_decrease: bool) -> Result<()> {
        self.operate(Operation::irreversible(), |ctx| {
            let side = ctx.acting_side()?;
            if life_decrease {
                zones::transfer(
                    ctx.board,
                    ctx.config,
                    TokenPool::new(side, TokenRegion::Life),
                    TokenPool::new(side, TokenRegion::Flair),
                    1,
                )?;
            }
            zones::reshuffle(ctx.board, side, ctx.rng);
            ctx.log(if life_decrease {
                "Reshuffled the deck and took 1 life damage"
            } else {
                "Reshuffled the deck"
            });
            Ok(())
        })
    }

    /// Mark a trump card as used (face-up) or unused.
    ///
    /// # Errors
    ///
    /// [`BoardError::ObjectNotFound`] unless `card` is in the acting side's special region.
    #[instrument(skip(self))]
    pub fn set_special_used(&mut self, card: ObjectId, used: bool) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            let side = ctx.acting_side()?;
            let target = ctx
                .board
                .card_mut(card)
                .filter(|c| c.side == side && c.region == CardRegion::Special)
                .ok_or(BoardError::ObjectNotFound { id: card })?;
            target.special_used = used;
            let text = if used {
                format!("Used trump card {}", target.card_id)
            } else {
                "Turned a trump card face down".to_string()
            };
            ctx.log(text);
            Ok(())
        })
    }

    /// Set a card's discharged flag.
    ///
    /// # Errors
    ///
    /// - [`BoardError::ObjectNotFound`] if `card` does not exist.
    /// - [`BoardError::ForbiddenOperation`] outside used, special and on-card regions.
    #[instrument(skip(self))]
    pub fn set_discharged(&mut self, card: ObjectId, discharged: bool) -> Result<()> {
        self.operate(Operation::undoable(), |ctx| {
            ctx.acting_side()?;
            let target = ctx.board.card_mut(card).ok_or(BoardError::ObjectNotFound { id: card })?;
            if !matches!(target.region, CardRegion::Used | CardRegion::Special | CardRegion::OnCard) {
                return Err(BoardError::forbidden(format!("cannot discharge a card in {}", target.region)));
            }
            target.discharged = discharged;
            let text = format!("Set {} discharged: {discharged}", target.card_id);
            ctx.log(text);
            Ok(())
        })
    }

    // === Tokens ===

    /// Move `count` sakura tokens between pools.
    #[instrument(skip(self))]
    pub fn transfer_tokens(&mut self, from: TokenPool, to: TokenPool, count: usize) -> Result<Vec<ObjectId>> {
        self.operate(Operation::undoable(), |ctx| {
            ctx.acting_side()?;
            let moved = zones::transfer(ctx.board, ctx.config, from, to, count)?;
            ctx.log(format!("Moved {count} sakura token(s) from {from} to {to}"));
            Ok(moved)
        })
    }

    /// Drag a token and the rest of its group.
    #[instrument(skip(self))]
    pub fn drag_tokens(&mut self, token: ObjectId, to: TokenPool) -> Result<Vec<ObjectId>> {
        self.operate(Operation::undoable(), |ctx| {
            ctx.acting_side()?;
            let moved = zones::drag_tokens(ctx.board, ctx.config, token, to)?;
            ctx.log(format!("Moved {} sakura token(s) to {to}", moved.len()));
            Ok(moved)
        })
    }

    // === Table bookkeeping ===

    /// Rename a side. Not recorded in history.
    #[instrument(skip(self))]
    pub fn set_player_name(&mut self, side: PlayerSide, name: String) -> Result<()> {
        self.operate(Operation::untracked(), |ctx| {
            ctx.board.player_names[side] = name;
            Ok(())
        })
    }

    /// Clear the board back to the pre-setup state, keeping player names.
    #[instrument(skip(self))]
    pub fn reset_board(&mut self) -> Result<()> {
        self.operate(Operation::irreversible().log("Reset the board"), |ctx| {
            ctx.acting_side()?;
            *ctx.board = ctx.board.reset();
            Ok(())
        })
    }
}

/// Owner-only log line naming freshly drawn cards.
pub(crate) fn log_card_names(ctx: &mut ActionContext<'_>, ids: &[ObjectId]) {
    if ids.is_empty() {
        return;
    }
    let names: Vec<String> = ids
        .iter()
        .filter_map(|id| ctx.board.card(*id))
        .map(|c| c.card_id.to_string())
        .collect();
    ctx.log_owner_only(format!("-> {}", names.join(", ")));
}
