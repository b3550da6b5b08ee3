//! Shuffle/draw engine: randomized reordering and bulk card transfer.
//!
//! Every function here leaves the board re-indexed, so callers can chain
//! them freely inside one action.

use tracing::debug;

use crate::core::{Board, BoardError, CardRegion, GameRng, ObjectId, PlayerSide, Result};

use super::indexer::reindex;

/// Where moved cards land in the destination region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegionPosition {
    /// Index 0 (top of the library).
    Front,
    /// After the last card (bottom of the library).
    #[default]
    Back,
    /// Before the card currently at this index; clamped to the back.
    Index(usize),
}

/// One side's card region, or the cards stacked on a host card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionRef {
    pub side: PlayerSide,
    pub region: CardRegion,
    pub host: Option<ObjectId>,
}

impl RegionRef {
    #[must_use]
    pub const fn new(side: PlayerSide, region: CardRegion) -> Self {
        Self { side, region, host: None }
    }

    /// The cards attached to `host`.
    ///
    /// Attached cards always take the host's side; `side` only names
    /// whose stack the caller meant, for logging.
    #[must_use]
    pub const fn on_card(side: PlayerSide, host: ObjectId) -> Self {
        Self {
            side,
            region: CardRegion::OnCard,
            host: Some(host),
        }
    }
}

/// Ids of the cards in `place`, ordered by `index_of_region`.
#[must_use]
pub fn region_ids(board: &Board, place: RegionRef) -> Vec<ObjectId> {
    let mut cards: Vec<_> = match place.region {
        CardRegion::OnCard => board
            .cards()
            .filter(|c| c.region == CardRegion::OnCard && c.linked_card_id == place.host)
            .collect(),
        region => board.side_cards(place.side).filter(|c| c.region == region).collect(),
    };
    cards.sort_by_key(|c| (c.index_of_region, c.id));
    cards.iter().map(|c| c.id).collect()
}

/// Uniformly permute a region's cards.
pub fn shuffle(board: &mut Board, side: PlayerSide, region: CardRegion, rng: &mut GameRng) {
    let mut ids = region_ids(board, RegionRef::new(side, region));
    rng.shuffle(&mut ids);

    for (index, id) in ids.iter().enumerate() {
        if let Some(card) = board.card_mut(*id) {
            card.index_of_region = index;
        }
    }
    reindex(board);
    debug!(%side, %region, cards = ids.len(), "Shuffled region");
}

/// Move `count` contiguous cards starting at `from_index` to `to`.
///
/// Moved cards keep their relative order. Returns their ids.
///
/// # Errors
///
/// - [`BoardError::InvalidRange`] if `from_index + count` exceeds the source size.
/// - [`BoardError::ForbiddenOperation`] / [`BoardError::ObjectNotFound`] for a bad on-card target.
pub fn move_cards(
    board: &mut Board,
    from: RegionRef,
    from_index: usize,
    to: RegionRef,
    count: usize,
    position: RegionPosition,
) -> Result<Vec<ObjectId>> {
    let source = region_ids(board, from);
    let end = from_index.checked_add(count).filter(|&end| end <= source.len());
    let Some(end) = end else {
        return Err(BoardError::InvalidRange {
            from_index,
            count,
            size: source.len(),
        });
    };

    let moving = source[from_index..end].to_vec();
    place_cards(board, &moving, to, position)?;
    debug!(from = %from.region, to = %to.region, count, "Moved cards");
    Ok(moving)
}

/// Move one card, wherever it is, to `to`.
///
/// # Errors
///
/// [`BoardError::ObjectNotFound`] if `id` is not a card, plus the on-card
/// target errors of [`move_cards`].
pub fn move_card(board: &mut Board, id: ObjectId, to: RegionRef, position: RegionPosition) -> Result<()> {
    if board.card(id).is_none() {
        return Err(BoardError::ObjectNotFound { id });
    }
    place_cards(board, &[id], to, position)
}

/// Draw `count` cards from the top of a side's library into its hand.
///
/// # Errors
///
/// [`BoardError::InvalidRange`] if the library holds fewer than `count` cards.
pub fn draw(board: &mut Board, side: PlayerSide, count: usize) -> Result<Vec<ObjectId>> {
    move_cards(
        board,
        RegionRef::new(side, CardRegion::Library),
        0,
        RegionRef::new(side, CardRegion::Hand),
        count,
        RegionPosition::Back,
    )
}

/// Return used and hidden-used cards to the library, then shuffle it.
pub fn reshuffle(board: &mut Board, side: PlayerSide, rng: &mut GameRng) {
    let library = RegionRef::new(side, CardRegion::Library);
    for region in [CardRegion::Used, CardRegion::HiddenUsed] {
        let ids = region_ids(board, RegionRef::new(side, region));
        arrange(board, &ids, library, side, RegionPosition::Back);
    }
    shuffle(board, side, CardRegion::Library, rng);
}

/// Cards beneath `host` in its stack, nearest first.
fn stack_below(board: &Board, host: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
    std::iter::successors(board.card(host), |card| board.linked_card(card))
        .skip(1)
        .take(board.objects.len())
        .map(|card| card.id)
}

/// Relocate `ids` (in order) into `to` at `position`.
fn place_cards(board: &mut Board, ids: &[ObjectId], to: RegionRef, position: RegionPosition) -> Result<()> {
    let side = if to.region == CardRegion::OnCard {
        let host = to
            .host
            .ok_or_else(|| BoardError::forbidden("on-card placement needs a host card"))?;
        let Some(host_card) = board.card(host) else {
            return Err(BoardError::ObjectNotFound { id: host });
        };
        if ids.contains(&host) {
            return Err(BoardError::forbidden("a card cannot be placed on itself"));
        }
        if stack_below(board, host).any(|id| ids.contains(&id)) {
            return Err(BoardError::forbidden("a card cannot be placed on its own stack"));
        }
        host_card.side
    } else {
        to.side
    };
    arrange(board, ids, to, side, position);
    Ok(())
}

/// Splice `ids` into `to` at `position` and reindex. `to` must already be valid.
fn arrange(board: &mut Board, ids: &[ObjectId], to: RegionRef, side: PlayerSide, position: RegionPosition) {
    let mut order: Vec<ObjectId> = region_ids(board, to)
        .into_iter()
        .filter(|id| !ids.contains(id))
        .collect();
    let at = match position {
        RegionPosition::Front => 0,
        RegionPosition::Back => order.len(),
        RegionPosition::Index(i) => i.min(order.len()),
    };
    order.splice(at..at, ids.iter().copied());

    for (index, id) in order.iter().enumerate() {
        if let Some(card) = board.card_mut(*id) {
            card.side = side;
            card.region = to.region;
            card.linked_card_id = to.host;
            card.index_of_region = index;
        }
    }
    reindex(board);
}
