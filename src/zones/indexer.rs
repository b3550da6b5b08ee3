//! Region indexer: restores every derived placement field of a board.
//!
//! Mutators move pieces by rewriting `region` (and, when they care about
//! order, writing a provisional `index_of_region`). `reindex` then:
//!
//! - gives every on-card piece the side of the card at the bottom of
//!   its stack,
//! - groups cards by `(side, region, host card)` and tokens by
//!   `(side, region)` or, on a card, by host card alone,
//! - sorts each group by its prior index (ties broken by object id, and
//!   for tokens by group first),
//! - reassigns contiguous 0-based indices,
//! - forces the open/rotated flags a card's region implies,
//! - recomputes `draggable`, token `group` and `group_token_dragging_count`.
//!
//! It never randomizes and never validates capacity. It is total and
//! idempotent.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::core::{
    Board, BoardObject, Card, CardOpenState, CardRegion, ObjectId, PlayerSide, TokenGroup, TokenRegion,
};

/// Key of an ordered card region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CardSlot {
    side: PlayerSide,
    region: CardRegion,
    host: Option<ObjectId>,
}

/// Key of a token pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TokenSlot {
    side: Option<PlayerSide>,
    region: TokenRegion,
    host: Option<ObjectId>,
}

/// Derived fields computed for one object.
#[derive(Clone, Copy, Debug)]
enum Placement {
    Card { index: usize, draggable: bool },
    Token { index: usize, group: TokenGroup, dragging_count: usize },
}

/// Recompute every derived field of `board` in place.
pub fn reindex(board: &mut Board) {
    follow_hosts(board);

    let mut card_slots: FxHashMap<CardSlot, Vec<(usize, ObjectId, usize)>> = FxHashMap::default();
    let mut token_slots: FxHashMap<TokenSlot, Vec<(TokenGroup, usize, ObjectId, usize)>> = FxHashMap::default();

    for (pos, object) in board.objects.iter().enumerate() {
        match object {
            BoardObject::Card(card) => {
                let slot = CardSlot {
                    side: card.side,
                    region: card.region,
                    host: host_of_card(card),
                };
                card_slots
                    .entry(slot)
                    .or_default()
                    .push((card.index_of_region, card.id, pos));
            }
            BoardObject::SakuraToken(token) => {
                let slot = match token.region {
                    TokenRegion::OnCard => TokenSlot {
                        side: None,
                        region: token.region,
                        host: token.linked_card_id,
                    },
                    region => TokenSlot {
                        side: if region.is_shared() { None } else { token.side },
                        region,
                        host: None,
                    },
                };
                token_slots
                    .entry(slot)
                    .or_default()
                    .push((token.derive_group(), token.index_of_region, token.id, pos));
            }
        }
    }

    let mut placements: Vec<Option<Placement>> = vec![None; board.objects.len()];

    for (slot, mut members) in card_slots {
        members.sort_unstable_by_key(|&(prior, id, _)| (prior, id));
        let len = members.len();
        for (index, &(_, _, pos)) in members.iter().enumerate() {
            let draggable = match slot.region {
                CardRegion::Library => index == 0,
                CardRegion::HiddenUsed => index + 1 == len,
                _ => true,
            };
            placements[pos] = Some(Placement::Card { index, draggable });
        }
    }

    for (_, mut members) in token_slots {
        members.sort_unstable_by_key(|&(group, prior, id, _)| (group, prior, id));

        let mut group_sizes: FxHashMap<TokenGroup, usize> = FxHashMap::default();
        for &(group, ..) in &members {
            *group_sizes.entry(group).or_default() += 1;
        }

        let mut seen_in_group: FxHashMap<TokenGroup, usize> = FxHashMap::default();
        for (index, &(group, _, _, pos)) in members.iter().enumerate() {
            let seen = seen_in_group.entry(group).or_default();
            let dragging_count = group_sizes[&group] - *seen;
            *seen += 1;
            placements[pos] = Some(Placement::Token {
                index,
                group,
                dragging_count,
            });
        }
    }

    let hand_open = board.hand_open_flags.clone();
    let hand_card_open = board.hand_card_open_flags.clone();

    for (object, placement) in board.objects.iter_mut().zip(placements) {
        match (object, placement) {
            (BoardObject::Card(card), Some(Placement::Card { index, draggable })) => {
                card.index_of_region = index;
                card.draggable = draggable;
                let opened = hand_open[card.side]
                    || hand_card_open[card.side].get(&card.id).copied().unwrap_or(false);
                normalize_card(card, opened);
            }
            (
                BoardObject::SakuraToken(token),
                Some(Placement::Token {
                    index,
                    group,
                    dragging_count,
                }),
            ) => {
                token.index_of_region = index;
                token.group = group;
                token.group_token_dragging_count = dragging_count;
                if token.region != TokenRegion::OnCard {
                    token.linked_card_id = None;
                }
                if token.region.is_shared() {
                    token.side = None;
                }
            }
            // Every object was assigned a placement of its own kind above.
            _ => {}
        }
    }

    trace!(objects = board.objects.len(), "Board reindexed");
}

/// Value form of [`reindex`].
#[must_use]
pub fn reindexed(mut board: Board) -> Board {
    reindex(&mut board);
    board
}

/// Re-side on-card pieces to the card their stack rests on.
///
/// Hosts can change side after pieces were attached; without this the
/// pieces of one stack would split across two slots.
fn follow_hosts(board: &mut Board) {
    let links: FxHashMap<ObjectId, (PlayerSide, Option<ObjectId>)> =
        board.cards().map(|c| (c.id, (c.side, host_of_card(c)))).collect();

    for object in board.objects.iter_mut() {
        match object {
            BoardObject::Card(card) => {
                if let Some(side) = host_of_card(card).and_then(|host| stack_side(&links, host)) {
                    card.side = side;
                }
            }
            BoardObject::SakuraToken(token) if token.region == TokenRegion::OnCard => {
                if let Some(side) = token.linked_card_id.and_then(|host| stack_side(&links, host)) {
                    token.side = Some(side);
                }
            }
            BoardObject::SakuraToken(_) => {}
        }
    }
}

/// Side of the bottom card under `host`. `None` for a missing host or a cycle.
fn stack_side(links: &FxHashMap<ObjectId, (PlayerSide, Option<ObjectId>)>, host: ObjectId) -> Option<PlayerSide> {
    let mut current = host;
    for _ in 0..=links.len() {
        let &(side, below) = links.get(&current)?;
        match below {
            Some(below) if links.contains_key(&below) => current = below,
            _ => return Some(side),
        }
    }
    None
}

fn host_of_card(card: &Card) -> Option<ObjectId> {
    if card.region == CardRegion::OnCard {
        card.linked_card_id
    } else {
        None
    }
}

/// Force the flags a card's region determines.
fn normalize_card(card: &mut Card, hand_opened: bool) {
    if card.region != CardRegion::OnCard {
        card.linked_card_id = None;
    }

    match card.region {
        CardRegion::Library => {
            card.open_state = CardOpenState::Closed;
            card.rotated = false;
            card.discharged = false;
        }
        CardRegion::Hand => {
            card.open_state = if hand_opened { CardOpenState::Opened } else { CardOpenState::OwnerOnly };
            card.rotated = false;
            card.discharged = false;
        }
        CardRegion::Used => {
            card.open_state = CardOpenState::Opened;
            card.rotated = false;
        }
        CardRegion::HiddenUsed => {
            card.open_state = CardOpenState::Closed;
            card.rotated = true;
            card.discharged = false;
        }
        CardRegion::Special => {
            card.open_state = if card.special_used { CardOpenState::Opened } else { CardOpenState::OwnerOnly };
        }
        CardRegion::Extra => {
            card.open_state = CardOpenState::OwnerOnly;
        }
        CardRegion::OnCard => {
            card.open_state = CardOpenState::Opened;
        }
    }
}
