//! Token allocator: capacity-checked movement of sakura tokens.
//!
//! Tokens are fungible inside a pool. A pool is one side's token region,
//! a shared region (`distance`, `dust`), or the tokens stacked on one
//! card. Transfers are all-or-nothing: every check runs before the first
//! token moves.

use tracing::debug;

use crate::core::{
    Board, BoardConfig, BoardError, ObjectId, PlayerSide, Result, SakuraToken, TokenGroup, TokenKind, TokenRegion,
};

use super::indexer::reindex;

/// Provisional index that sorts moved tokens after a pool's residents.
const APPEND_BASE: usize = usize::MAX / 2;

/// A named token pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenPool {
    pub side: Option<PlayerSide>,
    pub region: TokenRegion,
    /// Host card for `on-card` pools.
    pub card: Option<ObjectId>,
}

impl TokenPool {
    /// One side's region. Shared regions ignore the side.
    #[must_use]
    pub const fn new(side: PlayerSide, region: TokenRegion) -> Self {
        Self {
            side: if region.is_shared() { None } else { Some(side) },
            region,
            card: None,
        }
    }

    /// A region shared by both players.
    #[must_use]
    pub const fn shared(region: TokenRegion) -> Self {
        Self {
            side: None,
            region,
            card: None,
        }
    }

    /// The tokens placed on a card.
    #[must_use]
    pub const fn on_card(card: ObjectId) -> Self {
        Self {
            side: None,
            region: TokenRegion::OnCard,
            card: Some(card),
        }
    }

    /// The pool a token currently sits in.
    ///
    /// `None` for an on-card token that has lost its host link.
    #[must_use]
    pub fn of(token: &SakuraToken) -> Option<Self> {
        if token.region == TokenRegion::OnCard {
            token.linked_card_id.map(Self::on_card)
        } else {
            Some(Self {
                side: if token.region.is_shared() { None } else { token.side },
                region: token.region,
                card: None,
            })
        }
    }

    /// Does `token` sit in this pool?
    #[must_use]
    pub fn matches(&self, token: &SakuraToken) -> bool {
        if token.region != self.region {
            return false;
        }
        match self.region {
            TokenRegion::OnCard => token.linked_card_id == self.card,
            region if region.is_shared() => true,
            _ => token.side == self.side,
        }
    }
}

impl std::fmt::Display for TokenPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.card, self.side) {
            (Some(card), _) => write!(f, "{} of {card}", self.region),
            (None, Some(side)) => write!(f, "{side} {}", self.region),
            (None, None) => write!(f, "{}", self.region),
        }
    }
}

/// Tokens of a pool in layout order.
fn pool_tokens(board: &Board, pool: TokenPool) -> Vec<&SakuraToken> {
    let mut tokens: Vec<_> = board.tokens().filter(|t| pool.matches(t)).collect();
    tokens.sort_by_key(|t| (t.group, t.index_of_region, t.id));
    tokens
}

/// Tokens in a pool that count as sakura (inactive markers excluded).
#[must_use]
pub fn token_count(board: &Board, pool: TokenPool) -> usize {
    board
        .tokens()
        .filter(|t| pool.matches(t) && t.derive_group() != TokenGroup::Inactive)
        .count()
}

/// Move `count` tokens from the front of `from` to the back of `to`.
///
/// # Errors
///
/// - [`BoardError::ForbiddenOperation`] if `count` is zero.
/// - [`BoardError::ObjectNotFound`] if `to` is an on-card pool whose card does not exist.
/// - [`BoardError::InsufficientTokens`] if `from` holds fewer than `count` movable tokens.
/// - [`BoardError::CapacityExceeded`] if `to` is bounded and would overflow.
pub fn transfer(
    board: &mut Board,
    config: &BoardConfig,
    from: TokenPool,
    to: TokenPool,
    count: usize,
) -> Result<Vec<ObjectId>> {
    if count == 0 {
        return Err(BoardError::forbidden("token count must be positive"));
    }

    let movable: Vec<ObjectId> = pool_tokens(board, from)
        .into_iter()
        .filter(|t| t.group != TokenGroup::Inactive)
        .map(|t| t.id)
        .collect();
    if movable.len() < count {
        return Err(BoardError::InsufficientTokens {
            requested: count,
            available: movable.len(),
        });
    }

    let ids = movable[..count].to_vec();
    relocate(board, config, &ids, from, to)?;
    debug!(%from, %to, count, "Transferred tokens");
    Ok(ids)
}

/// Drag a token together with the rest of its group behind it.
///
/// Moves `group_token_dragging_count` tokens starting at `token_id`.
///
/// # Errors
///
/// [`BoardError::ObjectNotFound`] if `token_id` is not a token, plus the
/// destination errors of [`transfer`].
pub fn drag_tokens(board: &mut Board, config: &BoardConfig, token_id: ObjectId, to: TokenPool) -> Result<Vec<ObjectId>> {
    let token = board
        .token(token_id)
        .ok_or(BoardError::ObjectNotFound { id: token_id })?;
    let from = TokenPool::of(token)
        .ok_or_else(|| BoardError::forbidden(format!("token {token_id} is on a card but not linked to one")))?;
    let group = token.group;
    let start = token.index_of_region;

    let ids: Vec<ObjectId> = pool_tokens(board, from)
        .into_iter()
        .filter(|t| t.group == group && t.index_of_region >= start)
        .map(|t| t.id)
        .collect();

    relocate(board, config, &ids, from, to)?;
    debug!(%from, %to, count = ids.len(), "Dragged tokens");
    Ok(ids)
}

/// Create `count` new normal tokens at the back of `pool`.
///
/// Setup-time creation: capacity is not checked.
pub fn place_tokens(board: &mut Board, pool: TokenPool, count: usize) -> Vec<ObjectId> {
    spawn(board, pool, count, TokenKind::Sakura)
}

/// Create `count` artificial tokens owned by `owner` at the back of `pool`.
pub fn place_artificial_tokens(board: &mut Board, pool: TokenPool, count: usize, owner: PlayerSide) -> Vec<ObjectId> {
    spawn(board, pool, count, TokenKind::Artificial(owner))
}

fn spawn(board: &mut Board, pool: TokenPool, count: usize, kind: TokenKind) -> Vec<ObjectId> {
    let side = pool_side(board, pool);
    let ids = (0..count)
        .map(|_| board.add_token(pool.region, side, pool.card, kind))
        .collect();
    reindex(board);
    ids
}

/// Side that tokens entering `pool` take on.
fn pool_side(board: &Board, pool: TokenPool) -> Option<PlayerSide> {
    match pool.card {
        Some(card) => board.card(card).map(|c| c.side),
        None => pool.side,
    }
}

/// Move specific tokens of `from` into `to` after checking the destination.
fn relocate(board: &mut Board, config: &BoardConfig, ids: &[ObjectId], from: TokenPool, to: TokenPool) -> Result<()> {
    if let Some(card) = to.card {
        if board.card(card).is_none() {
            return Err(BoardError::ObjectNotFound { id: card });
        }
    }
    if from == to {
        return Ok(());
    }

    let adding = ids
        .iter()
        .filter_map(|id| board.token(*id))
        .filter(|t| t.derive_group() != TokenGroup::Inactive)
        .count();
    if let Some(capacity) = config.capacity(to.region) {
        let current = token_count(board, to);
        if current + adding > capacity {
            return Err(BoardError::CapacityExceeded {
                region: to.region,
                current,
                adding,
                capacity,
            });
        }
    }

    let side = pool_side(board, to);
    for (offset, id) in ids.iter().enumerate() {
        if let Some(token) = board.token_mut(*id) {
            token.region = to.region;
            token.side = side;
            token.linked_card_id = to.card;
            token.index_of_region = APPEND_BASE + offset;
        }
    }
    reindex(board);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardId, CardRegion};
    use crate::zones::{move_card, RegionPosition, RegionRef};

    fn aura(side: PlayerSide) -> TokenPool {
        TokenPool::new(side, TokenRegion::Aura)
    }

    fn life(side: PlayerSide) -> TokenPool {
        TokenPool::new(side, TokenRegion::Life)
    }

    fn setup() -> (Board, BoardConfig) {
        let mut board = Board::new();
        place_tokens(&mut board, aura(PlayerSide::P1), 3);
        place_tokens(&mut board, life(PlayerSide::P1), 10);
        place_tokens(&mut board, TokenPool::shared(TokenRegion::Distance), 10);
        (board, BoardConfig::default())
    }

    #[test]
    fn test_pool_normalizes_shared_side() {
        assert_eq!(TokenPool::new(PlayerSide::P2, TokenRegion::Dust), TokenPool::shared(TokenRegion::Dust));
        assert_eq!(aura(PlayerSide::P2).side, Some(PlayerSide::P2));
    }

    #[test]
    fn test_transfer_conserves_tokens() {
        let (mut board, config) = setup();
        let total = board.tokens().count();

        transfer(&mut board, &config, TokenPool::shared(TokenRegion::Distance), aura(PlayerSide::P1), 2).unwrap();

        assert_eq!(board.tokens().count(), total);
        assert_eq!(token_count(&board, aura(PlayerSide::P1)), 5);
        assert_eq!(token_count(&board, TokenPool::shared(TokenRegion::Distance)), 8);
        let moved_side = board
            .tokens()
            .filter(|t| t.region == TokenRegion::Aura)
            .all(|t| t.side == Some(PlayerSide::P1));
        assert!(moved_side);
    }

    #[test]
    fn test_aura_overflow_rejected() {
        let (mut board, config) = setup();
        transfer(&mut board, &config, life(PlayerSide::P1), aura(PlayerSide::P1), 1).unwrap();
        let before = board.clone();

        let err = transfer(&mut board, &config, TokenPool::shared(TokenRegion::Dust), aura(PlayerSide::P1), 2);
        assert!(matches!(err, Err(BoardError::InsufficientTokens { requested: 2, available: 0 })));

        let err = transfer(&mut board, &config, life(PlayerSide::P1), aura(PlayerSide::P1), 2).unwrap_err();
        assert_eq!(
            err,
            BoardError::CapacityExceeded {
                region: TokenRegion::Aura,
                current: 4,
                adding: 2,
                capacity: 5
            }
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_zero_count_rejected() {
        let (mut board, config) = setup();
        let err = transfer(&mut board, &config, life(PlayerSide::P1), aura(PlayerSide::P1), 0);
        assert!(matches!(err, Err(BoardError::ForbiddenOperation { .. })));
    }

    #[test]
    fn test_transfer_onto_card() {
        let (mut board, config) = setup();
        let host = board.add_card(CardId::new("host"), PlayerSide::P2, CardRegion::Used);

        transfer(&mut board, &config, TokenPool::shared(TokenRegion::Dust), TokenPool::on_card(host), 1)
            .unwrap_err();
        transfer(&mut board, &config, aura(PlayerSide::P1), TokenPool::on_card(host), 2).unwrap();

        assert_eq!(token_count(&board, TokenPool::on_card(host)), 2);
        let on_card: Vec<_> = board.tokens().filter(|t| t.region == TokenRegion::OnCard).collect();
        assert!(on_card.iter().all(|t| t.linked_card_id == Some(host) && t.side == Some(PlayerSide::P2)));

        let missing = transfer(&mut board, &config, aura(PlayerSide::P1), TokenPool::on_card(ObjectId(999)), 1);
        assert_eq!(missing, Err(BoardError::ObjectNotFound { id: ObjectId(999) }));
    }

    #[test]
    fn test_on_card_tokens_follow_host_across_sides() {
        let (mut board, config) = setup();
        let dust = TokenPool::shared(TokenRegion::Dust);
        place_tokens(&mut board, dust, 2);
        let host = board.add_card(CardId::new("host"), PlayerSide::P1, CardRegion::Used);
        transfer(&mut board, &config, dust, TokenPool::on_card(host), 1).unwrap();

        move_card(&mut board, host, RegionRef::new(PlayerSide::P2, CardRegion::Used), RegionPosition::Back).unwrap();
        transfer(&mut board, &config, dust, TokenPool::on_card(host), 1).unwrap();

        let stacked: Vec<_> = pool_tokens(&board, TokenPool::on_card(host))
            .iter()
            .map(|t| (t.side, t.index_of_region, t.group_token_dragging_count))
            .collect();
        assert_eq!(stacked, vec![(Some(PlayerSide::P2), 0, 2), (Some(PlayerSide::P2), 1, 1)]);
        assert_eq!(token_count(&board, TokenPool::on_card(host)), 2);
    }

    #[test]
    fn test_drag_unlinked_on_card_token_rejected() {
        let (mut board, config) = setup();
        let stray = board.add_token(TokenRegion::OnCard, None, None, TokenKind::Sakura);

        let err = drag_tokens(&mut board, &config, stray, TokenPool::shared(TokenRegion::Dust));

        assert!(matches!(err, Err(BoardError::ForbiddenOperation { .. })));
    }

    #[test]
    fn test_inactive_markers_not_counted_or_moved() {
        let mut board = Board::new();
        let config = BoardConfig::default();
        let distance = TokenPool::shared(TokenRegion::Distance);
        place_tokens(&mut board, distance, 10);
        let marker = board.add_token(TokenRegion::Distance, None, None, TokenKind::DistanceMinus);
        reindex(&mut board);

        assert_eq!(token_count(&board, distance), 10);

        transfer(&mut board, &config, distance, TokenPool::shared(TokenRegion::Dust), 10).unwrap();
        assert_eq!(board.token(marker).map(|t| t.region), Some(TokenRegion::Distance));

        let err = transfer(&mut board, &config, distance, TokenPool::shared(TokenRegion::Dust), 1);
        assert!(matches!(err, Err(BoardError::InsufficientTokens { available: 0, .. })));
    }

    #[test]
    fn test_drag_moves_rest_of_group() {
        let (mut board, config) = setup();
        let life_ids: Vec<_> = pool_tokens(&board, life(PlayerSide::P1)).iter().map(|t| t.id).collect();

        let dragged = drag_tokens(&mut board, &config, life_ids[7], TokenPool::shared(TokenRegion::Dust)).unwrap();

        assert_eq!(dragged, life_ids[7..].to_vec());
        assert_eq!(token_count(&board, life(PlayerSide::P1)), 7);
        assert_eq!(token_count(&board, TokenPool::shared(TokenRegion::Dust)), 3);
    }

    #[test]
    fn test_drag_respects_capacity() {
        let (mut board, config) = setup();
        let first_life = pool_tokens(&board, life(PlayerSide::P1))[0].id;

        let err = drag_tokens(&mut board, &config, first_life, aura(PlayerSide::P1));
        assert!(matches!(err, Err(BoardError::CapacityExceeded { adding: 10, .. })));
    }

    #[test]
    fn test_artificial_tokens_grouped_after_normal() {
        let mut board = Board::new();
        let machine = TokenPool::new(PlayerSide::P1, TokenRegion::Machine);
        place_artificial_tokens(&mut board, machine, 2, PlayerSide::P1);
        place_tokens(&mut board, machine, 1);

        let tokens = pool_tokens(&board, machine);
        assert_eq!(tokens[0].group, TokenGroup::Normal);
        assert_eq!(tokens[1].group, TokenGroup::ArtificialP1);
        assert_eq!(tokens[1].group_token_dragging_count, 2);
        assert_eq!(tokens[2].group_token_dragging_count, 1);
    }
}
