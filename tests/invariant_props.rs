//! Property tests for board invariants.
//!
//! Random sequences of card moves, shuffles and token transfers must
//! always leave:
//! - contiguous `0..n` indices in every region
//! - the same total number of tokens
//! - aura and distance within capacity

use proptest::prelude::*;
use rustc_hash::FxHashMap;

use sakura_table::zones::{self, place_tokens, token_count};
use sakura_table::{
    Board, BoardConfig, BoardObject, CardId, CardRegion, GameRng, PlayerSide, RegionPosition, RegionRef, TokenPool,
    TokenRegion,
};

const CARD_REGIONS: [CardRegion; 6] = [
    CardRegion::Library,
    CardRegion::Hand,
    CardRegion::Used,
    CardRegion::HiddenUsed,
    CardRegion::Special,
    CardRegion::Extra,
];

const TOKEN_REGIONS: [TokenRegion; 5] = [
    TokenRegion::Aura,
    TokenRegion::Life,
    TokenRegion::Flair,
    TokenRegion::Distance,
    TokenRegion::Dust,
];

#[derive(Clone, Debug)]
enum Step {
    MoveCards { side: usize, from: usize, to: usize, from_index: usize, count: usize, front: bool },
    Shuffle { side: usize, region: usize },
    Transfer { from_side: usize, from: usize, to_side: usize, to: usize, count: usize },
    Reshuffle { side: usize },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..2usize, 0..6usize, 0..6usize, 0..12usize, 0..5usize, any::<bool>()).prop_map(
            |(side, from, to, from_index, count, front)| Step::MoveCards { side, from, to, from_index, count, front }
        ),
        (0..2usize, 0..6usize).prop_map(|(side, region)| Step::Shuffle { side, region }),
        (0..2usize, 0..5usize, 0..2usize, 0..5usize, 1..6usize).prop_map(|(from_side, from, to_side, to, count)| {
            Step::Transfer { from_side, from, to_side, to, count }
        }),
        (0..2usize).prop_map(|side| Step::Reshuffle { side }),
    ]
}

fn starting_board() -> Board {
    let mut board = Board::new();
    for side in PlayerSide::ALL {
        for i in 0..10 {
            board.add_card(CardId::new(format!("{side}-{i}")), side, CardRegion::Library);
        }
        place_tokens(&mut board, TokenPool::new(side, TokenRegion::Aura), 3);
        place_tokens(&mut board, TokenPool::new(side, TokenRegion::Life), 10);
    }
    place_tokens(&mut board, TokenPool::shared(TokenRegion::Distance), 10);
    board
}

fn apply(board: &mut Board, config: &BoardConfig, rng: &mut GameRng, step: &Step) {
    // Rejected steps are expected; the invariants must hold either way.
    match *step {
        Step::MoveCards { side, from, to, from_index, count, front } => {
            let side = PlayerSide::ALL[side];
            let position = if front { RegionPosition::Front } else { RegionPosition::Back };
            let _ = zones::move_cards(
                board,
                RegionRef::new(side, CARD_REGIONS[from]),
                from_index,
                RegionRef::new(side, CARD_REGIONS[to]),
                count,
                position,
            );
        }
        Step::Shuffle { side, region } => {
            zones::shuffle(board, PlayerSide::ALL[side], CARD_REGIONS[region], rng);
        }
        Step::Transfer { from_side, from, to_side, to, count } => {
            let from = TokenPool::new(PlayerSide::ALL[from_side], TOKEN_REGIONS[from]);
            let to = TokenPool::new(PlayerSide::ALL[to_side], TOKEN_REGIONS[to]);
            let _ = zones::transfer(board, config, from, to, count);
        }
        Step::Reshuffle { side } => zones::reshuffle(board, PlayerSide::ALL[side], rng),
    }
}

/// Every region's indices are exactly `0..n`.
fn assert_contiguous(board: &Board) {
    let mut regions: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for object in &board.objects {
        let key = match object {
            BoardObject::Card(c) => format!("card/{}/{}/{:?}", c.side, c.region, c.linked_card_id),
            BoardObject::SakuraToken(t) => format!("token/{:?}/{}/{:?}", t.side, t.region, t.linked_card_id),
        };
        regions.entry(key).or_default().push(object.index_of_region());
    }
    for (key, mut indices) in regions {
        indices.sort_unstable();
        let expected: Vec<usize> = (0..indices.len()).collect();
        assert_eq!(indices, expected, "region {key} is not contiguous");
    }
}

proptest! {
    #[test]
    fn indices_stay_contiguous(steps in prop::collection::vec(step(), 1..40), seed in any::<u64>()) {
        let config = BoardConfig::default();
        let mut rng = GameRng::new(seed);
        let mut board = starting_board();

        for step in &steps {
            apply(&mut board, &config, &mut rng, step);
            assert_contiguous(&board);
        }
    }

    #[test]
    fn tokens_are_conserved_and_capped(steps in prop::collection::vec(step(), 1..40), seed in any::<u64>()) {
        let config = BoardConfig::default();
        let mut rng = GameRng::new(seed);
        let mut board = starting_board();
        let total = board.tokens().count();
        let cards = board.cards().count();

        for step in &steps {
            apply(&mut board, &config, &mut rng, step);

            prop_assert_eq!(board.tokens().count(), total);
            prop_assert_eq!(board.cards().count(), cards);
            for side in PlayerSide::ALL {
                prop_assert!(token_count(&board, TokenPool::new(side, TokenRegion::Aura)) <= 5);
            }
            prop_assert!(token_count(&board, TokenPool::shared(TokenRegion::Distance)) <= 10);
        }
    }

    #[test]
    fn reindex_is_idempotent(steps in prop::collection::vec(step(), 1..20), seed in any::<u64>()) {
        let config = BoardConfig::default();
        let mut rng = GameRng::new(seed);
        let mut board = starting_board();
        for step in &steps {
            apply(&mut board, &config, &mut rng, step);
        }

        let once = zones::reindexed(board);
        let twice = zones::reindexed(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn shuffle_is_a_permutation(size in 0..30usize, seed in any::<u64>()) {
        let mut board = Board::new();
        for i in 0..size {
            board.add_card(CardId::new(format!("c{i}")), PlayerSide::P1, CardRegion::Library);
        }
        let mut before = board.region_card_ids(PlayerSide::P1, CardRegion::Library);

        zones::shuffle(&mut board, PlayerSide::P1, CardRegion::Library, &mut GameRng::new(seed));

        let mut after = board.region_card_ids(PlayerSide::P1, CardRegion::Library);
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }
}

/// Every ordering of three cards appears about equally often.
#[test]
fn test_shuffle_uniformity() {
    const TRIALS: usize = 6000;
    let mut rng = GameRng::new(2024);
    let mut board = Board::new();
    for name in ["a", "b", "c"] {
        board.add_card(CardId::new(name), PlayerSide::P2, CardRegion::Library);
    }

    let mut counts: FxHashMap<Vec<String>, usize> = FxHashMap::default();
    for _ in 0..TRIALS {
        zones::shuffle(&mut board, PlayerSide::P2, CardRegion::Library, &mut rng);
        let order: Vec<String> = board
            .region_cards(PlayerSide::P2, CardRegion::Library)
            .iter()
            .map(|c| c.card_id.to_string())
            .collect();
        *counts.entry(order).or_default() += 1;
    }

    assert_eq!(counts.len(), 6);
    let expected = TRIALS / 6;
    for (order, count) in &counts {
        // ~6 standard deviations for p = 1/6, n = 6000
        assert!(
            count.abs_diff(expected) < 175,
            "ordering {order:?} drawn {count} times, expected about {expected}"
        );
    }
}
