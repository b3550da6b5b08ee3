//! Benchmarks for board snapshots: clone, reindex, JSON encoding.
//!
//! Run with: `cargo bench --bench snapshot`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sakura_table::zones::{place_tokens, reindex};
use sakura_table::{Board, CardId, CardRegion, PlayerSide, TokenPool, TokenRegion};

/// A mid-game board: full decks, tokens in every pool.
fn populated_board(cards_per_side: usize) -> Board {
    let mut board = Board::new();
    for side in PlayerSide::ALL {
        for i in 0..cards_per_side {
            let region = match i % 4 {
                0 => CardRegion::Library,
                1 => CardRegion::Hand,
                2 => CardRegion::Used,
                _ => CardRegion::HiddenUsed,
            };
            board.add_card(CardId::new(format!("card-{i}")), side, region);
        }
        place_tokens(&mut board, TokenPool::new(side, TokenRegion::Aura), 3);
        place_tokens(&mut board, TokenPool::new(side, TokenRegion::Life), 10);
    }
    place_tokens(&mut board, TokenPool::shared(TokenRegion::Distance), 10);
    reindex(&mut board);
    board
}

fn benchmark_clone(c: &mut Criterion) {
    let mut group = c.benchmark_group("Snapshot");

    for cards in [10, 40, 160] {
        let board = populated_board(cards);
        group.bench_with_input(BenchmarkId::new("clone", cards), &board, |b, board| {
            b.iter(|| black_box(board.clone()));
        });
        group.bench_with_input(BenchmarkId::new("reindex", cards), &board, |b, board| {
            b.iter(|| {
                let mut copy = board.clone();
                reindex(&mut copy);
                black_box(copy)
            });
        });
        group.bench_with_input(BenchmarkId::new("to_json", cards), &board, |b, board| {
            b.iter(|| black_box(serde_json::to_string(board)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_clone);
criterion_main!(benches);
