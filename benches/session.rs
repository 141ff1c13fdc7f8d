//! Session Benchmarks
//!
//! Move generation and full random playouts through the session controller.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_chess_session::engine::{Board, RulesEngine, StandardRules};
use rust_chess_session::selector::{MoveSelector, RandomSelector};
use rust_chess_session::session::{Mode, SessionController};

fn bench_legal_moves_starting(c: &mut Criterion) {
    let rules = StandardRules::new();
    let board = rules.initial_position();

    c.bench_function("legal_moves_starting_position", |b| {
        b.iter(|| black_box(rules.legal_moves(&board, None)))
    });
}

fn bench_legal_moves_middlegame(c: &mut Criterion) {
    let rules = StandardRules::new();
    let board =
        Board::from_fen("r1bq1rk1/pp2bppp/2n1pn2/3p4/2PP4/2N1PN2/PP2BPPP/R2QKB1R w KQ - 2 8")
            .expect("valid FEN");

    c.bench_function("legal_moves_middlegame", |b| {
        b.iter(|| black_box(rules.legal_moves(&board, None)))
    });
}

fn bench_terminal_status(c: &mut Criterion) {
    let rules = StandardRules::new();
    let board = rules.initial_position();

    c.bench_function("terminal_status_starting", |b| {
        b.iter(|| black_box(rules.terminal_status(&board)))
    });
}

// Random human moves against the random bot until the game ends or 200 plies.
fn bench_random_playout(c: &mut Criterion) {
    c.bench_function("random_playout_vs_bot", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            let mut game = SessionController::new(StandardRules::new(), RandomSelector::seeded(seed))
                .with_mode(Mode::Bot);
            let mut human = RandomSelector::seeded(seed.wrapping_mul(31));
            while !game.session().is_game_over() && game.session().history().len() < 200 {
                if game.request_bot_move().is_some() {
                    continue;
                }
                let legal = game.rules().legal_moves(game.session().position(), None);
                let Some(mv) = human.select(&legal) else {
                    break;
                };
                match mv.promotion {
                    Some(kind) => game.submit_move_with_promotion(mv.from, mv.to, kind),
                    None => game.submit_move(mv.from, mv.to),
                };
            }
            black_box(game.session().history().len())
        })
    });
}

criterion_group!(
    benches,
    bench_legal_moves_starting,
    bench_legal_moves_middlegame,
    bench_terminal_status,
    bench_random_playout,
);
criterion_main!(benches);
