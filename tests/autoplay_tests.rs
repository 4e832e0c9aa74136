//! Automation loop tests against an in-process fake game

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use threes_bridge::core::{DriverError, EncodedState, GameDriver, RawSnapshot};
use threes_bridge::engine::{
    run_batch, AutoPlayConfig, AutoPlayer, BatchConfig, Decision, GameOverReason, Oracle,
    Orchestrator, OrchestratorConfig, Step, BATCH_HEADER,
};
use threes_bridge::types::{FaceGrid, Move};

/// Scripted game: a fixed board, a queue of upcoming tiles, and a move
/// budget after which it reports itself lost.
struct FakeGame {
    board: FaceGrid,
    deck: Option<Vec<u32>>,
    next_tiles: Vec<u32>,
    moves_until_lost: usize,
    moves: Vec<Move>,
    polls: usize,
    restarts: usize,
    continues: usize,
}

impl FakeGame {
    fn new(moves_until_lost: usize) -> Self {
        Self {
            board: [[1, 2, 3, 0], [0, 6, 0, 0], [0, 0, 12, 0], [0, 0, 0, 48]],
            deck: None,
            next_tiles: vec![1],
            moves_until_lost,
            moves: Vec::new(),
            polls: 0,
            restarts: 0,
            continues: 0,
        }
    }

    fn played_this_game(&self) -> usize {
        self.moves.len()
    }
}

impl GameDriver for FakeGame {
    fn is_terminated(&mut self) -> Result<bool, DriverError> {
        self.polls += 1;
        Ok(self.played_this_game() >= self.moves_until_lost)
    }

    fn snapshot(&mut self) -> Result<RawSnapshot, DriverError> {
        let next_tile = self.next_tiles[self.moves.len() % self.next_tiles.len()];
        Ok(RawSnapshot {
            board: self.board,
            deck: self.deck.clone(),
            next_tile,
        })
    }

    fn execute_move(&mut self, mv: Move) -> Result<(), DriverError> {
        self.moves.push(mv);
        Ok(())
    }

    fn restart(&mut self) -> Result<(), DriverError> {
        self.restarts += 1;
        self.moves.clear();
        Ok(())
    }

    fn continue_after_win(&mut self) -> Result<(), DriverError> {
        self.continues += 1;
        Ok(())
    }
}

struct Counting {
    scores: [f32; 4],
    calls: AtomicUsize,
}

impl Oracle for Counting {
    fn score(&self, _: &EncodedState, mv: Move) -> f32 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scores[mv.ordinal()]
    }
}

fn counting(scores: [f32; 4]) -> Arc<Counting> {
    Arc::new(Counting {
        scores,
        calls: AtomicUsize::new(0),
    })
}

fn fast() -> AutoPlayConfig {
    AutoPlayConfig {
        settle: Duration::ZERO,
        ..AutoPlayConfig::default()
    }
}

#[test]
fn test_one_step_issues_exactly_the_chosen_move() {
    let oracle = counting([1.0, 2.0, 5.0, 3.0]);
    let orch = Orchestrator::new(oracle.clone(), OrchestratorConfig::default()).unwrap();
    let mut game = FakeGame::new(usize::MAX);

    let step = AutoPlayer::new(&mut game, &orch, fast()).step().unwrap();
    let Step::Continue(record) = step else {
        panic!("expected a move, got {step:?}");
    };

    assert_eq!(game.moves, vec![Move::Left]);
    assert_eq!(record.mv, Move::Left);
    assert_eq!(record.move_no, 1);
    assert_eq!(orch.select_best_move(&record.state), Decision::Play(record.mv));
    assert_eq!(record.state.tileset, 0b10);
    assert_eq!(game.polls, 1);
    assert_eq!(game.continues, 1);
}

#[test]
fn test_terminated_on_first_poll_scores_nothing() {
    let oracle = counting([1.0; 4]);
    let orch = Orchestrator::new(oracle.clone(), OrchestratorConfig::default()).unwrap();
    let mut game = FakeGame::new(0);

    let mut player = AutoPlayer::new(&mut game, &orch, fast());
    let over = player.run().unwrap();

    assert_eq!(over.reason, GameOverReason::Terminated);
    assert_eq!(over.moves, 0);
    assert_eq!(over.last_grid, None);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    drop(player);
    assert!(game.moves.is_empty());
}

#[test]
fn test_loop_returns_to_polling_after_each_move() {
    let oracle = counting([0.5, 0.0, 0.0, 0.0]);
    let orch = Orchestrator::sequential(oracle);
    let mut game = FakeGame::new(3);

    let over = AutoPlayer::new(&mut game, &orch, fast()).run().unwrap();
    assert_eq!(over.reason, GameOverReason::Terminated);
    assert_eq!(over.moves, 3);
    // One poll per move plus the one that saw the loss.
    assert_eq!(game.polls, 4);
    assert_eq!(game.moves, vec![Move::Up; 3]);
}

#[test]
fn test_observed_deck_feeds_the_encoding() {
    let orch = Orchestrator::sequential(counting([1.0; 4]));
    let mut game = FakeGame::new(usize::MAX);
    game.deck = Some(vec![1, 2, 2, 3, 3, 3]);
    game.next_tiles = vec![2];

    let step = AutoPlayer::new(&mut game, &orch, fast()).step().unwrap();
    let Step::Continue(record) = step else {
        panic!("expected a move, got {step:?}");
    };
    // One 1, three 2s (two observed + the upcoming one), three 3s; max rank 7 (48).
    assert_eq!(record.state.deck, 0x0703_0301);
    assert_eq!(record.state.tileset, 0b100);
}

#[test]
fn test_keep_playing_can_be_disabled() {
    let orch = Orchestrator::sequential(counting([1.0; 4]));
    let mut game = FakeGame::new(1);
    let config = AutoPlayConfig {
        keep_playing: false,
        ..fast()
    };
    AutoPlayer::new(&mut game, &orch, config).run().unwrap();
    assert_eq!(game.continues, 0);
}

#[test]
fn test_unknown_tile_value_aborts_the_run() {
    let orch = Orchestrator::sequential(counting([1.0; 4]));
    let mut game = FakeGame::new(usize::MAX);
    game.board[0][0] = 5;

    let err = AutoPlayer::new(&mut game, &orch, fast()).run().unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_TILE_VALUE");
    assert!(game.moves.is_empty());
}

#[test]
fn test_batch_writes_header_and_one_row_per_game() {
    let orch = Orchestrator::sequential(counting([0.0, 0.0, 1.0, 0.0]));
    let mut game = FakeGame::new(2);
    let config = BatchConfig {
        games: 3,
        autoplay: fast(),
    };

    let mut out = Vec::new();
    let records = run_batch(&mut game, &orch, &config, &mut out).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(game.restarts, 2);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], BATCH_HEADER);
    assert_eq!(lines.len(), 4);
    // 3 + 6 + 12 + 48 on the board: 3 + 9 + 27 + 243.
    for line in &lines[1..] {
        assert_eq!(*line, "2, 282, 7");
    }
}
