//! Batch play - run N games back to back and record one CSV row per game.

use std::io::Write;

use threes_bridge_core::{board_score, max_rank, normalize_grid, GameDriver};
use threes_bridge_types::RankGrid;
use tracing::{info, warn};

use crate::autoplay::{AutoPlayConfig, AutoPlayer, GameOverReason};
use crate::error::{AutoPlayError, BatchError};
use crate::orchestrator::Orchestrator;

/// First line of the results file.
pub const BATCH_HEADER: &str = "move, score, max rank";

/// Outcome of one finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRecord {
    /// 0-based game index within the batch.
    pub game: usize,
    pub moves: u64,
    pub score: u64,
    pub max_rank: u8,
    pub reason: GameOverReason,
}

impl GameRecord {
    fn from_grid(game: usize, moves: u64, reason: GameOverReason, grid: Option<&RankGrid>) -> Self {
        Self {
            game,
            moves,
            score: grid.map_or(0, board_score),
            max_rank: grid.map_or(0, max_rank),
            reason,
        }
    }

    pub fn csv_row(&self) -> String {
        format!("{}, {}, {}", self.moves, self.score, self.max_rank)
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub games: usize,
    pub autoplay: AutoPlayConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            games: 1,
            autoplay: AutoPlayConfig::default(),
        }
    }
}

/// Play `config.games` games on `driver`, writing the header and one row per
/// game to `out` as each game finishes.
///
/// The instance is restarted before every game except the first.
pub fn run_batch<D, W>(
    driver: &mut D,
    orchestrator: &Orchestrator,
    config: &BatchConfig,
    out: &mut W,
) -> Result<Vec<GameRecord>, BatchError>
where
    D: GameDriver,
    W: Write,
{
    writeln!(out, "{BATCH_HEADER}")?;

    let mut player = AutoPlayer::new(driver, orchestrator, config.autoplay.clone());
    let mut records = Vec::with_capacity(config.games);

    for game in 0..config.games {
        if game > 0 {
            player
                .driver_mut()
                .restart()
                .map_err(|e| BatchError::Game {
                    game,
                    source: AutoPlayError::from(e),
                })?;
            player.reset();
        }

        let over = player.run().map_err(|source| BatchError::Game { game, source })?;
        let grid = final_grid(player.driver_mut()).or(over.last_grid);
        let record = GameRecord::from_grid(game, over.moves, over.reason, grid.as_ref());

        info!(
            game,
            moves = record.moves,
            score = record.score,
            max_rank = record.max_rank,
            reason = record.reason.as_str(),
            "game finished"
        );
        writeln!(out, "{}", record.csv_row())?;
        out.flush()?;
        records.push(record);
    }

    Ok(records)
}

/// Board after the last move settled; `None` if it cannot be read.
fn final_grid<D: GameDriver>(driver: &mut D) -> Option<RankGrid> {
    match driver.snapshot() {
        Ok(raw) => match normalize_grid(&raw.board) {
            Ok(grid) => Some(grid),
            Err(e) => {
                warn!(error = %e, "final board could not be normalized");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "final board could not be read");
            None
        }
    }
}
