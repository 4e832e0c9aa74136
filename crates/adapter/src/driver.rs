//! Browser-game driver.
//!
//! Implements [`GameDriver`] by evaluating small scripts in the game's page.
//! Query results may come back as JSON values or as JSON-encoded strings
//! (what `JSON.stringify` produces); both are accepted.

use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use threes_bridge_core::{DriverError, GameDriver, RawSnapshot};
use threes_bridge_types::{
    FaceGrid, KeyAction, Move, BOARD_CELLS, BOARD_SIDE, KEY_CONFIRM, KEY_HOLD_MS, KEY_RESTART,
};
use tracing::{debug, info};

use crate::transport::Transport;

pub const STATUS_SCRIPT: &str = "Session.get('lost');";
pub const BOARD_SCRIPT: &str = "JSON.stringify(Session.get('tiles'));";
pub const DECK_SCRIPT: &str = "JSON.stringify(Session.get('current_deck'));";
pub const NEXT_TILE_SCRIPT: &str = "Session.get('next_tile');";
pub const CONTINUE_SCRIPT: &str = "var b = document.querySelector('.keep-playing-button'); if (b) { b.click(); }";

/// Script that hands a move straight to the game's move handler.
pub fn move_script(mv: Move) -> String {
    format!("document.THREE.game.move({{which: {}}});", mv.key_code())
}

/// Script that dispatches a synthetic key event on the page body.
pub fn key_event_script(action: KeyAction, key: u16) -> String {
    format!(
        "var e = document.createEvent('Events'); e.initEvent('{action}', true, true); \
         e.keyCode = {key}; e.which = {key}; (document.body || document).dispatchEvent(e);",
        action = action.as_str(),
        key = key,
    )
}

/// [`GameDriver`] over any script [`Transport`].
#[derive(Debug)]
pub struct WebGameDriver<T> {
    transport: T,
    key_hold: Duration,
}

impl<T: Transport> WebGameDriver<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            key_hold: Duration::from_millis(KEY_HOLD_MS),
        }
    }

    /// Delay between a synthetic key down and its key up.
    pub fn with_key_hold(mut self, key_hold: Duration) -> Self {
        self.key_hold = key_hold;
        self
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn eval(&mut self, script: &str) -> Result<Value, DriverError> {
        self.transport
            .execute(script)
            .map_err(|e| DriverError::Transport(e.to_string()))
    }

    /// Inputs that change the game must not be replayed on a retry.
    fn send_input(&mut self, script: &str) -> Result<(), DriverError> {
        self.transport
            .execute_once(script)
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        Ok(())
    }

    fn query<V: DeserializeOwned>(&mut self, query: &'static str, script: &str) -> Result<V, DriverError> {
        let value = self.eval(script)?;
        decode(query, value)
    }

    fn press(&mut self, key: u16) -> Result<(), DriverError> {
        self.send_input(&key_event_script(KeyAction::Down, key))?;
        if !self.key_hold.is_zero() {
            thread::sleep(self.key_hold);
        }
        self.send_input(&key_event_script(KeyAction::Up, key))
    }
}

impl<T: Transport> GameDriver for WebGameDriver<T> {
    fn is_terminated(&mut self) -> Result<bool, DriverError> {
        // `lost` is unset until the first game ends.
        let lost: Option<bool> = self.query("status", STATUS_SCRIPT)?;
        Ok(lost.unwrap_or(false))
    }

    fn snapshot(&mut self) -> Result<RawSnapshot, DriverError> {
        let tiles: Value = self.query("board", BOARD_SCRIPT)?;
        let board = parse_board(&tiles).map_err(|detail| DriverError::Malformed {
            query: "board",
            detail,
        })?;
        let deck: Option<Vec<u32>> = self.query("deck", DECK_SCRIPT)?;
        let next_tile: u32 = self.query("next_tile", NEXT_TILE_SCRIPT)?;
        Ok(RawSnapshot {
            board,
            deck,
            next_tile,
        })
    }

    fn execute_move(&mut self, mv: Move) -> Result<(), DriverError> {
        self.send_input(&move_script(mv))
    }

    fn restart(&mut self) -> Result<(), DriverError> {
        self.press(KEY_RESTART)?;
        self.press(KEY_CONFIRM)?;
        info!("game restarted");
        Ok(())
    }

    fn continue_after_win(&mut self) -> Result<(), DriverError> {
        self.eval(CONTINUE_SCRIPT)?;
        Ok(())
    }
}

/// Deserialize `value`, unwrapping one level of JSON-in-a-string.
fn decode<V: DeserializeOwned>(query: &'static str, value: Value) -> Result<V, DriverError> {
    let malformed = |detail: String| DriverError::Malformed { query, detail };
    let value = match value {
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(inner) => inner,
            Err(_) => Value::String(s),
        },
        other => other,
    };
    serde_json::from_value(value.clone()).map_err(|e| malformed(format!("{e}: {value}")))
}

/// Accepts a 4x4 nested array or a flat array of 16 cells.
fn parse_board(value: &Value) -> Result<FaceGrid, String> {
    let cells: Vec<u32> = match value {
        Value::Array(rows) if rows.len() == BOARD_SIDE && rows.iter().all(Value::is_array) => {
            let mut cells = Vec::with_capacity(BOARD_CELLS);
            for row in rows {
                let row: Vec<u32> = serde_json::from_value(row.clone()).map_err(|e| e.to_string())?;
                if row.len() != BOARD_SIDE {
                    return Err(format!("row of {} cells", row.len()));
                }
                cells.extend(row);
            }
            cells
        }
        Value::Array(_) => serde_json::from_value(value.clone()).map_err(|e| e.to_string())?,
        other => return Err(format!("expected an array, got {other}")),
    };
    if cells.len() != BOARD_CELLS {
        return Err(format!("expected {BOARD_CELLS} cells, got {}", cells.len()));
    }

    let mut board = FaceGrid::default();
    for (i, face) in cells.into_iter().enumerate() {
        board[i / BOARD_SIDE][i % BOARD_SIDE] = face;
    }
    debug!(?board, "board read");
    Ok(board)
}
