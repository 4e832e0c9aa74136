//! Native oracle - the search engine shipped as a shared library
//!
//! The engine exports a small C ABI:
//!
//! ```text
//! void  init_tables(void);
//! float score_toplevel_move(uint64_t board, uint32_t deck, uint16_t tileset, int move);
//! int   find_best_move(uint64_t board, uint32_t deck, uint16_t tileset);   // optional
//! void  set_heurweights(float *weights, int len);                          // optional
//! ```
//!
//! `init_tables` fills read-only lookup tables; after it returns, scoring
//! calls share no mutable state and may run concurrently.

use std::ffi::c_int;
use std::path::{Path, PathBuf};

use libloading::Library;
use threes_bridge_core::EncodedState;
use threes_bridge_types::Move;
use tracing::{debug, info};

use crate::error::OracleError;
use crate::oracle::Oracle;

type InitTablesFn = unsafe extern "C" fn();
type ScoreMoveFn = unsafe extern "C" fn(u64, u32, u16, c_int) -> f32;
type FindBestMoveFn = unsafe extern "C" fn(u64, u32, u16) -> c_int;
type SetWeightsFn = unsafe extern "C" fn(*const f32, c_int);

/// Number of heuristic weights accepted by `set_heurweights`.
pub const HEURISTIC_WEIGHTS: usize = 7;

/// File names tried by [`NativeOracle::discover`], in order.
pub const LIBRARY_NAMES: [&str; 3] = ["threes.so", "threes.dll", "threes.dylib"];

/// Handle to a loaded engine library.
pub struct NativeOracle {
    path: PathBuf,
    init_tables: InitTablesFn,
    score_move: ScoreMoveFn,
    find_best_move: Option<FindBestMoveFn>,
    set_weights: Option<SetWeightsFn>,
    // Declared last: dropped after the function pointers above.
    _library: Library,
}

impl std::fmt::Debug for NativeOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeOracle")
            .field("path", &self.path)
            .field("find_best_move", &self.find_best_move.is_some())
            .field("set_weights", &self.set_weights.is_some())
            .finish()
    }
}

impl NativeOracle {
    /// Load the library at `path` and initialize its tables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OracleError> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| OracleError::Unavailable {
            path: path.display().to_string(),
            reason,
        };

        // SAFETY: loading runs the library's initializers; the engine has none
        // beyond static zero-initialized tables.
        let library = unsafe { Library::new(&path) }.map_err(|e| unavailable(e.to_string()))?;

        // SAFETY: the signatures match the engine's exported C ABI above, and
        // the pointers are only used while `library` is alive (it is stored
        // alongside them).
        let (init_tables, score_move, find_best_move, set_weights) = unsafe {
            let init = *library
                .get::<InitTablesFn>(b"init_tables\0")
                .map_err(|e| unavailable(e.to_string()))?;
            let score = *library
                .get::<ScoreMoveFn>(b"score_toplevel_move\0")
                .map_err(|e| unavailable(e.to_string()))?;
            let find = library.get::<FindBestMoveFn>(b"find_best_move\0").ok().map(|s| *s);
            let weights = library.get::<SetWeightsFn>(b"set_heurweights\0").ok().map(|s| *s);
            (init, score, find, weights)
        };

        // SAFETY: takes no arguments and must run once before any scoring.
        unsafe { init_tables() };
        info!(path = %path.display(), "oracle tables initialized");

        Ok(Self {
            path,
            init_tables,
            score_move,
            find_best_move,
            set_weights,
            _library: library,
        })
    }

    /// Look for the engine in `dir` under each of [`LIBRARY_NAMES`].
    ///
    /// If `dir` is itself a file it is loaded directly.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self, OracleError> {
        let dir = dir.as_ref();
        if dir.is_file() {
            return Self::load(dir);
        }
        for name in LIBRARY_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found oracle library");
                return Self::load(candidate);
            }
        }
        Err(OracleError::Unavailable {
            path: dir.display().to_string(),
            reason: format!("none of {} found; build the engine first", LIBRARY_NAMES.join(", ")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the library exports its own best-move entry point.
    pub fn has_best_move_entry(&self) -> bool {
        self.find_best_move.is_some()
    }

    /// Replace the heuristic weights and rebuild the tables.
    ///
    /// Requires exclusive access: tables are rewritten in place.
    pub fn set_heuristic_weights(&mut self, weights: &[f32]) -> Result<(), OracleError> {
        if weights.len() != HEURISTIC_WEIGHTS {
            return Err(OracleError::InvalidWeights {
                expected: HEURISTIC_WEIGHTS,
                got: weights.len(),
            });
        }
        let Some(set_weights) = self.set_weights else {
            return Err(OracleError::Unavailable {
                path: self.path.display().to_string(),
                reason: "library does not export set_heurweights".to_string(),
            });
        };
        // SAFETY: pointer and length describe a live slice of exactly the
        // length the engine checks for; `&mut self` rules out concurrent scoring.
        unsafe {
            set_weights(weights.as_ptr(), weights.len() as c_int);
            (self.init_tables)();
        }
        info!(?weights, "oracle heuristic weights updated");
        Ok(())
    }
}

impl Oracle for NativeOracle {
    fn score(&self, state: &EncodedState, mv: Move) -> f32 {
        // SAFETY: tables were initialized in `load`; the call only reads them.
        unsafe { (self.score_move)(state.board, state.deck, state.tileset, mv.ordinal() as c_int) }
    }

    fn best_move(&self, state: &EncodedState) -> Option<Move> {
        match self.find_best_move {
            Some(find) => {
                // SAFETY: as for `score`.
                let ordinal = unsafe { find(state.board, state.deck, state.tileset) };
                Move::from_ordinal(ordinal)
            }
            None => crate::orchestrator::select_best(&Move::ALL.map(|mv| self.score(state, mv))),
        }
    }
}
