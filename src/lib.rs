//! Threes bridge (workspace facade crate).
//!
//! One import path for everything under `crates/`: `threes_bridge::{types, core, engine, adapter}`.

pub use threes_bridge_adapter as adapter;
pub use threes_bridge_core as core;
pub use threes_bridge_engine as engine;
pub use threes_bridge_types as types;
