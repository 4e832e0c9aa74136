//! Adapter module - driving a live game instance over TCP
//!
//! The live instance (a browser page hosting the game, fronted by a small
//! relay) evaluates scripts on request. This crate speaks to it and turns
//! those scripts into the [`GameDriver`](threes_bridge_core::GameDriver)
//! capability the automation loop needs.
//!
//! # Protocol Overview
//!
//! **Line-delimited JSON** over TCP:
//!
//! 1. **Connection**: client connects (default: 127.0.0.1:9222)
//! 2. **Handshake**: client sends `hello`, instance responds with `welcome`
//! 3. **Evaluation**: client sends `eval` with a script; instance answers
//!    `result` with the script's value, or `error`
//!
//! Responses echo the request's `seq`; anything else on the line is stale
//! and skipped.
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Instance: {"type":"hello","seq":1,"ts":1234567890,"client":{"name":"threes-bridge","version":"0.1.0"},"protocol_version":"1.0.0"}
//! Instance -> Client: {"type":"welcome","seq":1,"ts":1234567890,"protocol_version":"1.0.0"}
//! Client -> Instance: {"type":"eval","seq":2,"ts":1234567891,"script":"Session.get('lost');"}
//! Instance -> Client: {"type":"result","seq":2,"ts":1234567891,"value":false}
//! ```
//!
//! # Environment Variables
//!
//! - `THREES_BRIDGE_HOST`: instance address (default: "127.0.0.1")
//! - `THREES_BRIDGE_PORT`: port number (default: 9222)
//! - `THREES_BRIDGE_TIMEOUT_MS`: per-request timeout (default: 2000)
//! - `THREES_BRIDGE_RETRIES`: retries after a failed request (default: 3)
//! - `THREES_BRIDGE_BACKOFF_MS`: first retry delay, doubled each time (default: 100)
//!
//! # Modules
//!
//! - [`protocol`]: message structures
//! - [`config`]: [`TransportConfig`] and its environment loading
//! - [`transport`]: the [`Transport`] trait and [`TcpTransport`]
//! - [`driver`]: [`WebGameDriver`], the page scripts behind each driver call

pub mod config;
pub mod driver;
pub mod protocol;
pub mod transport;

pub use threes_bridge_core as core;
pub use threes_bridge_types as types;

pub use config::TransportConfig;
pub use driver::WebGameDriver;
pub use transport::{TcpTransport, Transport, TransportError};
