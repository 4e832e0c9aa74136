//! Protocol module - JSON message types for the live-instance link
//!
//! Line-delimited JSON. Every message has: type, seq (sequence number),
//! ts (timestamp in ms).

use serde::{Deserialize, Serialize};

/// Protocol version sent in `hello`.
pub const PROTOCOL_VERSION: &str = "1.0.0";

// ============== Client -> Instance Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    Hello,
}

impl Default for HelloType {
    fn default() -> Self {
        Self::Hello
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalType {
    #[serde(rename = "eval")]
    Eval,
}

impl Default for EvalType {
    fn default() -> Self {
        Self::Eval
    }
}

/// Client hello message (first message on every connection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Script evaluation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: EvalType,
    pub seq: u64,
    pub ts: u64,
    pub script: String,
}

// ============== Instance -> Client Messages ==============

/// Welcome message (response to hello)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeMessage {
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
}

/// Result of an `eval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub seq: u64,
    pub ts: u64,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// The instance could not evaluate a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub seq: u64,
    pub ts: u64,
    pub code: String,
    pub message: String,
}

/// Any message the instance may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InstanceMessage {
    Welcome(WelcomeMessage),
    Result(ResultMessage),
    Error(ErrorMessage),
}

impl InstanceMessage {
    pub fn seq(&self) -> u64 {
        match self {
            InstanceMessage::Welcome(m) => m.seq,
            InstanceMessage::Result(m) => m.seq,
            InstanceMessage::Error(m) => m.seq,
        }
    }
}

// ============== Helpers ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, client_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: client_version.to_string(),
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
    }
}

/// Create an eval request
pub fn create_eval(seq: u64, script: &str) -> EvalMessage {
    EvalMessage {
        msg_type: EvalType::Eval,
        seq,
        ts: current_timestamp_ms(),
        script: script.to_string(),
    }
}

/// Parse one line received from the instance
pub fn parse_message(line: &str) -> Result<InstanceMessage, serde_json::Error> {
    serde_json::from_str(line.trim())
}

/// Get current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
