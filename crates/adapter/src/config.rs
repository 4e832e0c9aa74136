//! Transport configuration from the environment.

use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::transport::TransportError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9222;
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 100;

/// Where the live instance listens and how hard to try reaching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout (connect, handshake, or eval round trip).
    pub timeout: Duration,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Base delay between attempts; doubles on each retry.
    pub backoff: Duration,
    pub client_name: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retries: DEFAULT_RETRIES,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            client_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl TransportConfig {
    /// Create from `THREES_BRIDGE_*` environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("THREES_BRIDGE_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = env::var("THREES_BRIDGE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let timeout = env::var("THREES_BRIDGE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);
        let retries = env::var("THREES_BRIDGE_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.retries);
        let backoff = env::var("THREES_BRIDGE_BACKOFF_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.backoff);

        Self {
            host,
            port,
            timeout,
            retries,
            backoff,
            client_name: defaults.client_name,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, TransportError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Address(format!("{}:{}: {e}", self.host, self.port)))?
            .next()
            .ok_or_else(|| TransportError::Address(format!("{}:{}", self.host, self.port)))
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}
