//! TCP transport to the live instance.
//!
//! Bridges the synchronous game loop with async networking: the transport
//! owns a private single-threaded tokio runtime and every [`Transport::execute`]
//! call blocks on one request/response round trip.
//!
//! Requests and responses are paired by `seq`. A response carrying any other
//! `seq` is a leftover from an earlier request that timed out and is skipped.
//! A failed round trip drops the connection; the next attempt reconnects and
//! repeats the handshake.
//!
//! Queries go through [`Transport::execute`], which may send a request again
//! after a timeout. Inputs that change the game go through
//! [`Transport::execute_once`]: once an eval has been written to the instance
//! it is never sent a second time.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use crate::config::TransportConfig;
use crate::protocol::{
    create_eval, create_hello, parse_message, InstanceMessage, PROTOCOL_VERSION,
};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid instance address {0}")]
    Address(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("connection closed by instance")]
    Closed,

    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The instance answered with an `error` message.
    #[error("instance error {code}: {message}")]
    Remote { code: String, message: String },
}

impl TransportError {
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Address(_) => "TRANSPORT_ADDRESS",
            TransportError::Io(_) => "TRANSPORT_IO",
            TransportError::Timeout(_) => "TRANSPORT_TIMEOUT",
            TransportError::Closed => "TRANSPORT_CLOSED",
            TransportError::Protocol(_) => "TRANSPORT_PROTOCOL",
            TransportError::Remote { .. } => "TRANSPORT_REMOTE",
        }
    }

    /// Whether retrying over a fresh connection may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::Io(_)
            | TransportError::Timeout(_)
            | TransportError::Closed
            | TransportError::Protocol(_) => true,
            TransportError::Address(_) | TransportError::Remote { .. } => false,
        }
    }

    /// Whether the connection is unusable after this error.
    fn breaks_connection(&self) -> bool {
        !matches!(self, TransportError::Remote { .. })
    }
}

/// Blocking script execution against the live instance.
pub trait Transport {
    /// Evaluate a side-effect free `script` and return its JSON value.
    ///
    /// The request may reach the instance more than once.
    fn execute(&mut self, script: &str) -> Result<serde_json::Value, TransportError>;

    /// Evaluate `script` at most once.
    ///
    /// Failures before the request is written may still be retried; after
    /// that the error is returned as is.
    fn execute_once(&mut self, script: &str) -> Result<serde_json::Value, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn execute(&mut self, script: &str) -> Result<serde_json::Value, TransportError> {
        (**self).execute(script)
    }

    fn execute_once(&mut self, script: &str) -> Result<serde_json::Value, TransportError> {
        (**self).execute_once(script)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&mut self, script: &str) -> Result<serde_json::Value, TransportError> {
        (**self).execute(script)
    }

    fn execute_once(&mut self, script: &str) -> Result<serde_json::Value, TransportError> {
        (**self).execute_once(script)
    }
}

/// A failed round trip and whether the eval had already been written.
struct Attempt {
    error: TransportError,
    delivered: bool,
}

impl Attempt {
    fn undelivered(error: TransportError) -> Self {
        Self {
            error,
            delivered: false,
        }
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl Connection {
    async fn open(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = TcpStream::connect(addr).await?;
        socket.set_nodelay(true)?;
        let (reader, writer) = socket.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            line: String::new(),
        })
    }

    async fn send<M: Serialize>(&mut self, msg: &M) -> Result<(), TransportError> {
        let mut line =
            serde_json::to_string(msg).map_err(|e| TransportError::Protocol(e.to_string()))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read until the response for `seq` arrives.
    async fn recv(&mut self, seq: u64) -> Result<InstanceMessage, TransportError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line).await? == 0 {
                return Err(TransportError::Closed);
            }
            if self.line.trim().is_empty() {
                continue;
            }
            let msg = parse_message(&self.line)
                .map_err(|e| TransportError::Protocol(format!("{e}: {}", self.line.trim())))?;
            if msg.seq() == seq {
                return Ok(msg);
            }
            debug!(expected = seq, got = msg.seq(), "skipping stale response");
        }
    }
}

/// Line-JSON transport over TCP.
pub struct TcpTransport {
    config: TransportConfig,
    runtime: Runtime,
    conn: Option<Connection>,
    seq: u64,
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("config", &self.config)
            .field("connected", &self.conn.is_some())
            .field("seq", &self.seq)
            .finish()
    }
}

impl TcpTransport {
    /// Create a transport; the first request connects lazily.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            config,
            runtime,
            conn: None,
            seq: 0,
        })
    }

    /// Create a transport and handshake right away.
    pub fn connect(config: TransportConfig) -> Result<Self, TransportError> {
        let mut transport = Self::new(config)?;
        transport.ensure_connected()?;
        Ok(transport)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn ensure_connected(&mut self) -> Result<(), TransportError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let addr = self.config.socket_addr()?;
        let hello = create_hello(
            self.next_seq(),
            &self.config.client_name,
            env!("CARGO_PKG_VERSION"),
        );
        let timeout = self.config.timeout;

        let conn = self.runtime.block_on(async {
            tokio::time::timeout(timeout, async {
                let mut conn = Connection::open(addr).await?;
                conn.send(&hello).await?;
                match conn.recv(hello.seq).await? {
                    InstanceMessage::Welcome(w) if w.protocol_version == PROTOCOL_VERSION => {
                        Ok(conn)
                    }
                    InstanceMessage::Welcome(w) => Err(TransportError::Protocol(format!(
                        "instance speaks protocol {}, expected {PROTOCOL_VERSION}",
                        w.protocol_version
                    ))),
                    InstanceMessage::Error(e) => Err(TransportError::Remote {
                        code: e.code,
                        message: e.message,
                    }),
                    InstanceMessage::Result(_) => {
                        Err(TransportError::Protocol("expected welcome".to_string()))
                    }
                }
            })
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
        })?;

        info!(%addr, "connected to live instance");
        self.conn = Some(conn);
        Ok(())
    }

    fn try_execute(&mut self, script: &str) -> Result<serde_json::Value, Attempt> {
        self.ensure_connected().map_err(Attempt::undelivered)?;
        let request = create_eval(self.next_seq(), script);
        let timeout = self.config.timeout;
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| Attempt::undelivered(TransportError::Closed))?;

        let mut delivered = false;
        let outcome = self.runtime.block_on(async {
            tokio::time::timeout(timeout, async {
                conn.send(&request).await?;
                delivered = true;
                match conn.recv(request.seq).await? {
                    InstanceMessage::Result(r) => Ok(r.value),
                    InstanceMessage::Error(e) => Err(TransportError::Remote {
                        code: e.code,
                        message: e.message,
                    }),
                    InstanceMessage::Welcome(_) => {
                        Err(TransportError::Protocol("unexpected welcome".to_string()))
                    }
                }
            })
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
        });
        outcome.map_err(|error| Attempt { error, delivered })
    }

    fn run(&mut self, script: &str, resend: bool) -> Result<serde_json::Value, TransportError> {
        let mut attempt = 0;
        loop {
            let Attempt { error, delivered } = match self.try_execute(script) {
                Ok(value) => return Ok(value),
                Err(failed) => failed,
            };
            if error.breaks_connection() {
                self.conn = None;
            }
            if delivered && !resend {
                warn!(error = %error, "request reached the instance, not resending");
                return Err(error);
            }
            if !error.is_recoverable() || attempt >= self.config.retries {
                return Err(error);
            }
            attempt += 1;
            let delay = self.config.backoff_for(attempt);
            warn!(
                attempt,
                retries = self.config.retries,
                error = %error,
                ?delay,
                "request failed, retrying"
            );
            std::thread::sleep(delay);
        }
    }
}

impl Transport for TcpTransport {
    fn execute(&mut self, script: &str) -> Result<serde_json::Value, TransportError> {
        self.run(script, true)
    }

    fn execute_once(&mut self, script: &str) -> Result<serde_json::Value, TransportError> {
        self.run(script, false)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader as StdBufReader, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use serde_json::{json, Value};

    use super::*;

    enum Reply {
        Lines(Vec<Value>),
        Delayed(Duration, Vec<Value>),
        Hangup,
    }

    /// Blocking fake instance: answers hello with welcome and hands every
    /// eval to `respond(connection_no, seq, script)`. Connections are served
    /// one at a time.
    fn spawn_instance<F>(respond: F) -> (TransportConfig, Arc<AtomicUsize>)
    where
        F: Fn(usize, u64, &str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let evals = Arc::new(AtomicUsize::new(0));
        let counter = evals.clone();

        thread::spawn(move || {
            for conn_no in 0.. {
                let (socket, _) = listener.accept().unwrap();
                let mut writer = socket.try_clone().unwrap();
                let reader = StdBufReader::new(socket);
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    let msg: Value = serde_json::from_str(&line).unwrap();
                    let seq = msg["seq"].as_u64().unwrap();
                    let replies = match msg["type"].as_str().unwrap() {
                        "hello" => Reply::Lines(vec![json!({
                            "type": "welcome", "seq": seq, "ts": 0, "protocol_version": "1.0.0"
                        })]),
                        "eval" => {
                            counter.fetch_add(1, Ordering::SeqCst);
                            respond(conn_no, seq, msg["script"].as_str().unwrap())
                        }
                        other => panic!("unexpected message type {other}"),
                    };
                    match replies {
                        Reply::Lines(lines) => {
                            if lines.iter().any(|reply| writeln!(writer, "{reply}").is_err()) {
                                break;
                            }
                        }
                        Reply::Delayed(delay, lines) => {
                            thread::sleep(delay);
                            if lines.iter().any(|reply| writeln!(writer, "{reply}").is_err()) {
                                break;
                            }
                        }
                        Reply::Hangup => break,
                    }
                }
            }
        });

        let config = TransportConfig {
            port,
            backoff: Duration::from_millis(1),
            ..TransportConfig::default()
        };
        (config, evals)
    }

    fn result(seq: u64, value: Value) -> Value {
        json!({"type": "result", "seq": seq, "ts": 0, "value": value})
    }

    #[test]
    fn test_eval_round_trip_skips_stale_responses() {
        let (config, _) = spawn_instance(|_, seq, script| {
            Reply::Lines(vec![
                result(seq.saturating_sub(1), json!("stale")),
                result(seq, json!({"script": script})),
            ])
        });
        let mut transport = TcpTransport::connect(config).unwrap();
        assert!(transport.is_connected());
        let value = transport.execute("Session.get('lost')").unwrap();
        assert_eq!(value, json!({"script": "Session.get('lost')"}));
        let value = transport.execute("1 + 1").unwrap();
        assert_eq!(value, json!({"script": "1 + 1"}));
    }

    #[test]
    fn test_remote_error_is_not_retried() {
        let (config, evals) = spawn_instance(|_, seq, _| {
            Reply::Lines(vec![json!({
                "type": "error", "seq": seq, "ts": 0,
                "code": "eval_failed", "message": "Session is not defined"
            })])
        });
        let mut transport = TcpTransport::new(config).unwrap();
        let err = transport.execute("Session.get('lost')").unwrap_err();
        assert_eq!(err.code(), "TRANSPORT_REMOTE");
        assert!(err.to_string().contains("Session is not defined"));
        assert_eq!(evals.load(Ordering::SeqCst), 1);
        assert!(transport.is_connected());
    }

    #[test]
    fn test_dropped_connection_reconnects() {
        let (config, evals) = spawn_instance(|conn_no, seq, _| {
            if conn_no == 0 {
                Reply::Hangup
            } else {
                Reply::Lines(vec![result(seq, json!(true))])
            }
        });
        let mut transport = TcpTransport::new(config).unwrap();
        assert_eq!(transport.execute("Session.get('lost')").unwrap(), json!(true));
        assert_eq!(evals.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unreachable_instance_gives_up() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = TransportConfig {
            port,
            retries: 1,
            backoff: Duration::from_millis(1),
            ..TransportConfig::default()
        };
        let mut transport = TcpTransport::new(config).unwrap();
        let err = transport.execute("1").unwrap_err();
        assert!(err.is_recoverable());
        assert!(!transport.is_connected());
    }

    fn slow_first_reply(conn_no: usize, seq: u64) -> Reply {
        let lines = vec![result(seq, Value::Null)];
        if conn_no == 0 {
            Reply::Delayed(Duration::from_millis(300), lines)
        } else {
            Reply::Lines(lines)
        }
    }

    #[test]
    fn test_move_is_not_resent_after_timeout() {
        let (config, evals) = spawn_instance(|conn_no, seq, _| slow_first_reply(conn_no, seq));
        let config = TransportConfig {
            timeout: Duration::from_millis(100),
            ..config
        };
        let mut transport = TcpTransport::connect(config).unwrap();

        let err = transport
            .execute_once("document.THREE.game.move({which: 37});")
            .unwrap_err();
        assert_eq!(err.code(), "TRANSPORT_TIMEOUT");
        assert!(!transport.is_connected());

        // Let the instance finish with the first connection.
        thread::sleep(Duration::from_millis(400));
        assert_eq!(transport.execute("Session.get('lost')").unwrap(), Value::Null);
        assert_eq!(evals.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_query_is_resent_after_timeout() {
        let (config, evals) = spawn_instance(|conn_no, seq, _| slow_first_reply(conn_no, seq));
        let config = TransportConfig {
            timeout: Duration::from_millis(100),
            retries: 5,
            backoff: Duration::from_millis(50),
            ..config
        };
        let mut transport = TcpTransport::new(config).unwrap();
        assert_eq!(transport.execute("Session.get('lost')").unwrap(), Value::Null);
        assert_eq!(evals.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_execute_once_reports_unreachable_instance() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = TransportConfig {
            port,
            retries: 1,
            backoff: Duration::from_millis(1),
            ..TransportConfig::default()
        };
        let mut transport = TcpTransport::new(config).unwrap();
        let err = transport.execute_once("1").unwrap_err();
        assert_eq!(err.code(), "TRANSPORT_IO");
    }
}
