//! `Session`: owns the TCP/TLS control channel to the Synergy server, runs
//! the handshake, and drives the read loop that feeds decoded messages into
//! a [`Dispatcher`].
//!
//! Mirrors the shape of this workspace's original client connection layer:
//! a struct wrapping an async stream, a small explicit session state
//! machine, and a `tokio::select!` loop multiplexing socket reads against a
//! heartbeat timer and a shutdown signal.

pub mod tls;

use std::net::SocketAddr;
use std::time::Duration;

use synergy_core::protocol::codec::{
    decode_greeting, decode_message, encode_hello_back, encode_message, ProtocolError,
    HELLO_PREAMBLE,
};
use synergy_core::protocol::messages::{PROTOCOL_MAJOR, PROTOCOL_MINOR};
use synergy_core::protocol::stream::StreamParser;
use synergy_core::protocol::SynergyMessage;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::config::ClientConfig;
use crate::application::cursor::CursorContext;
use crate::application::dispatch::{DispatchOutcome, Dispatcher};
use crate::application::virtual_device::{DeviceError, VirtualDevice};
use tls::TlsSetupError;

/// Interval at which the local watchdog checks for a stale connection.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);
/// Connection is considered dead after this much silence (three missed
/// heartbeat intervals).
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(9);
/// Bound on the initial TCP connect attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can terminate a [`Session`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("DNS resolution failed for {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no addresses resolved for {0}")]
    NoAddress(String),
    #[error("TLS setup failed: {0}")]
    TlsSetup(#[from] TlsSetupError),
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("heartbeat timed out after {0:?} of silence")]
    HeartbeatTimeout(Duration),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("server speaks unsupported protocol {major}.{minor}")]
    UnsupportedProtocol { major: u16, minor: u16 },
    #[error("server reported a protocol error on the control channel")]
    ServerProtocolError,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Coarse session lifecycle, logged at each transition. `Greeted` covers
/// the handshake-complete-but-not-yet-acknowledged window (`QINF`/`DINF`
/// may already have been exchanged); the heartbeat watchdog only arms once
/// the server sends `CIAK` and the session moves to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    AwaitingGreeting,
    Greeted,
    Active,
}

/// Type-erased async duplex stream so the read loop doesn't need to know
/// whether it is holding a plain `TcpStream` or a `TlsStream<TcpStream>`.
trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

/// Owns one control-channel connection to a Synergy server and the
/// dispatcher that turns its messages into kernel input events.
pub struct Session<D, C> {
    config: ClientConfig,
    dispatcher: Dispatcher<D, C>,
}

impl<D: VirtualDevice, C: CursorContext> Session<D, C> {
    pub fn new(config: ClientConfig, dispatcher: Dispatcher<D, C>) -> Self {
        Session { config, dispatcher }
    }

    /// Connects, completes the handshake, and runs the event loop until the
    /// connection is lost, the server sends a fatal protocol error, or
    /// `shutdown` resolves.
    ///
    /// A clean shutdown request returns `Ok(())`; any other termination is
    /// reported as a [`TransportError`] so the caller can decide whether to
    /// reconnect.
    pub async fn run(&mut self, shutdown: impl std::future::Future<Output = ()>) -> Result<(), TransportError> {
        tokio::pin!(shutdown);

        let mut stream = self.connect().await?;
        let mut parser = StreamParser::new();
        let mut read_buf = [0u8; 8192];
        let mut last_seen = Instant::now();
        let mut heartbeat_armed = false;
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await; // first tick fires immediately; consume it

        let mut state = SessionState::AwaitingGreeting;
        debug!(?state, "control channel open, awaiting handshake greeting");

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, closing session");
                    break Ok(());
                }
                _ = heartbeat.tick() => {
                    if heartbeat_armed && last_seen.elapsed() >= HEARTBEAT_TIMEOUT {
                        break Err(TransportError::HeartbeatTimeout(last_seen.elapsed()));
                    }
                }
                read = stream.read(&mut read_buf) => {
                    match read {
                        Ok(0) => {
                            break Err(TransportError::Io(std::io::Error::new(
                                std::io::ErrorKind::UnexpectedEof,
                                "server closed the control channel",
                            )));
                        }
                        Ok(n) => {
                            last_seen = Instant::now();
                            parser.feed(&read_buf[..n]);
                            match self.pump(&mut parser, stream.as_mut(), &mut state, &mut heartbeat_armed).await {
                                Ok(()) => {}
                                Err(e) => break Err(e),
                            }
                        }
                        Err(e) => break Err(TransportError::Io(e)),
                    }
                }
            }
        };

        if let Err(e) = self.dispatcher.shutdown() {
            warn!(error = %e, "error releasing held input on session teardown");
        }
        result
    }

    /// Drains every complete frame currently buffered in `parser`, handling
    /// the handshake greeting first and then regular post-handshake
    /// messages, advancing `state` and arming the heartbeat watchdog on the
    /// first `CIAK`.
    async fn pump(
        &mut self,
        parser: &mut StreamParser,
        stream: &mut dyn AsyncStream,
        state: &mut SessionState,
        heartbeat_armed: &mut bool,
    ) -> Result<(), TransportError> {
        if *state == SessionState::AwaitingGreeting {
            if let Some(frame) = parser.next()? {
                self.handle_greeting(&frame, stream).await?;
                *state = SessionState::Greeted;
                debug!(?state, "handshake complete");
            }
            return Ok(());
        }

        while let Some(frame) = parser.next()? {
            let became_active = self.handle_frame(&frame, stream).await?;
            if became_active && !*heartbeat_armed {
                *heartbeat_armed = true;
                *state = SessionState::Active;
                debug!(?state, "heartbeat armed");
            }
        }
        Ok(())
    }

    async fn handle_greeting(&self, frame: &[u8], stream: &mut dyn AsyncStream) -> Result<(), TransportError> {
        let (major, minor) = decode_greeting(frame)?;
        if major < PROTOCOL_MAJOR {
            return Err(TransportError::UnsupportedProtocol { major, minor });
        }
        let reply = encode_hello_back(PROTOCOL_MAJOR, PROTOCOL_MINOR, &self.config.client.name);
        stream.write_all(&reply).await?;
        info!(server_major = major, server_minor = minor, "handshake accepted");
        Ok(())
    }

    /// Dispatches one post-handshake frame. Returns `true` if this frame was
    /// the `CIAK` that moves the session into `Active` (arming the
    /// heartbeat watchdog).
    async fn handle_frame(&mut self, frame: &[u8], stream: &mut dyn AsyncStream) -> Result<bool, TransportError> {
        if frame.len() >= HELLO_PREAMBLE.len() && &frame[..HELLO_PREAMBLE.len()] == HELLO_PREAMBLE {
            // Servers don't resend the greeting post-handshake; treat a
            // stray greeting-shaped frame as noise rather than a crash.
            debug!("ignoring unexpected post-handshake greeting-shaped frame");
            return Ok(false);
        }

        let msg = match decode_message(frame) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "dropping malformed message");
                return Ok(false);
            }
        };

        if matches!(msg, SynergyMessage::ProtocolErrorNotice { .. }) {
            return Err(TransportError::ServerProtocolError);
        }
        let became_active = matches!(msg, SynergyMessage::InfoAck);

        match self.dispatcher.dispatch(msg)? {
            DispatchOutcome::None => {}
            DispatchOutcome::Reply(reply) => {
                stream.write_all(&encode_message(&reply)).await?;
            }
        }
        Ok(became_active)
    }

    async fn connect(&self) -> Result<Box<dyn AsyncStream>, TransportError> {
        let host = self.config.server.host.clone();
        let port = self.config.server.port;
        let addr_str = format!("{host}:{port}");
        let mut addrs = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|source| TransportError::Resolve { host: host.clone(), source })?;
        let addr = addrs.next().ok_or_else(|| TransportError::NoAddress(addr_str.clone()))?;

        let tcp = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Connect {
                addr,
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            })?
            .map_err(|source| TransportError::Connect { addr, source })?;
        tcp.set_nodelay(true).ok();

        if self.config.transport.tls || self.config.transport.mtls {
            let connector = tls::build_connector(&self.config.transport)?;
            let server_name = rustls::pki_types::ServerName::try_from(host.clone())
                .map_err(|_| TlsSetupError::Config(format!("invalid server name {host}")))?
                .to_owned();
            let tls_stream = connector
                .connect(server_name, tcp)
                .await
                .map_err(TransportError::TlsHandshake)?;
            Ok(Box::new(tls_stream))
        } else {
            Ok(Box::new(tcp))
        }
    }
}
