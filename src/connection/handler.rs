//! Per-connection task.
//!
//! Each client gets its own task that owns the socket, the read buffer and
//! the receiving end of the client's pub/sub outbox. The task waits on both
//! at once, so published messages go out even while the client is idle.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. accept()  ──>  registry.connect()  (ClientId + outbox)
//!        │
//!        ▼
//! 2. ┌──────────────────────────────────────────────┐
//!    │                 Main Loop                    │
//!    │                                              │
//!    │  drain complete frames from the buffer       │
//!    │     └─> Command ─> execute ─> write reply    │
//!    │                                              │
//!    │  select! {                                   │
//!    │     socket readable  ─> append to buffer     │
//!    │     outbox message   ─> write push frame     │
//!    │  }                                           │
//!    └──────────────────────────────────────────────┘
//!        │
//!        ▼
//! 3. EOF / QUIT / protocol error / I/O error
//!        │
//!        ▼
//! 4. registry.disconnect(ClientId)   (always)
//! ```
//!
//! ## Buffer Management
//!
//! TCP is a stream, so a read may hold half a frame or several pipelined
//! frames. Bytes accumulate in a `BytesMut` and are consumed frame by frame;
//! an incomplete tail simply waits for the next read.

use crate::commands::CommandHandler;
use crate::protocol::parser::MAX_BULK_SIZE;
use crate::protocol::{Command, ParseError, RespParser, RespValue};
use crate::pubsub::{Client, Message};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Largest amount of unparsed input a client may have buffered.
///
/// A command carrying a maximum-size bulk string, plus its other arguments,
/// must fit, so the cap sits well above [`MAX_BULK_SIZE`].
pub const MAX_BUFFER_SIZE: usize = 2 * MAX_BULK_SIZE;

const INITIAL_BUFFER_SIZE: usize = 4096;

/// Server-wide connection counters.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub connections_accepted: AtomicU64,
    pub active_connections: AtomicU64,
    pub commands_processed: AtomicU64,
    /// Pub/sub messages written to subscribers
    pub messages_pushed: AtomicU64,
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_pushed(&self) {
        self.messages_pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// How the loop should continue after a command.
enum Flow {
    Continue,
    Close,
}

/// State owned by one connection task.
pub struct ConnectionHandler {
    stream: BufWriter<TcpStream>,
    addr: SocketAddr,
    buffer: BytesMut,
    command_handler: CommandHandler,
    parser: RespParser,
    /// This connection's identity in the pub/sub registry
    client: Client,
    /// Messages published to this client's channels
    inbox: mpsc::Receiver<Message>,
    stats: Arc<ConnectionStats>,
    max_buffer: usize,
}

impl ConnectionHandler {
    /// Registers the connection with the pub/sub registry and prepares its
    /// buffers.
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();
        let (client, inbox) = command_handler.pubsub().connect();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            parser: RespParser::new(),
            client,
            inbox,
            stats,
            max_buffer: MAX_BUFFER_SIZE,
        }
    }

    /// Overrides the unparsed input cap (default [`MAX_BUFFER_SIZE`]).
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    /// Serves the client until it leaves or the connection fails.
    ///
    /// Subscriptions are released on every exit path before this returns.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, id = %self.client.id(), "Client connected");

        let result = self.main_loop().await;

        let released = self.command_handler.pubsub().disconnect(self.client.id());
        if released > 0 {
            debug!(client = %self.addr, channels = released, "Released subscriptions");
        }

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                info!(client = %self.addr, "Client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        self.stats.connection_closed();
        result
    }

    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(frame) = self.try_parse_frame().await? {
                if let Flow::Close = self.process_frame(frame).await? {
                    return Ok(());
                }
            }

            if self.buffer.len() >= self.max_buffer {
                error!(client = %self.addr, size = self.buffer.len(), "Buffer size limit exceeded");
                let reply = RespValue::error(format!(
                    "ERR Protocol error: request exceeds {} byte buffer limit",
                    self.max_buffer
                ));
                if let Err(io_err) = self.send_response(&reply).await {
                    debug!(client = %self.addr, error = %io_err, "Could not report buffer overflow");
                }
                return Err(ConnectionError::BufferFull);
            }
            if self.buffer.capacity() - self.buffer.len() < 1024 {
                self.buffer.reserve(INITIAL_BUFFER_SIZE);
            }

            tokio::select! {
                read = self.stream.get_mut().read_buf(&mut self.buffer) => {
                    let n = read?;
                    if n == 0 {
                        return Err(if self.buffer.is_empty() {
                            ConnectionError::ClientDisconnected
                        } else {
                            ConnectionError::UnexpectedEof
                        });
                    }
                    self.stats.bytes_read(n);
                    trace!(client = %self.addr, bytes = n, "Read data");
                }
                Some(message) = self.inbox.recv() => {
                    trace!(client = %self.addr, "Delivering published message");
                    self.send_response(&message.to_resp()).await?;
                    self.stats.message_pushed();
                }
            }
        }
    }

    /// Takes one complete frame off the buffer.
    ///
    /// A framing error is answered with `-ERR Protocol error` before the
    /// connection gives up.
    async fn try_parse_frame(&mut self) -> Result<Option<RespValue>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer) {
            Ok(Some((value, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed frame"
                );
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(self.protocol_error(e).await),
        }
    }

    async fn process_frame(&mut self, frame: RespValue) -> Result<Flow, ConnectionError> {
        let command = match Command::from_frame(frame) {
            Ok(command) => command,
            Err(e) => return Err(self.protocol_error(e).await),
        };

        let response = self.command_handler.execute(&self.client, &command);
        self.stats.command_processed();
        self.send_response(&response).await?;

        if command.key() == "QUIT" && !response.is_error() {
            debug!(client = %self.addr, "Client sent QUIT");
            return Ok(Flow::Close);
        }
        Ok(Flow::Continue)
    }

    /// Best-effort error reply for broken framing. Returns the error that
    /// ends the connection.
    async fn protocol_error(&mut self, e: ParseError) -> ConnectionError {
        warn!(client = %self.addr, error = %e, "Protocol error");
        let reply = RespValue::error(format!("ERR Protocol error: {}", e));
        if let Err(io_err) = self.send_response(&reply).await {
            debug!(client = %self.addr, error = %io_err, "Could not report protocol error");
        }
        ConnectionError::ParseError(e)
    }

    async fn send_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent response");
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Broken framing; the stream cannot be resynchronised.
    #[error("Protocol error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Client disconnected")]
    ClientDisconnected,

    /// The peer closed in the middle of a frame
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Runs one connection to completion. Spawned once per accepted socket.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    if let Err(e) = handler.run().await {
        trace!(client = %addr, error = %e, "Connection task finished with error");
    }
}
