//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::{decode_command, Reply};
use crate::store::Store;

/// Handles a single client connection
///
/// Generic over the byte stream so the read/decode/dispatch/write loop can
/// run against anything that reads and writes, not only TCP sockets.
pub struct Connection<T: Read + Write, S: Store> {
    /// Client byte stream
    stream: T,

    /// Shared command dispatcher (and through it, the store)
    dispatcher: Arc<Dispatcher<S>>,

    /// Fixed-size buffer filled by each read call
    read_buf: Vec<u8>,

    /// Encoded replies waiting to be written
    write_buf: BytesMut,

    /// Peer address for logging
    peer_addr: String,
}

impl<S: Store> Connection<TcpStream, S> {
    /// Create a connection handler over an accepted TCP stream
    pub fn from_tcp(
        stream: TcpStream,
        dispatcher: Arc<Dispatcher<S>>,
        read_buffer_size: usize,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        Ok(Self::new(stream, dispatcher, read_buffer_size, peer_addr))
    }

    /// Configure connection timeouts (0 leaves a timeout disabled)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }
}

impl<T: Read + Write, S: Store> Connection<T, S> {
    /// Create a connection handler over any byte stream
    pub fn new(
        stream: T,
        dispatcher: Arc<Dispatcher<S>>,
        read_buffer_size: usize,
        peer_addr: impl Into<String>,
    ) -> Self {
        Self {
            stream,
            dispatcher,
            read_buf: vec![0; read_buffer_size.max(1)],
            write_buf: BytesMut::new(),
            peer_addr: peer_addr.into(),
        }
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends replies.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let n = match self.stream.read(&mut self.read_buf) {
                Ok(0) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Ok(n) => n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(ref e) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(ref e) if is_timeout(e.kind()) => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e.into());
                }
            };

            let input = &self.read_buf[..n];
            tracing::trace!("Received from {}: {:?}", self.peer_addr, input.escape_ascii().to_string());

            let replies = respond(&self.dispatcher, input, &mut self.write_buf, &self.peer_addr);
            tracing::trace!("Answering {} with {} replies", self.peer_addr, replies);

            if let Err(e) = self.flush_replies() {
                // The client disconnected before we could send the reply
                if is_disconnect(e.kind()) {
                    tracing::debug!(
                        "Client {} disconnected before reply could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e.into());
            }
        }
    }

    fn flush_replies(&mut self) -> std::io::Result<()> {
        let result = self
            .stream
            .write_all(&self.write_buf)
            .and_then(|_| self.stream.flush());
        self.write_buf.clear();
        result
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> T {
        self.stream
    }
}

/// Decode and answer every message in one read, in order
///
/// A decode error is answered once and the rest of the read is dropped.
/// Returns the number of replies encoded into `out`.
fn respond<S: Store>(
    dispatcher: &Dispatcher<S>,
    input: &[u8],
    out: &mut BytesMut,
    peer_addr: &str,
) -> usize {
    let mut offset = 0;
    let mut replies = 0;

    while offset < input.len() {
        replies += 1;
        match decode_command(&input[offset..]) {
            Ok((command, consumed)) => {
                tracing::trace!("Command from {}: {:?}", peer_addr, command);
                offset += consumed;
                dispatcher.handle(&command).encode_into(out);
            }
            Err(e) => {
                tracing::warn!("Malformed request from {}: {}", peer_addr, e);
                Reply::from(e).encode_into(out);
                break;
            }
        }
    }

    replies
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}

// Windows reports TimedOut where Unix reports WouldBlock
fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
