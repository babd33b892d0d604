//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Line-framed client connection

use crate::codec::{InboundLine, RelayLineCodec};
use crate::{ConnectionId, RelayError, Result, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodecError};
use tracing::{debug, instrument, trace, warn};

/// A client connection speaking newline-terminated text
///
/// The socket is split so a pending read never blocks a write; the session
/// that owns the connection reads and writes from a single task.
pub struct LineConnection {
    reader: FramedRead<OwnedReadHalf, RelayLineCodec>,
    writer: FramedWrite<OwnedWriteHalf, RelayLineCodec>,

    // Metadata
    id: ConnectionId,
    peer_addr: SocketAddr,
    created_at: Instant,
    max_line_length: usize,

    // Metrics (lock-free, shareable)
    messages_sent: Arc<AtomicU64>,
    messages_received: Arc<AtomicU64>,
}

impl LineConnection {
    /// Wrap a TCP stream into a LineConnection
    #[instrument(skip(socket), fields(connection_id = %id))]
    pub fn wrap(socket: TcpStream, id: ConnectionId, max_line_length: usize) -> Result<Self> {
        let peer_addr = socket.peer_addr()?;
        if let Err(e) = socket.set_nodelay(true) {
            warn!(error = %e, "Failed to disable Nagle's algorithm");
        }

        debug!(peer_addr = %peer_addr, "Creating new line connection");

        counter!("gambit.connections.total").increment(1);
        gauge!("gambit.connections.active").increment(1.0);

        let (read_half, write_half) = socket.into_split();
        Ok(Self {
            reader: FramedRead::new(read_half, RelayLineCodec::new(max_line_length)),
            writer: FramedWrite::new(write_half, RelayLineCodec::new(max_line_length)),
            id,
            peer_addr,
            created_at: Instant::now(),
            max_line_length,
            messages_sent: Arc::new(AtomicU64::new(0)),
            messages_received: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Get when the connection was created
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Get lines sent
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Get lines received
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Send a notice to the client
    pub async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        self.send_line(message.to_string()).await
    }

    /// Send one line of raw text; the newline is appended
    #[instrument(skip(self, line), fields(connection_id = %self.id))]
    pub async fn send_line(&mut self, line: String) -> Result<()> {
        trace!(line = %line, "Sending line");
        match self.writer.send(line).await {
            Ok(()) => {
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
                counter!("gambit.messages.sent").increment(1);
                Ok(())
            }
            Err(e) => {
                counter!("gambit.errors.send").increment(1);
                Err(self.map_codec_error(e))
            }
        }
    }

    /// Receive the next line
    ///
    /// Returns `Ok(None)` once the peer has closed the stream. A line longer
    /// than the limit yields [`RelayError::LineTooLong`] and a line that is not
    /// UTF-8 yields [`RelayError::InvalidEncoding`]; either way the line is
    /// discarded and the connection remains usable.
    ///
    /// Cancel-safe: dropping the future never loses a received line.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        match self.reader.next().await {
            Some(Ok(InboundLine::Overflow)) => {
                counter!("gambit.errors.line_too_long").increment(1);
                Err(RelayError::LineTooLong(self.max_line_length))
            }
            Some(Ok(InboundLine::Invalid)) => {
                counter!("gambit.errors.invalid_encoding").increment(1);
                Err(RelayError::InvalidEncoding)
            }
            Some(Ok(InboundLine::Line(line))) => {
                self.messages_received.fetch_add(1, Ordering::Relaxed);
                counter!("gambit.messages.received").increment(1);
                trace!(connection_id = %self.id, line = %line, "Line received");
                Ok(Some(line))
            }
            Some(Err(e)) => {
                counter!("gambit.errors.receive").increment(1);
                Err(self.map_codec_error(e))
            }
            None => {
                debug!(connection_id = %self.id, "Connection stream ended");
                Ok(None)
            }
        }
    }

    /// Flush and shut down the write half
    pub async fn close(&mut self) -> Result<()> {
        self.writer
            .close()
            .await
            .map_err(|e| self.map_codec_error(e))
    }

    fn map_codec_error(&self, error: LinesCodecError) -> RelayError {
        match error {
            LinesCodecError::MaxLineLengthExceeded => RelayError::LineTooLong(self.max_line_length),
            LinesCodecError::Io(e) => RelayError::Io(e),
        }
    }
}

impl Drop for LineConnection {
    fn drop(&mut self) {
        gauge!("gambit.connections.active").decrement(1.0);
    }
}

impl std::fmt::Debug for LineConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConnection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("created_at", &self.created_at)
            .finish()
    }
}
