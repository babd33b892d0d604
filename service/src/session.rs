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

//! Client session
//!
//! One [`ClientSession`] runs per accepted connection. It reads lines from the
//! client, forwards commands to its room, and writes whatever the room pushes
//! into its outbox. Waiting for an opponent is simply waiting on the outbox.

use crate::protocol::parse_room_name;
use crate::room::{Departure, GameRoom, MoveOutcome, PlayerHandle};
use crate::{
    Command, ConnectionId, LineConnection, PlayerIndex, RelayError, Result, RoomRegistry,
    ServerConfig, ServerMessage, ServerMetrics, SessionState,
};
use gambit_rules::RulesEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{Span, debug, field, instrument, trace, warn};

/// Per-session limits
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum room name length
    pub max_room_name_len: usize,
    /// Disconnect after this long without input
    pub idle_timeout: Option<Duration>,
    /// Maximum time for a single write
    pub write_timeout: Duration,
}

impl From<&ServerConfig> for SessionConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_room_name_len: config.max_room_name_len,
            idle_timeout: config.idle_timeout,
            write_timeout: config.write_timeout,
        }
    }
}

/// State of one connected client
pub struct ClientSession<R: RulesEngine> {
    id: ConnectionId,
    connection: LineConnection,
    registry: Arc<RoomRegistry<R>>,
    metrics: Arc<ServerMetrics>,
    config: SessionConfig,
    outbox_tx: mpsc::UnboundedSender<ServerMessage>,
    outbox_rx: mpsc::UnboundedReceiver<ServerMessage>,
    state: SessionState,
    seat: Option<(Arc<GameRoom<R>>, PlayerIndex)>,
    departure: Departure,
}

impl<R: RulesEngine> ClientSession<R> {
    /// Create a session around `connection`
    ///
    /// `outbox_tx` and `outbox_rx` are the two ends of the channel the room
    /// and the server use to reach this client.
    pub fn new(
        connection: LineConnection,
        registry: Arc<RoomRegistry<R>>,
        metrics: Arc<ServerMetrics>,
        config: SessionConfig,
        outbox_tx: mpsc::UnboundedSender<ServerMessage>,
        outbox_rx: mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Self {
        Self {
            id: connection.id(),
            connection,
            registry,
            metrics,
            config,
            outbox_tx,
            outbox_rx,
            state: SessionState::AwaitingRoomName,
            seat: None,
            departure: Departure::Disconnected,
        }
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session until the client leaves or the game ends
    #[instrument(
        name = "session",
        skip(self),
        fields(connection_id = %self.id, peer = %self.connection.peer_addr(), room = field::Empty)
    )]
    pub async fn run(mut self) {
        debug!("Session started");

        if let Err(e) = self.event_loop().await {
            match &e {
                RelayError::Timeout => {
                    self.metrics.timeout_error();
                    debug!("Session timed out");
                }
                e if e.is_connection_error() => {
                    self.metrics.connection_error();
                    debug!(error = %e, "Connection lost");
                }
                e => {
                    self.metrics.connection_error();
                    warn!(error = %e, "Session failed");
                }
            }
        }

        self.cleanup().await;
        debug!("Session ended");
    }

    async fn event_loop(&mut self) -> Result<()> {
        self.send(&ServerMessage::RoomPrompt).await?;

        while !self.state.is_terminal() {
            select! {
                result = next_line(&mut self.connection, self.config.idle_timeout) => {
                    let handled = match result {
                        Ok(Some(line)) => {
                            self.metrics.message_received();
                            self.handle_line(&line).await
                        }
                        Ok(None) => {
                            self.departure = Departure::Disconnected;
                            return Ok(());
                        }
                        Err(e) => Err(e),
                    };
                    if let Err(e) = handled {
                        self.reject(e).await?;
                    }
                }

                Some(message) = self.outbox_rx.recv() => {
                    self.deliver(message).await?;
                }
            }
        }

        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<()> {
        let command = Command::parse(line);
        if command == Command::Quit {
            self.departure = Departure::Quit;
            self.send(&ServerMessage::Goodbye).await?;
            self.transition(SessionState::Terminated);
            return Ok(());
        }

        match self.state {
            SessionState::AwaitingRoomName => self.handle_room_name(line).await,
            SessionState::Terminated => Ok(()),
            _ => self.handle_command(command).await,
        }
    }

    async fn handle_room_name(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            return self.send(&ServerMessage::RoomPrompt).await;
        }
        let name = parse_room_name(line, self.config.max_room_name_len)?.to_string();

        let handle = PlayerHandle::new(self.id, self.outbox_tx.clone());
        match self.registry.join(&name, handle) {
            Ok((room, index)) => {
                Span::current().record("room", name.as_str());
                debug!(player = %index, "Seated");
                self.seat = Some((room, index));
                self.transition(SessionState::AwaitingOpponent);
                Ok(())
            }
            Err(RelayError::RoomFull(room)) => {
                debug!("Room full");
                self.send(&ServerMessage::RoomFull { room }).await?;
                self.transition(SessionState::Terminated);
                Ok(())
            }
            Err(RelayError::RoomClosed(room)) => {
                debug!("Room closed");
                self.send(&ServerMessage::RoomClosed { room }).await?;
                self.transition(SessionState::Terminated);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Empty => self.send(&ServerMessage::EmptyInput).await,
            Command::Malformed(line) => Err(RelayError::MalformedCommand(line)),
            Command::Move(notation) => self.submit_move(notation).await,
            // Handled before dispatch
            Command::Quit => Ok(()),
        }
    }

    async fn submit_move(&mut self, notation: String) -> Result<()> {
        let Some((room, index)) = self.seat.clone() else {
            return Ok(());
        };

        match room.apply_move(index, &notation) {
            MoveOutcome::NotYourTurn => Err(RelayError::NotYourTurn),
            MoveOutcome::IllegalMove => Err(RelayError::IllegalMove(notation)),
            MoveOutcome::AwaitingOpponent => self.send(&ServerMessage::WaitingForOpponent).await,
            MoveOutcome::GameOver => self.send(&ServerMessage::GameAlreadyOver).await,
            // The room already queued the broadcast for both players
            MoveOutcome::Continues { .. } | MoveOutcome::Ends { .. } => {
                trace!(notation = %notation, "Move applied");
                Ok(())
            }
        }
    }

    /// Report a recoverable error to the client; anything else ends the session
    async fn reject(&mut self, error: RelayError) -> Result<()> {
        if !error.is_recoverable() {
            return Err(error);
        }
        debug!(error = %error, state = %self.state, "Input rejected");

        let notice = match error {
            RelayError::NotYourTurn => ServerMessage::NotYourTurn,
            RelayError::IllegalMove(notation) => ServerMessage::IllegalMove { notation },
            RelayError::LineTooLong(_) => {
                self.metrics.protocol_error();
                ServerMessage::LineTooLong
            }
            _ if self.state == SessionState::AwaitingRoomName => {
                self.metrics.protocol_error();
                self.send(&ServerMessage::InvalidRoomName).await?;
                ServerMessage::RoomPrompt
            }
            _ => {
                self.metrics.protocol_error();
                ServerMessage::FormatError
            }
        };
        self.send(&notice).await
    }

    /// Write a notice from the outbox and follow the state it implies
    async fn deliver(&mut self, message: ServerMessage) -> Result<()> {
        self.send(&message).await?;
        match message {
            ServerMessage::YourTurn => self.transition(SessionState::MyTurn),
            ServerMessage::OpponentsTurn => self.transition(SessionState::OpponentTurn),
            ref m if m.is_final() => self.transition(SessionState::Terminated),
            _ => {}
        }
        Ok(())
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        timeout(self.config.write_timeout, self.connection.send(message))
            .await
            .map_err(|_| RelayError::Timeout)??;
        self.metrics.message_sent();
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            trace!(from = %self.state, to = %next, "State transition");
            self.state = next;
        }
    }

    async fn cleanup(&mut self) {
        self.transition(SessionState::Terminated);

        if let Some((room, _)) = self.seat.take() {
            if room.leave(self.id, self.departure) == 0 {
                self.registry.remove(room.name(), &room);
            }
        }

        while self.outbox_rx.try_recv().is_ok() {}

        let _ = timeout(self.config.write_timeout, self.connection.close()).await;
    }
}

impl<R: RulesEngine> std::fmt::Debug for ClientSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("room", &self.seat.as_ref().map(|(room, _)| room.name()))
            .field("player", &self.seat.as_ref().map(|(_, index)| *index))
            .finish()
    }
}

/// Read the next line, honouring the idle timeout
async fn next_line(
    connection: &mut LineConnection,
    idle_timeout: Option<Duration>,
) -> Result<Option<String>> {
    match idle_timeout {
        Some(limit) => timeout(limit, connection.next_line())
            .await
            .map_err(|_| RelayError::Timeout)?,
        None => connection.next_line().await,
    }
}
