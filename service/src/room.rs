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

//! Game room: admission, turn-checked moves and broadcast
//!
//! A [`GameRoom`] is the serialization point for everything that happens in
//! one game. Every mutation runs under the room's lock, and every notice the
//! room produces is pushed into the players' outboxes before the lock is
//! released, so both players observe events in the same order.

use crate::{ConnectionId, PlayerIndex, RelayError, Result, ServerMessage, ServerMetrics};
use gambit_rules::{RulesEngine, TerminalCondition};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How a player left a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The player sent a quit command
    Quit,
    /// The player's connection closed or failed
    Disconnected,
    /// The player's outbox was closed while a notice was being delivered
    Unreachable,
}

/// A seated player as seen by the room
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    id: ConnectionId,
    outbox: mpsc::UnboundedSender<ServerMessage>,
}

impl PlayerHandle {
    /// Create a handle delivering into `outbox`
    pub fn new(id: ConnectionId, outbox: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { id, outbox }
    }

    /// Get the connection this handle belongs to
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a notice without blocking
    pub fn deliver(&self, message: ServerMessage) -> Result<()> {
        self.outbox
            .send(message)
            .map_err(|_| RelayError::PeerUnreachable(self.id))
    }
}

/// Result of [`GameRoom::apply_move`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The sender does not hold the turn; nothing changed
    NotYourTurn,
    /// The rules engine rejected the move; nothing changed
    IllegalMove,
    /// The move was applied and the turn passed to `turn`
    Continues {
        /// Rendered position after the move
        board: String,
        /// Player now expected to move
        turn: PlayerIndex,
    },
    /// The move was applied and ended the game
    Ends {
        /// What ended the game
        condition: TerminalCondition,
        /// The mover, when the result is decisive
        winner: Option<PlayerIndex>,
        /// Rendered final position
        board: String,
    },
    /// The second player has not arrived yet
    AwaitingOpponent,
    /// The game has already ended
    GameOver,
}

struct Seat {
    index: PlayerIndex,
    handle: PlayerHandle,
}

struct RoomState<B> {
    seats: Vec<Seat>,
    board: B,
    turn: PlayerIndex,
    started: bool,
    game_over: bool,
    unreachable: Vec<ConnectionId>,
}

impl<B> RoomState<B> {
    fn deliver(&mut self, position: usize, message: ServerMessage) {
        let seat = &self.seats[position];
        if seat.handle.deliver(message).is_err() {
            self.unreachable.push(seat.handle.id);
        }
    }

    fn broadcast(&mut self, message: &ServerMessage) {
        for position in 0..self.seats.len() {
            self.deliver(position, message.clone());
        }
    }

    /// Prompt each player, then name the seat holding the turn
    fn announce_turn(&mut self) {
        for position in 0..self.seats.len() {
            let message = if self.seats[position].index == self.turn {
                ServerMessage::YourTurn
            } else {
                ServerMessage::OpponentsTurn
            };
            self.deliver(position, message);
            self.deliver(position, ServerMessage::TurnOf(self.turn));
        }
    }

    fn remove_seat(&mut self, id: ConnectionId) -> Option<Seat> {
        let position = self.seats.iter().position(|seat| seat.handle.id == id)?;
        Some(self.seats.remove(position))
    }

    fn in_progress(&self) -> bool {
        self.started && !self.game_over
    }
}

/// One named game between at most two players
pub struct GameRoom<R: RulesEngine> {
    name: String,
    rules: Arc<R>,
    metrics: Arc<ServerMetrics>,
    state: Mutex<RoomState<R::Board>>,
}

impl<R: RulesEngine> GameRoom<R> {
    /// Create an empty room holding a fresh board
    pub fn new(name: impl Into<String>, rules: Arc<R>, metrics: Arc<ServerMetrics>) -> Self {
        let board = rules.new_board();
        Self {
            name: name.into(),
            rules,
            metrics,
            state: Mutex::new(RoomState {
                seats: Vec::with_capacity(2),
                board,
                turn: PlayerIndex::FIRST,
                started: false,
                game_over: false,
                unreachable: Vec::new(),
            }),
        }
    }

    /// Get the room name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seat a player
    ///
    /// The first two players admitted receive [`PlayerIndex::FIRST`] and
    /// [`PlayerIndex::SECOND`] in admission order. The second admission
    /// starts the game and wakes both players through their outboxes.
    pub fn admit(&self, handle: PlayerHandle) -> Result<PlayerIndex> {
        let mut state = self.lock();
        if state.game_over {
            return Err(RelayError::RoomClosed(self.name.clone()));
        }
        let index = PlayerIndex::from_position(state.seats.len())
            .ok_or_else(|| RelayError::RoomFull(self.name.clone()))?;

        debug!(room = %self.name, connection_id = %handle.id, player = %index, "Player admitted");
        state.seats.push(Seat { index, handle });
        let position = state.seats.len() - 1;
        state.deliver(
            position,
            ServerMessage::Joined {
                room: self.name.clone(),
                player: index,
            },
        );

        if state.seats.len() < 2 {
            state.deliver(position, ServerMessage::WaitingForOpponent);
        } else {
            state.started = true;
            self.metrics.game_started();
            info!(room = %self.name, "Game started");
            let board = self.rules.render(&state.board);
            state.broadcast(&ServerMessage::GameStarted { board });
            state.announce_turn();
        }

        self.settle(&mut state);
        Ok(index)
    }

    /// Remove a player, returning how many remain
    ///
    /// Removing an absent player is a no-op. Leaving a game in progress ends
    /// it and tells the remaining player why.
    pub fn leave(&self, id: ConnectionId, departure: Departure) -> usize {
        let mut state = self.lock();
        if let Some(seat) = state.remove_seat(id) {
            debug!(room = %self.name, connection_id = %id, player = %seat.index, ?departure, "Player left");
            self.abandon(&mut state, departure);
            self.settle(&mut state);
        }
        state.seats.len()
    }

    /// Apply a move on behalf of `sender`
    ///
    /// On success every seated player receives the move echo, a check warning
    /// when applicable, and either the next turn prompt or the result.
    pub fn apply_move(&self, sender: PlayerIndex, notation: &str) -> MoveOutcome {
        let mut state = self.lock();
        if state.game_over {
            return MoveOutcome::GameOver;
        }
        if !state.started {
            return MoveOutcome::AwaitingOpponent;
        }
        if sender != state.turn {
            self.metrics.move_rejected();
            return MoveOutcome::NotYourTurn;
        }
        if !self.rules.is_legal(&state.board, notation) {
            self.metrics.move_rejected();
            return MoveOutcome::IllegalMove;
        }
        if let Err(e) = self.rules.apply(&mut state.board, notation) {
            warn!(room = %self.name, notation, error = %e, "Legal move failed to apply");
            self.metrics.move_rejected();
            return MoveOutcome::IllegalMove;
        }
        self.metrics.move_applied();

        let board = self.rules.render(&state.board);
        let check = self.rules.is_check(&state.board);
        let condition = self.rules.terminal_condition(&state.board);

        state.broadcast(&ServerMessage::MoveApplied {
            notation: notation.to_string(),
            board: board.clone(),
        });
        if check {
            state.broadcast(&ServerMessage::Check);
        }

        let outcome = match condition {
            Some(condition) => {
                let winner = condition.is_decisive().then_some(sender);
                state.game_over = true;
                self.metrics.game_finished();
                info!(room = %self.name, %condition, ?winner, "Game over");
                state.broadcast(&ServerMessage::GameOver {
                    condition,
                    winner,
                    board: board.clone(),
                });
                MoveOutcome::Ends {
                    condition,
                    winner,
                    board,
                }
            }
            None => {
                state.turn = sender.opponent();
                state.announce_turn();
                MoveOutcome::Continues {
                    board,
                    turn: state.turn,
                }
            }
        };

        self.settle(&mut state);
        outcome
    }

    /// Tell every player `message`, unseat them and finish the game
    pub fn close(&self, message: ServerMessage) {
        let mut state = self.lock();
        state.broadcast(&message);
        if state.in_progress() {
            self.metrics.game_finished();
        }
        state.game_over = true;
        state.seats.clear();
        state.unreachable.clear();
    }

    /// Get the number of seated players
    pub fn player_count(&self) -> usize {
        self.lock().seats.len()
    }

    /// Check if no players are seated
    pub fn is_empty(&self) -> bool {
        self.lock().seats.is_empty()
    }

    /// Check if both seats are taken
    pub fn is_full(&self) -> bool {
        self.lock().seats.len() >= 2
    }

    /// Check if the game has ended
    pub fn is_game_over(&self) -> bool {
        self.lock().game_over
    }

    /// Get the player expected to move
    pub fn turn(&self) -> PlayerIndex {
        self.lock().turn
    }

    /// Render the current position
    pub fn render_board(&self) -> String {
        let state = self.lock();
        self.rules.render(&state.board)
    }

    fn lock(&self) -> MutexGuard<'_, RoomState<R::Board>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn abandon(&self, state: &mut RoomState<R::Board>, departure: Departure) {
        if state.in_progress() {
            state.game_over = true;
            self.metrics.game_finished();
            info!(room = %self.name, ?departure, "Game abandoned");
            state.broadcast(&ServerMessage::OpponentLeft { departure });
        }
    }

    /// Unseat players whose outbox closed during delivery
    fn settle(&self, state: &mut RoomState<R::Board>) {
        while !state.unreachable.is_empty() {
            let unreachable = std::mem::take(&mut state.unreachable);
            for id in unreachable {
                if state.remove_seat(id).is_some() {
                    warn!(room = %self.name, connection_id = %id, "Player unreachable, unseating");
                    self.abandon(state, Departure::Unreachable);
                }
            }
        }
    }
}

impl<R: RulesEngine> fmt::Debug for GameRoom<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("GameRoom")
            .field("name", &self.name)
            .field("players", &state.seats.len())
            .field("turn", &state.turn)
            .field("started", &state.started)
            .field("game_over", &state.game_over)
            .finish()
    }
}
