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

//! Line protocol spoken between clients and the relay
//!
//! Every message is a single newline-terminated line of text, except board
//! diagrams which span several lines inside one message. Inbound lines are
//! parsed into a [`Command`]; outbound notices are [`ServerMessage`] values
//! whose `Display` form is exactly what goes on the wire (minus the final
//! newline, which the line codec appends).

use crate::room::Departure;
use crate::{PlayerIndex, RelayError, Result};
use gambit_rules::TerminalCondition;
use std::fmt;

/// Prefix of a move submission and of a rebroadcast move
pub const MOVE_PREFIX: &str = "MOV:";

/// A command parsed from one inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line
    Empty,
    /// `MOV:<notation>`
    Move(String),
    /// `QUIT` or `SAIR`, any case
    Quit,
    /// Anything else
    Malformed(String),
}

impl Command {
    /// Parse one line received from a client
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("sair") {
            return Command::Quit;
        }
        match line.strip_prefix(MOVE_PREFIX).map(str::trim) {
            Some(notation)
                if !notation.is_empty()
                    && notation.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                Command::Move(notation.to_string())
            }
            _ => Command::Malformed(line.to_string()),
        }
    }
}

/// Validate a room name sent as the first line of a session
///
/// Returns the trimmed name.
pub fn parse_room_name(line: &str, max_len: usize) -> Result<&str> {
    let name = line.trim();
    if name.is_empty() || name.chars().count() > max_len || name.chars().any(char::is_control) {
        return Err(RelayError::MalformedCommand(line.to_string()));
    }
    Ok(name)
}

/// Notices sent from the relay to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Ask for the room to join
    RoomPrompt,
    /// The room name was rejected
    InvalidRoomName,
    /// The client was seated in a room
    Joined {
        /// Room name
        room: String,
        /// Seat assigned at admission
        player: PlayerIndex,
    },
    /// The room already seats two players
    RoomFull {
        /// Room name
        room: String,
    },
    /// The room's game has already finished
    RoomClosed {
        /// Room name
        room: String,
    },
    /// Seated, but no opponent yet
    WaitingForOpponent,
    /// The second player arrived
    GameStarted {
        /// Rendered starting position
        board: String,
    },
    /// A move was applied
    MoveApplied {
        /// Notation as submitted
        notation: String,
        /// Rendered position after the move
        board: String,
    },
    /// This client is expected to move
    YourTurn,
    /// The opponent is expected to move
    OpponentsTurn,
    /// Announces which seat holds the turn
    TurnOf(PlayerIndex),
    /// A move was submitted out of turn
    NotYourTurn,
    /// The rules engine rejected a move
    IllegalMove {
        /// Notation as submitted
        notation: String,
    },
    /// The line was not a recognised command
    FormatError,
    /// The line exceeded the maximum length
    LineTooLong,
    /// The line was blank
    EmptyInput,
    /// The side to move is in check
    Check,
    /// The game reached a terminal condition
    GameOver {
        /// What ended the game
        condition: TerminalCondition,
        /// The mating player, for decisive results
        winner: Option<PlayerIndex>,
        /// Rendered final position
        board: String,
    },
    /// No move is possible because the game is over
    GameAlreadyOver,
    /// The opponent left an unfinished game
    OpponentLeft {
        /// How the opponent left
        departure: Departure,
    },
    /// The relay is going down
    ServerShutdown,
    /// Acknowledges a quit
    Goodbye,
}

impl ServerMessage {
    /// Check if the session should end once this notice is delivered
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ServerMessage::RoomFull { .. }
                | ServerMessage::RoomClosed { .. }
                | ServerMessage::GameOver { .. }
                | ServerMessage::OpponentLeft { .. }
                | ServerMessage::ServerShutdown
                | ServerMessage::Goodbye
        )
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::RoomPrompt => write!(f, "Enter the room name to join:"),
            ServerMessage::InvalidRoomName => write!(f, "Invalid room name. Try again."),
            ServerMessage::Joined { room, player } => {
                write!(f, "Joined room {} as {}.", room, player)
            }
            ServerMessage::RoomFull { room } => write!(f, "Room {} is full!", room),
            ServerMessage::RoomClosed { room } => {
                write!(f, "The game in room {} has already finished.", room)
            }
            ServerMessage::WaitingForOpponent => write!(f, "Waiting for an opponent..."),
            ServerMessage::GameStarted { board } => write!(f, "Game started!\n{}", board),
            ServerMessage::MoveApplied { notation, board } => {
                write!(f, "{}{}\n{}", MOVE_PREFIX, notation, board)
            }
            ServerMessage::YourTurn => write!(f, "Your turn!"),
            ServerMessage::OpponentsTurn => write!(f, "Wait for your opponent..."),
            ServerMessage::TurnOf(player) => write!(f, "{} to move.", player),
            ServerMessage::NotYourTurn => write!(f, "It is not your turn!"),
            ServerMessage::IllegalMove { notation } => {
                write!(f, "Invalid move {}. Try again.", notation)
            }
            ServerMessage::FormatError => write!(
                f,
                "Invalid input. Send a move in the format '{}e2e4'.",
                MOVE_PREFIX
            ),
            ServerMessage::LineTooLong => write!(f, "Message too long. Try again."),
            ServerMessage::EmptyInput => write!(f, "Empty input. Try again."),
            ServerMessage::Check => write!(f, "Warning: Check!"),
            ServerMessage::GameOver {
                condition,
                winner: Some(winner),
                board,
            } => write!(f, "Game over: {}! {} wins.\n{}", condition, winner, board),
            ServerMessage::GameOver {
                condition,
                winner: None,
                board,
            } => write!(f, "Game over: {}!\n{}", condition, board),
            ServerMessage::GameAlreadyOver => write!(f, "The game is already over."),
            ServerMessage::OpponentLeft { departure } => match departure {
                Departure::Quit => write!(f, "Your opponent quit. The game is over."),
                Departure::Disconnected => {
                    write!(f, "Your opponent disconnected. The game is over.")
                }
                Departure::Unreachable => {
                    write!(f, "Lost contact with your opponent. The game is over.")
                }
            },
            ServerMessage::ServerShutdown => {
                write!(f, "The server is shutting down. Connection closed.")
            }
            ServerMessage::Goodbye => write!(f, "Goodbye."),
        }
    }
}
