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

//! Error types for the relay server

use crate::types::ConnectionId;
use thiserror::Error;

/// Result type for operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Relay server error types
#[derive(Debug, Error)]
pub enum RelayError {
    /// I/O error from the underlying TCP stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A received line exceeded the configured maximum length
    #[error("Line exceeds maximum length of {0} bytes")]
    LineTooLong(usize),

    /// A received line was not valid UTF-8
    #[error("Line is not valid UTF-8")]
    InvalidEncoding,

    /// The room already seats two players
    #[error("Room {0:?} is full")]
    RoomFull(String),

    /// The room's game has finished and it accepts no new players
    #[error("Room {0:?} is closed")]
    RoomClosed(String),

    /// A move was submitted by the player whose turn it is not
    #[error("Not your turn")]
    NotYourTurn,

    /// The rules engine rejected a move
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// A line did not match any known command
    #[error("Malformed command: {0:?}")]
    MalformedCommand(String),

    /// A broadcast to the given player could not be delivered
    #[error("Peer {0} unreachable")]
    PeerUnreachable(ConnectionId),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Server is already accepting connections
    #[error("Server already running")]
    ServerAlreadyRunning,

    /// Server is not running
    #[error("Server not running")]
    ServerNotRunning,

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RelayError {
    /// Check if the error is recoverable
    ///
    /// Recoverable errors are reported to the offending client and the session
    /// carries on in its current state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RelayError::LineTooLong(_)
                | RelayError::InvalidEncoding
                | RelayError::NotYourTurn
                | RelayError::IllegalMove(_)
                | RelayError::MalformedCommand(_)
        )
    }

    /// Check if the error is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            RelayError::Io(_) | RelayError::PeerUnreachable(_)
                | RelayError::Timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_recoverable() {
        assert!(RelayError::NotYourTurn.is_recoverable());
        assert!(RelayError::IllegalMove("e2e5".into()).is_recoverable());
        assert!(RelayError::MalformedCommand("hello".into()).is_recoverable());
        assert!(RelayError::InvalidEncoding.is_recoverable());
        assert!(!RelayError::RoomFull("r1".into()).is_recoverable());
        assert!(!RelayError::PeerUnreachable(ConnectionId::new(7)).is_recoverable());
        assert!(!RelayError::Timeout.is_recoverable());
        assert!(!RelayError::ServerNotRunning.is_recoverable());
    }

    #[test]
    fn test_error_is_connection_error() {
        assert!(RelayError::PeerUnreachable(ConnectionId::new(7)).is_connection_error());
        assert!(RelayError::Timeout.is_connection_error());
        assert!(!RelayError::NotYourTurn.is_connection_error());
    }

    #[test]
    fn test_error_display() {
        let err = RelayError::PeerUnreachable(ConnectionId::new(42));
        assert_eq!(err.to_string(), "Peer conn-42 unreachable");

        let err = RelayError::RoomFull("r1".to_string());
        assert_eq!(err.to_string(), "Room \"r1\" is full");
    }
}
