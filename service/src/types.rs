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

//! Core types for the relay server

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Unique identifier for a connection (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Seat of a player within a room, fixed at admission
///
/// The first admitted player holds index 0 and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerIndex(u8);

impl PlayerIndex {
    /// The first admitted player
    pub const FIRST: PlayerIndex = PlayerIndex(0);
    /// The second admitted player
    pub const SECOND: PlayerIndex = PlayerIndex(1);

    /// Create an index from a seat position, if it is a valid seat
    pub fn from_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(Self::FIRST),
            1 => Some(Self::SECOND),
            _ => None,
        }
    }

    /// Get the zero-based seat position
    pub fn position(self) -> usize {
        self.0 as usize
    }

    /// Get the one-based player number shown to humans
    pub fn number(self) -> usize {
        self.position() + 1
    }

    /// Get the other seat
    pub fn opponent(self) -> Self {
        Self(1 - self.0)
    }
}

impl fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Client session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Prompted for a room name, nothing joined yet
    AwaitingRoomName,
    /// Seated in a room that has no opponent yet
    AwaitingOpponent,
    /// The room expects a move from this session
    MyTurn,
    /// The room expects a move from the opponent
    OpponentTurn,
    /// The session is finished and cleaning up
    Terminated,
}

impl SessionState {
    /// Check if the session is finished
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Check if a game is in progress for this session
    pub fn is_playing(self) -> bool {
        matches!(self, Self::MyTurn | Self::OpponentTurn)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingRoomName => write!(f, "awaiting-room-name"),
            Self::AwaitingOpponent => write!(f, "awaiting-opponent"),
            Self::MyTurn => write!(f, "my-turn"),
            Self::OpponentTurn => write!(f, "opponent-turn"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Server snapshot for non-blocking debug information
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Number of live client sessions
    pub active_sessions: usize,
    /// Total connections since server start
    pub total_connections: u64,
    /// Number of rooms in the registry
    pub active_rooms: usize,
    /// Server bind address
    pub bind_address: SocketAddr,
    /// Server uptime
    pub uptime: Duration,
    /// Server start time
    pub started_at: Instant,
}

impl fmt::Display for ServerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GambitServer {{ sessions: {}, rooms: {}, total: {}, addr: {}, uptime: {:?} }}",
            self.active_sessions,
            self.active_rooms,
            self.total_connections,
            self.bind_address,
            self.uptime
        )
    }
}
