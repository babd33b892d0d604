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

//! Gambit relay service
//!
//! A TCP relay that lets two remote clients play a game of chess over a
//! plain-text line protocol. Clients name a room; the first two clients to
//! name the same room are paired, and the relay enforces turn order, checks
//! every move against a [`RulesEngine`] and broadcasts the result.
//!
//! # Architecture
//!
//! ```text
//! GambitServer (listener)
//!     ↓ one task per connection
//! ClientSession → LineConnection
//!     ↓ room name
//! RoomRegistry → GameRoom ⇄ RulesEngine
//!     ↓ outbox channels
//! ClientSession (both players)
//! ```
//!
//! Each [`GameRoom`] serializes its own admissions, moves and departures
//! behind one lock; unrelated rooms never contend. The room pushes every
//! notice into the players' outboxes while it still holds that lock, so both
//! players observe the same order of events.
//!
//! # Example
//!
//! ```no_run
//! use gambit_service::{ChessRules, GambitServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("0.0.0.0:65432".parse()?);
//!     let server = GambitServer::new(config, ChessRules::new()).await?;
//!     server.start().await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod codec;
mod config;
mod connection;
mod error;
mod metrics;
mod protocol;
mod registry;
mod room;
mod server;
mod session;
mod types;

pub use codec::{InboundLine, RelayLineCodec};
pub use config::{DEFAULT_PORT, ServerConfig};
pub use connection::LineConnection;
pub use error::{RelayError, Result};
pub use gambit_rules::{ChessBoard, ChessRules, RulesEngine, TerminalCondition};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use protocol::{Command, MOVE_PREFIX, ServerMessage, parse_room_name};
pub use registry::RoomRegistry;
pub use room::{Departure, GameRoom, MoveOutcome, PlayerHandle};
pub use server::GambitServer;
pub use session::{ClientSession, SessionConfig};
pub use types::{ConnectionId, PlayerIndex, ServerSnapshot, SessionState};
