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

//! Lock-free metrics for the relay server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free server metrics
///
/// All metrics are stored as atomics and can be accessed concurrently
/// without locks. Use the `snapshot()` method to get a view of all metrics
/// at a point in time.
#[derive(Debug)]
pub struct ServerMetrics {
    // Connection counts
    total_connections: AtomicU64,
    active_connections: AtomicU64,

    // Rooms and games
    rooms_created: AtomicU64,
    rooms_removed: AtomicU64,
    games_started: AtomicU64,
    games_finished: AtomicU64,

    // Moves
    moves_applied: AtomicU64,
    moves_rejected: AtomicU64,

    // Throughput
    messages_sent: AtomicU64,
    messages_received: AtomicU64,

    // Errors
    connection_errors: AtomicU64,
    protocol_errors: AtomicU64,
    timeout_errors: AtomicU64,

    // Timing (stored as nanoseconds)
    total_connection_duration_ns: AtomicU64,

    // Server start time
    started_at: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            rooms_created: AtomicU64::new(0),
            rooms_removed: AtomicU64::new(0),
            games_started: AtomicU64::new(0),
            games_finished: AtomicU64::new(0),
            moves_applied: AtomicU64::new(0),
            moves_rejected: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            timeout_errors: AtomicU64::new(0),
            total_connection_duration_ns: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    // Connection tracking

    /// Record a new connection being opened
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection being closed
    pub fn connection_closed(&self, duration: Duration) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
        self.total_connection_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Get the current number of active connections
    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get the total number of connections since server start
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    // Room and game tracking

    /// Record a room being created in the registry
    pub fn room_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a room being evicted from the registry
    pub fn room_removed(&self) {
        self.rooms_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a room seating its second player
    pub fn game_started(&self) {
        self.games_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a game reaching a terminal condition or being abandoned
    pub fn game_finished(&self) {
        self.games_finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a move accepted by the rules engine
    pub fn move_applied(&self) {
        self.moves_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a move rejected for turn order or legality
    pub fn move_rejected(&self) {
        self.moves_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Throughput tracking

    /// Record a line sent
    pub fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a line received
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    // Error tracking

    /// Record a connection error
    pub fn connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a protocol error (malformed or oversized line)
    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a timeout error
    pub fn timeout_error(&self) {
        self.timeout_errors.fetch_add(1, Ordering::Relaxed);
    }

    // Snapshot

    /// Get a snapshot of all metrics
    ///
    /// The snapshot may not be perfectly consistent if metrics are being
    /// updated concurrently, but it is close enough for monitoring.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            rooms_removed: self.rooms_removed.load(Ordering::Relaxed),
            games_started: self.games_started.load(Ordering::Relaxed),
            games_finished: self.games_finished.load(Ordering::Relaxed),
            moves_applied: self.moves_applied.load(Ordering::Relaxed),
            moves_rejected: self.moves_rejected.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            timeout_errors: self.timeout_errors.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
            avg_connection_duration: self.average_connection_duration(),
        }
    }

    fn average_connection_duration(&self) -> Duration {
        let closed = self.total_connections.load(Ordering::Relaxed)
            - self.active_connections.load(Ordering::Relaxed);
        if closed == 0 {
            return Duration::ZERO;
        }
        let total_ns = self.total_connection_duration_ns.load(Ordering::Relaxed);
        Duration::from_nanos(total_ns / closed)
    }
}

/// A snapshot of server metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total connections since server start
    pub total_connections: u64,
    /// Current active connections
    pub active_connections: u64,
    /// Rooms created since server start
    pub rooms_created: u64,
    /// Rooms evicted since server start
    pub rooms_removed: u64,
    /// Games that seated two players
    pub games_started: u64,
    /// Games that ended or were abandoned
    pub games_finished: u64,
    /// Moves accepted
    pub moves_applied: u64,
    /// Moves rejected
    pub moves_rejected: u64,
    /// Total lines sent
    pub messages_sent: u64,
    /// Total lines received
    pub messages_received: u64,
    /// Total connection errors
    pub connection_errors: u64,
    /// Total protocol errors
    pub protocol_errors: u64,
    /// Total timeout errors
    pub timeout_errors: u64,
    /// Server uptime
    pub uptime: Duration,
    /// Average duration of closed connections
    pub avg_connection_duration: Duration,
}

impl MetricsSnapshot {
    /// Number of rooms currently in the registry
    pub fn active_rooms(&self) -> u64 {
        self.rooms_created.saturating_sub(self.rooms_removed)
    }

    /// Calculate total error count
    pub fn total_errors(&self) -> u64 {
        self.connection_errors + self.protocol_errors + self.timeout_errors
    }

    /// Calculate moves per second
    pub fn moves_per_sec(&self) -> f64 {
        if self.uptime.is_zero() {
            return 0.0;
        }
        self.moves_applied as f64 / self.uptime.as_secs_f64()
    }
}
