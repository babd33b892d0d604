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

//! Relay server
//!
//! The [`GambitServer`] owns the TCP listener, spawns one [`ClientSession`]
//! per accepted connection and coordinates shutdown.

use crate::session::{ClientSession, SessionConfig};
use crate::{
    ConnectionId, LineConnection, RelayError, Result, RoomRegistry, ServerConfig, ServerMessage,
    ServerMetrics, ServerSnapshot,
};
use dashmap::DashMap;
use gambit_rules::RulesEngine;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

type Outboxes = DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>;

/// Two-player game relay
///
/// # Example
///
/// ```no_run
/// use gambit_rules::ChessRules;
/// use gambit_service::{GambitServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = GambitServer::new(ServerConfig::default(), ChessRules::new()).await?;
///     server.start().await?;
///
///     tokio::signal::ctrl_c().await?;
///     server.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct GambitServer<R: RulesEngine> {
    config: ServerConfig,
    registry: Arc<RoomRegistry<R>>,
    metrics: Arc<ServerMetrics>,
    /// Outbox of every live session, for shutdown notices
    sessions: Arc<Outboxes>,
    tracker: TaskTracker,
    /// Taken by the accept loop on start
    listener: Mutex<Option<TcpListener>>,
    bind_address: SocketAddr,
    started_at: Instant,
    running: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    accept_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    next_id: Arc<AtomicU64>,
}

impl<R: RulesEngine> GambitServer<R> {
    /// Create a server bound to the configured address
    ///
    /// Connections are not accepted until [`start`](Self::start) is called.
    pub async fn new(config: ServerConfig, rules: R) -> Result<Self> {
        config.validate().map_err(RelayError::InvalidConfig)?;

        let listener = TcpListener::bind(config.bind_address).await?;
        let bind_address = listener.local_addr()?;
        let metrics = Arc::new(ServerMetrics::new());
        let registry = Arc::new(RoomRegistry::new(Arc::new(rules), metrics.clone()));

        info!(%bind_address, "Gambit server bound");

        Ok(Self {
            config,
            registry,
            metrics,
            sessions: Arc::new(DashMap::new()),
            tracker: TaskTracker::new(),
            listener: Mutex::new(Some(listener)),
            bind_address,
            started_at: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            accept_handle: tokio::sync::Mutex::new(None),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Start accepting connections
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(RelayError::ServerAlreadyRunning);
        }
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(listener) = listener else {
            // Already started and shut down once
            self.running.store(false, Ordering::SeqCst);
            return Err(RelayError::ServerAlreadyRunning);
        };

        info!(bind_address = %self.bind_address, "Starting Gambit server");
        let handle = tokio::spawn(self.acceptor().run(listener));
        *self.accept_handle.lock().await = Some(handle);
        Ok(())
    }

    fn acceptor(&self) -> Acceptor<R> {
        Acceptor {
            registry: self.registry.clone(),
            metrics: self.metrics.clone(),
            sessions: self.sessions.clone(),
            tracker: self.tracker.clone(),
            running: self.running.clone(),
            shutdown_notify: self.shutdown_notify.clone(),
            next_id: self.next_id.clone(),
            max_line_length: self.config.max_line_length,
            session_config: SessionConfig::from(&self.config),
        }
    }

    /// Shut the server down
    ///
    /// Stops accepting, tells every client the server is going away, drops
    /// all rooms and waits up to the configured shutdown timeout for the
    /// sessions to finish.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(RelayError::ServerNotRunning);
        }
        info!("Shutting down Gambit server");

        self.shutdown_notify.notify_one();
        if let Some(handle) = self.accept_handle.lock().await.take() {
            let _ = timeout(self.config.shutdown_timeout, handle).await;
        }

        self.registry.shutdown();
        for entry in self.sessions.iter() {
            let _ = entry.value().send(ServerMessage::ServerShutdown);
        }

        self.tracker.close();
        if timeout(self.config.shutdown_timeout, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                sessions = self.sessions.len(),
                "Sessions still running after shutdown timeout"
            );
        }

        info!("Gambit server shutdown complete");
        Ok(())
    }

    /// Check if the server is accepting connections
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the address the server is bound to
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Get the number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Get a snapshot of the server state
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            active_sessions: self.sessions.len(),
            total_connections: self.metrics.total_connections(),
            active_rooms: self.registry.len(),
            bind_address: self.bind_address,
            uptime: self.started_at.elapsed(),
            started_at: self.started_at,
        }
    }

    /// Get the room registry
    pub fn registry(&self) -> Arc<RoomRegistry<R>> {
        self.registry.clone()
    }

    /// Get the server metrics
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// State moved into the accept loop task
struct Acceptor<R: RulesEngine> {
    registry: Arc<RoomRegistry<R>>,
    metrics: Arc<ServerMetrics>,
    sessions: Arc<Outboxes>,
    tracker: TaskTracker,
    running: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    next_id: Arc<AtomicU64>,
    max_line_length: usize,
    session_config: SessionConfig,
}

impl<R: RulesEngine> Acceptor<R> {
    async fn run(self, listener: TcpListener) {
        while self.running.load(Ordering::SeqCst) {
            let accepted = tokio::select! {
                result = listener.accept() => result,
                _ = self.shutdown_notify.notified() => break,
            };

            let (socket, peer_addr) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    self.metrics.connection_error();
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            match LineConnection::wrap(socket, id, self.max_line_length) {
                Ok(connection) => {
                    info!(connection_id = %id, %peer_addr, "Connection established");
                    self.spawn_session(connection);
                }
                Err(e) => {
                    error!(connection_id = %id, error = %e, "Failed to wrap connection");
                    self.metrics.connection_error();
                }
            }
        }

        debug!("Accept loop terminated");
    }

    fn spawn_session(&self, connection: LineConnection) {
        let id = connection.id();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        // Registered before the task exists so shutdown can always reach it
        self.sessions.insert(id, outbox_tx.clone());
        self.metrics.connection_opened();

        let session = ClientSession::new(
            connection,
            self.registry.clone(),
            self.metrics.clone(),
            self.session_config.clone(),
            outbox_tx,
            outbox_rx,
        );
        let sessions = self.sessions.clone();
        let metrics = self.metrics.clone();
        self.tracker.spawn(async move {
            let start = Instant::now();
            session.run().await;
            sessions.remove(&id);
            metrics.connection_closed(start.elapsed());
        });
    }
}

impl<R: RulesEngine> std::fmt::Debug for GambitServer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GambitServer")
            .field("bind_address", &self.bind_address)
            .field("running", &self.is_running())
            .field("sessions", &self.session_count())
            .field("rooms", &self.registry.len())
            .field("uptime", &self.started_at.elapsed())
            .finish()
    }
}

impl<R: RulesEngine> Drop for GambitServer<R> {
    fn drop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            warn!("GambitServer dropped while still running");
            self.shutdown_notify.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_rules::ChessRules;

    fn config() -> ServerConfig {
        ServerConfig::new("127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn test_server_lifecycle() {
        let server = GambitServer::new(config(), ChessRules::new()).await.unwrap();
        assert!(!server.is_running());
        assert_ne!(server.bind_address().port(), 0);

        server.start().await.unwrap();
        assert!(server.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;

        server.shutdown().await.unwrap();
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_server_double_start() {
        let server = GambitServer::new(config(), ChessRules::new()).await.unwrap();
        server.start().await.unwrap();

        assert!(matches!(
            server.start().await,
            Err(RelayError::ServerAlreadyRunning)
        ));

        server.shutdown().await.unwrap();
        assert!(matches!(
            server.shutdown().await,
            Err(RelayError::ServerNotRunning)
        ));
        assert!(server.start().await.is_err());
    }

    #[tokio::test]
    async fn test_server_snapshot() {
        let server = GambitServer::new(config(), ChessRules::new()).await.unwrap();
        let snapshot = server.snapshot();

        assert_eq!(snapshot.active_sessions, 0);
        assert_eq!(snapshot.total_connections, 0);
        assert_eq!(snapshot.active_rooms, 0);
        assert_eq!(snapshot.bind_address, server.bind_address());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = config().with_max_line_length(0);
        let result = GambitServer::new(config, ChessRules::new()).await;
        assert!(matches!(result, Err(RelayError::InvalidConfig(_))));
    }
}
