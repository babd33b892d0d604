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

//! Gambit relay server
//!
//! Pairs clients by room name and relays a game of chess between them until
//! the game ends or a player leaves. Stops gracefully on Ctrl+C or SIGTERM.

mod cli;

use clap::Parser;
use cli::Cli;
use gambit_service::{ChessRules, GambitServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let server = GambitServer::new(cli.server_config(), ChessRules::new()).await?;
    server.start().await?;
    info!(bind_address = %server.bind_address(), "Gambit server listening");

    shutdown_signal().await?;
    info!("Shutdown signal received");

    server.shutdown().await?;
    let metrics = server.metrics().snapshot();
    info!(
        connections = metrics.total_connections,
        games = metrics.games_started,
        moves = metrics.moves_applied,
        "Gambit server stopped"
    );
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
