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

//! Gambit line client
//!
//! Connects to a gambit relay, prints everything the server says and forwards
//! what the user types. `sair` or `quit` leaves the game.

mod client;
mod error;

use client::GameClient;
use error::{ClientError, Result};

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Interactive client for the gambit chess relay
#[derive(Parser, Debug)]
#[command(name = "gambit-client")]
#[command(about = "Play chess through a gambit relay", long_about = None)]
#[command(version)]
struct Cli {
    /// Relay address
    #[arg(default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Relay port
    #[arg(default_value_t = 65432)]
    port: u16,

    /// Seconds to wait for the connection to open
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let addr = SocketAddr::new(cli.host, cli.port);
    let client = GameClient::connect(addr, Duration::from_secs(cli.connect_timeout)).await?;

    let input = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    let exit = client.run(input, &mut std::io::stdout()).await?;
    debug!(?exit, "Client finished");
    Ok(())
}
