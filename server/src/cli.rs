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

//! Command-line interface for gambit-server

use clap::Parser;
use gambit_service::{DEFAULT_PORT, ServerConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Gambit - two-player chess relay over a plain-text line protocol
#[derive(Parser, Debug)]
#[command(name = "gambit-server")]
#[command(about = "Two-player chess relay over TCP", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Address to bind to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Longest accepted line, in bytes
    #[arg(long, default_value_t = 1024)]
    pub max_line_length: usize,

    /// Longest accepted room name, in characters
    #[arg(long, default_value_t = 64)]
    pub max_room_name_len: usize,

    /// Disconnect clients idle for this many seconds (disabled when absent)
    #[arg(long)]
    pub idle_timeout: Option<u64>,

    /// Seconds allowed for a single write to a client
    #[arg(long, default_value_t = 10)]
    pub write_timeout: u64,

    /// Seconds to wait for sessions to finish on shutdown
    #[arg(long, default_value_t = 5)]
    pub shutdown_timeout: u64,
}

impl Cli {
    /// Build the server configuration described by these arguments
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(SocketAddr::new(self.host, self.port))
            .with_max_line_length(self.max_line_length)
            .with_max_room_name_len(self.max_room_name_len)
            .with_idle_timeout(self.idle_timeout.map(Duration::from_secs))
            .with_write_timeout(Duration::from_secs(self.write_timeout))
            .with_shutdown_timeout(Duration::from_secs(self.shutdown_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_server_config() {
        let cli = Cli::try_parse_from(["gambit-server"]).unwrap();
        let config = cli.server_config();
        let defaults = ServerConfig::default();

        assert_eq!(config.bind_address, defaults.bind_address);
        assert_eq!(config.max_line_length, defaults.max_line_length);
        assert_eq!(config.max_room_name_len, defaults.max_room_name_len);
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.write_timeout, defaults.write_timeout);
        assert_eq!(config.shutdown_timeout, defaults.shutdown_timeout);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "gambit-server",
            "--host",
            "0.0.0.0",
            "-p",
            "7000",
            "--idle-timeout",
            "300",
        ])
        .unwrap();
        let config = cli.server_config();

        assert_eq!(config.bind_address, "0.0.0.0:7000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["gambit-server", "--port", "70000"]).is_err());
    }
}
