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

//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default TCP port the relay listens on
pub const DEFAULT_PORT: u16 = 65432;

/// Server configuration
///
/// This structure contains all configuration options for the relay server.
/// Use the builder pattern methods to customize the configuration.
///
/// # Example
///
/// ```
/// use gambit_service::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::default()
///     .with_max_line_length(512)
///     .with_idle_timeout(Some(Duration::from_secs(600)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum length of a single inbound line, in bytes
    ///
    /// Longer lines are discarded and the client is told so.
    pub max_line_length: usize,

    /// Maximum length of a room name, in characters
    pub max_room_name_len: usize,

    /// Timeout for idle sessions (no inbound line)
    ///
    /// `None` disables the timeout.
    pub idle_timeout: Option<Duration>,

    /// Timeout for write operations
    ///
    /// A client that cannot accept a line within this duration is dropped.
    pub write_timeout: Duration,

    /// Timeout for graceful shutdown
    ///
    /// The server will wait this long for sessions to close after the
    /// shutdown notice before abandoning them.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            max_line_length: 1024,
            max_room_name_len: 64,
            idle_timeout: None,
            write_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given bind address
    ///
    /// All other settings will use their default values.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Set the maximum inbound line length
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Set the maximum room name length
    pub fn with_max_room_name_len(mut self, max: usize) -> Self {
        self.max_room_name_len = max;
        self
    }

    /// Set the idle timeout duration
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the write timeout duration
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the shutdown timeout duration
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validate the configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_length == 0 {
            return Err("max_line_length must be greater than 0".to_string());
        }

        if self.max_room_name_len == 0 {
            return Err("max_room_name_len must be greater than 0".to_string());
        }

        if self.max_room_name_len > self.max_line_length {
            return Err("max_room_name_len must not exceed max_line_length".to_string());
        }

        if self.idle_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err("idle_timeout must be greater than 0".to_string());
        }

        if self.write_timeout.is_zero() {
            return Err("write_timeout must be greater than 0".to_string());
        }

        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
