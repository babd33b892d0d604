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

//! Interactive relay client

use crate::{ClientError, Result};
use futures_util::{SinkExt, Stream, StreamExt};
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info};

/// Command the relay accepts to leave a game
const QUIT_COMMAND: &str = "QUIT";

/// What to do with one line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line; nothing is sent
    Empty,
    /// Leave the game and exit
    Quit,
    /// Forward the line to the server
    Send(String),
}

impl Input {
    /// Classify one line of user input
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Input::Empty
        } else if line.eq_ignore_ascii_case("sair") || line.eq_ignore_ascii_case("quit") {
            Input::Quit
        } else {
            Input::Send(line.to_string())
        }
    }
}

/// Why the client stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The user quit
    Quit,
    /// The server closed the connection
    ServerClosed,
    /// User input ended
    InputClosed,
}

/// Connection to a gambit relay
pub struct GameClient {
    framed: Framed<TcpStream, LinesCodec>,
}

impl GameClient {
    /// Connect to the relay at `addr`
    pub async fn connect(addr: SocketAddr, connect_timeout: Duration) -> Result<Self> {
        let stream = timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::ConnectionTimeout)??;
        stream.set_nodelay(true)?;
        info!(%addr, "Connected");
        Ok(Self {
            framed: Framed::new(stream, LinesCodec::new()),
        })
    }

    /// Print server lines to `out` and forward `input` lines to the server
    pub async fn run<I, W>(mut self, mut input: I, out: &mut W) -> Result<Exit>
    where
        I: Stream<Item = std::result::Result<String, LinesCodecError>> + Unpin,
        W: Write,
    {
        let exit = loop {
            tokio::select! {
                line = self.framed.next() => match line {
                    Some(line) => {
                        writeln!(out, "{}", line?)?;
                        out.flush()?;
                    }
                    None => {
                        writeln!(out, "Connection closed by the server.")?;
                        break Exit::ServerClosed;
                    }
                },

                line = input.next() => match line {
                    Some(line) => match Input::parse(&line?) {
                        Input::Empty => {
                            writeln!(out, "Empty input. Type a command.")?;
                        }
                        Input::Quit => {
                            writeln!(out, "Closing connection...")?;
                            self.framed.send(QUIT_COMMAND).await?;
                            break Exit::Quit;
                        }
                        Input::Send(line) => {
                            debug!(line = %line, "Sending");
                            self.framed.send(line).await?;
                        }
                    },
                    None => {
                        self.framed.send(QUIT_COMMAND).await?;
                        break Exit::InputClosed;
                    }
                },
            }
        };

        // Best effort; the server may already be gone
        let _ = SinkExt::<&str>::close(&mut self.framed).await;
        Ok(exit)
    }
}
