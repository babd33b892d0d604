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

//! End-to-end tests driving the relay over real TCP sockets

use gambit_service::{ChessRules, GambitServer, ServerConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const BOARD_LINES: usize = 8;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Line-oriented test client
struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        };
        client.expect("Enter the room name to join:").await;
        client
    }

    async fn next(&mut self) -> Option<String> {
        timeout(READ_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for the server")
            .unwrap()
    }

    async fn expect(&mut self, expected: &str) {
        assert_eq!(self.next().await.as_deref(), Some(expected));
    }

    async fn board(&mut self) -> Vec<String> {
        let mut board = Vec::with_capacity(BOARD_LINES);
        for _ in 0..BOARD_LINES {
            board.push(self.next().await.unwrap());
        }
        board
    }

    async fn expect_closed(&mut self) {
        assert_eq!(self.next().await, None);
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(line.as_bytes()).await;
        self.send_raw(b"\n").await;
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }
}

async fn start_server(config: ServerConfig) -> GambitServer<ChessRules> {
    let server = GambitServer::new(config, ChessRules::new()).await.unwrap();
    server.start().await.unwrap();
    server
}

fn local_config() -> ServerConfig {
    ServerConfig::new("127.0.0.1:0".parse().unwrap())
}

/// Seat two clients in `room` and consume the start-of-game notices
async fn paired(addr: SocketAddr, room: &str) -> (TestClient, TestClient) {
    let mut first = TestClient::connect(addr).await;
    first.send(room).await;
    first.expect(&format!("Joined room {room} as Player 1.")).await;
    first.expect("Waiting for an opponent...").await;

    let mut second = TestClient::connect(addr).await;
    second.send(room).await;
    second.expect(&format!("Joined room {room} as Player 2.")).await;
    second.expect("Game started!").await;
    second.board().await;
    second.expect("Wait for your opponent...").await;
    second.expect("Player 1 to move.").await;

    first.expect("Game started!").await;
    first.board().await;
    first.expect("Your turn!").await;
    first.expect("Player 1 to move.").await;

    (first, second)
}

/// Wait until `condition` holds or a second has passed
async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_move_is_broadcast_to_both_players() {
    let server = start_server(local_config()).await;
    let (mut a, mut b) = paired(server.bind_address(), "r1").await;

    a.send("MOV:e2e4").await;

    for client in [&mut a, &mut b] {
        client.expect("MOV:e2e4").await;
        let board = client.board().await;
        assert_eq!(board[0], "r n b q k b n r");
        assert_eq!(board[4], ". . . . P . . .");
        assert_eq!(board[6], "P P P P . P P P");
    }
    a.expect("Wait for your opponent...").await;
    b.expect("Your turn!").await;
    for client in [&mut a, &mut b] {
        client.expect("Player 2 to move.").await;
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_out_of_turn_and_illegal_moves_reach_sender_only() {
    let server = start_server(local_config()).await;
    let (mut a, mut b) = paired(server.bind_address(), "r1").await;

    b.send("MOV:e7e5").await;
    b.expect("It is not your turn!").await;

    a.send("MOV:e2e5").await;
    a.expect("Invalid move e2e5. Try again.").await;

    a.send("e2e4").await;
    a.expect("Invalid input. Send a move in the format 'MOV:e2e4'.").await;

    a.send("").await;
    a.expect("Empty input. Try again.").await;

    // Neither rejection produced anything for the opponent
    a.send("MOV:d2d4").await;
    b.expect("MOV:d2d4").await;
    a.expect("MOV:d2d4").await;

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_utf8_mid_game_is_a_format_error() {
    let server = start_server(local_config()).await;
    let (mut a, mut b) = paired(server.bind_address(), "r1").await;

    a.send_raw(b"MOV:e2\xe94\n").await;
    a.expect("Invalid input. Send a move in the format 'MOV:e2e4'.").await;

    // The game carries on for both players
    a.send("MOV:e2e4").await;
    for client in [&mut a, &mut b] {
        client.expect("MOV:e2e4").await;
        client.board().await;
    }
    a.expect("Wait for your opponent...").await;
    b.expect("Your turn!").await;
    assert!(!server.registry().get("r1").unwrap().is_game_over());

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_checkmate_ends_the_game() {
    let server = start_server(local_config()).await;
    let (mut a, mut b) = paired(server.bind_address(), "r1").await;

    let opening = [("f2f3", true), ("e7e5", false), ("g2g4", true)];
    for (notation, white) in opening {
        let (mover, other) = if white { (&mut a, &mut b) } else { (&mut b, &mut a) };
        mover.send(&format!("MOV:{notation}")).await;
        for client in [&mut *mover, &mut *other] {
            client.expect(&format!("MOV:{notation}")).await;
            client.board().await;
        }
        mover.expect("Wait for your opponent...").await;
        other.expect("Your turn!").await;
        let next = if white { "Player 2 to move." } else { "Player 1 to move." };
        mover.expect(next).await;
        other.expect(next).await;
    }

    b.send("MOV:d8h4").await;
    for client in [&mut a, &mut b] {
        client.expect("MOV:d8h4").await;
        let echoed = client.board().await;
        client.expect("Warning: Check!").await;
        client.expect("Game over: checkmate! Player 2 wins.").await;
        let final_board = client.board().await;
        assert_eq!(final_board, echoed);
        assert_eq!(final_board[4], ". . . . . . P q");
        client.expect_closed().await;
    }

    let registry = server.registry();
    assert!(eventually(|| registry.is_empty()).await);
    assert_eq!(server.metrics().snapshot().games_finished, 1);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_third_player_is_refused() {
    let server = start_server(local_config()).await;
    let (_a, _b) = paired(server.bind_address(), "r1").await;

    let mut c = TestClient::connect(server.bind_address()).await;
    c.send("r1").await;
    c.expect("Room r1 is full!").await;
    c.expect_closed().await;

    assert_eq!(server.registry().get("r1").unwrap().player_count(), 2);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_while_waiting_removes_room() {
    let server = start_server(local_config()).await;
    let addr = server.bind_address();
    let registry = server.registry();

    let mut a = TestClient::connect(addr).await;
    a.send("r1").await;
    a.expect("Joined room r1 as Player 1.").await;
    a.expect("Waiting for an opponent...").await;
    assert!(registry.get("r1").is_some());

    drop(a);
    assert!(eventually(|| registry.get("r1").is_none()).await);

    let mut b = TestClient::connect(addr).await;
    b.send("r1").await;
    b.expect("Joined room r1 as Player 1.").await;
    b.expect("Waiting for an opponent...").await;

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_opponent_disconnect_ends_game() {
    let server = start_server(local_config()).await;
    let (a, mut b) = paired(server.bind_address(), "r1").await;

    drop(a);
    b.expect("Your opponent disconnected. The game is over.").await;
    b.expect_closed().await;

    let registry = server.registry();
    assert!(eventually(|| registry.is_empty()).await);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_opponent_quit_ends_game() {
    let server = start_server(local_config()).await;
    let (mut a, mut b) = paired(server.bind_address(), "r1").await;

    a.send("sair").await;
    a.expect("Goodbye.").await;
    a.expect_closed().await;

    b.expect("Your opponent quit. The game is over.").await;
    b.expect_closed().await;

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_join_creates_one_room() {
    let server = start_server(local_config()).await;
    let addr = server.bind_address();

    let join = |addr| async move {
        let mut client = TestClient::connect(addr).await;
        client.send("r2").await;
        let joined = client.next().await.unwrap();
        (client, joined)
    };
    let ((_a, first), (_b, second)) = tokio::join!(join(addr), join(addr));

    let mut seats = vec![first, second];
    seats.sort();
    assert_eq!(
        seats,
        vec![
            "Joined room r2 as Player 1.".to_string(),
            "Joined room r2 as Player 2.".to_string(),
        ]
    );
    assert_eq!(server.registry().len(), 1);
    assert_eq!(server.registry().get("r2").unwrap().player_count(), 2);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_long_line_is_rejected_without_disconnect() {
    let config = local_config()
        .with_max_line_length(32)
        .with_max_room_name_len(16);
    let server = start_server(config).await;

    let mut a = TestClient::connect(server.bind_address()).await;
    a.send(&"x".repeat(100)).await;
    a.expect("Message too long. Try again.").await;

    a.send("r1").await;
    a.expect("Joined room r1 as Player 1.").await;

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_notifies_every_client() {
    let server = start_server(local_config()).await;
    let addr = server.bind_address();

    let mut waiting = TestClient::connect(addr).await;
    waiting.send("r1").await;
    waiting.expect("Joined room r1 as Player 1.").await;
    waiting.expect("Waiting for an opponent...").await;

    let mut idle = TestClient::connect(addr).await;
    assert!(eventually(|| server.session_count() == 2).await);

    server.shutdown().await.unwrap();

    for client in [&mut waiting, &mut idle] {
        client
            .expect("The server is shutting down. Connection closed.")
            .await;
        client.expect_closed().await;
    }
    assert!(server.registry().is_empty());
    assert!(!server.is_running());
    assert!(TcpStream::connect(addr).await.is_err());
}
