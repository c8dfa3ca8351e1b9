//! Integration tests for the arena server
//!
//! These tests run a real server on an ephemeral port and talk to it over TCP
//! the way a terminal client would.

use arena_protocol::TURN_PROMPT;
use arena_server::{Arena, Server};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server(seed: u64) -> SocketAddr {
    let mut server = Server::with_arena(
        "127.0.0.1:0",
        Duration::from_secs(10),
        Arena::with_seed(seed),
    )
    .await
    .expect("Failed to bind server");
    let addr = server.local_addr();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

/// A scripted terminal user
struct Player {
    stream: TcpStream,
    seen: String,
}

impl Player {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("Failed to connect");
        let mut player = Player {
            stream,
            seen: String::new(),
        };
        player.expect("Please enter your name:").await;
        player
    }

    async fn join(addr: SocketAddr, name: &str) -> Self {
        let mut player = Self::connect(addr).await;
        player.send(name).await;
        player.expect(&format!("Welcome, {}!", name)).await;
        player
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(format!("{}\n", line).as_bytes()).await;
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        assert_ok!(self.stream.write_all(bytes).await);
    }

    /// Reads until `needle` shows up; returns and consumes text through it.
    async fn expect(&mut self, needle: &str) -> String {
        self.expect_any(&[needle]).await.1
    }

    async fn expect_any(&mut self, needles: &[&str]) -> (usize, String) {
        let mut buf = [0u8; 1024];
        loop {
            let found = needles
                .iter()
                .enumerate()
                .filter_map(|(i, needle)| self.seen.find(needle).map(|pos| (pos, i)))
                .min();
            if let Some((pos, i)) = found {
                let end = pos + needles[i].len();
                let text: String = self.seen.drain(..end).collect();
                return (i, text);
            }

            let len = timeout(WAIT, self.stream.read(&mut buf))
                .await
                .unwrap_or_else(|_| panic!("Timed out waiting for {:?}, saw {:?}", needles, self.seen))
                .expect("Read failed");
            assert!(len > 0, "Connection closed while waiting for {:?}", needles);
            self.seen.push_str(&String::from_utf8_lossy(&buf[..len]));
        }
    }

    /// Waits for the opening message and reports whether this player acts first.
    async fn opening(&mut self, opponent: &str) -> bool {
        self.expect(&format!("You engage {}!", opponent)).await;
        let (which, _) = self.expect_any(&[TURN_PROMPT, "to strike..."]).await;
        which == 0
    }
}

/// Matches two fresh players and returns them as (acting, waiting).
async fn matched_pair(addr: SocketAddr) -> (Player, Player) {
    let mut alice = Player::join(addr, "Alice").await;
    let mut bob = Player::join(addr, "Bob").await;

    let alice_first = alice.opening("Bob").await;
    let bob_first = bob.opening("Alice").await;
    assert_ne!(alice_first, bob_first, "exactly one player holds the turn");

    if alice_first {
        (alice, bob)
    } else {
        (bob, alice)
    }
}

/// CONNECTION AND REGISTRATION TESTS
mod lobby_tests {
    use super::*;

    #[tokio::test]
    async fn greeting_and_join_announcement() {
        let addr = start_server(1).await;
        let mut watcher = Player::connect(addr).await;
        let _alice = Player::join(addr, "Alice").await;

        watcher.expect("Alice joins the Arena").await;
    }

    #[tokio::test]
    async fn name_split_across_writes() {
        let addr = start_server(2).await;
        let mut player = Player::connect(addr).await;

        player.send_raw(b"Al").await;
        sleep(Duration::from_millis(50)).await;
        player.send_raw(b"ice\r\n").await;

        player.expect("Welcome, Alice! Awaiting opponent...").await;
    }

    #[tokio::test]
    async fn departure_is_announced() {
        let addr = start_server(3).await;
        let mut watcher = Player::connect(addr).await;
        let alice = Player::join(addr, "Alice").await;
        watcher.expect("Alice joins the Arena").await;

        drop(alice);

        watcher.expect("Alice left the Arena").await;
    }
}

/// BATTLE FLOW TESTS
mod battle_tests {
    use super::*;

    #[tokio::test]
    async fn attack_passes_the_turn() {
        let addr = start_server(4).await;
        let (mut actor, mut waiter) = matched_pair(addr).await;

        actor.send("a").await;

        let report = waiter.expect(TURN_PROMPT).await;
        assert!(report.contains("hits you for 5 damage!"));
        assert!(report.contains("Your hitpoints: 25"));
        let own = actor.expect("to strike...").await;
        assert!(own.contains("for 5 damage!"));
    }

    #[tokio::test]
    async fn chat_reaches_opponent() {
        let addr = start_server(5).await;
        let (mut actor, mut waiter) = matched_pair(addr).await;

        actor.send_raw(b"s\ngood luck\n").await;

        actor.expect("You speak: good luck").await;
        waiter.expect("takes a break to tell you:\ngood luck").await;
    }

    #[tokio::test]
    async fn waiting_player_can_mute() {
        let addr = start_server(6).await;
        let (mut actor, mut waiter) = matched_pair(addr).await;

        waiter.send("m").await;
        waiter.expect("Chat is now muted.").await;

        actor.send("s").await;
        actor.expect("their mute toggle is on").await;
    }

    #[tokio::test]
    async fn fight_to_knockout_then_no_rematch() {
        let addr = start_server(7).await;
        let (first, second) = matched_pair(addr).await;
        let mut players = [first, second];

        // attacks only: the first player lands the sixth hit on the 11th blow
        for blow in 0..11 {
            let (actor, target) = if blow % 2 == 0 { (0, 1) } else { (1, 0) };
            players[actor].send("a").await;
            players[target].expect("hits you for 5 damage!").await;
        }

        players[0].expect("Victory!").await;
        players[1].expect("Defeat!").await;

        // winner scans first, skips the loser and takes the newcomer
        let mut carol = Player::join(addr, "Carol").await;
        carol.expect("You engage").await;
        let (which, _) = players[0].expect_any(&["You engage Carol!"]).await;
        assert_eq!(which, 0);
    }

    #[tokio::test]
    async fn disconnect_mid_match_awards_opponent() {
        let addr = start_server(8).await;
        let (actor, mut waiter) = matched_pair(addr).await;

        drop(actor);

        waiter.expect("disconnected. You win!").await;
    }
}
