//! # Arena Server Library
//!
//! A turn-based battle arena played over plain TCP text lines. Players
//! connect (telnet or netcat is enough), type a name, and are paired with
//! another waiting player. The player holding the turn may attack, use a
//! power move, say something to the opponent, or toggle mute.
//!
//! ## Architecture Design
//!
//! ### Single Coordinating Task
//! All arena state (the registry, every session, the random source) is owned
//! by one task running `network::Server::run`. Network tasks never touch that
//! state; they forward events over one ordered channel. Each wake-up handles
//! every queued event, then runs a single matchmaking pass.
//!
//! ### Per-Connection Tasks
//! - **Acceptor**: accepts connections and hands the streams to the loop
//! - **Reader**: forwards raw reads, which may hold part of a line or several
//! - **Writer**: drains the session's outbound queue into the socket
//!
//! ## Module Organization
//!
//! ### Registry (`registry`)
//! Ordered collection of sessions with append, remove, move-to-tail and
//! in-order iteration.
//!
//! ### Line Buffer (`line_buffer`)
//! Bounded reassembly of newline-terminated lines from arbitrary reads.
//!
//! ### Session (`session`)
//! Per-connection player fields and the outbound queue.
//!
//! ### Arena, Battle and Matchmaker (`arena`, `battle`, `matchmaker`)
//! Connection lifecycle, broadcast, the per-session command state machine,
//! combat rules and pairing of idle players.
//!
//! ### Network (`network`)
//! The TCP multiplexer and main loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use arena_server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), arena_server::BoxError> {
//!     let mut server = Server::new("0.0.0.0:51360", Duration::from_secs(10)).await?;
//!     server.run().await
//! }
//! ```

pub mod arena;
pub mod battle;
pub mod line_buffer;
pub mod matchmaker;
pub mod network;
pub mod registry;
pub mod session;

pub use arena::Arena;
pub use network::Server;
pub use session::{Session, SessionId};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
