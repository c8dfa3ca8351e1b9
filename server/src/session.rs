//! Per-connection player state
//!
//! A `Session` is created when a connection is accepted and dropped when the
//! connection goes away. Dropping it drops the outbound queue, which ends the
//! writer task and closes the socket's write half.
//!
//! Opponent links are plain session ids looked up through the registry, so a
//! link to a departed session simply fails to resolve.

use crate::line_buffer::LineAssembler;
use arena_protocol::{COMMAND_CAPACITY, MAX_HITPOINTS, NAME_CAPACITY, SPEAK_CAPACITY};
use log::warn;
use std::net::SocketAddr;
use tokio::sync::mpsc;

pub type SessionId = u32;

/// Coarse lifecycle state derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unnamed,
    Idle,
    InMatch,
}

/// Which reassembly context the next input bytes belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Name,
    Speech,
    Command,
}

#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub addr: SocketAddr,
    pub name: String,
    pub name_set: bool,
    /// Set only while in a match; mirrored on the opponent
    pub opponent: Option<SessionId>,
    /// Most recent finished opponent, used to avoid immediate rematches
    pub last_opponent: Option<SessionId>,
    pub hitpoints: u32,
    pub power_moves: u32,
    pub is_turn: bool,
    pub speaking: bool,
    pub speak_count: u32,
    pub mute_toggle: bool,
    pub(crate) name_input: LineAssembler,
    pub(crate) speech_input: LineAssembler,
    pub(crate) command_input: LineAssembler,
    outbox: mpsc::UnboundedSender<String>,
}

impl Session {
    pub fn new(
        id: SessionId,
        addr: SocketAddr,
        power_moves: u32,
        outbox: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            id,
            addr,
            name: String::new(),
            name_set: false,
            opponent: None,
            last_opponent: None,
            hitpoints: MAX_HITPOINTS,
            power_moves,
            is_turn: false,
            speaking: false,
            speak_count: 0,
            mute_toggle: false,
            name_input: LineAssembler::new(NAME_CAPACITY),
            speech_input: LineAssembler::new(SPEAK_CAPACITY),
            command_input: LineAssembler::new(COMMAND_CAPACITY),
            outbox,
        }
    }

    pub fn in_game(&self) -> bool {
        self.opponent.is_some()
    }

    /// Named and not currently in a match
    pub fn is_idle(&self) -> bool {
        self.name_set && !self.in_game()
    }

    pub fn state(&self) -> SessionState {
        if !self.name_set {
            SessionState::Unnamed
        } else if self.in_game() {
            SessionState::InMatch
        } else {
            SessionState::Idle
        }
    }

    pub fn capture(&self) -> Capture {
        if !self.name_set {
            Capture::Name
        } else if self.speaking {
            Capture::Speech
        } else {
            Capture::Command
        }
    }

    /// Feeds raw bytes to the active capture context; see `LineAssembler::feed`.
    pub(crate) fn feed(&mut self, input: &[u8]) -> (usize, Option<String>) {
        match self.capture() {
            Capture::Name => self.name_input.feed(input),
            Capture::Speech => self.speech_input.feed(input),
            Capture::Command => self.command_input.feed(input),
        }
    }

    /// Restores lobby values after a match, keeping name and rematch history.
    pub fn reset_to_lobby(&mut self, power_moves: u32) {
        self.opponent = None;
        self.hitpoints = MAX_HITPOINTS;
        self.power_moves = power_moves;
        self.is_turn = false;
        self.speaking = false;
        self.speak_count = 0;
        self.speech_input.clear();
    }

    /// Queues text for the writer task; returns false if the connection is gone.
    pub fn send(&self, text: String) -> bool {
        if self.outbox.send(text).is_err() {
            warn!("Failed to queue message for client {} ({})", self.id, self.addr);
            return false;
        }
        true
    }
}
