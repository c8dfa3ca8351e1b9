pub mod text;

pub const MAX_HITPOINTS: u32 = 30;
pub const ATTACK_DAMAGE: u32 = 5;
pub const POWER_MOVE_DAMAGE: u32 = 15;
pub const POWER_MOVE_HIT_CHANCE: f64 = 0.4;
pub const MIN_POWER_MOVES: u32 = 1;
pub const MAX_POWER_MOVES: u32 = 3;

/// Successful speak attempts allowed per turn phase before the player is told off
pub const SPEAK_ALLOWANCE: u32 = 2;

/// Bytes kept for a display name, excess is dropped
pub const NAME_CAPACITY: usize = 49;
/// Bytes kept for one chat line, excess is dropped
pub const SPEAK_CAPACITY: usize = 99;
/// Bytes kept for one command line, excess is dropped
pub const COMMAND_CAPACITY: usize = 99;
/// Upper bound on a single socket read
pub const READ_CHUNK: usize = 99;

pub const DEFAULT_PORT: u16 = 51360;
pub const DEFAULT_WAKE_INTERVAL_SECS: u64 = 10;

/// Marker that opens the command menu, sent only to the acting player
pub const TURN_PROMPT: &str = "It's your turn:";

/// Single-character player commands recognised outside of chat capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Attack,
    PowerMove,
    Speak,
    Mute,
}

impl Command {
    /// Parses a command line; only the first byte is significant.
    pub fn from_line(line: &str) -> Option<Self> {
        match line.as_bytes().first()? {
            b'a' => Some(Command::Attack),
            b'p' => Some(Command::PowerMove),
            b's' => Some(Command::Speak),
            b'm' => Some(Command::Mute),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Command::Attack => 'a',
            Command::PowerMove => 'p',
            Command::Speak => 's',
            Command::Mute => 'm',
        }
    }
}
