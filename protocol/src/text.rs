//! Server-to-client text rendering
//!
//! Every status message ends with the same block: the receiver's own
//! hitpoints and power moves, the opponent's name and hitpoints, and either
//! the command menu (receiver acts next) or a waiting line naming the
//! opponent. Only the information content is fixed; wording may change.

use crate::TURN_PROMPT;

/// A player's view of the current match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing<'a> {
    pub hitpoints: u32,
    pub power_moves: u32,
    pub opponent_name: &'a str,
    pub opponent_hitpoints: u32,
}

/// Which commands the acting player is offered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Menu {
    pub power_move: bool,
    pub speak: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Acting(Menu),
    Waiting,
    /// The match has just ended; no turn line follows the numbers
    Over,
}

fn standing_block(standing: &Standing<'_>, turn: Turn) -> String {
    let mut out = format!(
        "Your hitpoints: {}\nYour powermoves: {}\n\n{}'s hitpoints: {}\n",
        standing.hitpoints, standing.power_moves, standing.opponent_name, standing.opponent_hitpoints
    );
    match turn {
        Turn::Acting(menu) => {
            out.push('\n');
            out.push_str(TURN_PROMPT);
            out.push_str("\n(a)ttack\n");
            if menu.power_move {
                out.push_str("(p)owermove\n");
            }
            if menu.speak {
                out.push_str("(s)peak something\n");
            }
            out.push_str("(m)ute chat\n");
        }
        Turn::Waiting => {
            out.push_str(&format!(
                "Waiting for {} to strike...\n",
                standing.opponent_name
            ));
        }
        Turn::Over => {}
    }
    out
}

pub fn greeting() -> String {
    "Welcome! Please enter your name:".to_string()
}

pub fn awaiting_opponent(name: &str) -> String {
    format!("\nWelcome, {}! Awaiting opponent...\r\n", name)
}

pub fn joined_arena(name: &str) -> String {
    format!("\n*****{} joins the Arena******\r\n", name)
}

pub fn left_arena(name: &str) -> String {
    format!("\n*****{} left the Arena******\r\n", name)
}

pub fn engage(standing: &Standing<'_>, turn: Turn) -> String {
    format!(
        "\nYou engage {}!\n{}",
        standing.opponent_name,
        standing_block(standing, turn)
    )
}

/// Sent to the attacker after a landed blow.
pub fn you_hit(standing: &Standing<'_>, damage: u32, turn: Turn) -> String {
    format!(
        "\nYou hit {} for {} damage!\n{}",
        standing.opponent_name,
        damage,
        standing_block(standing, turn)
    )
}

pub fn you_missed(standing: &Standing<'_>, turn: Turn) -> String {
    format!("\nYou missed!\n{}", standing_block(standing, turn))
}

/// Sent to the defender; `turn` is `Over` when the blow ended the match.
pub fn hit_by_attack(standing: &Standing<'_>, damage: u32, turn: Turn) -> String {
    format!(
        "\n{} hits you for {} damage!\n{}",
        standing.opponent_name,
        damage,
        standing_block(standing, turn)
    )
}

pub fn hit_by_power_move(standing: &Standing<'_>, damage: u32, turn: Turn) -> String {
    format!(
        "\n{} powermoves you for {} damage!\n{}",
        standing.opponent_name,
        damage,
        standing_block(standing, turn)
    )
}

pub fn power_move_missed_you(standing: &Standing<'_>, turn: Turn) -> String {
    format!(
        "\n{}'s powermove missed!\n{}",
        standing.opponent_name,
        standing_block(standing, turn)
    )
}

pub fn speak_prompt() -> String {
    "\nSpeak: ".to_string()
}

pub fn you_speak(message: &str, standing: &Standing<'_>, menu: Menu) -> String {
    format!(
        "\nYou speak: {}\n\n{}",
        message,
        standing_block(standing, Turn::Acting(menu))
    )
}

pub fn chat_received(message: &str, standing: &Standing<'_>) -> String {
    format!(
        "\n\n{} takes a break to tell you:\n{}\n\n{}",
        standing.opponent_name,
        message,
        standing_block(standing, Turn::Waiting)
    )
}

pub fn speak_blocked_by_mute(standing: &Standing<'_>, menu: Menu) -> String {
    format!(
        "\nYou cannot speak with {}, their mute toggle is on.\n\n{}",
        standing.opponent_name,
        standing_block(standing, Turn::Acting(menu))
    )
}

pub fn spoken_enough(standing: &Standing<'_>, menu: Menu) -> String {
    format!(
        "\nYou have spoken enough! It is time to attack.\n\n{}",
        standing_block(standing, Turn::Acting(menu))
    )
}

pub fn mute_changed(muted: bool, standing: &Standing<'_>, turn: Turn) -> String {
    let state = if muted { "muted" } else { "unmuted" };
    format!(
        "\nChat is now {}.\n\n{}",
        state,
        standing_block(standing, turn)
    )
}

pub fn victory(loser: &str) -> String {
    format!(
        "Victory! {}'s hitpoints are now 0. You win!\nAwaiting next opponent...\r\n",
        loser
    )
}

pub fn defeat(winner: &str) -> String {
    format!(
        "Defeat! Your hitpoints are now 0. {} wins!\nAwaiting next opponent...\r\n",
        winner
    )
}

pub fn opponent_fled(name: &str) -> String {
    format!(
        "Opponent {} disconnected. You win!\nAwaiting next opponent...\r\n",
        name
    )
}
