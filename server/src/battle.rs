//! Per-session protocol handling and combat rules
//!
//! Input is reassembled line by line. Until a name is set every line is the
//! name. After that, lines are commands, except while the acting player is
//! speaking, when the next line is chat text.
//!
//! Only the acting player may attack, power-move or speak. Either player may
//! toggle mute at any time during a match. Anything else is dropped without
//! a reply.

use crate::arena::Arena;
use crate::session::{Capture, SessionId};
use arena_protocol::text::{self, Turn};
use arena_protocol::{
    Command, ATTACK_DAMAGE, POWER_MOVE_DAMAGE, POWER_MOVE_HIT_CHANCE, SPEAK_ALLOWANCE,
};
use log::{debug, info};
use rand::Rng;

/// Outcome of a turn-ending action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blow {
    Attack,
    PowerHit,
    PowerMiss,
}

impl Blow {
    fn damage(self) -> u32 {
        match self {
            Blow::Attack => ATTACK_DAMAGE,
            Blow::PowerHit => POWER_MOVE_DAMAGE,
            Blow::PowerMiss => 0,
        }
    }
}

impl Arena {
    /// Processes one raw read from a session.
    ///
    /// Consumes the chunk one line at a time so a mode switch made by one
    /// line (entering speech, setting the name) applies to the next line of
    /// the same read. An unterminated tail stays buffered for the next read.
    pub fn handle_input(&mut self, id: SessionId, mut chunk: &[u8]) {
        while !chunk.is_empty() {
            let Some(session) = self.registry.get_mut(id) else {
                return;
            };
            let capture = session.capture();
            let (used, line) = session.feed(chunk);
            chunk = &chunk[used..];

            if let Some(line) = line {
                match capture {
                    Capture::Name => self.assign_name(id, line),
                    Capture::Speech => self.deliver_speech(id, &line),
                    Capture::Command => match Command::from_line(&line) {
                        Some(command) => self.handle_command(id, command),
                        None => debug!("Client {} sent unknown command {:?}", id, line),
                    },
                }
            }
        }
    }

    fn assign_name(&mut self, id: SessionId, name: String) {
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };
        session.name = name;
        session.name_set = true;
        session.send(text::awaiting_opponent(&session.name));
        info!("Adding client {}", session.name);

        let announcement = text::joined_arena(&session.name);
        self.broadcast(&announcement, Some(id));
    }

    fn handle_command(&mut self, id: SessionId, command: Command) {
        let Some(session) = self.registry.get(id) else {
            return;
        };
        let Some(opponent_id) = session.opponent.filter(|opp| self.registry.contains(*opp))
        else {
            debug!("Client {} sent {:?} outside a match", id, command);
            return;
        };

        match (command, session.is_turn) {
            (Command::Mute, _) => self.toggle_mute(id),
            (_, false) => debug!("Client {} sent {:?} out of turn", id, command),
            (Command::Attack, true) => self.resolve_blow(id, opponent_id, Blow::Attack),
            (Command::PowerMove, true) => self.power_move(id, opponent_id),
            (Command::Speak, true) => self.begin_speech(id, opponent_id),
        }
    }

    fn power_move(&mut self, id: SessionId, opponent_id: SessionId) {
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };
        if session.power_moves == 0 {
            debug!("Client {} has no power moves left", id);
            return;
        }
        session.power_moves -= 1;

        let blow = if self.rng.gen_bool(POWER_MOVE_HIT_CHANCE) {
            Blow::PowerHit
        } else {
            Blow::PowerMiss
        };
        self.resolve_blow(id, opponent_id, blow);
    }

    /// Applies damage, passes the turn, reports to both sides and ends the
    /// match on a knock-out.
    fn resolve_blow(&mut self, id: SessionId, opponent_id: SessionId, blow: Blow) {
        let Some(target) = self.registry.get_mut(opponent_id) else {
            return;
        };
        target.hitpoints = target.hitpoints.saturating_sub(blow.damage());
        let knocked_out = target.hitpoints == 0;
        target.is_turn = !knocked_out;

        if let Some(actor) = self.registry.get_mut(id) {
            actor.is_turn = false;
            actor.speak_count = 0;
        }

        let (actor_turn, target_turn) = if knocked_out {
            (Turn::Over, Turn::Over)
        } else {
            (Turn::Waiting, Turn::Acting(self.menu(opponent_id)))
        };
        let (Some(actor_view), Some(target_view)) =
            (self.standing(id), self.standing(opponent_id))
        else {
            return;
        };
        let (actor_text, target_text) = match blow {
            Blow::Attack => (
                text::you_hit(&actor_view, blow.damage(), actor_turn),
                text::hit_by_attack(&target_view, blow.damage(), target_turn),
            ),
            Blow::PowerHit => (
                text::you_hit(&actor_view, blow.damage(), actor_turn),
                text::hit_by_power_move(&target_view, blow.damage(), target_turn),
            ),
            Blow::PowerMiss => (
                text::you_missed(&actor_view, actor_turn),
                text::power_move_missed_you(&target_view, target_turn),
            ),
        };
        // each view names the other side
        let victory = text::victory(actor_view.opponent_name);
        let defeat = text::defeat(target_view.opponent_name);

        self.send(id, actor_text);
        self.send(opponent_id, target_text);

        if knocked_out {
            self.send(id, victory);
            self.send(opponent_id, defeat);
            self.end_match(id, opponent_id);
        }
    }

    fn begin_speech(&mut self, id: SessionId, opponent_id: SessionId) {
        let opponent_muted = self
            .registry
            .get(opponent_id)
            .map_or(false, |opponent| opponent.mute_toggle);
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };

        if session.speak_count > SPEAK_ALLOWANCE {
            debug!("Client {} keeps trying to talk, ignoring", id);
            return;
        }
        if opponent_muted {
            let Some(view) = self.standing(id) else {
                return;
            };
            let reply = text::speak_blocked_by_mute(&view, self.menu(id));
            self.send(id, reply);
            return;
        }

        session.speak_count += 1;
        if session.speak_count > SPEAK_ALLOWANCE {
            let Some(view) = self.standing(id) else {
                return;
            };
            let reply = text::spoken_enough(&view, self.menu(id));
            self.send(id, reply);
            return;
        }

        session.speaking = true;
        session.speech_input.clear();
        session.send(text::speak_prompt());
    }

    fn deliver_speech(&mut self, id: SessionId, message: &str) {
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };
        session.speaking = false;
        let Some(opponent_id) = session.opponent else {
            return;
        };

        let (Some(speaker_view), Some(listener_view)) =
            (self.standing(id), self.standing(opponent_id))
        else {
            return;
        };
        let echo = text::you_speak(message, &speaker_view, self.menu(id));
        let delivery = text::chat_received(message, &listener_view);
        self.send(id, echo);
        self.send(opponent_id, delivery);
    }

    fn toggle_mute(&mut self, id: SessionId) {
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };
        session.mute_toggle = !session.mute_toggle;
        let muted = session.mute_toggle;
        let turn = if session.is_turn {
            Turn::Acting(self.menu(id))
        } else {
            Turn::Waiting
        };

        let Some(view) = self.standing(id) else {
            return;
        };
        let reply = text::mute_changed(muted, &view, turn);
        self.send(id, reply);
    }

    /// Returns both players to the lobby and records them as each other's
    /// last opponent. The winner moves to the tail first, then the loser.
    pub(crate) fn end_match(&mut self, winner: SessionId, loser: SessionId) {
        for (id, other) in [(winner, loser), (loser, winner)] {
            let power_moves = self.roll_power_moves();
            if let Some(session) = self.registry.get_mut(id) {
                session.reset_to_lobby(power_moves);
                session.last_opponent = Some(other);
            }
        }
        self.registry.move_to_tail(winner);
        self.registry.move_to_tail(loser);

        if let (Some(w), Some(l)) = (self.registry.get(winner), self.registry.get(loser)) {
            info!("Match between {} and {} has ended, {} won", w.name, l.name, w.name);
        }
    }
}
