//! Pairing of idle players
//!
//! One pass walks the registry in order. Each idle player takes the first
//! other idle player that is not its own last opponent. Only the seeker's
//! `last_opponent` is consulted, not the candidate's, so a pair can still be
//! rematched when the other side does the seeking.

use crate::arena::Arena;
use crate::session::SessionId;
use arena_protocol::text::{self, Turn};
use arena_protocol::MAX_HITPOINTS;
use log::info;
use rand::Rng;

impl Arena {
    /// Runs one matchmaking pass and returns the number of matches started.
    pub fn run_matchmaking(&mut self) -> usize {
        let mut started = 0;

        for id in self.registry.ids() {
            let idle = self.registry.get(id).is_some_and(|s| s.is_idle());
            if !idle {
                continue;
            }
            if let Some(opponent_id) = self.find_opponent(id) {
                self.start_match(id, opponent_id);
                started += 1;
            }
        }

        started
    }

    /// First idle, named session in registry order other than `seeker` and
    /// its last opponent.
    pub fn find_opponent(&self, seeker: SessionId) -> Option<SessionId> {
        let last_opponent = self.registry.get(seeker)?.last_opponent;
        self.registry
            .iter()
            .find(|candidate| {
                candidate.id != seeker
                    && candidate.is_idle()
                    && Some(candidate.id) != last_opponent
            })
            .map(|candidate| candidate.id)
    }

    /// Pairs two sessions, picks who acts first with a coin flip and sends
    /// each side its opening message.
    pub fn start_match(&mut self, first: SessionId, second: SessionId) {
        if first == second || !self.registry.contains(first) || !self.registry.contains(second) {
            return;
        }
        let first_acts = self.rng.gen_bool(0.5);

        for (id, other, acts) in [(first, second, first_acts), (second, first, !first_acts)] {
            let power_moves = self.roll_power_moves();
            if let Some(session) = self.registry.get_mut(id) {
                session.hitpoints = MAX_HITPOINTS;
                session.power_moves = power_moves;
                session.opponent = Some(other);
                session.is_turn = acts;
                session.speak_count = 0;
                session.speaking = false;
                session.speech_input.clear();
            }
        }

        for (id, acts) in [(first, first_acts), (second, !first_acts)] {
            let turn = if acts {
                Turn::Acting(self.menu(id))
            } else {
                Turn::Waiting
            };
            if let Some(view) = self.standing(id) {
                let opening = text::engage(&view, turn);
                self.send(id, opening);
            }
        }

        if let (Some(a), Some(b)) = (self.registry.get(first), self.registry.get(second)) {
            info!("{} and {} have been matched for a battle.", a.name, b.name);
        }
    }
}
