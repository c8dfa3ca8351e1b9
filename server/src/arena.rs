//! Arena state owned by the single coordinating task
//!
//! The `Arena` holds the registry and the random source. Connection events
//! come in through `connect`, `handle_input` (see `battle`) and `disconnect`;
//! `run_matchmaking` (see `matchmaker`) pairs idle players. Nothing here
//! touches a socket: outgoing text is pushed onto each session's queue.

use crate::registry::Registry;
use crate::session::{Session, SessionId};
use arena_protocol::text::{self, Menu, Standing};
use arena_protocol::{MAX_POWER_MOVES, MIN_POWER_MOVES, SPEAK_ALLOWANCE};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::SocketAddr;
use tokio::sync::mpsc;

pub struct Arena {
    pub(crate) registry: Registry,
    pub(crate) rng: StdRng,
    next_session_id: SessionId,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic arena for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: Registry::new(),
            rng,
            next_session_id: 1,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.registry.get(id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub(crate) fn roll_power_moves(&mut self) -> u32 {
        self.rng.gen_range(MIN_POWER_MOVES..=MAX_POWER_MOVES)
    }

    /// Registers a freshly accepted connection and prompts it for a name.
    pub fn connect(
        &mut self,
        addr: SocketAddr,
        outbox: mpsc::UnboundedSender<String>,
    ) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id += 1;

        let power_moves = self.roll_power_moves();
        let session = Session::new(id, addr, power_moves, outbox);
        session.send(text::greeting());
        self.registry.append(session);
        id
    }

    /// Removes a session after its connection closed or failed.
    ///
    /// A match in progress is awarded to the opponent, who goes back to the
    /// lobby and to the tail of the registry.
    pub fn disconnect(&mut self, id: SessionId) {
        let Some(departed) = self.registry.remove(id) else {
            return;
        };

        if let Some(opponent_id) = departed.opponent {
            let power_moves = self.roll_power_moves();
            if let Some(opponent) = self.registry.get_mut(opponent_id) {
                opponent.reset_to_lobby(power_moves);
                opponent.send(text::opponent_fled(&departed.name));
                info!(
                    "{} wins by default, {} disconnected mid-match",
                    opponent.name, departed.name
                );
            }
            self.registry.move_to_tail(opponent_id);
        }

        if departed.name_set {
            self.broadcast(&text::left_arena(&departed.name), Some(id));
        }
    }

    /// Sends `message` to every registered session except `exclude`.
    ///
    /// Failed deliveries are logged by the session and otherwise ignored; the
    /// connection is cleaned up when its reader reports the close.
    pub fn broadcast(&self, message: &str, exclude: Option<SessionId>) {
        for session in self.registry.iter() {
            if Some(session.id) != exclude {
                session.send(message.to_string());
            }
        }
    }

    pub(crate) fn send(&self, id: SessionId, message: String) {
        if let Some(session) = self.registry.get(id) {
            session.send(message);
        }
    }

    /// The match as seen by `id`; None when it has no live opponent.
    pub(crate) fn standing(&self, id: SessionId) -> Option<Standing<'_>> {
        let session = self.registry.get(id)?;
        let opponent = self.registry.get(session.opponent?)?;
        Some(Standing {
            hitpoints: session.hitpoints,
            power_moves: session.power_moves,
            opponent_name: &opponent.name,
            opponent_hitpoints: opponent.hitpoints,
        })
    }

    pub(crate) fn menu(&self, id: SessionId) -> Menu {
        match self.registry.get(id) {
            Some(session) => Menu {
                power_move: session.power_moves > 0,
                speak: session.speak_count <= SPEAK_ALLOWANCE,
            },
            None => Menu {
                power_move: false,
                speak: false,
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.registry.get_mut(id)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use arena_protocol::MAX_HITPOINTS;

    #[test]
    fn test_connect_greets_and_registers() {
        let mut arena = Arena::with_seed(1);
        let (id, mut rx) = join(&mut arena);

        assert_eq!(arena.len(), 1);
        let session = arena.session(id).unwrap();
        assert!(!session.name_set);
        assert!((MIN_POWER_MOVES..=MAX_POWER_MOVES).contains(&session.power_moves));
        assert_eq!(session.hitpoints, MAX_HITPOINTS);
        assert_eq!(drain(&mut rx), vec![text::greeting()]);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let mut arena = Arena::with_seed(1);
        let (a, _ra) = join(&mut arena);
        let (b, _rb) = join(&mut arena);
        arena.disconnect(a);
        let (c, _rc) = join(&mut arena);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_broadcast_excludes_sender() {
        let mut arena = Arena::with_seed(1);
        let (a, mut ra) = join(&mut arena);
        let (_b, mut rb) = join(&mut arena);
        let (_c, mut rc) = join(&mut arena);
        drain(&mut ra);
        drain(&mut rb);
        drain(&mut rc);

        arena.broadcast("news", Some(a));

        assert!(drain(&mut ra).is_empty());
        assert_eq!(drain(&mut rb), vec!["news".to_string()]);
        assert_eq!(drain(&mut rc), vec!["news".to_string()]);
    }

    #[test]
    fn test_broadcast_survives_dead_receiver() {
        let mut arena = Arena::with_seed(1);
        let (_a, ra) = join(&mut arena);
        let (_b, mut rb) = join(&mut arena);
        drain(&mut rb);
        drop(ra);

        arena.broadcast("still here", None);

        assert_eq!(arena.len(), 2);
        assert_eq!(drain(&mut rb), vec!["still here".to_string()]);
    }

    #[test]
    fn test_idle_disconnect_announces_departure() {
        let mut arena = Arena::with_seed(1);
        let (alice, _ra) = join_named(&mut arena, "Alice");
        let (_bob, mut rb) = join(&mut arena);
        drain(&mut rb);

        arena.disconnect(alice);

        assert_eq!(arena.len(), 1);
        assert!(arena.session(alice).is_none());
        assert_eq!(drain(&mut rb), vec![text::left_arena("Alice")]);
    }

    #[test]
    fn test_unnamed_disconnect_is_silent() {
        let mut arena = Arena::with_seed(1);
        let (a, _ra) = join(&mut arena);
        let (_b, mut rb) = join(&mut arena);
        drain(&mut rb);

        arena.disconnect(a);
        arena.disconnect(a);

        assert_eq!(arena.len(), 1);
        assert!(drain(&mut rb).is_empty());
    }

    #[test]
    fn test_mid_match_disconnect_awards_opponent() {
        let mut arena = Arena::with_seed(7);
        let (alice, _ra) = join_named(&mut arena, "Alice");
        let (bob, mut rb) = join_named(&mut arena, "Bob");
        let (carol, _rc) = join_named(&mut arena, "Carol");
        arena.start_match(alice, bob);
        if let Some(session) = arena.session_mut(bob) {
            session.hitpoints = 10;
            session.speak_count = 2;
        }
        drain(&mut rb);

        arena.disconnect(alice);

        let bob_session = arena.session(bob).unwrap();
        assert!(!bob_session.in_game());
        assert_eq!(bob_session.opponent, None);
        assert_eq!(bob_session.hitpoints, MAX_HITPOINTS);
        assert!(!bob_session.is_turn);
        assert_eq!(bob_session.speak_count, 0);
        assert!((MIN_POWER_MOVES..=MAX_POWER_MOVES).contains(&bob_session.power_moves));
        assert_eq!(arena.registry().ids(), vec![carol, bob]);

        let received = drain(&mut rb);
        assert_eq!(received[0], text::opponent_fled("Alice"));
        assert!(received.contains(&text::left_arena("Alice")));
    }
}
