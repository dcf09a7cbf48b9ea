//! Per-room configuration.

use std::time::Duration;

use crate::game::constants::MAX_PLAYERS;

#[derive(Clone, Debug)]
pub struct RoomConfig {
    /// Seats in the room; capped by the color palette.
    pub max_players: usize,
    /// How long a pending mandatory discard may sit unresolved before the
    /// room force-discards from the front of the hand. `None` disables
    /// the deadline.
    pub discard_timeout: Option<Duration>,
    /// Seed for the room's random source. `None` seeds from the OS,
    /// which is the production mode; tests pin a seed for determinism.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            discard_timeout: Some(Duration::from_secs(45)),
            seed: None,
        }
    }
}
