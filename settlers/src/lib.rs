//! # Settlers
//!
//! A session server core for a hex-and-dice settlement board game.
//!
//! This library holds the single authoritative copy of each room's game
//! state, validates and applies client actions, and hands the resulting
//! snapshots to a broadcast gateway. Rooms are isolated behind per-room
//! actor tasks, so two actions for the same room can never interleave
//! their read-modify-write of the game state while separate rooms run
//! fully in parallel.
//!
//! ## Architecture
//!
//! - [`game`]: the data aggregate for one room (tiles, bank, structures,
//!   pending interrupts) and the turn/phase state machine that is the only
//!   code allowed to mutate it. Phases:
//!
//!   `Lobby -> Setup -> RollingDice -> PlayerTurn` with the robber
//!   sub-protocol (`PlayerTurnKnight`, `PlayerStealingCard`) suspending
//!   normal turn flow after a 7 is rolled, and the
//!   `RollingDice -> PlayerTurn -> RollingDice` loop repeating
//!   indefinitely.
//!
//! - [`room`]: the actor hosting one game, the registry that admits
//!   players into open rooms (creating and destroying rooms on demand),
//!   and the full-snapshot broadcast events pushed to every subscriber
//!   after each accepted mutation.
//!
//! Presentation is a deliberate non-concern: board geometry, hit-testing
//! and rendering live in the client, which submits already-resolved
//! positions and tile indices.
//!
//! ## Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use settlers::game::GameState;
//!
//! // A freshly generated board with the robber parked on the desert.
//! let mut rng = StdRng::seed_from_u64(7);
//! let game = GameState::generate(&mut rng);
//! assert_eq!(game.robber_index, game.desert_index);
//! ```

/// Core game logic: entities, board generation, and the state machine.
pub mod game;
pub use game::{
    Action, GameError, GameState, Outcome, Phase,
    constants::{BANK_PER_RESOURCE, BOARD_TILE_COUNT, DISCARD_THRESHOLD, MAX_PLAYERS},
    entities::{Player, PlayerColor, PlayerId, Resource, TileKind},
};

/// Room actors, the room registry, and broadcast events.
pub mod room;
pub use room::{
    RoomConfig, RoomRegistry,
    events::{RoomSnapshot, ServerEvent},
};
