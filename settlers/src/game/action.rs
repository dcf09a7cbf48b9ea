//! Client actions and mutation outcomes.

use serde::{Deserialize, Serialize};

use crate::game::entities::{PlayerId, Point, Resource};

/// Everything a player can ask the state machine to do. One variant per
/// wire action; payloads are parsed and typed at the boundary so the
/// machine never sees loose data.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Action {
    /// Fix the turn order and begin the setup phase.
    StartGame,
    /// Finish the acting player's turn (or setup turn).
    EndTurn,
    /// Roll both dice.
    RollDice,
    /// Relocate the robber to `tile_index` after a 7.
    MoveKnight { tile_index: usize },
    /// Choose which eligible opponent to steal from.
    StealCard { target: PlayerId },
    /// Submit the replacement hand for a mandatory discard.
    DiscardCards { hand: Vec<Resource> },
    /// Place a settlement. `adjacent_tiles` is the presentation layer's
    /// hit-testing output: the indices of tiles within the adjacency
    /// radius of `position`.
    PlaceSettlement {
        position: Point,
        adjacent_tiles: Vec<usize>,
    },
    /// Place a road between two corner positions.
    PlaceRoad { start: Point, end: Point },
}

/// What an accepted mutation means for the broadcast gateway. Dice events
/// are distinguished from generic updates so clients can trigger the roll
/// animation or the discard prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Broadcast a generic `update-game-state`.
    Updated,
    /// Broadcast `dice-rolled`.
    DiceRolled,
    /// A 7 came up; broadcast `knight-rolled`.
    KnightRolled,
}
