//! The data aggregate for one room.
//!
//! `GameState` is plain data; all behavior lives in the state machine
//! (`machine.rs`), which is the only mutator. The whole struct serializes
//! into the room snapshot broadcast after every accepted action.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::board::Board;
use crate::game::constants::BANK_PER_RESOURCE;
use crate::game::entities::{
    PlayerId, Resource, ResourceBundle, Road, Settlement, Tile,
};

/// Where the room is in its lifecycle. There is no terminal phase; the
/// `RollingDice -> PlayerTurn -> RollingDice` loop repeats until the room
/// is torn down.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Phase {
    /// Room just created, accepting players.
    Lobby,
    /// Snake-order initial placements.
    Setup,
    /// Waiting for the turn holder to roll.
    RollingDice,
    /// Normal turn: build, then end the turn.
    PlayerTurn,
    /// A 7 was rolled; the turn holder must relocate the robber.
    PlayerTurnKnight,
    /// Robber moved next to several opponents; the turn holder must pick
    /// a victim.
    PlayerStealingCard,
}

/// Authoritative state of one game. Created at first join, mutated only
/// by validated actions, dropped with the room.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub phase: Phase,
    /// Generated once; tiles never move.
    pub tiles: Vec<Tile>,
    pub desert_index: usize,
    /// The robber starts on the desert.
    pub robber_index: usize,
    /// Both dice, or `None` between turns.
    pub dice: Option<(u8, u8)>,
    pub bank: ResourceBundle,
    pub settlements: Vec<Settlement>,
    pub roads: Vec<Road>,
    /// Random permutation of the players, fixed at game start.
    pub turn_order: Vec<PlayerId>,
    pub turn_index: usize,
    /// 1-based setup-turn counter; setup ends when it reaches
    /// `2 * player count`.
    pub setup_turn: usize,
    pub setup_placed_settlement: bool,
    pub setup_placed_road: bool,
    /// Players who owe a mandatory discard, with the required count.
    pub pending_discards: HashMap<PlayerId, usize>,
    /// Opponents the turn holder may steal from, recorded when the robber
    /// lands next to more than one.
    pub steal_candidates: Vec<PlayerId>,
}

impl GameState {
    /// A fresh lobby-phase state with a newly generated board and a full
    /// bank.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let board = Board::generate(rng);
        Self {
            phase: Phase::Lobby,
            tiles: board.tiles,
            desert_index: board.desert_index,
            robber_index: board.desert_index,
            dice: None,
            bank: ResourceBundle::from_counts([BANK_PER_RESOURCE; 5]),
            settlements: Vec::new(),
            roads: Vec::new(),
            turn_order: Vec::new(),
            turn_index: 0,
            setup_turn: 0,
            setup_placed_settlement: false,
            setup_placed_road: false,
            pending_discards: HashMap::new(),
            steal_candidates: Vec::new(),
        }
    }

    /// The player whose turn it is, once the order exists.
    pub fn current_player(&self) -> Option<&PlayerId> {
        self.turn_order.get(self.turn_index)
    }

    pub fn is_current(&self, player: &PlayerId) -> bool {
        self.current_player() == Some(player)
    }

    /// Victory points are derived, one per owned settlement.
    pub fn victory_points(&self, player: &PlayerId) -> usize {
        self.settlements
            .iter()
            .filter(|s| &s.owner == player)
            .count()
    }

    /// Total cards of `kind` across the bank and every hand. Constant for
    /// the life of a room; the conservation tests pin this down.
    pub fn circulating(&self, kind: Resource, hands: &[Vec<Resource>]) -> u32 {
        let in_hands: u32 = hands
            .iter()
            .map(|hand| hand.iter().filter(|c| **c == kind).count() as u32)
            .sum();
        u32::from(self.bank.get(kind)) + in_hands
    }
}
