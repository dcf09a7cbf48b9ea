//! Broadcast payloads.
//!
//! Every event carries the full room snapshot — players plus game state —
//! taken after the mutation that triggered it, so clients re-render from
//! whole cloth and a later action can never interleave a partial state
//! into an earlier broadcast.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::action::Outcome;
use crate::game::entities::{Player, PlayerColor, PlayerId, Resource};
use crate::game::state::GameState;

pub type RoomId = Uuid;

/// One player as broadcast to the room, with derived victory points
/// attached.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub hand: Vec<Resource>,
    pub victory_points: usize,
}

/// The full state of one room.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub players: Vec<PlayerView>,
    pub game_state: GameState,
}

impl RoomSnapshot {
    pub fn capture(id: RoomId, players: &[Player], game: &GameState) -> Self {
        let players = players
            .iter()
            .map(|p| PlayerView {
                id: p.id.clone(),
                name: p.name.clone(),
                color: p.color,
                hand: p.hand.clone(),
                victory_points: game.victory_points(&p.id),
            })
            .collect();
        Self {
            id,
            players,
            game_state: game.clone(),
        }
    }
}

/// Events pushed to every room subscriber. Dice events are distinguished
/// from the generic update so clients can run the roll animation or open
/// the discard prompt.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    JoinedRoom(RoomSnapshot),
    UpdateGameState(RoomSnapshot),
    DiceRolled(RoomSnapshot),
    KnightRolled(RoomSnapshot),
}

impl ServerEvent {
    /// Wrap a snapshot in the event kind an accepted mutation calls for.
    pub fn for_outcome(outcome: Outcome, snapshot: RoomSnapshot) -> Self {
        match outcome {
            Outcome::Updated => Self::UpdateGameState(snapshot),
            Outcome::DiceRolled => Self::DiceRolled(snapshot),
            Outcome::KnightRolled => Self::KnightRolled(snapshot),
        }
    }

    pub fn snapshot(&self) -> &RoomSnapshot {
        match self {
            Self::JoinedRoom(s)
            | Self::UpdateGameState(s)
            | Self::DiceRolled(s)
            | Self::KnightRolled(s) => s,
        }
    }
}
