//! Rejection taxonomy for the state machine.
//!
//! A rejected action is a no-op: no state mutation, no broadcast. The
//! reason is reported to the acting caller only, never to the room.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("action not legal in the current phase")]
    PhaseViolation,
    #[error("not your turn")]
    TurnViolation,
    #[error("player is not in this room")]
    UnknownPlayer,
    #[error("no tile at index {0}")]
    UnknownTile(usize),
    #[error("the robber must move to a different tile")]
    RobberStayedPut,
    #[error("target is not eligible to be stolen from")]
    IneligibleTarget,
    #[error("no discard is pending for you")]
    NoPendingDiscard,
    #[error("replacement hand must be your hand minus exactly {required} cards")]
    DiscardMismatch { required: usize },
    #[error("place a settlement and a road before ending a setup turn")]
    SetupIncomplete,
    #[error("resolve pending discards or the robber before ending the turn")]
    PendingInterrupts,
    #[error("not enough resources to build")]
    CannotAfford,
    #[error("need at least one player to start")]
    NotEnoughPlayers,
    #[error("game already in progress")]
    GameInProgress,
    #[error("room is full")]
    RoomFull,
}
