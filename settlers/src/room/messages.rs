//! Room actor message types.
//!
//! Every request carries a `oneshot` for its reply, so callers get an
//! answer without sharing any state with the actor.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::game::action::{Action, Outcome};
use crate::game::entities::{PlayerColor, PlayerId};
use crate::game::error::GameError;
use crate::room::events::{RoomId, RoomSnapshot, ServerEvent};

/// Messages accepted by a room actor.
#[derive(Debug)]
pub enum RoomMessage {
    /// Seat a player. The subscriber channel is registered before the
    /// `joined-room` broadcast so the joiner sees it too.
    Join {
        player: PlayerId,
        display_name: String,
        subscriber: mpsc::Sender<ServerEvent>,
        respond_to: oneshot::Sender<Result<RoomJoined, GameError>>,
    },

    /// Remove a player; tears the room down when it empties.
    Leave {
        player: PlayerId,
        respond_to: oneshot::Sender<LeaveReply>,
    },

    /// A game action from a seated player.
    Act {
        player: PlayerId,
        action: Action,
        respond_to: oneshot::Sender<Result<Outcome, GameError>>,
    },

    /// The current full snapshot, without mutating anything.
    Snapshot {
        respond_to: oneshot::Sender<RoomSnapshot>,
    },

    /// Re-register a broadcast channel (reconnects).
    Subscribe {
        player: PlayerId,
        sender: mpsc::Sender<ServerEvent>,
    },

    /// Stop broadcasting to a player without unseating them.
    Unsubscribe { player: PlayerId },
}

/// Reply to a successful join.
#[derive(Clone, Debug)]
pub struct RoomJoined {
    pub room_id: RoomId,
    pub color: PlayerColor,
}

/// Reply to a leave request.
#[derive(Clone, Copy, Debug)]
pub struct LeaveReply {
    /// Whether the player was actually seated here.
    pub removed: bool,
    /// The room emptied and is shutting down.
    pub now_empty: bool,
}

/// The actor's inbox closed underneath a request.
#[derive(Clone, Copy, Debug, Error)]
#[error("room {0} is gone")]
pub struct RoomGone(pub RoomId);
