//! Rooms: one actor task per game session, a registry that admits players
//! into open rooms, and the broadcast events pushed after every accepted
//! mutation.
//!
//! All read-modify-write of a room's [`crate::game::GameState`] happens
//! inside its actor, so actions for the same room are serialized while
//! separate rooms run fully in parallel and share nothing but the
//! process-wide entropy source.

pub mod actor;
pub mod config;
pub mod events;
pub mod messages;
pub mod registry;

pub use actor::{RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use events::{RoomId, RoomSnapshot, ServerEvent};
pub use messages::{LeaveReply, RoomGone, RoomJoined, RoomMessage};
pub use registry::{RoomRegistry, RoomSummary};
