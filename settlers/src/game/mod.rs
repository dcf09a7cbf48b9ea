//! Game engine for one room: entities, board generation, and the
//! turn/phase state machine.
//!
//! [`GameState`] is pure data plus invariants; every mutation goes through
//! [`GameState::apply`], which validates an [`Action`] against the current
//! phase and turn owner and either applies it or rejects it with a
//! [`GameError`] while leaving the state untouched.

pub mod action;
pub mod board;
pub mod constants;
pub mod entities;
pub mod error;
mod machine;
pub mod state;

pub use action::{Action, Outcome};
pub use error::GameError;
pub use state::{GameState, Phase};
