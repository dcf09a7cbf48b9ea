//! HTTP/WebSocket gateway for the `settlers` session library.
//!
//! The binary in `main.rs` wires configuration and logging around
//! [`api::create_router`]; everything interesting lives in [`api`].

pub mod api;
pub mod config;
