//! Server configuration management.
//!
//! Consolidates all environment variable reads into one validated struct
//! so the rest of the server never touches `std::env`.

use std::net::SocketAddr;
use std::time::Duration;

use settlers::game::constants::MAX_PLAYERS;
use settlers::room::RoomConfig;
use thiserror::Error;

/// Complete server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server bind address.
    pub bind: SocketAddr,
    /// Settings applied to every room the registry creates.
    pub room: RoomConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl ServerConfig {
    /// Load configuration from environment variables, with the CLI bind
    /// override taking precedence.
    ///
    /// Recognized variables:
    /// - `SERVER_BIND` (default `127.0.0.1:4000`)
    /// - `MAX_ROOM_PLAYERS` (1..=4, default 4)
    /// - `DISCARD_TIMEOUT_SECS` (0 disables the deadline, default 45)
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw = std::env::var("SERVER_BIND")
                    .unwrap_or_else(|_| "127.0.0.1:4000".to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "SERVER_BIND",
                    value: raw,
                })?
            }
        };

        let mut room = RoomConfig::default();
        if let Ok(raw) = std::env::var("MAX_ROOM_PLAYERS") {
            let seats: usize = raw.parse().map_err(|_| ConfigError::Invalid {
                name: "MAX_ROOM_PLAYERS",
                value: raw.clone(),
            })?;
            if seats == 0 || seats > MAX_PLAYERS {
                return Err(ConfigError::Invalid {
                    name: "MAX_ROOM_PLAYERS",
                    value: raw,
                });
            }
            room.max_players = seats;
        }
        if let Ok(raw) = std::env::var("DISCARD_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                name: "DISCARD_TIMEOUT_SECS",
                value: raw,
            })?;
            room.discard_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(Self { bind, room })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_override_wins() {
        let bind: SocketAddr = "0.0.0.0:9999".parse().unwrap();
        let config = ServerConfig::from_env(Some(bind)).unwrap();
        assert_eq!(config.bind, bind);
        assert_eq!(config.room.max_players, MAX_PLAYERS);
    }
}
