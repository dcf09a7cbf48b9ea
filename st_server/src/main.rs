//! Multi-room board game server using the async actor model.
//!
//! Each room's state is owned by a dedicated actor task behind the
//! `RoomRegistry`; this binary only wires configuration, logging, and the
//! HTTP/WebSocket gateway around it.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use settlers::room::RoomRegistry;
use st_server::api::{self, AppState};
use st_server::config::ServerConfig;

const HELP: &str = "\
Run a multi-room board game server

USAGE:
  st_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:4000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:4000)
  MAX_ROOM_PLAYERS         Seats per room, 1..=4
  DISCARD_TIMEOUT_SECS     Deadline for unanswered discards; 0 disables
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists.
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind_override)?;
    info!("starting board game server at {}", config.bind);

    let registry = Arc::new(RoomRegistry::new(config.room.clone()));
    let state = AppState { registry };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
