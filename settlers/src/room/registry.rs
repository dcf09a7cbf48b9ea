//! The room registry: an owned map of room id to handle with explicit
//! lifecycle rules — rooms are created on demand when no open room can
//! seat a joiner and deleted when the last player leaves.

use std::collections::BTreeMap;

use anyhow::{Context, anyhow};
use log::info;
use tokio::sync::{RwLock, mpsc};

use crate::game::entities::PlayerId;
use crate::game::error::GameError;
use crate::game::state::Phase;
use crate::room::actor::{RoomActor, RoomHandle};
use crate::room::config::RoomConfig;
use crate::room::events::{RoomId, ServerEvent};
use crate::room::messages::RoomJoined;

/// One row of the room listing.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub player_count: usize,
    pub phase: Phase,
}

/// Process-wide owner of all live rooms.
pub struct RoomRegistry {
    config: RoomConfig,
    /// BTreeMap so the open-room scan order is consistent between joins.
    rooms: RwLock<BTreeMap<RoomId, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: RwLock::new(BTreeMap::new()),
        }
    }

    /// Seat a player in the first open room that accepts them, creating a
    /// fresh room when none does. Returns the room's handle along with
    /// the join reply.
    pub async fn join_room(
        &self,
        player: PlayerId,
        display_name: String,
        subscriber: mpsc::Sender<ServerEvent>,
    ) -> anyhow::Result<(RoomHandle, RoomJoined)> {
        let candidates: Vec<RoomHandle> = {
            let rooms = self.rooms.read().await;
            rooms.values().cloned().collect()
        };

        let mut dead = Vec::new();
        for handle in candidates {
            match handle
                .join(player.clone(), display_name.clone(), subscriber.clone())
                .await
            {
                Ok(Ok(joined)) => return Ok((handle, joined)),
                // Full or already playing; keep scanning.
                Ok(Err(GameError::RoomFull | GameError::GameInProgress)) => {}
                Ok(Err(rejection)) => return Err(anyhow!(rejection)),
                Err(gone) => dead.push(gone.0),
            }
        }
        if !dead.is_empty() {
            let mut rooms = self.rooms.write().await;
            for id in dead {
                rooms.remove(&id);
            }
        }

        // No open seat anywhere: open a new room.
        let (actor, handle) = RoomActor::new(self.config.clone());
        let room_id = handle.room_id();
        tokio::spawn(actor.run());
        {
            let mut rooms = self.rooms.write().await;
            rooms.insert(room_id, handle.clone());
        }
        info!("created room {room_id} for {display_name}");

        let joined = handle
            .join(player, display_name, subscriber)
            .await
            .context("fresh room went away during join")?
            .map_err(|rejection| anyhow!(rejection))?;
        Ok((handle, joined))
    }

    /// Remove a player; drops the room once it reports empty. Returns
    /// whether the player was actually seated there.
    pub async fn leave_room(&self, room_id: RoomId, player: PlayerId) -> anyhow::Result<bool> {
        let handle = {
            let rooms = self.rooms.read().await;
            rooms.get(&room_id).cloned()
        };
        let Some(handle) = handle else {
            return Ok(false);
        };

        let reply = handle.leave(player).await?;
        if reply.now_empty {
            let mut rooms = self.rooms.write().await;
            rooms.remove(&room_id);
            info!("destroyed empty room {room_id}");
        }
        Ok(reply.removed)
    }

    pub async fn get_room(&self, room_id: RoomId) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }

    /// Snapshot every live room for the listing endpoint. Rooms that died
    /// since the scan are skipped.
    pub async fn summaries(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = {
            let rooms = self.rooms.read().await;
            rooms.values().cloned().collect()
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(snapshot) = handle.snapshot().await {
                summaries.push(RoomSummary {
                    id: snapshot.id,
                    player_count: snapshot.players.len(),
                    phase: snapshot.game_state.phase,
                });
            }
        }
        summaries
    }
}
