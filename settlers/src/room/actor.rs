//! Room actor: one task per room owning the players and game state.

use std::collections::HashMap;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, interval};
use uuid::Uuid;

use crate::game::action::{Action, Outcome};
use crate::game::entities::{Player, PlayerColor, PlayerId};
use crate::game::error::GameError;
use crate::game::state::{GameState, Phase};
use crate::room::config::RoomConfig;
use crate::room::events::{RoomId, RoomSnapshot, ServerEvent};
use crate::room::messages::{LeaveReply, RoomGone, RoomJoined, RoomMessage};

/// Cloneable address of a room actor.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    async fn request<T>(
        &self,
        message: RoomMessage,
        receiver: oneshot::Receiver<T>,
    ) -> Result<T, RoomGone> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RoomGone(self.room_id))?;
        receiver.await.map_err(|_| RoomGone(self.room_id))
    }

    pub async fn join(
        &self,
        player: PlayerId,
        display_name: String,
        subscriber: mpsc::Sender<ServerEvent>,
    ) -> Result<Result<RoomJoined, GameError>, RoomGone> {
        let (respond_to, rx) = oneshot::channel();
        self.request(
            RoomMessage::Join {
                player,
                display_name,
                subscriber,
                respond_to,
            },
            rx,
        )
        .await
    }

    pub async fn leave(&self, player: PlayerId) -> Result<LeaveReply, RoomGone> {
        let (respond_to, rx) = oneshot::channel();
        self.request(RoomMessage::Leave { player, respond_to }, rx).await
    }

    pub async fn act(
        &self,
        player: PlayerId,
        action: Action,
    ) -> Result<Result<Outcome, GameError>, RoomGone> {
        let (respond_to, rx) = oneshot::channel();
        self.request(
            RoomMessage::Act {
                player,
                action,
                respond_to,
            },
            rx,
        )
        .await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomGone> {
        let (respond_to, rx) = oneshot::channel();
        self.request(RoomMessage::Snapshot { respond_to }, rx).await
    }

    pub async fn subscribe(
        &self,
        player: PlayerId,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<(), RoomGone> {
        self.sender
            .send(RoomMessage::Subscribe { player, sender })
            .await
            .map_err(|_| RoomGone(self.room_id))
    }

    pub async fn unsubscribe(&self, player: PlayerId) -> Result<(), RoomGone> {
        self.sender
            .send(RoomMessage::Unsubscribe { player })
            .await
            .map_err(|_| RoomGone(self.room_id))
    }
}

/// The actor itself. Owns the only mutable copy of the room's state; all
/// access goes through the inbox, which serializes actions per room.
pub struct RoomActor {
    id: RoomId,
    config: RoomConfig,
    players: Vec<Player>,
    game: GameState,
    rng: StdRng,
    inbox: mpsc::Receiver<RoomMessage>,
    subscribers: HashMap<PlayerId, mpsc::Sender<ServerEvent>>,
    /// Deadline for the oldest unresolved mandatory discard.
    discard_due: Option<Instant>,
    is_closed: bool,
}

impl RoomActor {
    pub fn new(config: RoomConfig) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(64);
        let id = Uuid::new_v4();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let game = GameState::generate(&mut rng);

        let actor = Self {
            id,
            config,
            players: Vec::new(),
            game,
            rng,
            inbox,
            subscribers: HashMap::new(),
            discard_due: None,
            is_closed: false,
        };
        let handle = RoomHandle {
            sender,
            room_id: id,
        };
        (actor, handle)
    }

    pub fn room_id(&self) -> RoomId {
        self.id
    }

    /// Event loop: drain the inbox, tick for overdue discards, stop when
    /// the room empties.
    pub async fn run(mut self) {
        info!("room {} open", self.id);
        let mut tick = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                maybe_message = self.inbox.recv() => {
                    match maybe_message {
                        Some(message) => self.handle_message(message),
                        None => break,
                    }
                    if self.is_closed {
                        break;
                    }
                }
                _ = tick.tick() => {
                    self.handle_tick();
                }
            }
        }

        info!("room {} closed", self.id);
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                player,
                display_name,
                subscriber,
                respond_to,
            } => {
                let result = self.handle_join(player, display_name, subscriber);
                let accepted = result.is_ok();
                let _ = respond_to.send(result);
                if accepted {
                    self.broadcast(|s| ServerEvent::JoinedRoom(s));
                }
            }

            RoomMessage::Leave { player, respond_to } => {
                let reply = self.handle_leave(&player);
                let _ = respond_to.send(reply);
                if reply.removed && !reply.now_empty {
                    self.broadcast(ServerEvent::UpdateGameState);
                }
            }

            RoomMessage::Act {
                player,
                action,
                respond_to,
            } => {
                let result = self
                    .game
                    .apply(&mut self.players, &player, action, &mut self.rng);
                match result {
                    Ok(outcome) => {
                        self.arm_discard_deadline(outcome);
                        let _ = respond_to.send(Ok(outcome));
                        self.broadcast(|s| ServerEvent::for_outcome(outcome, s));
                    }
                    Err(rejection) => {
                        // Rejections are no-ops: reported to the caller,
                        // never broadcast.
                        debug!("room {}: rejected {player}: {rejection}", self.id);
                        let _ = respond_to.send(Err(rejection));
                    }
                }
            }

            RoomMessage::Snapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }

            RoomMessage::Subscribe { player, sender } => {
                self.subscribers.insert(player, sender);
            }

            RoomMessage::Unsubscribe { player } => {
                self.subscribers.remove(&player);
            }
        }
    }

    fn handle_join(
        &mut self,
        player: PlayerId,
        display_name: String,
        subscriber: mpsc::Sender<ServerEvent>,
    ) -> Result<RoomJoined, GameError> {
        if self.game.phase != Phase::Lobby {
            return Err(GameError::GameInProgress);
        }

        // A reconnect keeps the existing seat and just refreshes the
        // broadcast channel.
        if let Some(existing) = self.players.iter().find(|p| p.id == player) {
            let color = existing.color;
            self.subscribers.insert(player, subscriber);
            return Ok(RoomJoined {
                room_id: self.id,
                color,
            });
        }

        let seats = self.config.max_players.min(PlayerColor::PALETTE.len());
        if self.players.len() >= seats {
            return Err(GameError::RoomFull);
        }

        let used: Vec<PlayerColor> = self.players.iter().map(|p| p.color).collect();
        let color =
            PlayerColor::draw_unused(&used, &mut self.rng).ok_or(GameError::RoomFull)?;

        info!("room {}: {display_name} joined as {color}", self.id);
        self.players
            .push(Player::new(player.clone(), display_name, color));
        self.subscribers.insert(player, subscriber);
        Ok(RoomJoined {
            room_id: self.id,
            color,
        })
    }

    fn handle_leave(&mut self, player: &PlayerId) -> LeaveReply {
        self.subscribers.remove(player);
        let Some(pos) = self.players.iter().position(|p| &p.id == player) else {
            return LeaveReply {
                removed: false,
                now_empty: self.players.is_empty(),
            };
        };

        let departed = self.players.remove(pos);
        self.game.handle_departure(&departed.id, &departed.hand);
        info!("room {}: {} left", self.id, departed.name);

        let now_empty = self.players.is_empty();
        if now_empty {
            self.is_closed = true;
        }
        LeaveReply {
            removed: true,
            now_empty,
        }
    }

    /// Start (or clear) the discard clock after an accepted action.
    fn arm_discard_deadline(&mut self, outcome: Outcome) {
        if self.game.pending_discards.is_empty() {
            self.discard_due = None;
            return;
        }
        if outcome == Outcome::KnightRolled
            && let Some(timeout) = self.config.discard_timeout
        {
            self.discard_due = Some(Instant::now() + timeout);
        }
    }

    /// Force-resolve discards nobody answered before the deadline.
    fn handle_tick(&mut self) {
        let Some(due) = self.discard_due else {
            return;
        };
        if self.game.pending_discards.is_empty() {
            self.discard_due = None;
            return;
        }
        if Instant::now() < due {
            return;
        }

        let debtors: Vec<PlayerId> = self.game.pending_discards.keys().cloned().collect();
        warn!(
            "room {}: forcing {} overdue discard(s)",
            self.id,
            debtors.len()
        );
        for debtor in &debtors {
            self.game.force_discard(&mut self.players, debtor);
        }
        self.discard_due = None;
        self.broadcast(ServerEvent::UpdateGameState);
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::capture(self.id, &self.players, &self.game)
    }

    /// Push the post-mutation snapshot to every subscriber. Slow or gone
    /// clients are dropped rather than allowed to stall the room.
    fn broadcast(&mut self, wrap: impl Fn(RoomSnapshot) -> ServerEvent) {
        let snapshot = self.snapshot();
        let room_id = self.id;
        self.subscribers.retain(|player, sender| {
            match sender.try_send(wrap(snapshot.clone())) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("room {room_id}: dropping slow subscriber {player}");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}
