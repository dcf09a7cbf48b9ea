//! Integration tests for the room actor and registry: joining, broadcast
//! fan-out, rejection silence, teardown, and the discard deadline.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use settlers::game::constants::BOARD_TILE_COUNT;
use settlers::game::entities::{PlayerId, Point};
use settlers::game::{Action, GameError, Outcome, Phase};
use settlers::room::events::ServerEvent;
use settlers::room::{RoomConfig, RoomRegistry};

fn test_config() -> RoomConfig {
    RoomConfig {
        seed: Some(7),
        discard_timeout: None,
        ..RoomConfig::default()
    }
}

fn channel() -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
    mpsc::channel(512)
}

async fn next_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for broadcast")
        .expect("broadcast channel closed")
}

fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn join_fills_one_room_before_opening_another() {
    let registry = RoomRegistry::new(test_config());
    let mut receivers = Vec::new();
    let mut room_ids = Vec::new();

    for i in 0..5 {
        let (tx, rx) = channel();
        let (_, joined) = registry
            .join_room(PlayerId::new(format!("p{i}")), format!("player {i}"), tx)
            .await
            .expect("join");
        receivers.push(rx);
        room_ids.push(joined.room_id);
    }

    // Four seats per room: the fifth player opens a second room.
    assert_eq!(room_ids[0], room_ids[1]);
    assert_eq!(room_ids[0], room_ids[3]);
    assert_ne!(room_ids[0], room_ids[4]);
    assert_eq!(registry.room_count().await, 2);

    // The first joiner saw every subsequent join of their own room.
    let events = drain(&mut receivers[0]);
    assert_eq!(events.len(), 4);
    assert!(
        events
            .iter()
            .all(|e| matches!(e, ServerEvent::JoinedRoom(_)))
    );
    assert_eq!(events[3].snapshot().players.len(), 4);

    // Colors are unique within the room.
    let players = &events[3].snapshot().players;
    for (i, a) in players.iter().enumerate() {
        for b in players.iter().skip(i + 1) {
            assert_ne!(a.color, b.color);
        }
    }
}

#[tokio::test]
async fn rejected_actions_reach_only_the_caller() {
    let registry = RoomRegistry::new(test_config());
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();

    let (room, _) = registry
        .join_room(PlayerId::new("alice"), "Alice".into(), tx_a)
        .await
        .expect("join");
    registry
        .join_room(PlayerId::new("bob"), "Bob".into(), tx_b)
        .await
        .expect("join");
    drain(&mut rx_a);
    drain(&mut rx_b);

    // Rolling in the lobby is a phase violation and must not broadcast.
    let result = room
        .act(PlayerId::new("alice"), Action::RollDice)
        .await
        .expect("room alive");
    assert_eq!(result, Err(GameError::PhaseViolation));

    // An outsider is rejected too.
    let result = room
        .act(PlayerId::new("mallory"), Action::EndTurn)
        .await
        .expect("room alive");
    assert_eq!(result, Err(GameError::UnknownPlayer));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(drain(&mut rx_a).is_empty());
    assert!(drain(&mut rx_b).is_empty());
}

#[tokio::test]
async fn start_game_broadcasts_setup_phase() {
    let registry = RoomRegistry::new(test_config());
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();

    let (room, _) = registry
        .join_room(PlayerId::new("alice"), "Alice".into(), tx_a)
        .await
        .expect("join");
    registry
        .join_room(PlayerId::new("bob"), "Bob".into(), tx_b)
        .await
        .expect("join");
    drain(&mut rx_a);
    drain(&mut rx_b);

    let outcome = room
        .act(PlayerId::new("alice"), Action::StartGame)
        .await
        .expect("room alive")
        .expect("start accepted");
    assert_eq!(outcome, Outcome::Updated);

    for rx in [&mut rx_a, &mut rx_b] {
        let event = next_event(rx).await;
        let snapshot = match &event {
            ServerEvent::UpdateGameState(s) => s,
            other => panic!("expected update-game-state, got {other:?}"),
        };
        assert_eq!(snapshot.game_state.phase, Phase::Setup);
        assert_eq!(snapshot.game_state.turn_order.len(), 2);
        assert_eq!(snapshot.game_state.setup_turn, 1);
    }

    // A second start is rejected silently.
    let result = room
        .act(PlayerId::new("bob"), Action::StartGame)
        .await
        .expect("room alive");
    assert_eq!(result, Err(GameError::GameInProgress));
}

#[tokio::test]
async fn leaving_broadcasts_to_the_rest_and_empty_rooms_vanish() {
    let registry = RoomRegistry::new(test_config());
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();

    let (_, joined_a) = registry
        .join_room(PlayerId::new("alice"), "Alice".into(), tx_a)
        .await
        .expect("join");
    registry
        .join_room(PlayerId::new("bob"), "Bob".into(), tx_b)
        .await
        .expect("join");
    drain(&mut rx_a);
    drain(&mut rx_b);

    let removed = registry
        .leave_room(joined_a.room_id, PlayerId::new("alice"))
        .await
        .expect("leave");
    assert!(removed);

    let event = next_event(&mut rx_b).await;
    assert!(matches!(event, ServerEvent::UpdateGameState(_)));
    assert_eq!(event.snapshot().players.len(), 1);
    assert_eq!(registry.room_count().await, 1);

    let removed = registry
        .leave_room(joined_a.room_id, PlayerId::new("bob"))
        .await
        .expect("leave");
    assert!(removed);
    assert_eq!(registry.room_count().await, 0);

    // Leaving a destroyed room is a quiet no-op.
    let removed = registry
        .leave_room(joined_a.room_id, PlayerId::new("bob"))
        .await
        .expect("leave");
    assert!(!removed);
}

#[tokio::test]
async fn rooms_mid_game_are_not_joinable() {
    let registry = RoomRegistry::new(test_config());
    let (tx_a, _rx_a) = channel();

    let (room, joined_a) = registry
        .join_room(PlayerId::new("alice"), "Alice".into(), tx_a)
        .await
        .expect("join");
    room.act(PlayerId::new("alice"), Action::StartGame)
        .await
        .expect("room alive")
        .expect("start accepted");

    let (tx_b, _rx_b) = channel();
    let (_, joined_b) = registry
        .join_room(PlayerId::new("bob"), "Bob".into(), tx_b)
        .await
        .expect("join");
    assert_ne!(joined_a.room_id, joined_b.room_id);
    assert_eq!(registry.room_count().await, 2);
}

/// Walk a two-player room through the whole setup snake and into the
/// first dice turn, across the actor API.
#[tokio::test]
async fn full_setup_round_reaches_rolling_dice() {
    let registry = RoomRegistry::new(test_config());
    let (tx_a, mut rx_a) = channel();
    let (tx_b, _rx_b) = channel();

    let (room, _) = registry
        .join_room(PlayerId::new("alice"), "Alice".into(), tx_a)
        .await
        .expect("join");
    registry
        .join_room(PlayerId::new("bob"), "Bob".into(), tx_b)
        .await
        .expect("join");

    room.act(PlayerId::new("alice"), Action::StartGame)
        .await
        .expect("alive")
        .expect("start");

    for _ in 0..4 {
        let snapshot = room.snapshot().await.expect("alive");
        let current = snapshot.game_state.turn_order[snapshot.game_state.turn_index].clone();
        room.act(
            current.clone(),
            Action::PlaceSettlement {
                position: Point { x: 0.0, y: 0.0 },
                adjacent_tiles: vec![0, 1, 2],
            },
        )
        .await
        .expect("alive")
        .expect("settlement");
        room.act(
            current.clone(),
            Action::PlaceRoad {
                start: Point { x: 0.0, y: 0.0 },
                end: Point { x: 1.0, y: 0.0 },
            },
        )
        .await
        .expect("alive")
        .expect("road");
        room.act(current, Action::EndTurn)
            .await
            .expect("alive")
            .expect("end turn");
    }

    let snapshot = room.snapshot().await.expect("alive");
    assert_eq!(snapshot.game_state.phase, Phase::RollingDice);
    assert_eq!(snapshot.game_state.turn_index, 0);
    assert_eq!(snapshot.game_state.settlements.len(), 4);
    assert_eq!(snapshot.game_state.roads.len(), 4);

    // The roll broadcast is the distinguished dice event.
    drain(&mut rx_a);
    let roller = snapshot.game_state.turn_order[0].clone();
    room.act(roller, Action::RollDice)
        .await
        .expect("alive")
        .expect("roll");
    let event = next_event(&mut rx_a).await;
    assert!(
        matches!(event, ServerEvent::DiceRolled(_) | ServerEvent::KnightRolled(_)),
        "expected a distinguished dice event, got {event:?}"
    );
    assert!(event.snapshot().game_state.dice.is_some());
}

/// An unanswered mandatory discard resolves itself once the deadline
/// passes, so the room can never be blocked forever.
#[tokio::test]
async fn overdue_discards_resolve_on_the_tick() {
    let config = RoomConfig {
        seed: Some(21),
        discard_timeout: Some(Duration::from_millis(100)),
        ..RoomConfig::default()
    };
    let registry = RoomRegistry::new(config);
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();

    let (room, _) = registry
        .join_room(PlayerId::new("alice"), "Alice".into(), tx_a)
        .await
        .expect("join");
    registry
        .join_room(PlayerId::new("bob"), "Bob".into(), tx_b)
        .await
        .expect("join");

    room.act(PlayerId::new("alice"), Action::StartGame)
        .await
        .expect("alive")
        .expect("start");

    // Claim adjacency to the whole board so every roll pays out and
    // hands cross the discard threshold quickly.
    let everywhere: Vec<usize> = (0..BOARD_TILE_COUNT).collect();
    for _ in 0..4 {
        let snapshot = room.snapshot().await.expect("alive");
        let current = snapshot.game_state.turn_order[snapshot.game_state.turn_index].clone();
        room.act(
            current.clone(),
            Action::PlaceSettlement {
                position: Point { x: 0.0, y: 0.0 },
                adjacent_tiles: everywhere.clone(),
            },
        )
        .await
        .expect("alive")
        .expect("settlement");
        room.act(
            current.clone(),
            Action::PlaceRoad {
                start: Point { x: 0.0, y: 0.0 },
                end: Point { x: 1.0, y: 0.0 },
            },
        )
        .await
        .expect("alive")
        .expect("road");
        room.act(current, Action::EndTurn)
            .await
            .expect("alive")
            .expect("end turn");
    }

    // Play until a 7 lands while someone owes cards.
    let mut guard = 0;
    loop {
        guard += 1;
        assert!(guard < 2000, "never reached a pending discard");
        drain(&mut rx_a);
        drain(&mut rx_b);

        let snapshot = room.snapshot().await.expect("alive");
        let game = &snapshot.game_state;
        let current = game.turn_order[game.turn_index].clone();
        match game.phase {
            Phase::RollingDice => {
                room.act(current, Action::RollDice)
                    .await
                    .expect("alive")
                    .expect("roll");
            }
            Phase::PlayerTurnKnight if !game.pending_discards.is_empty() => break,
            Phase::PlayerTurnKnight => {
                let target = (game.robber_index + 1) % BOARD_TILE_COUNT;
                room.act(current, Action::MoveKnight { tile_index: target })
                    .await
                    .expect("alive")
                    .expect("knight");
            }
            Phase::PlayerTurn => {
                room.act(current, Action::EndTurn)
                    .await
                    .expect("alive")
                    .expect("end turn");
            }
            other => panic!("unexpected phase {other:?}"),
        }
    }

    // Nobody answers the discard prompt; the room resolves it alone.
    let resolved = timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = room.snapshot().await.expect("alive");
            if snapshot.game_state.pending_discards.is_empty() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .expect("discard deadline never fired");

    // The forced discard went back to the bank: totals are intact.
    for kind in settlers::game::entities::Resource::ALL {
        let in_hands: u32 = resolved
            .players
            .iter()
            .map(|p| p.hand.iter().filter(|c| **c == kind).count() as u32)
            .sum();
        let total = u32::from(resolved.game_state.bank.get(kind)) + in_hands;
        assert_eq!(total, u32::from(settlers::game::constants::BANK_PER_RESOURCE));
    }

    // And the robber move is unblocked.
    let snapshot = room.snapshot().await.expect("alive");
    let game = &snapshot.game_state;
    assert_eq!(game.phase, Phase::PlayerTurnKnight);
    let current = game.turn_order[game.turn_index].clone();
    let target = (game.robber_index + 1) % BOARD_TILE_COUNT;
    room.act(current, Action::MoveKnight { tile_index: target })
        .await
        .expect("alive")
        .expect("knight after forced discard");
}
