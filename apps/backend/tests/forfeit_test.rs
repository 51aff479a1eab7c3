mod common;

use std::time::Duration;

use backend::config::game::GameConfig;
use backend::entities::games::{GameEndReason, GameStatus};
use backend::realtime::events::GameEvent;
use backend::realtime::presence::PresenceMonitor;
use common::{
    create_user_with_funds, fetch_game, fetch_players, fetch_wallet, start_stake_game,
    test_state_with,
};

fn short_grace(millis: u64) -> GameConfig {
    GameConfig {
        forfeit_grace: Duration::from_millis(millis),
        ..GameConfig::default()
    }
}

#[tokio::test]
async fn exceeding_the_grace_period_forfeits_to_the_opponent() {
    let state = test_state_with(short_grace(50)).await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let monitor = PresenceMonitor::new(state.clone());
    let mut rx = state.events.subscribe();

    let conn = monitor.on_user_connected(bob, game.id).await.unwrap();
    monitor
        .on_user_disconnected(bob, game.id, conn)
        .await
        .unwrap();

    let ended = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let GameEvent::GameEnded { .. } = rx.recv().await.unwrap() {
                break;
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "no GameEnded event within the timeout");

    let game = fetch_game(&state, game.id).await;
    assert_eq!(game.status, GameStatus::Completed);
    assert_eq!(game.winner_user_id, Some(alice));
    assert_eq!(game.end_reason, Some(GameEndReason::Forfeit));

    let alice_wallet = fetch_wallet(&state, alice).await;
    assert_eq!(alice_wallet.balance_cents, 6_800);
    assert_eq!(alice_wallet.locked_balance_cents, 0);
    let bob_wallet = fetch_wallet(&state, bob).await;
    assert_eq!(bob_wallet.balance_cents, 5_000);
    assert_eq!(bob_wallet.locked_balance_cents, 0);
}

#[tokio::test]
async fn reconnecting_within_the_grace_period_cancels_the_forfeit() {
    let state = test_state_with(short_grace(200)).await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let monitor = PresenceMonitor::new(state.clone());
    let conn = monitor.on_user_connected(bob, game.id).await.unwrap();
    monitor
        .on_user_disconnected(bob, game.id, conn)
        .await
        .unwrap();

    let players = fetch_players(&state, game.id).await;
    let seat = players.iter().find(|p| p.user_id == bob).unwrap();
    assert!(!seat.is_connected);

    monitor.on_user_connected(bob, game.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let game = fetch_game(&state, game.id).await;
    assert_eq!(game.status, GameStatus::Active);

    let players = fetch_players(&state, game.id).await;
    let seat = players.iter().find(|p| p.user_id == bob).unwrap();
    assert!(seat.is_connected);
}

#[tokio::test]
async fn a_superseded_connections_disconnect_is_ignored() {
    let state = test_state_with(short_grace(50)).await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let monitor = PresenceMonitor::new(state.clone());
    let stale = monitor.on_user_connected(bob, game.id).await.unwrap();
    let _fresh = monitor.on_user_connected(bob, game.id).await.unwrap();

    monitor
        .on_user_disconnected(bob, game.id, stale)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let game = fetch_game(&state, game.id).await;
    assert_eq!(game.status, GameStatus::Active);
    let players = fetch_players(&state, game.id).await;
    let seat = players.iter().find(|p| p.user_id == bob).unwrap();
    assert!(seat.is_connected);
}

#[tokio::test]
async fn reconnection_publishes_a_distinct_event() {
    let state = test_state_with(short_grace(500)).await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let monitor = PresenceMonitor::new(state.clone());
    let conn = monitor.on_user_connected(bob, game.id).await.unwrap();

    let mut rx = state.events.subscribe();
    monitor
        .on_user_disconnected(bob, game.id, conn)
        .await
        .unwrap();
    monitor.on_user_connected(bob, game.id).await.unwrap();

    assert!(matches!(
        rx.recv().await.unwrap(),
        GameEvent::OpponentDisconnected { grace_secs: 0, .. }
    ));
    assert!(matches!(
        rx.recv().await.unwrap(),
        GameEvent::OpponentReconnected { user_id, .. } if user_id == bob
    ));
}

#[tokio::test]
async fn channel_events_are_rate_limited_per_connection() {
    let config = GameConfig {
        event_rate_window: Duration::from_secs(10),
        event_rate_max: 3,
        ..GameConfig::default()
    };
    let state = test_state_with(config).await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let monitor = PresenceMonitor::new(state.clone());
    let conn = monitor.on_user_connected(bob, game.id).await.unwrap();
    let other = monitor.on_user_connected(alice, game.id).await.unwrap();

    assert!(monitor.allow_channel_event(conn));
    assert!(monitor.allow_channel_event(conn));
    assert!(monitor.allow_channel_event(conn));
    assert!(!monitor.allow_channel_event(conn));

    // The opponent's connection has its own budget.
    assert!(monitor.allow_channel_event(other));
}
