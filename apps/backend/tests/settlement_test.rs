mod common;

use backend::db::txn::with_txn;
use backend::entities::games::{GameEndReason, GameStatus};
use backend::entities::wallet_transactions::TxnKind;
use backend::state::app_state::AppState;
use backend::GameFlowService;
use common::{
    create_user_with_funds, fetch_game, fetch_transactions, fetch_user, fetch_wallet,
    start_stake_game, test_state,
};

async fn settle(
    state: &AppState,
    game_id: i64,
    winner: Option<i64>,
    reason: GameEndReason,
) -> Option<backend::GameEvent> {
    let flow = GameFlowService;
    let config = state.game.clone();
    with_txn(state, |txn| Box::pin(async move {
        flow.settle(txn, &config, game_id, winner, reason).await
    }))
    .await
    .unwrap()
}

#[tokio::test]
async fn a_win_pays_the_winner_and_releases_both_stakes() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let event = settle(&state, game.id, Some(alice), GameEndReason::EmptyHand).await;
    assert!(event.is_some());

    let game = fetch_game(&state, game.id).await;
    assert_eq!(game.status, GameStatus::Completed);
    assert!(game.fee_processed);
    assert_eq!(game.winner_user_id, Some(alice));
    assert_eq!(game.winner_payout_cents, Some(1_800));
    assert_eq!(game.loser_loss_cents, Some(1_000));
    assert_eq!(game.platform_fee_cents, Some(200));
    assert!(game.completed_at.is_some());

    // Payout plus fee always reconstitutes the pot.
    assert_eq!(
        game.winner_payout_cents.unwrap() + game.platform_fee_cents.unwrap(),
        game.pot_cents
    );

    let alice_wallet = fetch_wallet(&state, alice).await;
    assert_eq!(alice_wallet.balance_cents, 6_800);
    assert_eq!(alice_wallet.locked_balance_cents, 0);

    let bob_wallet = fetch_wallet(&state, bob).await;
    assert_eq!(bob_wallet.balance_cents, 5_000);
    assert_eq!(bob_wallet.locked_balance_cents, 0);
}

#[tokio::test]
async fn settlement_writes_ledger_rows_with_balance_snapshots() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    settle(&state, game.id, Some(alice), GameEndReason::EmptyHand).await;

    let alice_txns = fetch_transactions(&state, alice).await;
    let win = &alice_txns[0];
    assert_eq!(win.kind, TxnKind::Win);
    assert_eq!(win.amount_cents, 1_800);
    assert_eq!(win.balance_before_cents, 5_000);
    assert_eq!(win.balance_after_cents, 6_800);
    assert_eq!(win.game_id, Some(game.id));

    // The loss only releases locked funds; the balance itself moved at no
    // point after the original deposit.
    let bob_txns = fetch_transactions(&state, bob).await;
    let loss = &bob_txns[0];
    assert_eq!(loss.kind, TxnKind::Loss);
    assert_eq!(loss.amount_cents, 1_000);
    assert_eq!(loss.balance_before_cents, 5_000);
    assert_eq!(loss.balance_after_cents, 5_000);
    assert_eq!(loss.game_id, Some(game.id));
}

#[tokio::test]
async fn settling_twice_is_a_no_op() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let first = settle(&state, game.id, Some(alice), GameEndReason::EmptyHand).await;
    assert!(first.is_some());

    // A racing settler with a different outcome must change nothing.
    let second = settle(&state, game.id, Some(bob), GameEndReason::Forfeit).await;
    assert!(second.is_none());

    let game = fetch_game(&state, game.id).await;
    assert_eq!(game.winner_user_id, Some(alice));
    assert_eq!(game.end_reason, Some(GameEndReason::EmptyHand));

    let alice_wallet = fetch_wallet(&state, alice).await;
    assert_eq!(alice_wallet.balance_cents, 6_800);
    let bob_wallet = fetch_wallet(&state, bob).await;
    assert_eq!(bob_wallet.balance_cents, 5_000);

    // Exactly one settlement ledger row per side.
    let alice_wins = fetch_transactions(&state, alice)
        .await
        .iter()
        .filter(|t| t.kind == TxnKind::Win)
        .count();
    assert_eq!(alice_wins, 1);
}

#[tokio::test]
async fn a_draw_refunds_both_stakes() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    let bob = create_user_with_funds(&state, "bob", 5_000).await;
    let game = start_stake_game(&state, alice, bob, 1_000).await;

    let event = settle(&state, game.id, None, GameEndReason::Draw).await;
    assert!(event.is_some());

    let game = fetch_game(&state, game.id).await;
    assert_eq!(game.status, GameStatus::Completed);
    assert_eq!(game.winner_user_id, None);
    assert_eq!(game.winner_payout_cents, None);
    assert_eq!(game.platform_fee_cents, Some(0));
    assert_eq!(game.end_reason, Some(GameEndReason::Draw));

    for user in [alice, bob] {
        let wallet = fetch_wallet(&state, user).await;
        assert_eq!(wallet.balance_cents, 5_000);
        assert_eq!(wallet.locked_balance_cents, 0);

        let txns = fetch_transactions(&state, user).await;
        let refund = &txns[0];
        assert_eq!(refund.kind, TxnKind::Refund);
        assert_eq!(refund.amount_cents, 1_000);
        assert_eq!(refund.balance_before_cents, refund.balance_after_cents);

        let stats = fetch_user(&state, user).await;
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.total_games, 1);
    }
}

#[tokio::test]
async fn settlement_updates_lifetime_stats_and_streaks() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 10_000).await;
    let bob = create_user_with_funds(&state, "bob", 10_000).await;

    let game = start_stake_game(&state, alice, bob, 1_000).await;
    settle(&state, game.id, Some(alice), GameEndReason::EmptyHand).await;

    let game = start_stake_game(&state, alice, bob, 1_000).await;
    settle(&state, game.id, Some(alice), GameEndReason::Blocked).await;

    let alice_stats = fetch_user(&state, alice).await;
    assert_eq!(alice_stats.total_games, 2);
    assert_eq!(alice_stats.wins, 2);
    assert_eq!(alice_stats.current_streak, 2);
    assert_eq!(alice_stats.best_streak, 2);
    assert_eq!(alice_stats.total_earnings_cents, 3_600);

    let bob_stats = fetch_user(&state, bob).await;
    assert_eq!(bob_stats.total_games, 2);
    assert_eq!(bob_stats.losses, 2);
    assert_eq!(bob_stats.current_streak, 0);
    assert_eq!(bob_stats.total_losses_cents, 2_000);

    // A loss snaps the winner's streak back but keeps the best.
    let game = start_stake_game(&state, alice, bob, 1_000).await;
    settle(&state, game.id, Some(bob), GameEndReason::EmptyHand).await;

    let alice_stats = fetch_user(&state, alice).await;
    assert_eq!(alice_stats.current_streak, 0);
    assert_eq!(alice_stats.best_streak, 2);
    let bob_stats = fetch_user(&state, bob).await;
    assert_eq!(bob_stats.current_streak, 1);
}

#[tokio::test]
async fn a_waiting_game_cannot_be_settled() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;

    let flow = GameFlowService;
    let config = state.game.clone();
    let created = with_txn(&state, |txn| Box::pin(async move {
        flow.create_or_join(txn, alice, 1_000, &config).await
    }))
    .await
    .unwrap();

    let event = settle(&state, created.game.id, Some(alice), GameEndReason::Forfeit).await;
    assert!(event.is_none());

    let game = fetch_game(&state, created.game.id).await;
    assert_eq!(game.status, GameStatus::Waiting);
    let wallet = fetch_wallet(&state, alice).await;
    assert_eq!(wallet.locked_balance_cents, 1_000);
}
