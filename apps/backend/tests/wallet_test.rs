mod common;

use backend::db::txn::with_txn;
use backend::entities::wallet_transactions::TxnKind;
use backend::entities::wallets;
use backend::state::app_state::AppState;
use backend::GameFlowService;
use backend::WalletService;
use common::{assert_code, create_user_with_funds, fetch_wallet, test_state};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

async fn freeze_wallet(state: &AppState, user_id: i64) {
    let wallet = fetch_wallet(state, user_id).await;
    let mut active = wallet.into_active_model();
    active.is_frozen = Set(true);
    active
        .update(&state.db)
        .await
        .expect("freeze wallet");
}

#[tokio::test]
async fn deposits_credit_the_balance_and_append_a_ledger_row() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 0).await;

    let wallet = with_txn(&state, |txn| Box::pin(async move {
        WalletService.deposit(txn, alice, 2_500).await
    }))
    .await
    .unwrap();
    assert_eq!(wallet.balance_cents, 2_500);
    assert_eq!(wallet.locked_balance_cents, 0);

    let txns = with_txn(&state, |txn| Box::pin(async move {
        WalletService.transactions(txn, alice).await
    }))
    .await
    .unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].kind, TxnKind::Deposit);
    assert_eq!(txns[0].amount_cents, 2_500);
    assert_eq!(txns[0].balance_before_cents, 0);
    assert_eq!(txns[0].balance_after_cents, 2_500);
}

#[tokio::test]
async fn withdrawals_debit_available_funds() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;

    let wallet = with_txn(&state, |txn| Box::pin(async move {
        WalletService.withdraw(txn, alice, 1_500).await
    }))
    .await
    .unwrap();
    assert_eq!(wallet.balance_cents, 3_500);

    let txns = with_txn(&state, |txn| Box::pin(async move {
        WalletService.transactions(txn, alice).await
    }))
    .await
    .unwrap();
    // Newest first: withdrawal then the fixture deposit.
    assert_eq!(txns[0].kind, TxnKind::Withdrawal);
    assert_eq!(txns[0].amount_cents, 1_500);
    assert_eq!(txns[1].kind, TxnKind::Deposit);
}

#[tokio::test]
async fn overdrawing_is_refused() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 1_000).await;

    let err = with_txn(&state, |txn| Box::pin(async move {
        WalletService.withdraw(txn, alice, 1_001).await
    }))
    .await
    .unwrap_err();
    assert_code(err, "INSUFFICIENT_FUNDS");

    let wallet = fetch_wallet(&state, alice).await;
    assert_eq!(wallet.balance_cents, 1_000);
}

#[tokio::test]
async fn locked_stakes_cannot_be_withdrawn() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;

    let flow = GameFlowService;
    let config = state.game.clone();
    with_txn(&state, |txn| Box::pin(async move {
        flow.create_or_join(txn, alice, 1_000, &config).await
    }))
    .await
    .unwrap();

    // 5000 on the books, 1000 locked: only 4000 is withdrawable.
    let err = with_txn(&state, |txn| Box::pin(async move {
        WalletService.withdraw(txn, alice, 4_500).await
    }))
    .await
    .unwrap_err();
    assert_code(err, "INSUFFICIENT_FUNDS");

    let wallet = with_txn(&state, |txn| Box::pin(async move {
        WalletService.withdraw(txn, alice, 4_000).await
    }))
    .await
    .unwrap();
    assert_eq!(wallet.balance_cents, 1_000);
    assert_eq!(wallet.locked_balance_cents, 1_000);
    assert_eq!(wallet.available_cents(), 0);
}

#[tokio::test]
async fn frozen_wallets_refuse_all_mutations() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 5_000).await;
    freeze_wallet(&state, alice).await;

    let err = with_txn(&state, |txn| Box::pin(async move {
        WalletService.deposit(txn, alice, 100).await
    }))
    .await
    .unwrap_err();
    assert_code(err, "WALLET_FROZEN");

    let err = with_txn(&state, |txn| Box::pin(async move {
        WalletService.withdraw(txn, alice, 100).await
    }))
    .await
    .unwrap_err();
    assert_code(err, "WALLET_FROZEN");

    // Matchmaking cannot lock funds in a frozen wallet either.
    let flow = GameFlowService;
    let config = state.game.clone();
    let err = with_txn(&state, |txn| Box::pin(async move {
        flow.create_or_join(txn, alice, 1_000, &config).await
    }))
    .await
    .unwrap_err();
    assert_code(err, "WALLET_FROZEN");
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let state = test_state().await;
    let alice = create_user_with_funds(&state, "alice", 1_000).await;

    for amount in [0, -50] {
        let err = with_txn(&state, |txn| Box::pin(async move {
            WalletService.deposit(txn, alice, amount).await
        }))
        .await
        .unwrap_err();
        assert_code(err, "VALIDATION");

        let err = with_txn(&state, |txn| Box::pin(async move {
            WalletService.withdraw(txn, alice, amount).await
        }))
        .await
        .unwrap_err();
        assert_code(err, "VALIDATION");
    }
}

#[tokio::test]
async fn balance_lookup_for_an_unknown_user_is_not_found() {
    let state = test_state().await;

    let err = with_txn(&state, |txn| Box::pin(async move {
        WalletService.balance(txn, 9_999).await
    }))
    .await
    .unwrap_err();
    assert_code(err, "WALLET_NOT_FOUND");
}

#[tokio::test]
async fn available_cents_subtracts_the_locked_balance() {
    let wallet = wallets::Model {
        id: 1,
        user_id: 1,
        balance_cents: 5_000,
        locked_balance_cents: 1_500,
        currency: "USD".to_string(),
        is_active: true,
        is_frozen: false,
        created_at: time::OffsetDateTime::now_utc(),
        updated_at: time::OffsetDateTime::now_utc(),
    };
    assert_eq!(wallet.available_cents(), 3_500);
}
