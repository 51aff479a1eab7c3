#![allow(dead_code)]

use backend::config::game::GameConfig;
use backend::db::txn::with_txn;
use backend::domain::tiles::Tile;
use backend::entities::types::TileList;
use backend::entities::{game_players, games, users, wallet_transactions, wallets};
use backend::error::AppError;
use backend::repos::{
    games as games_repo, players as players_repo, users as users_repo, wallets as wallets_repo,
};
use backend::services::wallets::WalletService;
use backend::state::app_state::AppState;
use migration::{Migrator, MigratorTrait};
use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, Database};
use tracing_subscriber::{fmt, EnvFilter};

static LOGGING: OnceCell<()> = OnceCell::new();

#[ctor::ctor]
fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// Fresh in-memory database with the full schema applied.
pub async fn test_state() -> AppState {
    test_state_with(GameConfig::default()).await
}

pub async fn test_state_with(config: GameConfig) -> AppState {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // One connection: a second one would see an empty in-memory database.
    opts.max_connections(1).min_connections(1);
    let db = Database::connect(opts).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("apply migrations");
    AppState::new(db, config)
}

/// User with a wallet holding `balance_cents` of deposited funds.
pub async fn create_user_with_funds(
    state: &AppState,
    username: &str,
    balance_cents: i64,
) -> i64 {
    let username = username.to_string();
    with_txn(state, |txn| Box::pin(async move {
        let user = users_repo::create(txn, &username).await?;
        wallets_repo::create(txn, user.id).await?;
        if balance_cents > 0 {
            WalletService.deposit(txn, user.id, balance_cents).await?;
        }
        Ok(user.id)
    }))
    .await
    .expect("create funded user")
}

/// Active game: creator opens at the stake, joiner matches into it.
pub async fn start_stake_game(
    state: &AppState,
    creator: i64,
    joiner: i64,
    stake_cents: i64,
) -> games::Model {
    let flow = backend::GameFlowService;
    let config = state.game.clone();
    let outcome = with_txn(state, |txn| Box::pin(async move {
        flow.create_or_join(txn, creator, stake_cents, &config).await
    }))
    .await
    .expect("create game");
    let game_id = outcome.game.id;

    let flow = backend::GameFlowService;
    let outcome = with_txn(state, |txn| Box::pin(async move {
        flow.join_game(txn, joiner, game_id).await
    }))
    .await
    .expect("join game");
    outcome.game
}

/// Overwrite a player's dealt hand for a scripted scenario.
pub async fn force_hand(state: &AppState, game_id: i64, user_id: i64, tiles: Vec<Tile>) {
    with_txn(state, |txn| Box::pin(async move {
        let seat = players_repo::require_seat(txn, game_id, user_id).await?;
        players_repo::set_hand(txn, seat.id, TileList::new(tiles)).await?;
        Ok(())
    }))
    .await
    .expect("set hand")
}

/// Overwrite the board and boneyard for a scripted scenario.
pub async fn force_layout(
    state: &AppState,
    game_id: i64,
    board: Vec<Tile>,
    boneyard: Vec<Tile>,
) -> games::Model {
    with_txn(state, |txn| Box::pin(async move {
        let game = games_repo::require_game(txn, game_id).await?;
        Ok(games_repo::update(
            txn,
            game_id,
            game.lock_version,
            games_repo::GameUpdate::new()
                .with_board(TileList::new(board))
                .with_boneyard(TileList::new(boneyard)),
        )
        .await?)
    }))
    .await
    .expect("set layout")
}

pub async fn fetch_game(state: &AppState, game_id: i64) -> games::Model {
    games_repo::require_game(&state.db, game_id)
        .await
        .expect("game exists")
}

pub async fn fetch_players(state: &AppState, game_id: i64) -> Vec<game_players::Model> {
    players_repo::find_by_game(&state.db, game_id)
        .await
        .expect("players exist")
}

pub async fn fetch_wallet(state: &AppState, user_id: i64) -> wallets::Model {
    wallets_repo::require_by_user(&state.db, user_id)
        .await
        .expect("wallet exists")
}

pub async fn fetch_user(state: &AppState, user_id: i64) -> users::Model {
    users_repo::require_user(&state.db, user_id)
        .await
        .expect("user exists")
}

pub async fn fetch_transactions(
    state: &AppState,
    user_id: i64,
) -> Vec<wallet_transactions::Model> {
    let wallet = fetch_wallet(state, user_id).await;
    wallets_repo::list_transactions(&state.db, wallet.id)
        .await
        .expect("transactions listed")
}

pub fn tile(left: u8, right: u8) -> Tile {
    Tile::new(left, right).expect("valid test tile")
}

pub fn assert_code(err: AppError, expected: &str) {
    assert_eq!(err.code(), expected, "unexpected error: {err}");
}
