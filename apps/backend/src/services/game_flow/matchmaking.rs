use sea_orm::DatabaseTransaction;
use tracing::{debug, info};

use super::{ActionOutcome, GameFlowService};
use crate::config::game::GameConfig;
use crate::domain::dealing;
use crate::entities::games::{self, GameStatus};
use crate::entities::types::TileList;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind};
use crate::realtime::events::GameEvent;
use crate::repos::{games as games_repo, players as players_repo, users as users_repo,
    wallets as wallets_repo};
use time::OffsetDateTime;

impl GameFlowService {
    /// Find a compatible waiting game at the stake or open a new one.
    ///
    /// Stake validation, fund lock, and seating are one atomic unit; if
    /// anything fails after the lock, the enclosing transaction rolls the
    /// lock back.
    pub async fn create_or_join(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        stake_cents: i64,
        config: &GameConfig,
    ) -> Result<ActionOutcome, AppError> {
        config.validate_stake(stake_cents)?;
        users_repo::require_user(txn, user_id).await?;

        // Funds are checked before the pending-game gate, so a doubly
        // ineligible user hears about the money first. The lock rolls back
        // with the transaction if a later check fails.
        wallets_repo::lock_stake(txn, user_id, stake_cents).await?;
        self.ensure_not_in_game(txn, user_id).await?;

        match games_repo::find_waiting_by_stake(txn, stake_cents, user_id).await? {
            Some(game) => self.seat_and_start(txn, game, user_id).await,
            None => {
                let game =
                    games_repo::create_waiting(txn, user_id, stake_cents, config.max_turn_secs)
                        .await?;
                players_repo::create(txn, game.id, user_id, 0, TileList::default()).await?;
                info!(game_id = game.id, user_id, stake_cents, "game created, waiting for opponent");
                Ok(ActionOutcome::new(game))
            }
        }
    }

    /// Join a specific waiting game from the lobby.
    pub async fn join_game(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        game_id: i64,
    ) -> Result<ActionOutcome, AppError> {
        users_repo::require_user(txn, user_id).await?;
        let game = games_repo::require_game(txn, game_id).await?;

        if game.status != GameStatus::Waiting {
            return Err(DomainError::conflict(
                ConflictKind::NotJoinable,
                format!("game {game_id} is {:?}", game.status),
            )
            .into());
        }
        if game.created_by == user_id {
            return Err(DomainError::conflict(
                ConflictKind::SelfMatch,
                "cannot join a game you created",
            )
            .into());
        }
        wallets_repo::lock_stake(txn, user_id, game.stake_cents).await?;
        self.ensure_not_in_game(txn, user_id).await?;
        self.seat_and_start(txn, game, user_id).await
    }

    /// Creator-side cancellation of a still-waiting game; unlocks the stake.
    pub async fn cancel_game(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        game_id: i64,
    ) -> Result<ActionOutcome, AppError> {
        let game = games_repo::require_game(txn, game_id).await?;
        if game.created_by != user_id {
            return Err(DomainError::conflict(
                ConflictKind::NotCancellable,
                "only the creator may cancel a waiting game",
            )
            .into());
        }
        if !games_repo::try_cancel(txn, game_id).await? {
            return Err(DomainError::conflict(
                ConflictKind::NotCancellable,
                format!("game {game_id} is no longer waiting"),
            )
            .into());
        }

        wallets_repo::unlock_stake(txn, user_id, game.stake_cents).await?;
        let game = games_repo::require_game(txn, game_id).await?;
        info!(game_id, user_id, "game cancelled, stake unlocked");
        Ok(ActionOutcome::new(game))
    }

    /// Lobby listing of joinable games created by others.
    pub async fn list_open_games(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        stake_cents: Option<i64>,
    ) -> Result<Vec<games::Model>, AppError> {
        Ok(games_repo::list_open_games(txn, user_id, stake_cents).await?)
    }

    async fn ensure_not_in_game(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<(), AppError> {
        if let Some(pending) = games_repo::find_pending_by_user(txn, user_id).await? {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyInGame,
                format!("user {user_id} already in game {}", pending.id),
            )
            .into());
        }
        Ok(())
    }

    /// Seat the joiner, deal, and activate. The creator always moves first.
    async fn seat_and_start(
        &self,
        txn: &DatabaseTransaction,
        game: games::Model,
        joiner_id: i64,
    ) -> Result<ActionOutcome, AppError> {
        // Matchmaking queries exclude the creator, so this only trips if a
        // caller wires the queries wrong.
        if game.created_by == joiner_id {
            return Err(DomainError::infra(
                InfraErrorKind::Other("matchmaking".into()),
                format!("self-match reached seating for game {}", game.id),
            )
            .into());
        }

        debug!(game_id = game.id, joiner_id, "seating second player");

        // ThreadRng is not Send; finish the deal before the next await.
        let deal = {
            let mut rng = rand::rng();
            dealing::deal(&mut rng)
        };

        let creator_seat = players_repo::require_seat(txn, game.id, game.created_by).await?;
        players_repo::set_hand(txn, creator_seat.id, TileList::new(deal.hand_a)).await?;
        players_repo::create(txn, game.id, joiner_id, 1, TileList::new(deal.hand_b)).await?;

        let now = OffsetDateTime::now_utc();
        let pot_cents = game.stake_cents * 2;
        let game = games_repo::update(
            txn,
            game.id,
            game.lock_version,
            games_repo::GameUpdate::new()
                .with_status(GameStatus::Active)
                .with_pot_cents(pot_cents)
                .with_boneyard(TileList::new(deal.boneyard))
                .with_current_turn(Some(game.created_by))
                .with_started_at(now)
                .with_turn_started_at(Some(now)),
        )
        .await?;

        info!(
            game_id = game.id,
            creator = game.created_by,
            joiner_id,
            pot_cents,
            "game started"
        );

        let event = GameEvent::GameStarted {
            game_id: game.id,
            stake_cents: game.stake_cents,
            pot_cents,
            first_turn_user_id: game.created_by,
        };
        Ok(ActionOutcome::new(game).with_event(event))
    }
}
