//! Game aggregate queries and the optimistic-lock update path.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, NotSet, Order,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use time::OffsetDateTime;

use crate::entities::games::{self, GameEndReason, GameStatus};
use crate::entities::game_players;
use crate::entities::types::TileList;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Option<games::Model>, DomainError> {
    Ok(games::Entity::find_by_id(game_id).one(conn).await?)
}

/// Find game by ID or fail with a domain NotFound.
pub async fn require_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<games::Model, DomainError> {
    find_by_id(conn, game_id).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Game, format!("game {game_id} not found"))
    })
}

/// Any waiting or active game the user is seated in. Used to enforce the
/// one-game-at-a-time rule.
pub async fn find_pending_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<games::Model>, DomainError> {
    Ok(games::Entity::find()
        .join(JoinType::InnerJoin, games::Relation::GamePlayers.def())
        .filter(game_players::Column::UserId.eq(user_id))
        .filter(games::Column::Status.is_in([GameStatus::Waiting, GameStatus::Active]))
        .one(conn)
        .await?)
}

/// Oldest waiting game at the stake created by someone else.
pub async fn find_waiting_by_stake<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    stake_cents: i64,
    excluding_user: i64,
) -> Result<Option<games::Model>, DomainError> {
    Ok(games::Entity::find()
        .filter(games::Column::Status.eq(GameStatus::Waiting))
        .filter(games::Column::StakeCents.eq(stake_cents))
        .filter(games::Column::CreatedBy.ne(excluding_user))
        .order_by(games::Column::CreatedAt, Order::Asc)
        .one(conn)
        .await?)
}

/// Lobby listing: waiting games created by others, optionally filtered by
/// stake, oldest first.
pub async fn list_open_games<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    excluding_user: i64,
    stake_cents: Option<i64>,
) -> Result<Vec<games::Model>, DomainError> {
    let mut query = games::Entity::find()
        .filter(games::Column::Status.eq(GameStatus::Waiting))
        .filter(games::Column::CreatedBy.ne(excluding_user));
    if let Some(stake) = stake_cents {
        query = query.filter(games::Column::StakeCents.eq(stake));
    }
    Ok(query
        .order_by(games::Column::CreatedAt, Order::Asc)
        .all(conn)
        .await?)
}

/// Completed games the user was seated in, newest first.
pub async fn find_completed_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Vec<games::Model>, DomainError> {
    Ok(games::Entity::find()
        .join(JoinType::InnerJoin, games::Relation::GamePlayers.def())
        .filter(game_players::Column::UserId.eq(user_id))
        .filter(games::Column::Status.eq(GameStatus::Completed))
        .order_by(games::Column::CompletedAt, Order::Desc)
        .all(conn)
        .await?)
}

pub async fn create_waiting<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    created_by: i64,
    stake_cents: i64,
    max_turn_secs: i32,
) -> Result<games::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let game = games::ActiveModel {
        id: NotSet,
        created_by: Set(created_by),
        status: Set(GameStatus::Waiting),
        stake_cents: Set(stake_cents),
        pot_cents: Set(0),
        board: Set(TileList::default()),
        boneyard: Set(TileList::default()),
        boneyard_count: Set(0),
        current_turn_user_id: Set(None),
        turn_no: Set(0),
        consecutive_passes: Set(0),
        max_turn_secs: Set(max_turn_secs),
        turn_started_at: Set(None),
        winner_user_id: Set(None),
        winner_payout_cents: Set(None),
        loser_loss_cents: Set(None),
        platform_fee_cents: Set(None),
        fee_processed: Set(false),
        end_reason: Set(None),
        started_at: Set(None),
        completed_at: Set(None),
        duration_secs: Set(None),
        lock_version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(game.insert(conn).await?)
}

/// Column updates applied together under one optimistic-lock bump.
#[derive(Debug, Default)]
pub struct GameUpdate {
    status: Option<GameStatus>,
    pot_cents: Option<i64>,
    board: Option<TileList>,
    boneyard: Option<TileList>,
    current_turn_user_id: Option<Option<i64>>,
    turn_no: Option<i32>,
    consecutive_passes: Option<i32>,
    turn_started_at: Option<Option<OffsetDateTime>>,
    started_at: Option<OffsetDateTime>,
}

impl GameUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: GameStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_pot_cents(mut self, pot_cents: i64) -> Self {
        self.pot_cents = Some(pot_cents);
        self
    }

    pub fn with_board(mut self, board: TileList) -> Self {
        self.board = Some(board);
        self
    }

    /// Also mirrors the boneyard length into `boneyard_count`.
    pub fn with_boneyard(mut self, boneyard: TileList) -> Self {
        self.boneyard = Some(boneyard);
        self
    }

    pub fn with_current_turn(mut self, user_id: Option<i64>) -> Self {
        self.current_turn_user_id = Some(user_id);
        self
    }

    pub fn with_turn_no(mut self, turn_no: i32) -> Self {
        self.turn_no = Some(turn_no);
        self
    }

    pub fn with_consecutive_passes(mut self, passes: i32) -> Self {
        self.consecutive_passes = Some(passes);
        self
    }

    pub fn with_turn_started_at(mut self, at: Option<OffsetDateTime>) -> Self {
        self.turn_started_at = Some(at);
        self
    }

    pub fn with_started_at(mut self, at: OffsetDateTime) -> Self {
        self.started_at = Some(at);
        self
    }
}

fn json_value(tiles: &TileList) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(tiles).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("tile list serialization failed: {e}"),
        )
    })
}

/// Apply an optimistic update with lock version check, then refetch.
///
/// Filters by id and the expected lock_version and checks rows_affected to
/// distinguish NotFound from OptimisticLock, so concurrent submissions for
/// the same turn resolve to exactly one winner.
pub async fn update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    current_lock_version: i32,
    changes: GameUpdate,
) -> Result<games::Model, DomainError> {
    let now = OffsetDateTime::now_utc();

    let mut update = games::Entity::update_many();
    if let Some(status) = changes.status {
        update = update.col_expr(games::Column::Status, Expr::val(status).into());
    }
    if let Some(pot) = changes.pot_cents {
        update = update.col_expr(games::Column::PotCents, Expr::val(pot).into());
    }
    if let Some(board) = &changes.board {
        update = update.col_expr(games::Column::Board, Expr::val(json_value(board)?).into());
    }
    if let Some(boneyard) = &changes.boneyard {
        update = update
            .col_expr(
                games::Column::Boneyard,
                Expr::val(json_value(boneyard)?).into(),
            )
            .col_expr(
                games::Column::BoneyardCount,
                Expr::val(boneyard.len() as i32).into(),
            );
    }
    if let Some(user_id) = changes.current_turn_user_id {
        update = update.col_expr(games::Column::CurrentTurnUserId, Expr::val(user_id).into());
    }
    if let Some(turn_no) = changes.turn_no {
        update = update.col_expr(games::Column::TurnNo, Expr::val(turn_no).into());
    }
    if let Some(passes) = changes.consecutive_passes {
        update = update.col_expr(games::Column::ConsecutivePasses, Expr::val(passes).into());
    }
    if let Some(at) = changes.turn_started_at {
        update = update.col_expr(games::Column::TurnStartedAt, Expr::val(at).into());
    }
    if let Some(at) = changes.started_at {
        update = update.col_expr(games::Column::StartedAt, Expr::val(Some(at)).into());
    }

    let result = update
        .col_expr(games::Column::UpdatedAt, Expr::val(now).into())
        .col_expr(
            games::Column::LockVersion,
            Expr::col(games::Column::LockVersion).add(1),
        )
        .filter(games::Column::Id.eq(game_id))
        .filter(games::Column::LockVersion.eq(current_lock_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match games::Entity::find_by_id(game_id).one(conn).await? {
            Some(game) => Err(DomainError::conflict(
                ConflictKind::OptimisticLock,
                format!(
                    "game {game_id} lock_version expected {current_lock_version}, found {}",
                    game.lock_version
                ),
            )),
            None => Err(DomainError::not_found(
                NotFoundKind::Game,
                format!("game {game_id} not found"),
            )),
        };
    }

    require_game(conn, game_id).await
}

/// Financial outcome stamped onto the game row at settlement.
#[derive(Debug, Clone)]
pub struct GameSettle {
    pub winner_user_id: Option<i64>,
    pub winner_payout_cents: Option<i64>,
    pub loser_loss_cents: Option<i64>,
    pub platform_fee_cents: i64,
    pub end_reason: GameEndReason,
    pub completed_at: OffsetDateTime,
    pub duration_secs: Option<i64>,
}

/// Conditionally flip an active game to completed.
///
/// The filter on `status = active AND fee_processed = false` is the
/// idempotency guard: concurrent settlers race on this UPDATE and exactly
/// one sees rows_affected == 1. A false return means another settlement
/// already won and the caller must not touch wallets or stats.
pub async fn try_settle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    settle: &GameSettle,
) -> Result<bool, DomainError> {
    let now = OffsetDateTime::now_utc();

    let result = games::Entity::update_many()
        .col_expr(
            games::Column::Status,
            Expr::val(GameStatus::Completed).into(),
        )
        .col_expr(
            games::Column::WinnerUserId,
            Expr::val(settle.winner_user_id).into(),
        )
        .col_expr(
            games::Column::WinnerPayoutCents,
            Expr::val(settle.winner_payout_cents).into(),
        )
        .col_expr(
            games::Column::LoserLossCents,
            Expr::val(settle.loser_loss_cents).into(),
        )
        .col_expr(
            games::Column::PlatformFeeCents,
            Expr::val(Some(settle.platform_fee_cents)).into(),
        )
        .col_expr(games::Column::FeeProcessed, Expr::val(true).into())
        .col_expr(
            games::Column::EndReason,
            Expr::val(Some(settle.end_reason)).into(),
        )
        .col_expr(
            games::Column::CompletedAt,
            Expr::val(Some(settle.completed_at)).into(),
        )
        .col_expr(
            games::Column::DurationSecs,
            Expr::val(settle.duration_secs).into(),
        )
        .col_expr(games::Column::CurrentTurnUserId, Expr::val(None::<i64>).into())
        .col_expr(games::Column::UpdatedAt, Expr::val(now).into())
        .col_expr(
            games::Column::LockVersion,
            Expr::col(games::Column::LockVersion).add(1),
        )
        .filter(games::Column::Id.eq(game_id))
        .filter(games::Column::Status.eq(GameStatus::Active))
        .filter(games::Column::FeeProcessed.eq(false))
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Creator-side cancellation: waiting games only.
/// Returns false if the game was no longer cancellable.
pub async fn try_cancel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<bool, DomainError> {
    let now = OffsetDateTime::now_utc();

    let result = games::Entity::update_many()
        .col_expr(
            games::Column::Status,
            Expr::val(GameStatus::Cancelled).into(),
        )
        .col_expr(games::Column::CompletedAt, Expr::val(Some(now)).into())
        .col_expr(games::Column::UpdatedAt, Expr::val(now).into())
        .col_expr(
            games::Column::LockVersion,
            Expr::col(games::Column::LockVersion).add(1),
        )
        .filter(games::Column::Id.eq(game_id))
        .filter(games::Column::Status.eq(GameStatus::Waiting))
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}
