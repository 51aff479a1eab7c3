//! Seat rows: hands, per-player counters, and connection flags.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, Order, QueryFilter,
    QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::game_players;
use crate::entities::types::TileList;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind};

pub async fn find_by_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Vec<game_players::Model>, DomainError> {
    Ok(game_players::Entity::find()
        .filter(game_players::Column::GameId.eq(game_id))
        .order_by(game_players::Column::Seat, Order::Asc)
        .all(conn)
        .await?)
}

pub async fn find_seat<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    user_id: i64,
) -> Result<Option<game_players::Model>, DomainError> {
    Ok(game_players::Entity::find()
        .filter(game_players::Column::GameId.eq(game_id))
        .filter(game_players::Column::UserId.eq(user_id))
        .one(conn)
        .await?)
}

/// The user's seat in the game, or a NotSeated conflict.
pub async fn require_seat<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    user_id: i64,
) -> Result<game_players::Model, DomainError> {
    find_seat(conn, game_id, user_id).await?.ok_or_else(|| {
        DomainError::conflict(
            ConflictKind::NotSeated,
            format!("user {user_id} is not seated in game {game_id}"),
        )
    })
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    user_id: i64,
    seat: i16,
    hand: TileList,
) -> Result<game_players::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let player = game_players::ActiveModel {
        id: NotSet,
        game_id: Set(game_id),
        user_id: Set(user_id),
        seat: Set(seat),
        hand: Set(hand),
        score: Set(None),
        moves_count: Set(0),
        draws_count: Set(0),
        pass_count: Set(0),
        is_winner: Set(false),
        payout_cents: Set(None),
        is_connected: Set(true),
        last_seen: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(player.insert(conn).await?)
}

pub async fn set_hand<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
    hand: TileList,
) -> Result<(), DomainError> {
    update_player(conn, player_id, move |update| {
        Ok(update.col_expr(
            game_players::Column::Hand,
            Expr::val(hand_json(&hand)?).into(),
        ))
    })
    .await
}

/// Placed a tile: new hand, moves counter.
pub async fn apply_place<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
    hand: TileList,
) -> Result<(), DomainError> {
    update_player(conn, player_id, move |update| {
        Ok(update
            .col_expr(
                game_players::Column::Hand,
                Expr::val(hand_json(&hand)?).into(),
            )
            .col_expr(
                game_players::Column::MovesCount,
                Expr::col(game_players::Column::MovesCount).add(1),
            ))
    })
    .await
}

/// Drew a tile: new hand, draws counter.
pub async fn apply_draw<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
    hand: TileList,
) -> Result<(), DomainError> {
    update_player(conn, player_id, move |update| {
        Ok(update
            .col_expr(
                game_players::Column::Hand,
                Expr::val(hand_json(&hand)?).into(),
            )
            .col_expr(
                game_players::Column::DrawsCount,
                Expr::col(game_players::Column::DrawsCount).add(1),
            ))
    })
    .await
}

pub async fn apply_pass<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
) -> Result<(), DomainError> {
    update_player(conn, player_id, |update| {
        Ok(update.col_expr(
            game_players::Column::PassCount,
            Expr::col(game_players::Column::PassCount).add(1),
        ))
    })
    .await
}

/// Pip score recorded at blocked-game resolution.
pub async fn set_score<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
    score: i32,
) -> Result<(), DomainError> {
    update_player(conn, player_id, move |update| {
        Ok(update.col_expr(game_players::Column::Score, Expr::val(Some(score)).into()))
    })
    .await
}

pub async fn set_result<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
    is_winner: bool,
    payout_cents: Option<i64>,
) -> Result<(), DomainError> {
    update_player(conn, player_id, move |update| {
        Ok(update
            .col_expr(game_players::Column::IsWinner, Expr::val(is_winner).into())
            .col_expr(
                game_players::Column::PayoutCents,
                Expr::val(payout_cents).into(),
            ))
    })
    .await
}

/// Presence flag keyed by game and user rather than seat row id, since the
/// presence monitor only knows the user.
pub async fn set_connected<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    user_id: i64,
    connected: bool,
) -> Result<(), DomainError> {
    let now = OffsetDateTime::now_utc();
    game_players::Entity::update_many()
        .col_expr(game_players::Column::IsConnected, Expr::val(connected).into())
        .col_expr(game_players::Column::LastSeen, Expr::val(Some(now)).into())
        .col_expr(game_players::Column::UpdatedAt, Expr::val(now).into())
        .filter(game_players::Column::GameId.eq(game_id))
        .filter(game_players::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

fn hand_json(hand: &TileList) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(hand).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("hand serialization failed: {e}"),
        )
    })
}

async fn update_player<C, F>(conn: &C, player_id: i64, configure: F) -> Result<(), DomainError>
where
    C: ConnectionTrait + Send + Sync,
    F: FnOnce(
        sea_orm::UpdateMany<game_players::Entity>,
    ) -> Result<sea_orm::UpdateMany<game_players::Entity>, DomainError>,
{
    let now = OffsetDateTime::now_utc();
    let result = configure(game_players::Entity::update_many())?
        .col_expr(game_players::Column::UpdatedAt, Expr::val(now).into())
        .filter(game_players::Column::Id.eq(player_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("player row {player_id} missing during update"),
        ));
    }
    Ok(())
}
