//! User rows and lifetime stat counters.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set,
};
use time::OffsetDateTime;

use crate::entities::users;
use crate::errors::domain::{DomainError, InfraErrorKind, NotFoundKind};

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    username: &str,
) -> Result<users::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let user = users::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        total_games: Set(0),
        wins: Set(0),
        losses: Set(0),
        draws: Set(0),
        total_earnings_cents: Set(0),
        total_losses_cents: Set(0),
        current_streak: Set(0),
        best_streak: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(user.insert(conn).await?)
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<users::Model>, DomainError> {
    Ok(users::Entity::find_by_id(user_id).one(conn).await?)
}

pub async fn require_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<users::Model, DomainError> {
    find_by_id(conn, user_id).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::User, format!("user {user_id} not found"))
    })
}

/// Winner stats: games, wins, earnings, streak extension. A second UPDATE
/// folds the new streak into best_streak when it exceeds it, keeping both
/// writes atomic increments rather than read-modify-write.
pub async fn record_win<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    earnings_cents: i64,
) -> Result<(), DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::TotalGames,
            Expr::col(users::Column::TotalGames).add(1),
        )
        .col_expr(users::Column::Wins, Expr::col(users::Column::Wins).add(1))
        .col_expr(
            users::Column::TotalEarningsCents,
            Expr::col(users::Column::TotalEarningsCents).add(earnings_cents),
        )
        .col_expr(
            users::Column::CurrentStreak,
            Expr::col(users::Column::CurrentStreak).add(1),
        )
        .col_expr(users::Column::UpdatedAt, Expr::val(now).into())
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    require_row(result.rows_affected, user_id)?;

    users::Entity::update_many()
        .col_expr(
            users::Column::BestStreak,
            Expr::col(users::Column::CurrentStreak).into(),
        )
        .filter(users::Column::Id.eq(user_id))
        .filter(
            Expr::col(users::Column::CurrentStreak).gt(Expr::col(users::Column::BestStreak)),
        )
        .exec(conn)
        .await?;
    Ok(())
}

/// Loser stats: games, losses, stake lost, streak reset.
pub async fn record_loss<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    loss_cents: i64,
) -> Result<(), DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::TotalGames,
            Expr::col(users::Column::TotalGames).add(1),
        )
        .col_expr(
            users::Column::Losses,
            Expr::col(users::Column::Losses).add(1),
        )
        .col_expr(
            users::Column::TotalLossesCents,
            Expr::col(users::Column::TotalLossesCents).add(loss_cents),
        )
        .col_expr(users::Column::CurrentStreak, Expr::val(0).into())
        .col_expr(users::Column::UpdatedAt, Expr::val(now).into())
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    require_row(result.rows_affected, user_id)
}

/// Draws move only the game and draw counters; streaks are untouched.
pub async fn record_draw<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<(), DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::TotalGames,
            Expr::col(users::Column::TotalGames).add(1),
        )
        .col_expr(users::Column::Draws, Expr::col(users::Column::Draws).add(1))
        .col_expr(users::Column::UpdatedAt, Expr::val(now).into())
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    require_row(result.rows_affected, user_id)
}

fn require_row(rows_affected: u64, user_id: i64) -> Result<(), DomainError> {
    if rows_affected == 0 {
        return Err(DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("user row {user_id} missing during stat update"),
        ));
    }
    Ok(())
}
