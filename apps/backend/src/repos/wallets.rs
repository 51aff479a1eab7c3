//! Wallet balances as conditional atomic increments, never
//! read-modify-write, plus the append-only transaction ledger.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, Order, QueryFilter,
    QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::wallet_transactions::{self, TxnKind, TxnStatus};
use crate::entities::wallets;
use crate::errors::domain::{DomainError, FundsKind, InfraErrorKind, NotFoundKind};

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<wallets::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let wallet = wallets::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        balance_cents: Set(0),
        locked_balance_cents: Set(0),
        currency: Set("USD".to_string()),
        is_active: Set(true),
        is_frozen: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(wallet.insert(conn).await?)
}

pub async fn find_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<wallets::Model>, DomainError> {
    Ok(wallets::Entity::find()
        .filter(wallets::Column::UserId.eq(user_id))
        .one(conn)
        .await?)
}

pub async fn require_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<wallets::Model, DomainError> {
    find_by_user(conn, user_id).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Wallet,
            format!("wallet for user {user_id} not found"),
        )
    })
}

/// Move `stake_cents` of available funds into the locked balance.
///
/// The UPDATE carries the full gate in its WHERE clause (active, unfrozen,
/// available >= stake); rows_affected == 0 is re-read once to classify the
/// refusal.
pub async fn lock_stake<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    stake_cents: i64,
) -> Result<wallets::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::LockedBalanceCents,
            Expr::col(wallets::Column::LockedBalanceCents).add(stake_cents),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::val(now).into())
        .filter(wallets::Column::UserId.eq(user_id))
        .filter(wallets::Column::IsActive.eq(true))
        .filter(wallets::Column::IsFrozen.eq(false))
        .filter(
            Expr::col(wallets::Column::BalanceCents)
                .gte(Expr::col(wallets::Column::LockedBalanceCents).add(stake_cents)),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let wallet = require_by_user(conn, user_id).await?;
        return Err(classify_gate_failure(&wallet, stake_cents));
    }
    require_by_user(conn, user_id).await
}

/// Release locked funds back to available.
pub async fn unlock_stake<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    stake_cents: i64,
) -> Result<wallets::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::LockedBalanceCents,
            Expr::col(wallets::Column::LockedBalanceCents).sub(stake_cents),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::val(now).into())
        .filter(wallets::Column::UserId.eq(user_id))
        .filter(Expr::col(wallets::Column::LockedBalanceCents).gte(stake_cents))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        // Locked balance below the stake means the ledger is inconsistent.
        return Err(DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("cannot unlock {stake_cents} cents for user {user_id}"),
        ));
    }
    require_by_user(conn, user_id).await
}

/// Winner-side settlement: credit the payout and release the locked stake
/// in a single UPDATE so both move or neither does.
pub async fn settle_win<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    payout_cents: i64,
    stake_cents: i64,
) -> Result<wallets::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::BalanceCents,
            Expr::col(wallets::Column::BalanceCents).add(payout_cents),
        )
        .col_expr(
            wallets::Column::LockedBalanceCents,
            Expr::col(wallets::Column::LockedBalanceCents).sub(stake_cents),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::val(now).into())
        .filter(wallets::Column::UserId.eq(user_id))
        .filter(Expr::col(wallets::Column::LockedBalanceCents).gte(stake_cents))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("cannot settle win of {payout_cents} cents for user {user_id}"),
        ));
    }
    require_by_user(conn, user_id).await
}

/// Unconditional balance increase (winnings, deposits).
pub async fn credit<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    amount_cents: i64,
) -> Result<wallets::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::BalanceCents,
            Expr::col(wallets::Column::BalanceCents).add(amount_cents),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::val(now).into())
        .filter(wallets::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::not_found(
            NotFoundKind::Wallet,
            format!("wallet for user {user_id} not found"),
        ));
    }
    require_by_user(conn, user_id).await
}

/// Gated balance decrease (withdrawals, stake capture). Only available
/// funds can be debited; locked funds stay untouchable.
pub async fn debit<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    amount_cents: i64,
) -> Result<wallets::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let result = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::BalanceCents,
            Expr::col(wallets::Column::BalanceCents).sub(amount_cents),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::val(now).into())
        .filter(wallets::Column::UserId.eq(user_id))
        .filter(wallets::Column::IsActive.eq(true))
        .filter(wallets::Column::IsFrozen.eq(false))
        .filter(
            Expr::col(wallets::Column::BalanceCents)
                .gte(Expr::col(wallets::Column::LockedBalanceCents).add(amount_cents)),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let wallet = require_by_user(conn, user_id).await?;
        return Err(classify_gate_failure(&wallet, amount_cents));
    }
    require_by_user(conn, user_id).await
}

fn classify_gate_failure(wallet: &wallets::Model, required_cents: i64) -> DomainError {
    if !wallet.is_active {
        DomainError::funds(
            FundsKind::Inactive,
            format!("wallet {} is inactive", wallet.id),
        )
    } else if wallet.is_frozen {
        DomainError::funds(
            FundsKind::Frozen,
            format!("wallet {} is frozen", wallet.id),
        )
    } else {
        DomainError::funds(
            FundsKind::Insufficient {
                required_cents,
                available_cents: wallet.available_cents(),
            },
            format!(
                "required {required_cents} cents, available {}",
                wallet.available_cents()
            ),
        )
    }
}

/// One ledger row per balance mutation, with before/after snapshots.
#[derive(Debug, Clone)]
pub struct TxnCreate {
    pub wallet_id: i64,
    pub game_id: Option<i64>,
    pub kind: TxnKind,
    pub amount_cents: i64,
    pub balance_before_cents: i64,
    pub balance_after_cents: i64,
    pub description: Option<String>,
}

pub async fn append_transaction<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: TxnCreate,
) -> Result<wallet_transactions::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let row = wallet_transactions::ActiveModel {
        id: NotSet,
        wallet_id: Set(dto.wallet_id),
        game_id: Set(dto.game_id),
        kind: Set(dto.kind),
        status: Set(TxnStatus::Completed),
        amount_cents: Set(dto.amount_cents),
        balance_before_cents: Set(dto.balance_before_cents),
        balance_after_cents: Set(dto.balance_after_cents),
        description: Set(dto.description),
        created_at: Set(now),
    };
    Ok(row.insert(conn).await?)
}

pub async fn list_transactions<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    wallet_id: i64,
) -> Result<Vec<wallet_transactions::Model>, DomainError> {
    Ok(wallet_transactions::Entity::find()
        .filter(wallet_transactions::Column::WalletId.eq(wallet_id))
        .order_by(wallet_transactions::Column::CreatedAt, Order::Desc)
        .order_by(wallet_transactions::Column::Id, Order::Desc)
        .all(conn)
        .await?)
}
