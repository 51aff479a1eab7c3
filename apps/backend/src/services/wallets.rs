//! Wallet service: deposits, withdrawals, and the read surface.
//!
//! Deposits and withdrawals are modeled as already-settled balance
//! mutations; real payment rails live outside this crate.

use sea_orm::DatabaseTransaction;
use tracing::info;

use crate::entities::wallet_transactions::{self, TxnKind};
use crate::entities::wallets;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::wallets as wallets_repo;

#[derive(Default)]
pub struct WalletService;

impl WalletService {
    /// Current balances for the user.
    pub async fn balance(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<wallets::Model, AppError> {
        Ok(wallets_repo::require_by_user(txn, user_id).await?)
    }

    /// Ledger rows for the user's wallet, newest first.
    pub async fn transactions(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<Vec<wallet_transactions::Model>, AppError> {
        let wallet = wallets_repo::require_by_user(txn, user_id).await?;
        Ok(wallets_repo::list_transactions(txn, wallet.id).await?)
    }

    pub async fn deposit(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount_cents: i64,
    ) -> Result<wallets::Model, AppError> {
        require_positive(amount_cents)?;

        // The gate (active, unfrozen) applies to deposits too; re-use the
        // debit classification by checking the wallet up front.
        let before = wallets_repo::require_by_user(txn, user_id).await?;
        if !before.is_active || before.is_frozen {
            return Err(gate_error(&before).into());
        }

        let wallet = wallets_repo::credit(txn, user_id, amount_cents).await?;
        wallets_repo::append_transaction(
            txn,
            wallets_repo::TxnCreate {
                wallet_id: wallet.id,
                game_id: None,
                kind: TxnKind::Deposit,
                amount_cents,
                balance_before_cents: wallet.balance_cents - amount_cents,
                balance_after_cents: wallet.balance_cents,
                description: Some("Deposit".to_string()),
            },
        )
        .await?;

        info!(user_id, amount_cents, "deposit completed");
        Ok(wallet)
    }

    pub async fn withdraw(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount_cents: i64,
    ) -> Result<wallets::Model, AppError> {
        require_positive(amount_cents)?;

        let wallet = wallets_repo::debit(txn, user_id, amount_cents).await?;
        wallets_repo::append_transaction(
            txn,
            wallets_repo::TxnCreate {
                wallet_id: wallet.id,
                game_id: None,
                kind: TxnKind::Withdrawal,
                amount_cents,
                balance_before_cents: wallet.balance_cents + amount_cents,
                balance_after_cents: wallet.balance_cents,
                description: Some("Withdrawal".to_string()),
            },
        )
        .await?;

        info!(user_id, amount_cents, "withdrawal completed");
        Ok(wallet)
    }
}

fn require_positive(amount_cents: i64) -> Result<(), AppError> {
    if amount_cents <= 0 {
        return Err(DomainError::validation(
            ValidationKind::Other("NON_POSITIVE_AMOUNT".into()),
            format!("amount must be positive, got {amount_cents}"),
        )
        .into());
    }
    Ok(())
}

fn gate_error(wallet: &wallets::Model) -> DomainError {
    use crate::errors::domain::FundsKind;
    if !wallet.is_active {
        DomainError::funds(
            FundsKind::Inactive,
            format!("wallet {} is inactive", wallet.id),
        )
    } else {
        DomainError::funds(
            FundsKind::Frozen,
            format!("wallet {} is frozen", wallet.id),
        )
    }
}
