//! Domain-level error type used across services and repos.
//!
//! This error type is transport- and DB-agnostic. Callers at the crate
//! boundary should return `Result<T, crate::error::AppError>` and convert
//! from `DomainError` using the provided `From<DomainError> for AppError`
//! implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    User,
    Game,
    Wallet,
    Other(String),
}

/// Domain-level conflict kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    NotYourTurn,
    GameNotActive,
    AlreadyInGame,
    NotJoinable,
    SelfMatch,
    HasLegalMove,
    BoneyardEmpty,
    OptimisticLock,
    NotSeated,
    NotCancellable,
    Other(String),
}

/// Input validation kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    InvalidStake,
    MalformedTile,
    InvalidPosition,
    Other(String),
}

/// Rejections that indicate a client submitting state it cannot legally
/// hold, as opposed to ordinary bad input. Logged at `warn!` by services.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AntiCheatKind {
    TileNotOwned,
    IllegalMove,
}

/// Wallet-gating failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FundsKind {
    Insufficient {
        required_cents: i64,
        available_cents: i64,
    },
    Frozen,
    Inactive,
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input/user validation or business rule violation
    Validation(ValidationKind, String),
    /// Semantic conflict
    Conflict(ConflictKind, String),
    /// Client asserted state it does not hold
    AntiCheat(AntiCheatKind, String),
    /// Wallet cannot cover or accept the mutation
    Funds(FundsKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Infrastructure/operational failures
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::AntiCheat(kind, d) => write!(f, "anti-cheat {kind:?}: {d}"),
            DomainError::Funds(kind, d) => write!(f, "funds {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn anti_cheat(kind: AntiCheatKind, detail: impl Into<String>) -> Self {
        Self::AntiCheat(kind, detail.into())
    }
    pub fn funds(kind: FundsKind, detail: impl Into<String>) -> Self {
        Self::Funds(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e {
            sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
                DomainError::infra(InfraErrorKind::DbUnavailable, e.to_string())
            }
            other => DomainError::infra(InfraErrorKind::Other("db".into()), other.to_string()),
        }
    }
}
