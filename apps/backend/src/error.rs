use thiserror::Error;

use crate::errors::domain::{
    AntiCheatKind, ConflictKind, DomainError, FundsKind, InfraErrorKind, NotFoundKind,
    ValidationKind,
};

/// Crate-boundary error. Hosts embedding this library map each variant to
/// their transport (HTTP status, socket error frame) via `code()`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: &'static str, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: &'static str, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: &'static str, detail: String },
    #[error("Forbidden: {detail}")]
    Forbidden { code: &'static str, detail: String },
    #[error("Funds error: {detail}")]
    Funds { code: &'static str, detail: String },
    #[error("Database error: {detail}")]
    Db { detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { code, .. } => code,
            AppError::NotFound { code, .. } => code,
            AppError::Conflict { code, .. } => code,
            AppError::Forbidden { code, .. } => code,
            AppError::Funds { code, .. } => code,
            AppError::Db { .. } => "DB_ERROR",
            AppError::Internal { .. } => "INTERNAL",
            AppError::Config { .. } => "CONFIG_ERROR",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AppError::Validation { detail, .. }
            | AppError::NotFound { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::Forbidden { detail, .. }
            | AppError::Funds { detail, .. }
            | AppError::Db { detail }
            | AppError::Internal { detail }
            | AppError::Config { detail } => detail,
        }
    }

    pub fn invalid(code: &'static str, detail: String) -> Self {
        Self::Validation { code, detail }
    }

    pub fn not_found(code: &'static str, detail: String) -> Self {
        Self::NotFound { code, detail }
    }

    pub fn conflict(code: &'static str, detail: String) -> Self {
        Self::Conflict { code, detail }
    }

    pub fn forbidden(code: &'static str, detail: String) -> Self {
        Self::Forbidden { code, detail }
    }

    pub fn funds(code: &'static str, detail: String) -> Self {
        Self::Funds { code, detail }
    }

    pub fn db(detail: String) -> Self {
        Self::Db { detail }
    }

    pub fn internal(detail: String) -> Self {
        Self::Internal { detail }
    }

    pub fn config(detail: String) -> Self {
        Self::Config { detail }
    }
}

impl From<std::env::VarError> for AppError {
    fn from(e: std::env::VarError) -> Self {
        AppError::internal(format!("env var error: {e}"))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::db(format!("db error: {e}"))
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(kind, detail) => {
                let code = match kind {
                    ValidationKind::InvalidStake => "INVALID_STAKE",
                    ValidationKind::MalformedTile => "MALFORMED_TILE",
                    ValidationKind::InvalidPosition => "INVALID_POSITION",
                    ValidationKind::Other(_) => "VALIDATION",
                    _ => "VALIDATION",
                };
                AppError::invalid(code, detail)
            }
            DomainError::Conflict(kind, detail) => {
                let code = match kind {
                    ConflictKind::NotYourTurn => "NOT_YOUR_TURN",
                    ConflictKind::GameNotActive => "GAME_NOT_ACTIVE",
                    ConflictKind::AlreadyInGame => "ALREADY_IN_GAME",
                    ConflictKind::NotJoinable => "GAME_NOT_JOINABLE",
                    ConflictKind::SelfMatch => "CANNOT_JOIN_OWN_GAME",
                    ConflictKind::HasLegalMove => "HAS_LEGAL_MOVE",
                    ConflictKind::BoneyardEmpty => "BONEYARD_EMPTY",
                    ConflictKind::OptimisticLock => "OPTIMISTIC_LOCK",
                    ConflictKind::NotSeated => "NOT_A_PLAYER",
                    ConflictKind::NotCancellable => "GAME_NOT_CANCELLABLE",
                    ConflictKind::Other(_) => "CONFLICT",
                    _ => "CONFLICT",
                };
                AppError::conflict(code, detail)
            }
            DomainError::AntiCheat(kind, detail) => {
                let code = match kind {
                    AntiCheatKind::TileNotOwned => "TILE_NOT_OWNED",
                    AntiCheatKind::IllegalMove => "ILLEGAL_MOVE",
                    _ => "ANTI_CHEAT",
                };
                AppError::forbidden(code, detail)
            }
            DomainError::Funds(kind, detail) => {
                let code = match kind {
                    FundsKind::Insufficient { .. } => "INSUFFICIENT_FUNDS",
                    FundsKind::Frozen => "WALLET_FROZEN",
                    FundsKind::Inactive => "WALLET_INACTIVE",
                    _ => "FUNDS",
                };
                AppError::funds(code, detail)
            }
            DomainError::NotFound(kind, detail) => {
                let code = match kind {
                    NotFoundKind::User => "USER_NOT_FOUND",
                    NotFoundKind::Game => "GAME_NOT_FOUND",
                    NotFoundKind::Wallet => "WALLET_NOT_FOUND",
                    NotFoundKind::Other(_) => "NOT_FOUND",
                    _ => "NOT_FOUND",
                };
                AppError::not_found(code, detail)
            }
            DomainError::Infra(kind, detail) => match kind {
                InfraErrorKind::DbUnavailable => AppError::db(detail),
                _ => AppError::internal(detail),
            },
        }
    }
}
