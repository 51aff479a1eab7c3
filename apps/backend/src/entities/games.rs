use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::types::TileList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "abandoned")]
    Abandoned,
}

impl GameStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameStatus::Completed | GameStatus::Cancelled | GameStatus::Abandoned
        )
    }
}

/// How a completed game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum GameEndReason {
    #[sea_orm(string_value = "empty_hand")]
    EmptyHand,
    #[sea_orm(string_value = "blocked")]
    Blocked,
    #[sea_orm(string_value = "forfeit")]
    Forfeit,
    #[sea_orm(string_value = "draw")]
    Draw,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "games")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "created_by")]
    pub created_by: i64,
    pub status: GameStatus,
    #[sea_orm(column_name = "stake_cents")]
    pub stake_cents: i64,
    #[sea_orm(column_name = "pot_cents")]
    pub pot_cents: i64,
    #[sea_orm(column_type = "Json")]
    pub board: TileList,
    #[sea_orm(column_type = "Json")]
    pub boneyard: TileList,
    #[sea_orm(column_name = "boneyard_count")]
    pub boneyard_count: i32,
    #[sea_orm(column_name = "current_turn_user_id")]
    pub current_turn_user_id: Option<i64>,
    #[sea_orm(column_name = "turn_no")]
    pub turn_no: i32,
    #[sea_orm(column_name = "consecutive_passes")]
    pub consecutive_passes: i32,
    #[sea_orm(column_name = "max_turn_secs")]
    pub max_turn_secs: i32,
    #[sea_orm(column_name = "turn_started_at")]
    pub turn_started_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "winner_user_id")]
    pub winner_user_id: Option<i64>,
    #[sea_orm(column_name = "winner_payout_cents")]
    pub winner_payout_cents: Option<i64>,
    #[sea_orm(column_name = "loser_loss_cents")]
    pub loser_loss_cents: Option<i64>,
    #[sea_orm(column_name = "platform_fee_cents")]
    pub platform_fee_cents: Option<i64>,
    #[sea_orm(column_name = "fee_processed")]
    pub fee_processed: bool,
    #[sea_orm(column_name = "end_reason")]
    pub end_reason: Option<GameEndReason>,
    #[sea_orm(column_name = "started_at")]
    pub started_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "completed_at")]
    pub completed_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "duration_secs")]
    pub duration_secs: Option<i64>,
    #[sea_orm(column_name = "lock_version")]
    pub lock_version: i32,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::game_players::Entity")]
    GamePlayers,
    #[sea_orm(has_many = "super::game_moves::Entity")]
    GameMoves,
}

impl Related<super::game_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GamePlayers.def()
    }
}

impl Related<super::game_moves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameMoves.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
