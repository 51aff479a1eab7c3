use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::types::TileList;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_players")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "game_id")]
    pub game_id: i64,
    #[sea_orm(column_name = "user_id")]
    pub user_id: i64,
    #[sea_orm(column_type = "SmallInteger")]
    pub seat: i16,
    #[sea_orm(column_type = "Json")]
    pub hand: TileList,
    pub score: Option<i32>,
    #[sea_orm(column_name = "moves_count")]
    pub moves_count: i32,
    #[sea_orm(column_name = "draws_count")]
    pub draws_count: i32,
    #[sea_orm(column_name = "pass_count")]
    pub pass_count: i32,
    #[sea_orm(column_name = "is_winner")]
    pub is_winner: bool,
    #[sea_orm(column_name = "payout_cents")]
    pub payout_cents: Option<i64>,
    #[sea_orm(column_name = "is_connected")]
    pub is_connected: bool,
    #[sea_orm(column_name = "last_seen")]
    pub last_seen: Option<OffsetDateTime>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::games::Entity",
        from = "Column::GameId",
        to = "super::games::Column::Id"
    )]
    Game,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::games::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Game.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
