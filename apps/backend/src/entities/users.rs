use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    #[sea_orm(column_name = "total_games")]
    pub total_games: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    #[sea_orm(column_name = "total_earnings_cents")]
    pub total_earnings_cents: i64,
    #[sea_orm(column_name = "total_losses_cents")]
    pub total_losses_cents: i64,
    #[sea_orm(column_name = "current_streak")]
    pub current_streak: i32,
    #[sea_orm(column_name = "best_streak")]
    pub best_streak: i32,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

impl Model {
    /// Percentage of decided-or-drawn games won. Computed, never stored.
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.wins) * 100.0 / f64::from(self.total_games)
    }

    /// Lifetime earnings minus lifetime losses. Computed, never stored.
    pub fn net_profit_cents(&self) -> i64 {
        self.total_earnings_cents - self.total_losses_cents
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::wallets::Entity")]
    Wallet,
    #[sea_orm(has_many = "super::game_players::Entity")]
    GamePlayers,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::game_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GamePlayers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
