//! Append-only move log.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, Order, QueryFilter, QueryOrder, Set};
use time::OffsetDateTime;

use crate::domain::tiles::{Position, Tile};
use crate::entities::game_moves::{self, MoveAction, MovePosition};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone)]
pub struct MoveCreate {
    pub game_id: i64,
    pub user_id: i64,
    pub move_no: i32,
    pub action: MoveAction,
    pub tile: Option<Tile>,
    pub position: Option<Position>,
}

pub async fn append<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: MoveCreate,
) -> Result<game_moves::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let row = game_moves::ActiveModel {
        id: NotSet,
        game_id: Set(dto.game_id),
        user_id: Set(dto.user_id),
        move_no: Set(dto.move_no),
        action: Set(dto.action),
        tile_left: Set(dto.tile.map(|t| i16::from(t.left))),
        tile_right: Set(dto.tile.map(|t| i16::from(t.right))),
        position: Set(dto.position.map(|p| match p {
            Position::Start => MovePosition::Start,
            Position::End => MovePosition::End,
        })),
        created_at: Set(now),
    };
    Ok(row.insert(conn).await?)
}

pub async fn list_by_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Vec<game_moves::Model>, DomainError> {
    Ok(game_moves::Entity::find()
        .filter(game_moves::Column::GameId.eq(game_id))
        .order_by(game_moves::Column::MoveNo, Order::Asc)
        .order_by(game_moves::Column::Id, Order::Asc)
        .all(conn)
        .await?)
}
