//! Shared JSON column types.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::domain::tiles::Tile;

/// Ordered tile list stored in a JSON column (board chains, hands,
/// boneyards).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct TileList(pub Vec<Tile>);

impl TileList {
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self(tiles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Tile] {
        &self.0
    }
}

impl From<Vec<Tile>> for TileList {
    fn from(tiles: Vec<Tile>) -> Self {
        Self(tiles)
    }
}
