//! Core tile types: Tile, Position, and the double-six set.

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

/// Highest pip value in a double-six set.
pub const MAX_PIP: u8 = 6;

/// Number of tiles in a double-six set: C(7,2) + 7 doubles.
pub const DOUBLE_SIX_SET_SIZE: usize = 28;

/// Tiles dealt to each player at game start.
pub const HAND_SIZE: usize = 7;

/// A domino tile. `left`/`right` are the stored orientation; legality checks
/// treat the tile as symmetric, but `{l,r}` and `{r,l}` remain distinct
/// stored values so the board chain stays oriented.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub left: u8,
    pub right: u8,
}

impl Tile {
    /// Construct a tile, rejecting pips outside 0..=6.
    pub fn new(left: u8, right: u8) -> Result<Self, DomainError> {
        if left > MAX_PIP || right > MAX_PIP {
            return Err(DomainError::validation(
                ValidationKind::MalformedTile,
                format!("pips must be 0..={MAX_PIP}, got {left}|{right}"),
            ));
        }
        Ok(Self { left, right })
    }

    pub fn is_double(&self) -> bool {
        self.left == self.right
    }

    /// Whether either face shows the given pip.
    pub fn matches(&self, pip: u8) -> bool {
        self.left == pip || self.right == pip
    }

    pub fn pip_sum(&self) -> u32 {
        u32::from(self.left) + u32::from(self.right)
    }

    /// The same tile with faces swapped.
    pub fn flipped(&self) -> Tile {
        Tile {
            left: self.right,
            right: self.left,
        }
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.left, self.right)
    }
}

/// Which end of the board chain a tile is attached to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Start,
    End,
}

/// The full double-six set in canonical order (left <= right).
pub fn double_six_set() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(DOUBLE_SIX_SET_SIZE);
    for left in 0..=MAX_PIP {
        for right in left..=MAX_PIP {
            tiles.push(Tile { left, right });
        }
    }
    tiles
}

/// Total pip count of a hand, used for blocked-game scoring.
pub fn hand_score(hand: &[Tile]) -> u32 {
    hand.iter().map(Tile::pip_sum).sum()
}
