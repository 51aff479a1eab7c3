//! Board legality and blocked-game resolution.
//!
//! The board is an oriented chain: every adjacent pair of tiles already
//! matches, so the open pips are just `board[0].left` and
//! `board[last].right`.

use crate::domain::tiles::{hand_score, Position, Tile};

/// Open pips at the two ends of the board, or `None` for an empty board.
pub fn endpoints(board: &[Tile]) -> Option<(u8, u8)> {
    let first = board.first()?;
    let last = board.last()?;
    Some((first.left, last.right))
}

/// Whether the tile may be attached at either end. Any tile opens an empty
/// board.
pub fn is_legal(tile: Tile, board: &[Tile]) -> bool {
    match endpoints(board) {
        None => true,
        Some((start, end)) => tile.matches(start) || tile.matches(end),
    }
}

/// Whether any tile in the hand is legal on the board.
pub fn has_legal_move(hand: &[Tile], board: &[Tile]) -> bool {
    hand.iter().any(|tile| is_legal(*tile, board))
}

/// The end a legal tile can attach to, preferring `Start` when both fit.
/// Returns `None` if the tile is not legal.
pub fn legal_position(tile: Tile, board: &[Tile]) -> Option<Position> {
    match endpoints(board) {
        None => Some(Position::End),
        Some((start, _)) if tile.matches(start) => Some(Position::Start),
        Some((_, end)) if tile.matches(end) => Some(Position::End),
        Some(_) => None,
    }
}

/// Orient the tile for attachment and extend the board chain.
/// Panics in debug builds if the attachment does not match; callers check
/// `is_legal` first.
pub fn attach(board: &mut Vec<Tile>, tile: Tile, position: Position) {
    match endpoints(board) {
        None => board.push(tile),
        Some((start, end)) => match position {
            Position::Start => {
                debug_assert!(tile.matches(start));
                // The attached tile's right face must meet the chain start.
                let oriented = if tile.right == start { tile } else { tile.flipped() };
                board.insert(0, oriented);
            }
            Position::End => {
                debug_assert!(tile.matches(end));
                let oriented = if tile.left == end { tile } else { tile.flipped() };
                board.push(oriented);
            }
        },
    }
}

/// Whether the tile can attach at the given end specifically.
pub fn is_legal_at(tile: Tile, board: &[Tile], position: Position) -> bool {
    match endpoints(board) {
        None => true,
        Some((start, end)) => match position {
            Position::Start => tile.matches(start),
            Position::End => tile.matches(end),
        },
    }
}

/// Resolve a blocked game from the two hand scores. The lower pip count
/// wins; equal counts mean a draw.
pub fn blocked_winner(score_a: u32, score_b: u32) -> Option<BlockedSeat> {
    use std::cmp::Ordering;
    match score_a.cmp(&score_b) {
        Ordering::Less => Some(BlockedSeat::A),
        Ordering::Greater => Some(BlockedSeat::B),
        Ordering::Equal => None,
    }
}

/// Which of the two compared hands won a blocked game.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlockedSeat {
    A,
    B,
}

/// Score both hands for blocked resolution.
pub fn blocked_scores(hand_a: &[Tile], hand_b: &[Tile]) -> (u32, u32) {
    (hand_score(hand_a), hand_score(hand_b))
}
