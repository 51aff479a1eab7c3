//! Domain layer: pure game logic types and helpers.

pub mod dealing;
pub mod rules;
pub mod tiles;

#[cfg(test)]
mod tests_props;

// Re-exports for ergonomics
pub use dealing::{deal, shuffled_set, Deal};
pub use rules::{
    attach, blocked_scores, blocked_winner, endpoints, has_legal_move, is_legal, is_legal_at,
    legal_position, BlockedSeat,
};
pub use tiles::{
    double_six_set, hand_score, Position, Tile, DOUBLE_SIX_SET_SIZE, HAND_SIZE, MAX_PIP,
};
