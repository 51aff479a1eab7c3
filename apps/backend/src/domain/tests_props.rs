/// Property-based tests for dealing and board legality
use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::dealing::deal;
use crate::domain::rules::{attach, endpoints, has_legal_move, is_legal, legal_position};
use crate::domain::tiles::{double_six_set, Tile, DOUBLE_SIX_SET_SIZE, MAX_PIP};

fn arb_tile() -> impl Strategy<Value = Tile> {
    (0..=MAX_PIP, 0..=MAX_PIP).prop_map(|(left, right)| Tile { left, right })
}

/// A valid oriented board chain of up to `max_len` tiles, grown by random
/// legal attachments from the full set.
fn arb_board(max_len: usize) -> impl Strategy<Value = Vec<Tile>> {
    (any::<u64>(), 0..=max_len).prop_map(move |(seed, len)| {
        let mut pool = {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut tiles = double_six_set();
            use rand::seq::SliceRandom;
            tiles.shuffle(&mut rng);
            tiles
        };
        let mut board = Vec::new();
        while board.len() < len {
            let Some(idx) = pool.iter().position(|t| is_legal(*t, &board)) else {
                break;
            };
            let tile = pool.remove(idx);
            let position = legal_position(tile, &board).unwrap();
            attach(&mut board, tile, position);
        }
        board
    })
}

proptest! {
    /// Property: the deal partitions the double-six set.
    /// hands and boneyard are disjoint and together hold all 28 tiles.
    #[test]
    fn prop_deal_partitions_the_set(seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let deal = deal(&mut rng);

        prop_assert_eq!(deal.hand_a.len(), 7);
        prop_assert_eq!(deal.hand_b.len(), 7);
        prop_assert_eq!(deal.boneyard.len(), 14);

        let mut all: Vec<Tile> = Vec::with_capacity(DOUBLE_SIX_SET_SIZE);
        all.extend(&deal.hand_a);
        all.extend(&deal.hand_b);
        all.extend(&deal.boneyard);

        let unique: HashSet<Tile> = all.iter().copied().collect();
        prop_assert_eq!(unique.len(), DOUBLE_SIX_SET_SIZE);
        let full: HashSet<Tile> = double_six_set().into_iter().collect();
        prop_assert_eq!(unique, full);
    }

    /// Property: legality is orientation-symmetric and matches endpoints.
    #[test]
    fn prop_legality_matches_endpoints(tile in arb_tile(), board in arb_board(10)) {
        let legal = is_legal(tile, &board);
        prop_assert_eq!(legal, is_legal(tile.flipped(), &board));

        match endpoints(&board) {
            None => prop_assert!(legal, "any tile opens an empty board"),
            Some((start, end)) => {
                let expected = tile.matches(start) || tile.matches(end);
                prop_assert_eq!(legal, expected);
            }
        }
    }

    /// Property: attaching a legal tile keeps the chain matched and grows
    /// the board by one.
    #[test]
    fn prop_attach_preserves_chain(tile in arb_tile(), board in arb_board(10)) {
        prop_assume!(is_legal(tile, &board));
        let position = legal_position(tile, &board).unwrap();

        let mut next = board.clone();
        attach(&mut next, tile, position);

        prop_assert_eq!(next.len(), board.len() + 1);
        for pair in next.windows(2) {
            prop_assert_eq!(pair[0].right, pair[1].left);
        }
    }

    /// Property: has_legal_move agrees with per-tile legality.
    #[test]
    fn prop_has_legal_move_agrees(
        hand in proptest::collection::vec(arb_tile(), 0..8),
        board in arb_board(10),
    ) {
        let expected = hand.iter().any(|t| is_legal(*t, &board));
        prop_assert_eq!(has_legal_move(&hand, &board), expected);
    }
}
