//! Shuffling and the opening deal.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::tiles::{double_six_set, Tile, HAND_SIZE};

/// The opening deal: two hands of seven and the remaining fourteen tiles
/// face-down in the boneyard. Draws come off the back of the boneyard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    pub hand_a: Vec<Tile>,
    pub hand_b: Vec<Tile>,
    pub boneyard: Vec<Tile>,
}

/// The double-six set in a random order.
pub fn shuffled_set<R: Rng + ?Sized>(rng: &mut R) -> Vec<Tile> {
    let mut tiles = double_six_set();
    tiles.shuffle(rng);
    tiles
}

/// Shuffle and split 7 / 7 / 14.
pub fn deal<R: Rng + ?Sized>(rng: &mut R) -> Deal {
    let mut tiles = shuffled_set(rng);
    let boneyard = tiles.split_off(2 * HAND_SIZE);
    let hand_b = tiles.split_off(HAND_SIZE);
    Deal {
        hand_a: tiles,
        hand_b,
        boneyard,
    }
}
