//! Board generation.
//!
//! A board is the fixed multiset of tile kinds and the fixed multiset of
//! number tokens, each independently shuffled. Sizes are deterministic;
//! only the order is random.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::game::constants::{NUMBER_TOKENS, TILE_COUNTS};
use crate::game::entities::{Tile, TileKind};

/// A generated tile table plus the desert's position.
#[derive(Clone, Debug)]
pub struct Board {
    pub tiles: Vec<Tile>,
    pub desert_index: usize,
}

impl Board {
    /// Generate a full board: shuffle the tile kinds, shuffle the tokens,
    /// then lay the tokens over the tiles in order, skipping the desert.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let kinds = generate_tile_kinds(rng);
        let tokens = generate_tokens(rng);

        let mut tiles = Vec::with_capacity(kinds.len());
        let mut desert_index = 0;
        let mut token_iter = tokens.into_iter();
        for (index, kind) in kinds.into_iter().enumerate() {
            let token = match kind {
                TileKind::Desert => {
                    desert_index = index;
                    None
                }
                _ => token_iter.next(),
            };
            tiles.push(Tile { kind, token });
        }

        Self {
            tiles,
            desert_index,
        }
    }
}

/// Produce the tile-kind sequence by repeatedly drawing a uniformly random
/// kind that still has remaining copies. Preserves the exact per-kind
/// counts; the order is a uniform permutation of the multiset.
fn generate_tile_kinds(rng: &mut impl Rng) -> Vec<TileKind> {
    let mut remaining: Vec<(TileKind, u8)> = TILE_COUNTS.to_vec();
    let mut kinds = Vec::with_capacity(TILE_COUNTS.iter().map(|(_, n)| *n as usize).sum());

    while !remaining.is_empty() {
        let pick = rng.random_range(0..remaining.len());
        let (kind, count) = &mut remaining[pick];
        kinds.push(*kind);
        *count -= 1;
        if *count == 0 {
            remaining.swap_remove(pick);
        }
    }

    kinds
}

/// The 18-token multiset in uniformly random order.
fn generate_tokens(rng: &mut impl Rng) -> Vec<u8> {
    let mut tokens = NUMBER_TOKENS.to_vec();
    tokens.shuffle(rng);
    tokens
}
