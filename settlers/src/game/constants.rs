//! Fixed quantities of the ruleset.

use crate::game::entities::TileKind;

/// Tiles on the board. 3 brick + 4 wood + 4 sheep + 4 wheat + 3 rock + 1 desert.
pub const BOARD_TILE_COUNT: usize = 19;

/// How many tiles of each kind a generated board contains.
pub const TILE_COUNTS: [(TileKind, u8); 6] = [
    (TileKind::Brick, 3),
    (TileKind::Wood, 4),
    (TileKind::Sheep, 4),
    (TileKind::Wheat, 4),
    (TileKind::Rock, 3),
    (TileKind::Desert, 1),
];

/// The number-token multiset laid over the non-desert tiles. Two each of
/// 3-6 and 8-11, one each of 2 and 12; never a 7.
pub const NUMBER_TOKENS: [u8; BOARD_TILE_COUNT - 1] =
    [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// Cards of each resource the shared bank starts with.
pub const BANK_PER_RESOURCE: u8 = 20;

/// Room capacity; also the size of the color palette.
pub const MAX_PLAYERS: usize = 4;

/// Rolling a 7 forces every player holding more than this many cards to
/// discard half of them (rounded down).
pub const DISCARD_THRESHOLD: usize = 7;
