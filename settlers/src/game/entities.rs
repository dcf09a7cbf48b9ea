//! Entities shared by every room: resources, tiles, players, structures.

use std::{collections::HashMap, fmt};

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// The five producing resource kinds.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Resource {
    Brick,
    Wood,
    Sheep,
    Wheat,
    Rock,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Wood,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Rock,
    ];
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Brick => "BRICK",
            Self::Wood => "WOOD",
            Self::Sheep => "SHEEP",
            Self::Wheat => "WHEAT",
            Self::Rock => "ROCK",
        };
        write!(f, "{repr}")
    }
}

/// What a board tile is made of. The desert is the single non-producing
/// kind; it never carries a number token.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TileKind {
    Brick,
    Wood,
    Sheep,
    Wheat,
    Rock,
    Desert,
}

impl TileKind {
    /// The resource this tile yields, if any.
    pub fn resource(self) -> Option<Resource> {
        match self {
            Self::Brick => Some(Resource::Brick),
            Self::Wood => Some(Resource::Wood),
            Self::Sheep => Some(Resource::Sheep),
            Self::Wheat => Some(Resource::Wheat),
            Self::Rock => Some(Resource::Rock),
            Self::Desert => None,
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resource() {
            Some(resource) => write!(f, "{resource}"),
            None => write!(f, "DESERT"),
        }
    }
}

/// One board tile. Position is the tile's index in the room's tile vector;
/// tiles are generated once per room and never move.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Tile {
    pub kind: TileKind,
    /// `None` exactly for the desert.
    pub token: Option<u8>,
}

/// Per-kind non-negative card counts. Used for the shared bank, building
/// costs, and hand tallies. Counts never go negative; subtraction that
/// would underflow is rejected instead.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResourceBundle {
    counts: [u8; Resource::ALL.len()],
}

impl ResourceBundle {
    pub const fn from_counts(counts: [u8; 5]) -> Self {
        Self { counts }
    }

    pub const fn zero() -> Self {
        Self {
            counts: [0; Resource::ALL.len()],
        }
    }

    /// Count each kind's occurrences in a positional hand.
    pub fn tally(cards: &[Resource]) -> Self {
        let mut bundle = Self::zero();
        for card in cards {
            bundle.add(*card, 1);
        }
        bundle
    }

    pub fn get(&self, resource: Resource) -> u8 {
        self.counts[resource_index(resource)]
    }

    pub fn add(&mut self, resource: Resource, amount: u8) {
        let idx = resource_index(resource);
        self.counts[idx] = self.counts[idx].saturating_add(amount);
    }

    pub fn subtract(&mut self, resource: Resource, amount: u8) -> Result<(), ResourceError> {
        let idx = resource_index(resource);
        if self.counts[idx] < amount {
            return Err(ResourceError::Insufficient {
                resource,
                available: self.counts[idx],
                requested: amount,
            });
        }
        self.counts[idx] -= amount;
        Ok(())
    }

    pub fn add_bundle(&mut self, other: &ResourceBundle) {
        for (idx, value) in other.counts.iter().enumerate() {
            self.counts[idx] = self.counts[idx].saturating_add(*value);
        }
    }

    pub fn subtract_bundle(&mut self, other: &ResourceBundle) -> Result<(), ResourceError> {
        if !self.covers(other) {
            return Err(ResourceError::InsufficientBundle);
        }
        for (idx, value) in other.counts.iter().enumerate() {
            self.counts[idx] -= *value;
        }
        Ok(())
    }

    /// True when every per-kind count is at least `other`'s.
    pub fn covers(&self, other: &ResourceBundle) -> bool {
        self.counts
            .iter()
            .zip(other.counts.iter())
            .all(|(have, need)| have >= need)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&v| u32::from(v)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&v| v == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, u8)> + '_ {
        Resource::ALL.into_iter().zip(self.counts.iter().copied())
    }
}

impl fmt::Display for ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![];
        for (resource, amount) in self.iter() {
            if amount > 0 {
                parts.push(format!("{amount}x{resource}"));
            }
        }
        write!(f, "{}", parts.join(", "))
    }
}

// The bank is broadcast as a {"WOOD": 20, ...} map, so bundles serialize
// by kind name rather than positionally.
impl Serialize for ResourceBundle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Resource::ALL.len()))?;
        for (resource, count) in self.iter() {
            map.serialize_entry(&resource, &count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResourceBundle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let counts: HashMap<Resource, u8> = HashMap::deserialize(deserializer)?;
        let mut bundle = ResourceBundle::zero();
        for (resource, count) in counts {
            bundle.add(resource, count);
        }
        Ok(bundle)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("insufficient {resource}: have {available}, need {requested}")]
    Insufficient {
        resource: Resource,
        available: u8,
        requested: u8,
    },
    #[error("insufficient resources to cover bundle")]
    InsufficientBundle,
}

const fn resource_index(resource: Resource) -> usize {
    match resource {
        Resource::Brick => 0,
        Resource::Wood => 1,
        Resource::Sheep => 2,
        Resource::Wheat => 3,
        Resource::Rock => 4,
    }
}

/// What a road costs outside setup.
pub const COST_ROAD: ResourceBundle = ResourceBundle::from_counts([1, 1, 0, 0, 0]);
/// What a settlement costs outside setup.
pub const COST_SETTLEMENT: ResourceBundle = ResourceBundle::from_counts([1, 1, 1, 1, 0]);

/// Opaque player identity. Supplied by the transport layer (a socket id, a
/// uuid); the game attaches no meaning to its contents.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Player colors, unique within a room.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayerColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl PlayerColor {
    pub const PALETTE: [PlayerColor; 4] = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Green,
        PlayerColor::Yellow,
    ];

    /// Pick a uniformly random color not yet in use, or `None` when the
    /// palette is exhausted.
    pub fn draw_unused(used: &[PlayerColor], rng: &mut impl Rng) -> Option<PlayerColor> {
        let remaining: Vec<PlayerColor> = Self::PALETTE
            .into_iter()
            .filter(|color| !used.contains(color))
            .collect();
        remaining.choose(rng).copied()
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
        };
        write!(f, "{repr}")
    }
}

/// One seated player. The hand is positional so single cards can be
/// removed by index, but its semantics are an order-insignificant
/// multiset. Victory points are derived from built structures and never
/// stored.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub hand: Vec<Resource>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, color: PlayerColor) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            hand: Vec::new(),
        }
    }

    /// Remove and return one uniformly random card, if any.
    pub fn take_random_card(&mut self, rng: &mut impl Rng) -> Option<Resource> {
        if self.hand.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.hand.len());
        Some(self.hand.swap_remove(idx))
    }
}

/// Canonical client-space position. Geometry is the presentation layer's
/// concern; the server only stores and echoes these.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One entry of a settlement's adjacency cache: the tile's index plus its
/// resource kind and number token captured at placement time.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileFact {
    pub tile_index: usize,
    pub kind: TileKind,
    pub token: Option<u8>,
}

/// A built settlement, worth one victory point to its owner.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub owner: PlayerId,
    pub position: Point,
    /// Tiles adjacent to the settlement, denormalized from the tile table
    /// at placement so production rolls never re-derive adjacency.
    pub adjacent_tiles: Vec<TileFact>,
}

/// A built road between two corner positions.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Road {
    pub owner: PlayerId,
    pub start: Point,
    pub end: Point,
}
