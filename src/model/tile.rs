//! Grid cells.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Grid width in cells.
pub const GRID_COLS: u32 = 6;

/// Grid height in cells.
pub const GRID_ROWS: u32 = 10;

/// Durability given to freshly placed cells.
pub const DEFAULT_TILE_HP: u32 = 100;

/// What occupies a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    #[default]
    Empty,
    Tavern,
    Turret,
    Barricade,
    GoldMine,
    Workshop,
}

impl TileKind {
    pub fn is_building(self) -> bool {
        self != TileKind::Empty
    }
}

/// Stable cell identifier, rendered as `tile_{x}_{y}`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId {
    x: u32,
    y: u32,
}

impl TileId {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Parse an id of the form `tile_{x}_{y}`.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("tile_")?;
        let (x, y) = rest.split_once('_')?;
        Some(Self {
            x: x.parse().ok()?,
            y: y.parse().ok()?,
        })
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }
}

impl fmt::Debug for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileId({}, {})", self.x, self.y)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile_{}_{}", self.x, self.y)
    }
}

/// A single grid cell.
///
/// Coordinates are fixed at construction; everything else is mutable game
/// state. `hp` never exceeds `max_hp`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TileRecord", into = "TileRecord")]
pub struct Tile {
    id: TileId,
    pub kind: TileKind,
    /// Building level, 0 for an empty cell.
    pub level: u32,
    hp: u32,
    max_hp: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, kind: TileKind, level: u32) -> Self {
        Self {
            id: TileId::new(x, y),
            kind,
            level,
            hp: DEFAULT_TILE_HP,
            max_hp: DEFAULT_TILE_HP,
        }
    }

    /// Set durability, clamping `hp` to `max_hp`.
    pub fn with_durability(mut self, hp: u32, max_hp: u32) -> Self {
        self.set_durability(hp, max_hp);
        self
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn x(&self) -> u32 {
        self.id.x
    }

    pub fn y(&self) -> u32 {
        self.id.y
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn set_durability(&mut self, hp: u32, max_hp: u32) {
        self.max_hp = max_hp;
        self.hp = hp.min(max_hp);
    }

    /// Apply damage, saturating at zero. Returns true if the cell is destroyed.
    pub fn damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }

    pub fn repair(&mut self) {
        self.hp = self.max_hp;
    }
}

/// Wire form of a tile: `{id, type, level, x, y, hp, maxHp}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    kind: TileKind,
    #[serde(default)]
    level: u32,
    x: u32,
    y: u32,
    #[serde(default = "default_hp")]
    hp: u32,
    #[serde(default = "default_hp")]
    max_hp: u32,
}

fn default_hp() -> u32 {
    DEFAULT_TILE_HP
}

impl From<Tile> for TileRecord {
    fn from(tile: Tile) -> Self {
        Self {
            id: Some(tile.id.to_string()),
            kind: tile.kind,
            level: tile.level,
            x: tile.id.x,
            y: tile.id.y,
            hp: tile.hp,
            max_hp: tile.max_hp,
        }
    }
}

// The id is always re-derived from the coordinates; a stored id that
// disagrees is dropped.
impl From<TileRecord> for Tile {
    fn from(record: TileRecord) -> Self {
        let id = TileId::new(record.x, record.y);
        if let Some(stored) = record.id.as_deref() {
            if TileId::parse(stored) != Some(id) {
                warn!(stored, derived = %id, "tile id does not match coordinates");
            }
        }
        if record.hp > record.max_hp {
            warn!(tile = %id, hp = record.hp, max_hp = record.max_hp, "clamping tile hp");
        }

        let mut tile = Tile::new(record.x, record.y, record.kind, record.level);
        tile.set_durability(record.hp, record.max_hp);
        tile
    }
}
