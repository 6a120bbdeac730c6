//! The game state and its plain document form.

use crate::error::{Result, SaveError};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tile::{Tile, TileKind, GRID_COLS, GRID_ROWS};

/// Oldest schema version; assumed for documents without a version tag.
pub const BASE_VERSION: &str = "0.0.0";

/// Schema version written by this crate.
pub const CURRENT_VERSION: &str = "1.0.0";

/// Player progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Player {
    pub gold: u64,
    pub reputation: u64,
    pub day: u32,
    pub level: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            gold: 100,
            reputation: 0,
            day: 1,
            level: 1,
        }
    }
}

/// Upgrade levels, all starting at 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Upgrades {
    pub turret_damage: u32,
    pub turret_range: u32,
    pub turret_speed: u32,
    pub barricade_hp: u32,
    pub gold_production: u32,
    pub workshop_speed: u32,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            turret_damage: 1,
            turret_range: 1,
            turret_speed: 1,
            barricade_hp: 1,
            gold_production: 1,
            workshop_speed: 1,
        }
    }
}

/// Run progress counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Progress {
    pub current_wave: u32,
    pub max_wave_cleared: u32,
    /// Seconds.
    pub total_play_time: u64,
    pub last_save_time: Timestamp,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_wave: 1,
            max_wave_cleared: 0,
            total_play_time: 0,
            last_save_time: Timestamp::now(),
        }
    }
}

/// Cumulative statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub enemies_defeated: u64,
    pub gold_earned: u64,
    pub gold_spent: u64,
    pub buildings_built: u64,
    pub buildings_destroyed: u64,
    pub waves_survived: u64,
}

/// Everything that gets persisted for a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub version: String,
    pub player: Player,
    pub tiles: Vec<Tile>,
    pub upgrades: Upgrades,
    pub progress: Progress,
    pub stats: Stats,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            player: Player::default(),
            tiles: Vec::new(),
            upgrades: Upgrades::default(),
            progress: Progress::default(),
            stats: Stats::default(),
        }
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tiles with an empty grid, row-major.
    pub fn initialize_empty_grid(&mut self) {
        self.tiles = (0..GRID_ROWS)
            .flat_map(|y| (0..GRID_COLS).map(move |x| Tile::new(x, y, TileKind::Empty, 0)))
            .collect();
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.x() == x && t.y() == y)
    }

    pub fn tile_at_mut(&mut self, x: u32, y: u32) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|t| t.x() == x && t.y() == y)
    }

    /// Number of cells holding a building.
    pub fn building_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.kind.is_building()).count()
    }

    /// A mid-run state, handy for demos and tests.
    pub fn example() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            player: Player {
                gold: 500,
                reputation: 150,
                day: 5,
                level: 3,
            },
            tiles: vec![
                Tile::new(2, 5, TileKind::Tavern, 2).with_durability(200, 200),
                Tile::new(1, 5, TileKind::Turret, 1),
                Tile::new(3, 5, TileKind::Turret, 1),
                Tile::new(2, 4, TileKind::Barricade, 1).with_durability(150, 150),
                Tile::new(0, 6, TileKind::GoldMine, 2).with_durability(80, 80),
            ],
            upgrades: Upgrades {
                turret_damage: 3,
                turret_range: 2,
                turret_speed: 2,
                barricade_hp: 2,
                gold_production: 3,
                workshop_speed: 1,
            },
            progress: Progress {
                current_wave: 12,
                max_wave_cleared: 15,
                total_play_time: 3600,
                last_save_time: Timestamp::now(),
            },
            stats: Stats {
                enemies_defeated: 150,
                gold_earned: 5000,
                gold_spent: 4500,
                buildings_built: 25,
                buildings_destroyed: 3,
                waves_survived: 15,
            },
        }
    }

    /// Copy the state into its plain document form, stamped with the current time.
    pub fn to_document(&self) -> SaveDocument {
        SaveDocument {
            version: self.version.clone(),
            player: self.player.clone(),
            tiles: self.tiles.clone(),
            upgrades: self.upgrades.clone(),
            progress: self.progress.clone(),
            stats: self.stats.clone(),
            saved_at: Timestamp::now(),
        }
    }

    pub fn from_document(doc: SaveDocument) -> Self {
        Self {
            version: doc.version,
            player: doc.player,
            tiles: doc.tiles,
            upgrades: doc.upgrades,
            progress: doc.progress,
            stats: doc.stats,
        }
    }

    /// Rebuild a state from a plain value tree.
    ///
    /// Missing sub-records and fields take their defaults. A tree of the
    /// wrong shape fails as a whole.
    pub fn from_value(value: Value) -> Result<Self> {
        let doc: SaveDocument = serde_json::from_value(value)?;
        Ok(Self::from_document(doc))
    }
}

/// Plain, behaviorless snapshot of a [`GameState`] as it is encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    #[serde(default = "base_version")]
    pub version: String,
    #[serde(default)]
    pub player: Player,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub upgrades: Upgrades,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default, deserialize_with = "Timestamp::deserialize_lenient")]
    pub saved_at: Timestamp,
}

fn base_version() -> String {
    BASE_VERSION.to_string()
}

impl SaveDocument {
    /// Encode as canonical JSON text.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SaveError::Serialization(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| SaveError::Serialization(e.to_string()))
    }
}
