//! The persisted game state.
//!
//! The model owns no persistence logic. It converts between [`GameState`]
//! and a plain [`SaveDocument`] that the store manager encodes.

mod game;
mod tile;

pub use game::{
    GameState, Player, Progress, SaveDocument, Stats, Upgrades, BASE_VERSION, CURRENT_VERSION,
};
pub use tile::{Tile, TileId, TileKind, DEFAULT_TILE_HP, GRID_COLS, GRID_ROWS};
