//! # Tavern Save
//!
//! A chunked, versioned save store for game state kept in a key-value
//! backend that caps each value at a few kilobytes and offers no
//! transactions.
//!
//! ## Core Concepts
//!
//! - **State model**: [`GameState`] and its plain [`SaveDocument`] form
//! - **Chunks**: payloads past the threshold are split across ordered keys
//! - **Metadata**: a small record, written last and read first, describing
//!   the layout and schema version of the save
//! - **Migrations**: old documents are brought forward before decoding
//! - **Backends**: anything implementing [`KvBackend`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tavern_save::{GameState, MemoryBackend, SaveConfig, SaveManager};
//!
//! let manager = SaveManager::new(Arc::new(MemoryBackend::new()), SaveConfig::default())?;
//!
//! let mut state = GameState::new();
//! state.initialize_empty_grid();
//! manager.save(&state).await?;
//!
//! let restored = manager.load().await?.expect("just saved");
//! assert_eq!(restored, state);
//! ```

pub mod backend;
pub mod chunks;
pub mod error;
pub mod manager;
pub mod migration;
pub mod model;
pub mod types;

// Re-exports
pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use chunks::{join_chunks, split_chunks, KeyLayout};
pub use error::{BackendError, BackendResult, Result, SaveError};
pub use manager::{SaveConfig, SaveManager, DEFAULT_MAX_CHUNKS};
pub use migration::{MigrationStep, Migrator, MIGRATIONS};
pub use model::{
    GameState, Player, Progress, SaveDocument, Stats, Tile, TileId, TileKind, Upgrades,
    BASE_VERSION, CURRENT_VERSION, GRID_COLS, GRID_ROWS,
};
pub use types::{SaveMeta, SaveReport, Timestamp};
