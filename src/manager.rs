//! The chunked save manager.
//!
//! Ties the state model, chunk layout, migrations and a backend together:
//!
//! - save: encode, write the payload (one value or ordered chunks), then
//!   write the metadata record
//! - load: read metadata, read the payload it describes, verify, migrate,
//!   rebuild the state
//! - clear: delete the payload keys, then the metadata record
//!
//! Backend calls are issued one at a time. The manager holds no locks, so
//! callers must not run overlapping operations against the same prefix.

use crate::backend::{validate_key, KvBackend, MAX_KEY_LEN};
use crate::chunks::{join_chunks, split_chunks, KeyLayout};
use crate::error::{Result, SaveError};
use crate::migration::{MigrationStep, Migrator};
use crate::model::{GameState, CURRENT_VERSION};
use crate::types::{is_semver_shaped, SaveMeta, SaveReport};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Room left in a key for `chunk_` plus an index.
const CHUNK_SUFFIX_RESERVE: usize = 16;

/// Keys the cloud store allows per user.
pub const DEFAULT_MAX_CHUNKS: usize = 1024;

/// Save manager configuration.
#[derive(Clone, Debug)]
pub struct SaveConfig {
    /// Prefix shared by every key of the save slot.
    pub key_prefix: String,

    /// Payloads of at least this many bytes are split, into slices of this
    /// many characters. Kept below the backend's per-value limit.
    pub chunk_size: usize,

    /// Schema version written on save and migrated to on load.
    pub current_version: String,

    /// Most chunks a save may use. Metadata claiming more is corrupt.
    pub max_chunks: usize,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            key_prefix: "gameState_".to_string(),
            chunk_size: 3500,
            current_version: CURRENT_VERSION.to_string(),
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

impl SaveConfig {
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key_prefix)
            .map_err(|_| SaveError::InvalidConfig(format!("key prefix {:?}", self.key_prefix)))?;
        if self.key_prefix.len() > MAX_KEY_LEN - CHUNK_SUFFIX_RESERVE {
            return Err(SaveError::InvalidConfig(format!(
                "key prefix longer than {} characters",
                MAX_KEY_LEN - CHUNK_SUFFIX_RESERVE
            )));
        }
        if self.chunk_size == 0 {
            return Err(SaveError::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.max_chunks == 0 {
            return Err(SaveError::InvalidConfig("max_chunks must be positive".into()));
        }
        if !is_semver_shaped(&self.current_version) {
            return Err(SaveError::InvalidConfig(format!(
                "current_version {:?} is not major.minor.patch",
                self.current_version
            )));
        }
        Ok(())
    }
}

/// Persists [`GameState`] through a size-limited key-value backend.
pub struct SaveManager {
    config: SaveConfig,
    keys: KeyLayout,
    migrator: Migrator,
    backend: Arc<dyn KvBackend>,
}

impl SaveManager {
    /// Create a manager over `backend`.
    pub fn new(backend: Arc<dyn KvBackend>, config: SaveConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            keys: KeyLayout::new(config.key_prefix.clone()),
            migrator: Migrator::new(config.current_version.clone()),
            config,
            backend,
        })
    }

    /// Replace the built-in migration chain.
    pub fn with_migrations(mut self, steps: Vec<MigrationStep>) -> Self {
        self.migrator = Migrator::with_steps(self.config.current_version.clone(), steps);
        self
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    // --- Save ---

    /// Write `state`, replacing any previous save.
    ///
    /// The metadata record is written only after every payload value has
    /// been written. On error the previous metadata is untouched; chunks
    /// written before the failure are left in place.
    pub async fn save(&self, state: &GameState) -> Result<SaveReport> {
        let mut doc = state.to_document();
        doc.version = self.config.current_version.clone();
        let payload = doc.encode()?;
        let bytes = payload.len();

        let pieces = if bytes < self.config.chunk_size {
            vec![payload.as_str()]
        } else {
            split_chunks(&payload, self.config.chunk_size)
        };

        if pieces.len() > self.config.max_chunks {
            return Err(SaveError::TooManyChunks {
                chunks: pieces.len(),
                limit: self.config.max_chunks,
            });
        }

        debug!(bytes, chunks = pieces.len(), "saving state");

        if pieces.len() > 1 {
            for (index, piece) in pieces.iter().enumerate() {
                self.put(&self.keys.chunk_key(index), piece).await?;
            }
        } else {
            self.put(&self.keys.main_key(), &payload).await?;
        }

        let mut meta = SaveMeta::new(self.config.current_version.clone(), pieces.len(), &payload);
        meta.saved_at = doc.saved_at;
        let encoded_meta =
            serde_json::to_string(&meta).map_err(|e| SaveError::Serialization(e.to_string()))?;
        self.put(&self.keys.meta_key(), &encoded_meta).await?;

        info!(bytes, chunks = meta.chunks, "save complete");

        Ok(SaveReport {
            chunks: meta.chunks,
            bytes,
            saved_at: meta.saved_at,
        })
    }

    // --- Load ---

    /// Read the stored state.
    ///
    /// Returns `Ok(None)` when there is no save. A save that exists but
    /// cannot be used (missing chunk, bad checksum, undecodable payload,
    /// unknown version) is an error for which [`SaveError::is_corrupt`]
    /// holds; no partially rebuilt state is ever returned.
    pub async fn load(&self) -> Result<Option<GameState>> {
        let meta = match self.read_meta().await? {
            Some(meta) => meta,
            None => {
                debug!("no save found");
                return Ok(None);
            }
        };

        let payload = match self.read_payload(&meta).await? {
            Some(payload) => payload,
            None => return Ok(None),
        };

        if let Some(expected) = meta.checksum {
            let got = crc32fast::hash(payload.as_bytes());
            if got != expected {
                // A single value is replaced whole, so a mismatch there only
                // means the metadata write after it failed.
                if meta.is_chunked() {
                    return Err(SaveError::ChecksumMismatch { expected, got });
                }
                warn!(expected, got, "stale metadata checksum for main value");
            }
        }

        let value: serde_json::Value = serde_json::from_str(&payload)?;
        let migrated = self.migrator.migrate(value)?;
        let state = GameState::from_value(migrated)?;

        info!(
            bytes = payload.len(),
            chunks = meta.chunks,
            saved_at = %meta.saved_at,
            "load complete"
        );

        Ok(Some(state))
    }

    /// Read the stored state, treating every failure as "no usable save".
    ///
    /// For callers that only need to decide whether to start fresh. The
    /// failure is logged.
    pub async fn load_usable(&self) -> Option<GameState> {
        match self.load().await {
            Ok(state) => state,
            Err(e) if e.is_corrupt() => {
                warn!(error = %e, "stored save is unusable");
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to load save");
                None
            }
        }
    }

    async fn read_meta(&self) -> Result<Option<SaveMeta>> {
        let raw = match self.fetch(&self.keys.meta_key()).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let meta: SaveMeta = serde_json::from_str(&raw)
            .map_err(|e| SaveError::InvalidMetadata(e.to_string()))?;
        if meta.chunks == 0 {
            return Err(SaveError::InvalidMetadata("chunk count is zero".into()));
        }
        if meta.chunks > self.config.max_chunks {
            return Err(SaveError::InvalidMetadata(format!(
                "chunk count {} exceeds limit {}",
                meta.chunks, self.config.max_chunks
            )));
        }
        Ok(Some(meta))
    }

    async fn read_payload(&self, meta: &SaveMeta) -> Result<Option<String>> {
        if !meta.is_chunked() {
            let payload = self.fetch(&self.keys.main_key()).await?;
            if payload.is_none() {
                warn!("metadata present but main value is missing");
            }
            return Ok(payload);
        }

        let mut chunks = Vec::new();
        for index in 0..meta.chunks {
            match self.fetch(&self.keys.chunk_key(index)).await? {
                Some(chunk) => chunks.push(chunk),
                None => {
                    warn!(index, expected = meta.chunks, "save chunk missing");
                    return Err(SaveError::MissingChunk {
                        index,
                        expected: meta.chunks,
                    });
                }
            }
        }

        Ok(Some(join_chunks(&chunks)))
    }

    // --- Clear ---

    /// Delete the save. Succeeds when there is nothing to delete.
    ///
    /// Payload keys go first and the metadata record last, so an
    /// interrupted clear leaves a save that fails to load rather than one
    /// that loads stale data.
    pub async fn clear(&self) -> Result<()> {
        let data_keys = match self.read_meta().await {
            Ok(Some(meta)) => self.keys.data_keys(meta.chunks),
            Ok(None) => {
                debug!("nothing to clear");
                return Ok(());
            }
            Err(SaveError::InvalidMetadata(reason)) => {
                warn!(%reason, "clearing save with unreadable metadata");
                vec![self.keys.main_key()]
            }
            Err(e) => return Err(e),
        };

        for key in &data_keys {
            self.delete(key).await?;
        }
        self.delete(&self.keys.meta_key()).await?;

        info!(keys = data_keys.len() + 1, "save cleared");
        Ok(())
    }

    // --- Diagnostics ---

    /// Whether a metadata record exists.
    pub async fn has_save(&self) -> Result<bool> {
        Ok(self.fetch(&self.keys.meta_key()).await?.is_some())
    }

    /// Every backend key under this manager's prefix.
    pub async fn stored_keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .backend
            .list_keys()
            .await?
            .into_iter()
            .filter(|k| self.keys.owns(k))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Keys under the prefix that the current save does not reference, such
    /// as chunks left by an aborted save or a save that shrank.
    pub async fn stale_keys(&self) -> Result<Vec<String>> {
        let live = match self.read_meta().await? {
            Some(meta) => {
                let mut live = self.keys.data_keys(meta.chunks);
                live.push(self.keys.meta_key());
                live
            }
            None => Vec::new(),
        };

        Ok(self
            .stored_keys()
            .await?
            .into_iter()
            .filter(|k| !live.contains(k))
            .collect())
    }

    // --- Backend access ---

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        debug!(key, bytes = value.len(), "backend set");
        self.backend.set(key, value).await.map_err(|e| {
            warn!(key, error = %e, "backend set failed");
            SaveError::from(e)
        })
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        debug!(key, "backend get");
        self.backend.get(key).await.map_err(|e| {
            warn!(key, error = %e, "backend get failed");
            SaveError::from(e)
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!(key, "backend remove");
        self.backend.remove(key).await.map_err(|e| {
            warn!(key, error = %e, "backend remove failed");
            SaveError::from(e)
        })
    }
}
