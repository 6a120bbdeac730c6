//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tavern_save::{
    BackendError, BackendResult, GameState, KvBackend, MemoryBackend, SaveConfig, SaveManager,
    TileKind,
};

/// Install a log subscriber that writes through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Memory backend with injectable failures and a record of every call.
#[derive(Default)]
pub struct FlakyBackend {
    pub inner: MemoryBackend,
    /// Number of further `set` calls that succeed; `None` means unlimited.
    sets_allowed: Mutex<Option<usize>>,
    failing_gets: Mutex<HashSet<String>>,
    failing_removes: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FlakyBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn allow_sets(&self, count: usize) {
        *self.sets_allowed.lock() = Some(count);
    }

    pub fn heal(&self) {
        *self.sets_allowed.lock() = None;
        self.failing_gets.lock().clear();
        self.failing_removes.lock().clear();
    }

    pub fn fail_get(&self, key: &str) {
        self.failing_gets.lock().insert(key.to_string());
    }

    pub fn fail_remove(&self, key: &str) {
        self.failing_removes.lock().insert(key.to_string());
    }

    /// Calls so far, as `op:key`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, op: &str, key: &str) {
        self.calls.lock().push(format!("{}:{}", op, key));
    }
}

#[async_trait]
impl KvBackend for FlakyBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.record("get", key);
        if self.failing_gets.lock().contains(key) {
            return Err(BackendError::Unavailable(format!("get {}", key)));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.record("set", key);
        {
            let mut allowed = self.sets_allowed.lock();
            match allowed.as_mut() {
                Some(0) => return Err(BackendError::Unavailable(format!("set {}", key))),
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> BackendResult<()> {
        self.record("remove", key);
        if self.failing_removes.lock().contains(key) {
            return Err(BackendError::Unavailable(format!("remove {}", key)));
        }
        self.inner.remove(key).await
    }

    async fn list_keys(&self) -> BackendResult<Vec<String>> {
        self.inner.list_keys().await
    }
}

pub fn test_manager(backend: Arc<dyn KvBackend>) -> SaveManager {
    SaveManager::new(backend, SaveConfig::default()).unwrap()
}

/// A full grid with enough buildings to push the encoding past 3500 bytes.
pub fn large_state() -> GameState {
    let mut state = GameState::example();
    state.initialize_empty_grid();
    for (i, tile) in state.tiles.iter_mut().enumerate() {
        if i % 2 == 0 {
            tile.kind = TileKind::Barricade;
            tile.level = 3;
            tile.set_durability(90, 150);
        }
    }
    state.stats.enemies_defeated = 123_456;
    state
}
