//! In-process backend.

use super::{validate_key, KvBackend};
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Backend keeping values in memory.
///
/// With a value limit it rejects oversize writes the way the cloud store
/// does, which makes it a faithful stand-in for tests and local play.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
    value_limit: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values longer than `limit` bytes.
    pub fn with_value_limit(limit: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            value_limit: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of a value without going through the async interface.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        validate_key(key)?;
        if let Some(limit) = self.value_limit {
            if value.len() > limit {
                return Err(BackendError::ValueTooLarge {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> BackendResult<()> {
        validate_key(key)?;
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BackendResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}
