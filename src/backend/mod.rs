//! Key-value backends the save manager persists through.
//!
//! A backend stores string values under string keys and may cap the size of
//! each value. The manager only ever talks to [`KvBackend`], so switching
//! between a cloud store and a local fallback means passing a different
//! backend, not flipping a mode.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;

/// Longest key accepted by the cloud store.
pub const MAX_KEY_LEN: usize = 128;

/// Asynchronous string key-value store.
///
/// A `set` that returns an error must be treated as if nothing was written.
/// Removing a key that does not exist succeeds.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Read a value, `None` if the key is absent.
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Delete a value.
    async fn remove(&self, key: &str) -> BackendResult<()>;

    /// Every key currently stored.
    async fn list_keys(&self) -> BackendResult<Vec<String>>;
}

/// Check a key against the cloud store's rules: 1 to 128 characters of
/// `A-Z`, `a-z`, `0-9`, `_` and `-`.
pub fn validate_key(key: &str) -> BackendResult<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(BackendError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("gameState_chunk_12").is_ok());
        assert!(validate_key("a-b").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("has space").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN)).is_ok());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
    }
}
