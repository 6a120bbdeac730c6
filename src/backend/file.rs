//! Directory-backed backend for local play.

use super::{validate_key, KvBackend};
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs as afs;

/// Extension of value files.
const VALUE_EXT: &str = "val";

/// Extension of in-flight writes.
const TEMP_EXT: &str = "tmp";

/// Backend storing one file per key under a directory.
///
/// The directory is held with an exclusive lock for the lifetime of the
/// backend. Writes land in a temp file first and are renamed into place, so
/// a failed `set` never leaves a truncated value behind.
pub struct FileBackend {
    path: PathBuf,

    /// Lock file for exclusive access.
    _lock_file: File,
}

impl FileBackend {
    /// Open (creating if needed) a backend rooted at `path`.
    pub fn open(path: impl AsRef<Path>) -> BackendResult<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;

        let lock_file = Self::acquire_lock(&path)?;

        Ok(Self {
            path,
            _lock_file: lock_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn acquire_lock(path: &Path) -> BackendResult<File> {
        let lock_file = File::create(path.join("LOCK"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| BackendError::Locked)?;

        Ok(lock_file)
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{}.{}", key, VALUE_EXT))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{}.{}", key, TEMP_EXT))
    }
}

#[async_trait]
impl KvBackend for FileBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        validate_key(key)?;
        match afs::read_to_string(self.value_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        validate_key(key)?;
        let temp = self.temp_path(key);
        if let Err(e) = afs::write(&temp, value).await {
            let _ = afs::remove_file(&temp).await;
            return Err(e.into());
        }
        afs::rename(&temp, self.value_path(key)).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> BackendResult<()> {
        validate_key(key)?;
        match afs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self) -> BackendResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = afs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let backend = FileBackend::open(dir.path().join("saves")).unwrap();
            backend.set("gameState_main", "{\"a\":1}").await.unwrap();
        }

        let backend = FileBackend::open(dir.path().join("saves")).unwrap();
        assert_eq!(
            backend.get("gameState_main").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
    }

    #[tokio::test]
    async fn test_missing_key_and_remove() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        assert_eq!(backend.get("absent").await.unwrap(), None);
        backend.remove("absent").await.unwrap();

        backend.set("k", "v").await.unwrap();
        backend.remove("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_keys_skips_other_files() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        backend.set("b", "2").await.unwrap();
        backend.set("a", "1").await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(backend.list_keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert!(matches!(
            backend.set("../escape", "v").await,
            Err(BackendError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_exclusive_lock() {
        let dir = TempDir::new().unwrap();
        let _first = FileBackend::open(dir.path()).unwrap();
        assert!(matches!(
            FileBackend::open(dir.path()),
            Err(BackendError::Locked)
        ));
    }
}
