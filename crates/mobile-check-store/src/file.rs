//! File-backed payload store: one JSON document per identifier.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mobile_check_core::{EntryId, Result, StoredEntry};

use crate::store::PayloadStore;

const ENTRY_EXTENSION: &str = "json";

/// Payload store keeping each entry in `<dir>/<id>.json`.
///
/// There is no file locking. Identifiers are random, so writers never
/// collide; readers racing a `take` on the same entry may see it vanish,
/// which is reported as not found.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "File store opened");
        Ok(Self { dir })
    }

    /// Returns the directory entries are kept in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, id: &EntryId) -> PathBuf {
        self.dir.join(format!("{id}.{ENTRY_EXTENSION}"))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<StoredEntry>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes under a temporary name so readers never observe a partial file.
    async fn write_entry(&self, entry: &StoredEntry) -> Result<()> {
        let bytes = serde_json::to_vec(entry)?;
        let tmp = self.dir.join(format!(".{}.tmp", entry.id));

        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, self.entry_path(&entry.id)).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp file");
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove_entry(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PayloadStore for FileStore {
    async fn put(&self, payload: serde_json::Value) -> Result<EntryId> {
        let mut id = EntryId::new();
        while tokio::fs::try_exists(self.entry_path(&id)).await? {
            id = EntryId::new();
        }

        self.write_entry(&StoredEntry::new(id, payload)).await?;
        Ok(id)
    }

    async fn get(&self, id: &EntryId) -> Result<Option<StoredEntry>> {
        self.read_entry(&self.entry_path(id)).await
    }

    async fn take(&self, id: &EntryId) -> Result<Option<StoredEntry>> {
        let path = self.entry_path(id);
        let Some(entry) = self.read_entry(&path).await? else {
            return Ok(None);
        };

        // Whoever removes the file owns the entry.
        if self.remove_entry(&path).await? {
            Ok(Some(entry))
        } else {
            Ok(None)
        }
    }

    async fn delete(&self, id: &EntryId) -> Result<bool> {
        self.remove_entry(&self.entry_path(id)).await
    }

    async fn count(&self) -> Result<usize> {
        let mut count = 0;
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let is_entry = path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(EntryId::parse)
                    .is_some();
            if is_entry {
                count += 1;
            }
        }
        Ok(count)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use mobile_check_core::Error;
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::store::tests::exercise_store;

    #[tokio::test]
    async fn test_file_store_contract() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        exercise_store(&store).await;
        assert_eq!(store.backend_name(), "file");
    }

    #[tokio::test]
    async fn test_file_store_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let payload = json!([[0, "Door", 1, "Interior", "East"]]);

        let id = {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.put(payload.clone()).await.unwrap()
        };

        let store = FileStore::open(dir.path()).await.unwrap();
        let entry = store.get(&id).await.unwrap().unwrap();
        assert_eq!(entry.payload, payload);
        assert!(dir.path().join(format!("{id}.json")).is_file());
    }

    #[tokio::test]
    async fn test_file_store_malformed_entry() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let id = EntryId::new();
        std::fs::write(dir.path().join(format!("{id}.json")), b"{not json").unwrap();

        let err = store.get(&id).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_file_store_failed_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let entry = StoredEntry::new(EntryId::new(), json!({"a": 1}));

        // A non-empty directory in the entry's place makes the rename fail.
        let blocker = dir.path().join(format!("{}.json", entry.id));
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        assert!(store.write_entry(&entry).await.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|item| item.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[tokio::test]
    async fn test_file_store_count_ignores_strays() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.put(json!(1)).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("readme.json"), b"{}").unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }
}
