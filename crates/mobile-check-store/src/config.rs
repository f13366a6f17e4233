//! Store backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use mobile_check_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::file::FileStore;
use crate::store::{InMemoryStore, PayloadStore};

/// Which backend holds uploaded payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process memory.
    #[default]
    Memory,
    /// One JSON file per entry on local disk.
    File,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "file" | "fs" => Ok(Self::File),
            other => Err(Error::InvalidConfig {
                message: format!("unknown store backend '{other}' (expected 'memory' or 'file')"),
            }),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory used by the file backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl StoreConfig {
    /// Configuration for the in-memory backend.
    #[must_use]
    pub fn memory() -> Self {
        Self::default()
    }

    /// Configuration for the file backend rooted at `dir`.
    #[must_use]
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: dir.into(),
        }
    }
}

/// Opens the backend described by `config`.
///
/// # Errors
///
/// Returns an error if the file backend's directory cannot be created.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn PayloadStore>> {
    let store: Arc<dyn PayloadStore> = match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::open(&config.data_dir).await?),
    };

    tracing::info!(
        backend = store.backend_name(),
        data_dir = %config.data_dir.display(),
        "Payload store ready"
    );

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" FILE ".parse::<StoreBackend>().unwrap(), StoreBackend::File);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_backend_serde() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"backend": "file", "data_dir": "/tmp/x"}"#).unwrap();
        assert_eq!(config, StoreConfig::file("/tmp/x"));

        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StoreConfig::memory());
    }

    #[tokio::test]
    async fn test_open_store() {
        let store = open_store(&StoreConfig::memory()).await.unwrap();
        assert_eq!(store.backend_name(), "memory");

        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&StoreConfig::file(dir.path().join("entries")))
            .await
            .unwrap();
        assert_eq!(store.backend_name(), "file");
        assert!(dir.path().join("entries").is_dir());
    }
}
