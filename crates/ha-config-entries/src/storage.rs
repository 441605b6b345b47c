//! Versioned JSON persistence under the `.storage/` directory

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported version for {key}: expected {expected}, found {found}")]
    VersionMismatch {
        key: String,
        expected: u32,
        found: u32,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage file wrapper with version tracking
///
/// ```json
/// { "version": 1, "minor_version": 1, "key": "core.config_entries", "data": { ... } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFile<T> {
    pub version: u32,
    pub minor_version: u32,
    pub key: String,
    pub data: T,
}

/// Handle on a config directory's `.storage/` folder
#[derive(Debug, Clone)]
pub struct Storage {
    storage_dir: PathBuf,
}

impl Storage {
    /// Create a storage handle for `config_dir/.storage`
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: config_dir.as_ref().join(".storage"),
        }
    }

    /// Get the file path for a storage key
    pub fn file_path(&self, key: &str) -> PathBuf {
        self.storage_dir.join(key)
    }

    /// Load a storage file, returning `None` when it does not exist yet
    ///
    /// Files written by a newer major version are rejected.
    pub async fn load<T>(&self, key: &str, version: u32) -> StorageResult<Option<StorageFile<T>>>
    where
        T: DeserializeOwned,
    {
        let path = self.file_path(key);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Storage file not found: {}", key);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let file: StorageFile<T> = serde_json::from_str(&content)?;
        if file.version > version {
            return Err(StorageError::VersionMismatch {
                key: key.to_string(),
                expected: version,
                found: file.version,
            });
        }

        debug!(
            "Loaded storage file: {} (v{}.{})",
            key, file.version, file.minor_version
        );
        Ok(Some(file))
    }

    /// Save a storage file
    ///
    /// Writes to `<key>.tmp` and renames over the target.
    pub async fn save<T>(&self, file: &StorageFile<T>) -> StorageResult<()>
    where
        T: Serialize,
    {
        fs::create_dir_all(&self.storage_dir).await?;

        let path = self.file_path(&file.key);
        let temp_path = self.file_path(&format!("{}.tmp", file.key));

        let content = serde_json::to_string_pretty(file)?;
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(
            "Saved storage file: {} (v{}.{})",
            file.key, file.version, file.minor_version
        );
        Ok(())
    }
}
