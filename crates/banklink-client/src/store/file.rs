use std::path::{Path, PathBuf};

use async_trait::async_trait;
use banklink_core::{BankLinkError, KeyValueStore};
use tokio::fs;
use tracing::{debug, instrument};

/// Local filesystem key/value store.
///
/// One file per key, so a damaged value never affects the others:
/// ```text
/// {base_dir}/
///   accessToken
///   accounts
///   transactions
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore with the given base directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path holding a key's value.
    fn value_path(&self, key: &str) -> Result<PathBuf, BankLinkError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(BankLinkError::Store(format!("Invalid key '{}'", key)));
        }
        Ok(self.base_dir.join(key))
    }

    async fn ensure_base_dir(&self) -> Result<(), BankLinkError> {
        fs::create_dir_all(&self.base_dir).await.map_err(|e| {
            BankLinkError::Store(format!(
                "Failed to create store dir {}: {}",
                self.base_dir.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<String>, BankLinkError> {
        let path = self.value_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => {
                let value = String::from_utf8(bytes).map_err(|e| {
                    BankLinkError::StoreCorruption {
                        field: key.to_string(),
                        reason: format!("not valid UTF-8: {}", e),
                    }
                })?;
                debug!("Loaded {} ({} bytes)", key, value.len());
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BankLinkError::Store(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn put(&self, key: &str, value: &str) -> Result<(), BankLinkError> {
        let path = self.value_path(key)?;
        self.ensure_base_dir().await?;

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value).await.map_err(|e| {
            BankLinkError::Store(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        fs::rename(&temp_path, &path).await.map_err(|e| {
            BankLinkError::Store(format!("Failed to rename to {}: {}", path.display(), e))
        })?;

        debug!("Saved {} ({} bytes)", key, value.len());
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<bool, BankLinkError> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {}", key);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BankLinkError::Store(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
