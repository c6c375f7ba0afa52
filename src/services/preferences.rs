use crate::error::{AppError, ErrorKind};
use async_trait::async_trait;
use log::{debug, error, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// String key-value persistence. Values are opaque to the store.
#[async_trait]
pub trait Preferences: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Preferences kept in a single JSON object file.
///
/// Every call re-reads the file so external edits are picked up; writes go
/// through a temp file and a rename.
pub struct FilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries, or `None` when the file exists but isn't a JSON
    /// object of strings.
    async fn read_entries(&self) -> Result<Option<BTreeMap<String, String>>, AppError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Some(BTreeMap::new())),
            Err(e) => {
                error!("Failed to read preferences {}: {}", self.path.display(), e);
                return Err(AppError::new(ErrorKind::Storage, e.to_string()));
            }
        };

        if content.trim().is_empty() {
            return Ok(Some(BTreeMap::new()));
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                warn!(
                    "Preferences file {} is corrupt, treating it as empty: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, AppError> {
        Ok(self.read_entries().await?.unwrap_or_default())
    }

    /// Entries to update. A corrupt file is renamed to `<name>.corrupt` first
    /// so the next store starts clean without losing the old bytes.
    async fn load_for_update(&self) -> Result<BTreeMap<String, String>, AppError> {
        if let Some(entries) = self.read_entries().await? {
            return Ok(entries);
        }
        let aside = self.corrupt_path();
        tokio::fs::rename(&self.path, &aside).await.map_err(|e| {
            error!("Failed to move aside {}: {}", self.path.display(), e);
            AppError::new(ErrorKind::Storage, e.to_string())
        })?;
        warn!("Moved corrupt preferences to {}", aside.display());
        Ok(BTreeMap::new())
    }

    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    async fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serialized).await.map_err(|e| {
            error!("Failed to write preferences {}: {}", tmp_path.display(), e);
            AppError::new(ErrorKind::Storage, e.to_string())
        })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AppError::new(ErrorKind::Storage, e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Preferences for FilePreferences {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.load().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_for_update().await?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries).await?;
        debug!("Stored {} byte(s) under '{}'", value.len(), key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_for_update().await?;
        if entries.remove(key).is_some() {
            self.store(&entries).await?;
        }
        Ok(())
    }
}
