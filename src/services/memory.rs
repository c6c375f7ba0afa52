//! In-memory capability providers, for tests and for embedding the gallery
//! without touching the disk.

use crate::error::AppError;
use crate::models::capture_types::{CameraPhoto, CaptureOptions};
use crate::models::fs_types::{Directory, ReadFileResult, WriteFileResult};
use crate::services::camera::Camera;
use crate::services::fetch_service::WebFetcher;
use crate::services::fs_service::{decode_base64, strip_data_url, Filesystem};
use crate::services::preferences::Preferences;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type FileKey = (Option<Directory>, String);

/// Files keyed by (directory, path). Writes report `<uri_root>/<path>` as the URI.
#[derive(Default)]
pub struct MemoryFilesystem {
    uri_root: String,
    files: Mutex<HashMap<FileKey, String>>,
    deleted: Mutex<Vec<(String, Directory)>>,
    fail_writes: Mutex<bool>,
}

impl MemoryFilesystem {
    pub fn new(uri_root: impl Into<String>) -> Self {
        Self {
            uri_root: uri_root.into(),
            ..Default::default()
        }
    }

    /// Seed a file with base64 `data`.
    pub fn insert(&self, path: &str, directory: Option<Directory>, data: &str) {
        lock(&self.files).insert((directory, path.to_string()), data.to_string());
    }

    pub fn contains(&self, path: &str, directory: Option<Directory>) -> bool {
        lock(&self.files).contains_key(&(directory, path.to_string()))
    }

    pub fn file_count(&self) -> usize {
        lock(&self.files).len()
    }

    /// Every delete request seen so far, in order.
    pub fn deleted(&self) -> Vec<(String, Directory)> {
        lock(&self.deleted).clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn read_file(
        &self,
        path: &str,
        directory: Option<Directory>,
    ) -> Result<ReadFileResult, AppError> {
        lock(&self.files)
            .get(&(directory, path.to_string()))
            .map(|data| ReadFileResult { data: data.clone() })
            .ok_or_else(|| AppError::not_found(format!("File does not exist: {}", path)))
    }

    async fn write_file(
        &self,
        path: &str,
        data: &str,
        directory: Directory,
    ) -> Result<WriteFileResult, AppError> {
        if *lock(&self.fail_writes) {
            return Err(AppError::new(
                crate::error::ErrorKind::Io,
                format!("Write rejected: {}", path),
            ));
        }
        // validate like a real backend would
        decode_base64(data)?;
        lock(&self.files).insert(
            (Some(directory), path.to_string()),
            strip_data_url(data).to_string(),
        );
        Ok(WriteFileResult {
            uri: format!("{}/{}", self.uri_root, path),
        })
    }

    async fn delete_file(&self, path: &str, directory: Directory) -> Result<(), AppError> {
        lock(&self.deleted).push((path.to_string(), directory));
        lock(&self.files)
            .remove(&(Some(directory), path.to_string()))
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("File does not exist: {}", path)))
    }
}

#[derive(Default)]
pub struct MemoryPreferences {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let prefs = Self::default();
        lock(&prefs.entries).insert(key.to_string(), value.to_string());
        prefs
    }

    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }
}

#[async_trait]
impl Preferences for MemoryPreferences {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Replays queued results; an empty queue behaves like the user cancelling.
#[derive(Default)]
pub struct ScriptedCamera {
    results: Mutex<VecDeque<Result<CameraPhoto, AppError>>>,
    requests: Mutex<Vec<CaptureOptions>>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_photo(&self, photo: CameraPhoto) {
        lock(&self.results).push_back(Ok(photo));
    }

    pub fn push_error(&self, err: AppError) {
        lock(&self.results).push_back(Err(err));
    }

    /// Options of every capture request seen so far.
    pub fn requests(&self) -> Vec<CaptureOptions> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Camera for ScriptedCamera {
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CameraPhoto, AppError> {
        lock(&self.requests).push(options.clone());
        lock(&self.results)
            .pop_front()
            .unwrap_or_else(|| Err(AppError::cancelled("User cancelled photos app")))
    }
}

/// Serves fixed bytes per web path.
#[derive(Default)]
pub struct MemoryFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, web_path: &str, body: &[u8]) {
        lock(&self.bodies).insert(web_path.to_string(), body.to_vec());
    }
}

#[async_trait]
impl WebFetcher for MemoryFetcher {
    async fn fetch(&self, web_path: &str) -> Result<Vec<u8>, AppError> {
        lock(&self.bodies).get(web_path).cloned().ok_or_else(|| {
            AppError::new(
                crate::error::ErrorKind::Fetch,
                format!("Failed to fetch {}: HTTP 404", web_path),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn same_path_in_different_directories_are_separate_files() {
        let fs = MemoryFilesystem::new("/mem");
        fs.write_file("a.jpeg", "Zm9v", Directory::Data).await.unwrap();
        fs.write_file("a.jpeg", "YmFy", Directory::Cache).await.unwrap();
        fs.insert("a.jpeg", None, "YmF6");
        assert_eq!(fs.file_count(), 3);

        let data = fs.read_file("a.jpeg", Some(Directory::Data)).await.unwrap();
        assert_eq!(data.data, "Zm9v");

        fs.delete_file("a.jpeg", Directory::Cache).await.unwrap();
        assert!(!fs.contains("a.jpeg", Some(Directory::Cache)));
        assert!(fs.contains("a.jpeg", Some(Directory::Data)));
        assert!(fs.contains("a.jpeg", None));

        let err = fs.delete_file("a.jpeg", Directory::Cache).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
