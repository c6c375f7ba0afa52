use crate::error::AppError;
use crate::models::fs_types::{Directory, ReadFileResult, WriteFileResult};
use async_trait::async_trait;
use base64::Engine;
use log::{debug, error};
use std::path::{Component, Path, PathBuf};

pub(crate) const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "heic",
];

const FILE_SCHEME: &str = "file://";

/// Byte-level file access, addressed either by a path relative to a logical
/// `Directory` or by an absolute path / `file://` URI when no directory is given.
#[async_trait]
pub trait Filesystem: Send + Sync {
    async fn read_file(
        &self,
        path: &str,
        directory: Option<Directory>,
    ) -> Result<ReadFileResult, AppError>;

    /// `data` is base64, optionally wrapped in a data URL.
    async fn write_file(
        &self,
        path: &str,
        data: &str,
        directory: Directory,
    ) -> Result<WriteFileResult, AppError>;

    async fn delete_file(&self, path: &str, directory: Directory) -> Result<(), AppError>;
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Text after the last path separator of `filepath`.
///
/// On hybrid platforms `filepath` is a full native URI and deletion assumes its
/// last segment is the file name that was written, so an empty segment is an error.
pub fn file_name_from_path(filepath: &str) -> Result<&str, AppError> {
    let name = match filepath.rfind(['/', '\\']) {
        Some(idx) => &filepath[idx + 1..],
        None => filepath,
    };
    if name.is_empty() {
        return Err(AppError::precondition(format!(
            "Cannot derive a file name from '{}'",
            filepath
        )));
    }
    Ok(name)
}

/// Strip a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(data: &str) -> &str {
    if data.starts_with("data:") {
        if let Some(idx) = data.find(',') {
            return &data[idx + 1..];
        }
    }
    data
}

pub fn jpeg_data_uri(base64_data: &str) -> String {
    format!("data:image/jpeg;base64,{}", base64_data)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>, AppError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(strip_data_url(data).trim())?)
}

/// Turn a `file://` URI into a plain path. Other strings pass through.
pub fn uri_to_path(uri: &str) -> PathBuf {
    match uri.strip_prefix(FILE_SCHEME) {
        Some(rest) => PathBuf::from(strip_drive_slash(rest)),
        None => PathBuf::from(uri),
    }
}

/// `/C:/x` -> `C:/x`
fn strip_drive_slash(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':' {
        &path[1..]
    } else {
        path
    }
}

pub fn path_to_uri(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("{}{}", FILE_SCHEME, display)
    } else {
        format!("{}/{}", FILE_SCHEME, display)
    }
}

/// Filesystem backed by the local disk, with one root per logical directory.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl LocalFilesystem {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let cache_dir = data_dir.join("cache");
        Self { data_dir, cache_dir }
    }

    pub fn with_cache_dir<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = cache_dir.as_ref().to_path_buf();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn root(&self, directory: Directory) -> &Path {
        match directory {
            Directory::Data => &self.data_dir,
            Directory::Cache => &self.cache_dir,
        }
    }

    /// Resolve a relative path under a logical directory. Absolute paths and
    /// parent components are rejected so writes stay inside the root.
    fn resolve(&self, path: &str, directory: Directory) -> Result<PathBuf, AppError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(AppError::precondition(format!(
                "Path must be relative to the {:?} directory: {}",
                directory, path
            )));
        }
        Ok(self.root(directory).join(relative))
    }

    fn resolve_any(&self, path: &str, directory: Option<Directory>) -> Result<PathBuf, AppError> {
        match directory {
            Some(dir) => self.resolve(path, dir),
            None => Ok(uri_to_path(path)),
        }
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn read_file(
        &self,
        path: &str,
        directory: Option<Directory>,
    ) -> Result<ReadFileResult, AppError> {
        let full_path = self.resolve_any(path, directory)?;
        let bytes = tokio::fs::read(&full_path).await.map_err(|e| {
            error!("Failed to read {}: {}", full_path.display(), e);
            AppError::from(e)
        })?;
        debug!("Read {} byte(s) from {}", bytes.len(), full_path.display());
        Ok(ReadFileResult {
            data: encode_base64(&bytes),
        })
    }

    async fn write_file(
        &self,
        path: &str,
        data: &str,
        directory: Directory,
    ) -> Result<WriteFileResult, AppError> {
        let full_path = self.resolve(path, directory)?;
        let bytes = decode_base64(data)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, &bytes).await.map_err(|e| {
            error!("Failed to write {}: {}", full_path.display(), e);
            AppError::from(e)
        })?;
        debug!("Wrote {} byte(s) to {}", bytes.len(), full_path.display());

        Ok(WriteFileResult {
            uri: path_to_uri(&full_path),
        })
    }

    async fn delete_file(&self, path: &str, directory: Directory) -> Result<(), AppError> {
        let full_path = self.resolve(path, directory)?;
        tokio::fs::remove_file(&full_path).await.map_err(|e| {
            let mut err = AppError::from(e);
            err.message = format!("Cannot delete {}: {}", full_path.display(), err.message);
            err
        })?;
        debug!("Deleted {}", full_path.display());
        Ok(())
    }
}
