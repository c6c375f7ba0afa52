use crate::config::{GalleryConfig, DEFAULT_STORAGE_KEY};
use crate::error::AppError;
use crate::models::capture_types::{CameraPhoto, CaptureOptions};
use crate::models::fs_types::Directory;
use crate::models::photo_types::Photo;
use crate::services::camera::Camera;
use crate::services::fetch_service::WebFetcher;
use crate::services::fs_service::{file_name_from_path, Filesystem};
use crate::services::platform::{select_strategy, PlatformKind, PlatformStrategy, UriConverter};
use crate::services::preferences::Preferences;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const PHOTO_EXTENSION: &str = "jpeg";

/// The host capabilities a gallery runs on.
#[derive(Clone)]
pub struct Capabilities {
    pub camera: Arc<dyn Camera>,
    pub filesystem: Arc<dyn Filesystem>,
    pub preferences: Arc<dyn Preferences>,
}

struct GalleryState {
    photos: Vec<Photo>,
    last_stamp: u128,
}

/// Owns the ordered photo list (newest first) and keeps it in sync with the
/// preferences store and the photo files.
///
/// Mutations hold `ops` from start to finish, so they never interleave.
/// `state` is only locked briefly, so readers never wait on the camera.
/// There is no transaction across the file and preferences writes: a failure
/// between them leaves the two out of step.
pub struct PhotoService {
    storage_key: String,
    capture_options: CaptureOptions,
    capabilities: Capabilities,
    platform: Arc<dyn PlatformStrategy>,
    ops: Mutex<()>,
    state: RwLock<GalleryState>,
}

impl PhotoService {
    pub fn new(capabilities: Capabilities, platform: Arc<dyn PlatformStrategy>) -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            capture_options: CaptureOptions::default(),
            capabilities,
            platform,
            ops: Mutex::new(()),
            state: RwLock::new(GalleryState {
                photos: Vec::new(),
                last_stamp: 0,
            }),
        }
    }

    pub fn from_config(
        config: &GalleryConfig,
        capabilities: Capabilities,
        converter: Arc<dyn UriConverter>,
        fetcher: Arc<dyn WebFetcher>,
    ) -> Self {
        let platform = select_strategy(config.platform, converter, fetcher);
        Self::new(capabilities, platform)
            .with_storage_key(config.storage_key.clone())
            .with_capture_options(config.capture.clone())
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_capture_options(mut self, options: CaptureOptions) -> Self {
        self.capture_options = options;
        self
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform.kind()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Snapshot of the current list, newest first.
    pub async fn photos(&self) -> Vec<Photo> {
        self.state.read().await.photos.clone()
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// A missing or unreadable stored value yields an empty gallery. On the
    /// web every record's `webview_path` is rebuilt from its file; if any file
    /// can't be read the previous list is kept and the error returned.
    pub async fn load_saved(&self) -> Result<Vec<Photo>, AppError> {
        let _op = self.ops.lock().await;

        let raw = self.capabilities.preferences.get(&self.storage_key).await?;
        let mut photos = parse_saved(raw.as_deref());

        for photo in photos.iter_mut() {
            self.platform
                .refresh(self.capabilities.filesystem.as_ref(), photo)
                .await?;
        }

        info!(
            "Loaded {} saved photo(s) from '{}'",
            photos.len(),
            self.storage_key
        );
        self.state.write().await.photos = photos.clone();
        Ok(photos)
    }

    /// Capture a photo, store it as a new file, and put it at the front of
    /// the gallery. Camera cancellation and I/O errors propagate untouched.
    pub async fn add_new_to_gallery(&self) -> Result<Photo, AppError> {
        let _op = self.ops.lock().await;

        let capture = self
            .capabilities
            .camera
            .get_photo(&self.capture_options)
            .await?;

        let stamp = next_stamp(self.state.read().await.last_stamp);
        let photo = self.save_picture(&capture, stamp).await?;

        let photos = {
            let mut state = self.state.write().await;
            state.last_stamp = stamp;
            state.photos.insert(0, photo.clone());
            state.photos.clone()
        };
        self.persist(&photos).await?;

        info!("Added {} to the gallery", photo.filepath);
        Ok(photo)
    }

    /// Remove the entry at `position` and delete its file.
    ///
    /// `photo` must be the entry currently at `position`; a stale position is
    /// rejected rather than removing some other entry.
    pub async fn delete_picture(&self, photo: &Photo, position: usize) -> Result<(), AppError> {
        let _op = self.ops.lock().await;
        self.delete_locked(photo, position).await
    }

    /// Remove an entry by its `filepath`, regardless of where it currently sits.
    pub async fn delete_by_filepath(&self, filepath: &str) -> Result<(), AppError> {
        let _op = self.ops.lock().await;
        let (photo, position) = {
            let state = self.state.read().await;
            let position = state
                .photos
                .iter()
                .position(|p| p.filepath == filepath)
                .ok_or_else(|| {
                    AppError::not_found(format!("No photo with filepath {}", filepath))
                })?;
            (state.photos[position].clone(), position)
        };
        self.delete_locked(&photo, position).await
    }

    /// Caller holds `ops`.
    async fn delete_locked(&self, photo: &Photo, position: usize) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let photos = &mut state.photos;
        match photos.get(position) {
            None => {
                return Err(AppError::precondition(format!(
                    "Position {} is out of range for {} photo(s)",
                    position,
                    photos.len()
                )))
            }
            Some(current) if current.filepath != photo.filepath => {
                return Err(AppError::precondition(format!(
                    "Photo at position {} is {}, not {}",
                    position, current.filepath, photo.filepath
                )))
            }
            Some(_) => {}
        }
        let file_name = file_name_from_path(&photo.filepath)?.to_string();

        photos.remove(position);
        let remaining = photos.clone();
        drop(state);
        self.persist(&remaining).await?;

        self.capabilities
            .filesystem
            .delete_file(&file_name, Directory::Data)
            .await?;

        info!("Deleted {} (position {})", photo.filepath, position);
        Ok(())
    }

    async fn save_picture(&self, capture: &CameraPhoto, stamp: u128) -> Result<Photo, AppError> {
        let fs = self.capabilities.filesystem.as_ref();
        let data = self.platform.read_capture(fs, capture).await?;

        let file_name = format!("{}.{}", stamp, PHOTO_EXTENSION);
        let saved = fs.write_file(&file_name, &data, Directory::Data).await?;
        debug!("Saved capture as {} ({})", file_name, saved.uri);

        self.platform.build_record(&file_name, &saved, capture)
    }

    async fn persist(&self, photos: &[Photo]) -> Result<(), AppError> {
        let value = serde_json::to_string(photos)?;
        self.capabilities
            .preferences
            .set(&self.storage_key, &value)
            .await
    }
}

/// Lenient parse of the stored list: absent, `null`, non-array and malformed
/// values all mean "no saved photos".
fn parse_saved(raw: Option<&str>) -> Vec<Photo> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Option<Vec<Photo>>>(raw) {
        Ok(photos) => photos.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring malformed saved photo list: {}", e);
            Vec::new()
        }
    }
}

/// Millisecond timestamp for the next file name, bumped past `last` so two
/// captures in the same millisecond don't share a file.
fn next_stamp(last: u128) -> u128 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    now.max(last + 1)
}
