use crate::error::AppError;
use crate::models::photo_types::Photo;
use crate::services::photo_service::PhotoService;
use log::debug;
use std::sync::Arc;

/// Drives the gallery screen: loads on init, captures on demand, and exposes
/// the list to render. All gallery behaviour lives in `PhotoService`.
#[derive(Clone)]
pub struct GalleryPage {
    photo_service: Arc<PhotoService>,
}

impl GalleryPage {
    pub fn new(photo_service: Arc<PhotoService>) -> Self {
        Self { photo_service }
    }

    pub fn photo_service(&self) -> &PhotoService {
        &self.photo_service
    }

    pub async fn on_init(&self) -> Result<(), AppError> {
        debug!("Gallery page init");
        self.photo_service.load_saved().await?;
        Ok(())
    }

    pub async fn add_photo_to_gallery(&self) -> Result<Photo, AppError> {
        self.photo_service.add_new_to_gallery().await
    }

    /// Delete whatever is at `position` in the list as it is right now.
    pub async fn delete_photo_at(&self, position: usize) -> Result<(), AppError> {
        let photos = self.photo_service.photos().await;
        let photo = photos.get(position).ok_or_else(|| {
            AppError::precondition(format!(
                "Position {} is out of range for {} photo(s)",
                position,
                photos.len()
            ))
        })?;
        self.photo_service.delete_picture(photo, position).await
    }

    pub async fn photos(&self) -> Vec<Photo> {
        self.photo_service.photos().await
    }
}

#[cfg(feature = "tauri")]
#[tauri::command]
pub async fn load_saved(page: tauri::State<'_, GalleryPage>) -> Result<Vec<Photo>, AppError> {
    page.photo_service().load_saved().await
}

#[cfg(feature = "tauri")]
#[tauri::command]
pub async fn add_new_to_gallery(page: tauri::State<'_, GalleryPage>) -> Result<Photo, AppError> {
    page.add_photo_to_gallery().await
}

#[cfg(feature = "tauri")]
#[tauri::command]
pub async fn delete_picture(
    photo: Photo,
    position: usize,
    page: tauri::State<'_, GalleryPage>,
) -> Result<(), AppError> {
    page.photo_service().delete_picture(&photo, position).await
}

#[cfg(feature = "tauri")]
#[tauri::command]
pub async fn delete_by_filepath(
    filepath: String,
    page: tauri::State<'_, GalleryPage>,
) -> Result<(), AppError> {
    page.photo_service().delete_by_filepath(&filepath).await
}

#[cfg(feature = "tauri")]
#[tauri::command]
pub async fn photos(page: tauri::State<'_, GalleryPage>) -> Result<Vec<Photo>, AppError> {
    Ok(page.photos().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::capture_types::CameraPhoto;
    use crate::models::fs_types::Directory;
    use crate::services::memory::{MemoryFetcher, MemoryFilesystem, MemoryPreferences, ScriptedCamera};
    use crate::services::photo_service::Capabilities;
    use crate::services::platform::WebPlatform;

    fn page_with(
        prefs: MemoryPreferences,
        fs: Arc<MemoryFilesystem>,
        camera: Arc<ScriptedCamera>,
        fetcher: Arc<MemoryFetcher>,
    ) -> GalleryPage {
        let service = PhotoService::new(
            Capabilities {
                camera,
                filesystem: fs,
                preferences: Arc::new(prefs),
            },
            Arc::new(WebPlatform::new(fetcher)),
        );
        GalleryPage::new(Arc::new(service))
    }

    #[tokio::test]
    async fn init_loads_saved_photos() {
        let fs = Arc::new(MemoryFilesystem::new("/data"));
        fs.insert("1.jpeg", Some(Directory::Data), "Zm9v");
        let page = page_with(
            MemoryPreferences::with_value("photos", r#"[{"filepath":"1.jpeg","webviewPath":""}]"#),
            fs,
            Arc::new(ScriptedCamera::new()),
            Arc::new(MemoryFetcher::new()),
        );

        assert!(page.photos().await.is_empty());
        page.on_init().await.unwrap();

        let photos = page.photos().await;
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].webview_path, "data:image/jpeg;base64,Zm9v");
    }

    #[tokio::test]
    async fn add_then_delete_through_the_page() {
        let fs = Arc::new(MemoryFilesystem::new("/data"));
        let camera = Arc::new(ScriptedCamera::new());
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert("blob:1", b"foo");
        camera.push_photo(CameraPhoto {
            web_path: Some("blob:1".to_string()),
            format: "jpeg".to_string(),
            ..Default::default()
        });
        let page = page_with(MemoryPreferences::new(), fs.clone(), camera, fetcher);

        let photo = page.add_photo_to_gallery().await.unwrap();
        assert_eq!(page.photos().await, vec![photo.clone()]);

        page.delete_photo_at(0).await.unwrap();
        assert!(page.photos().await.is_empty());
        assert_eq!(fs.deleted()[0].0, photo.filepath);

        let err = page.delete_photo_at(0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Precondition);
    }
}
