use crate::error::{AppError, ErrorKind};
use crate::models::capture_types::{CameraPhoto, CameraResultType, CaptureOptions};
use crate::services::fs_service::{encode_base64, is_image_file, path_to_uri};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader};
use log::debug;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Interactive photo capture. Implementations return `ErrorKind::Cancelled`
/// when the user backs out.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CameraPhoto, AppError>;
}

/// Treats an image already on disk as the captured photo.
#[derive(Debug, Clone)]
pub struct FileCamera {
    source: PathBuf,
}

impl FileCamera {
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CameraPhoto, AppError> {
        if !is_image_file(&self.source) {
            return Err(AppError::new(
                ErrorKind::Io,
                format!("Not an image file: {}", self.source.display()),
            ));
        }
        if !tokio::fs::try_exists(&self.source).await.unwrap_or(false) {
            return Err(AppError::not_found(format!(
                "Image does not exist: {}",
                self.source.display()
            )));
        }

        let format = image_format_name(&self.source);
        debug!(
            "Capturing {} as {:?} ({:?}, quality {})",
            self.source.display(),
            options.result_type,
            options.source,
            options.quality
        );

        let mut photo = CameraPhoto {
            path: Some(path_to_uri(&self.source)),
            web_path: Some(self.source.to_string_lossy().to_string()),
            base64_string: None,
            format,
        };

        if options.result_type == CameraResultType::Uri {
            return Ok(photo);
        }

        let source = self.source.clone();
        let quality = options.quality.min(100);
        let bytes = tokio::task::spawn_blocking(move || read_with_quality(&source, quality))
            .await
            .map_err(|e| AppError::new(ErrorKind::Other, format!("Capture task failed: {}", e)))??;

        if quality < 100 {
            photo.format = "jpeg".to_string();
        }
        let encoded = encode_base64(&bytes);
        photo.base64_string = Some(match options.result_type {
            CameraResultType::DataUrl => format!("data:image/{};base64,{}", photo.format, encoded),
            _ => encoded,
        });
        Ok(photo)
    }
}

fn image_format_name(path: &Path) -> String {
    ImageFormat::from_path(path)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .map(|ext| if ext == "jpg" { "jpeg" } else { ext })
        .unwrap_or("jpeg")
        .to_string()
}

/// Raw bytes at full quality, otherwise a JPEG re-encode at `quality`.
fn read_with_quality(path: &Path, quality: u8) -> Result<Vec<u8>, AppError> {
    if quality >= 100 {
        return Ok(std::fs::read(path)?);
    }

    let img = ImageReader::open(path)
        .map_err(|e| AppError {
            kind: ErrorKind::Io,
            message: format!("Failed to open image {}: {}", path.display(), e),
        })?
        .with_guessed_format()?
        .decode()?;
    // jpeg has no alpha channel
    let img = image::DynamicImage::ImageRgb8(img.into_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.max(1));
    img.write_with_encoder(encoder).map_err(|e| AppError {
        kind: ErrorKind::Io,
        message: format!("Failed to encode capture: {}", e),
    })?;
    Ok(buffer.into_inner())
}

#[cfg(feature = "tauri")]
pub use dialog::DialogCamera;

#[cfg(feature = "tauri")]
mod dialog {
    use super::*;
    use crate::services::fs_service::IMAGE_EXTENSIONS;
    use tauri::{AppHandle, Runtime};
    use tauri_plugin_dialog::DialogExt;

    /// Lets the user pick an image through the native file dialog.
    pub struct DialogCamera<R: Runtime> {
        app: AppHandle<R>,
    }

    impl<R: Runtime> DialogCamera<R> {
        pub fn new(app: AppHandle<R>) -> Self {
            Self { app }
        }
    }

    #[async_trait]
    impl<R: Runtime> Camera for DialogCamera<R> {
        async fn get_photo(&self, options: &CaptureOptions) -> Result<CameraPhoto, AppError> {
            let app = self.app.clone();
            let picked = tokio::task::spawn_blocking(move || {
                app.dialog()
                    .file()
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .blocking_pick_file()
            })
            .await
            .map_err(|e| AppError::new(ErrorKind::Other, format!("Picker task failed: {}", e)))?;

            let picked = picked.ok_or_else(|| AppError::cancelled("User cancelled photos app"))?;
            let path = picked
                .into_path()
                .map_err(|e| AppError::new(ErrorKind::Io, e.to_string()))?;

            FileCamera::new(path).get_photo(options).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture_types::CameraSource;
    use crate::services::fs_service::decode_base64;
    use tempfile::TempDir;

    fn write_test_png(dir: &Path) -> PathBuf {
        let path = dir.join("shot.png");
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 40, 40]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn uri_result_points_at_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write_test_png(dir.path());

        let photo = FileCamera::new(&path)
            .get_photo(&CaptureOptions::default())
            .await
            .unwrap();

        assert_eq!(photo.path.as_deref(), Some(path_to_uri(&path).as_str()));
        assert_eq!(photo.web_path.as_deref(), Some(path.to_str().unwrap()));
        assert_eq!(photo.base64_string, None);
        assert_eq!(photo.format, "png");
    }

    #[tokio::test]
    async fn reduced_quality_reencodes_as_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = write_test_png(dir.path());
        let options = CaptureOptions {
            result_type: CameraResultType::Base64,
            source: CameraSource::Photos,
            quality: 50,
        };

        let photo = FileCamera::new(&path).get_photo(&options).await.unwrap();

        let bytes = decode_base64(photo.base64_string.as_deref().unwrap()).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(photo.format, "jpeg");
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let err = FileCamera::new(&path)
            .get_photo(&CaptureOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
    }
}
