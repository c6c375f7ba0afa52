use photo_gallery_lib::config::GalleryConfig;
use photo_gallery_lib::services::camera::{Camera, FileCamera};
use photo_gallery_lib::services::fetch_service::HttpFetcher;
use photo_gallery_lib::services::fs_service::LocalFilesystem;
use photo_gallery_lib::services::platform::AssetUriConverter;
use photo_gallery_lib::services::preferences::{FilePreferences, Preferences};
use photo_gallery_lib::{Capabilities, ErrorKind, GalleryPage, PhotoService, PlatformKind};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_jpeg(path: &Path) {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 120, 200]));
    img.save(path).unwrap();
}

fn build_page(root: &Path, camera: Arc<dyn Camera>, platform: PlatformKind) -> GalleryPage {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = GalleryConfig {
        platform,
        data_dir: Some(root.to_path_buf()),
        ..GalleryConfig::default()
    };
    let data_dir = config.resolve_data_dir(root);
    let capabilities = Capabilities {
        camera,
        filesystem: Arc::new(LocalFilesystem::new(data_dir.join("photos"))),
        preferences: Arc::new(FilePreferences::new(config.preferences_path(&data_dir))),
    };
    let service = PhotoService::from_config(
        &config,
        capabilities,
        Arc::new(AssetUriConverter::new("asset", "localhost")),
        Arc::new(HttpFetcher::new()),
    );
    GalleryPage::new(Arc::new(service))
}

#[tokio::test]
async fn hybrid_gallery_survives_a_restart() {
    let root = TempDir::new().unwrap();
    let shots = TempDir::new().unwrap();
    let shot = shots.path().join("capture.jpeg");
    write_jpeg(&shot);

    let page = build_page(root.path(), Arc::new(FileCamera::new(&shot)), PlatformKind::Hybrid);
    page.on_init().await.unwrap();
    let first = page.add_photo_to_gallery().await.unwrap();
    let second = page.add_photo_to_gallery().await.unwrap();

    assert!(first.filepath.starts_with("file://"));
    assert!(first.webview_path.starts_with("asset://localhost/"));
    assert_ne!(first.filepath, second.filepath);

    // a fresh page over the same directory sees the same list, newest first
    let reopened = build_page(root.path(), Arc::new(FileCamera::new(&shot)), PlatformKind::Hybrid);
    reopened.on_init().await.unwrap();
    let photos = reopened.photos().await;
    assert_eq!(photos, vec![second.clone(), first.clone()]);

    let stored_file = root
        .path()
        .join("photos")
        .join(first.filepath.rsplit('/').next().unwrap());
    assert!(stored_file.exists());
    assert_eq!(std::fs::read(&stored_file).unwrap(), std::fs::read(&shot).unwrap());

    reopened.delete_photo_at(1).await.unwrap();
    assert!(!stored_file.exists());
    assert_eq!(reopened.photos().await, vec![second]);
}

#[tokio::test]
async fn web_gallery_reloads_as_data_uris() {
    let root = TempDir::new().unwrap();
    let shots = TempDir::new().unwrap();
    let shot = shots.path().join("capture.jpeg");
    write_jpeg(&shot);

    let page = build_page(root.path(), Arc::new(FileCamera::new(&shot)), PlatformKind::Web);
    let added = page.add_photo_to_gallery().await.unwrap();

    assert!(added.filepath.ends_with(".jpeg"));
    assert!(!added.filepath.contains('/'));
    assert_eq!(added.webview_path, shot.to_string_lossy());

    let reopened = build_page(root.path(), Arc::new(FileCamera::new(&shot)), PlatformKind::Web);
    reopened.on_init().await.unwrap();
    let photos = reopened.photos().await;
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].filepath, added.filepath);
    assert!(photos[0].webview_path.starts_with("data:image/jpeg;base64,/9j/"));
}

#[tokio::test]
async fn corrupt_photo_list_starts_empty() {
    let root = TempDir::new().unwrap();
    let prefs = FilePreferences::new(root.path().join("preferences.json"));
    prefs.set("photos", "[{\"filepath\":").await.unwrap();

    let page = build_page(
        root.path(),
        Arc::new(FileCamera::new(root.path().join("missing.jpeg"))),
        PlatformKind::Hybrid,
    );
    page.on_init().await.unwrap();
    assert!(page.photos().await.is_empty());

    let err = page.add_photo_to_gallery().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(page.photos().await.is_empty());
}

#[tokio::test]
async fn corrupt_preferences_file_does_not_block_the_gallery() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("preferences.json"), "{\"photos\": [trunc").unwrap();
    let shots = TempDir::new().unwrap();
    let shot = shots.path().join("capture.jpeg");
    write_jpeg(&shot);

    let page = build_page(root.path(), Arc::new(FileCamera::new(&shot)), PlatformKind::Hybrid);
    page.on_init().await.unwrap();
    assert!(page.photos().await.is_empty());

    let added = page.add_photo_to_gallery().await.unwrap();

    let reopened = build_page(root.path(), Arc::new(FileCamera::new(&shot)), PlatformKind::Hybrid);
    reopened.on_init().await.unwrap();
    assert_eq!(reopened.photos().await, vec![added]);
    assert!(root.path().join("preferences.json.corrupt").exists());
}
