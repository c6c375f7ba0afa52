use crate::commands;
use crate::commands::gallery::GalleryPage;
use crate::config::GalleryConfig;
use crate::services::camera::DialogCamera;
use crate::services::fetch_service::HttpFetcher;
use crate::services::fs_service::LocalFilesystem;
use crate::services::photo_service::{Capabilities, PhotoService};
use crate::services::preferences::FilePreferences;
use log::info;
use std::sync::Arc;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Manager, Runtime};

/// The gallery as a Tauri plugin. Configured from `plugins.gallery` in
/// `tauri.conf.json`; every field is optional.
pub fn init<R: Runtime>() -> TauriPlugin<R, Option<GalleryConfig>> {
    Builder::<R, Option<GalleryConfig>>::new("gallery")
        .invoke_handler(tauri::generate_handler![
            commands::gallery::load_saved,
            commands::gallery::add_new_to_gallery,
            commands::gallery::delete_picture,
            commands::gallery::delete_by_filepath,
            commands::gallery::photos,
        ])
        .setup(|app, api| {
            let config = api.config().clone().unwrap_or_default();
            config.validate()?;

            let app_data_dir = app.path().app_data_dir()?;
            let data_dir = config.resolve_data_dir(&app_data_dir);
            if !data_dir.exists() {
                std::fs::create_dir_all(&data_dir)?;
            }

            let capabilities = Capabilities {
                camera: Arc::new(DialogCamera::new(app.clone())),
                filesystem: Arc::new(LocalFilesystem::new(data_dir.join("photos"))),
                preferences: Arc::new(FilePreferences::new(config.preferences_path(&data_dir))),
            };
            let service = PhotoService::from_config(
                &config,
                capabilities,
                Arc::new(config.asset_protocol.converter()),
                Arc::new(HttpFetcher::new()),
            );

            info!(
                "Gallery ready at {} ({:?} platform)",
                data_dir.display(),
                config.platform
            );
            app.manage(GalleryPage::new(Arc::new(service)));
            Ok(())
        })
        .build()
}
