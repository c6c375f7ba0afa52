pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "tauri")]
mod plugin;

#[cfg(feature = "tauri")]
pub use plugin::init;

pub use commands::gallery::GalleryPage;
pub use config::GalleryConfig;
pub use error::{AppError, ErrorKind};
pub use models::photo_types::Photo;
pub use services::photo_service::{Capabilities, PhotoService};
pub use services::platform::PlatformKind;
