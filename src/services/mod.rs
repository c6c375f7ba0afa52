pub mod camera;
pub mod fetch_service;
pub mod fs_service;
pub mod memory;
pub mod photo_service;
pub mod platform;
pub mod preferences;
