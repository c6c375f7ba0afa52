pub mod capture_types;
pub mod fs_types;
pub mod photo_types;
