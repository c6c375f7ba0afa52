use crate::error::{AppError, ErrorKind};
use crate::models::capture_types::CaptureOptions;
use crate::services::platform::{AssetUriConverter, PlatformKind};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORAGE_KEY: &str = "photos";
const DEFAULT_PREFERENCES_FILE: &str = "preferences.json";

/// Gallery settings. Every field has a default, so an empty JSON object (or
/// no `plugins.gallery` block in `tauri.conf.json`) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryConfig {
    /// Preferences key the serialized photo list lives under.
    pub storage_key: String,
    pub platform: PlatformKind,
    /// Root for photo files and preferences. The host's app data directory
    /// is used when unset.
    pub data_dir: Option<PathBuf>,
    pub preferences_file: String,
    pub capture: CaptureOptions,
    pub asset_protocol: AssetProtocol,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetProtocol {
    pub scheme: String,
    pub host: String,
}

impl Default for AssetProtocol {
    #[cfg(windows)]
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "asset.localhost".to_string(),
        }
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        Self {
            scheme: "asset".to_string(),
            host: "localhost".to_string(),
        }
    }
}

impl AssetProtocol {
    pub fn converter(&self) -> AssetUriConverter {
        AssetUriConverter::new(self.scheme.clone(), self.host.clone())
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            platform: PlatformKind::Hybrid,
            data_dir: None,
            preferences_file: DEFAULT_PREFERENCES_FILE.to_string(),
            capture: CaptureOptions::default(),
            asset_protocol: AssetProtocol::default(),
        }
    }
}

impl GalleryConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            AppError::new(ErrorKind::Config, format!("Invalid gallery config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorKind::Config,
                format!("Cannot read gallery config {}: {}", path.display(), e),
            )
        })?;
        info!("Loaded gallery config from {}", path.display());
        Self::from_json_str(&content)
    }

    /// Defaults overridden by `GALLERY_DATA_DIR`, `GALLERY_PLATFORM`,
    /// `GALLERY_STORAGE_KEY` and `GALLERY_CAPTURE_QUALITY`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("GALLERY_DATA_DIR") {
            info!("Using gallery data dir from GALLERY_DATA_DIR: {}", dir);
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(platform) = lookup("GALLERY_PLATFORM") {
            self.platform = platform.parse()?;
        }
        if let Some(key) = lookup("GALLERY_STORAGE_KEY") {
            self.storage_key = key;
        }
        if let Some(quality) = lookup("GALLERY_CAPTURE_QUALITY") {
            self.capture.quality = quality.trim().parse().map_err(|_| {
                AppError::new(
                    ErrorKind::Config,
                    format!("GALLERY_CAPTURE_QUALITY must be 0-100, got '{}'", quality),
                )
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.storage_key.trim().is_empty() {
            return Err(AppError::new(ErrorKind::Config, "storageKey must not be empty"));
        }
        if self.capture.quality > 100 {
            return Err(AppError::new(
                ErrorKind::Config,
                format!("capture.quality must be 0-100, got {}", self.capture.quality),
            ));
        }
        if self.preferences_file.trim().is_empty() {
            return Err(AppError::new(
                ErrorKind::Config,
                "preferencesFile must not be empty",
            ));
        }
        Ok(())
    }

    /// `data_dir`, or `fallback` when unset.
    pub fn resolve_data_dir(&self, fallback: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    pub fn preferences_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.preferences_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture_types::CameraResultType;
    use std::collections::HashMap;

    #[test]
    fn empty_object_is_all_defaults() {
        let config = GalleryConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GalleryConfig::default());
        assert_eq!(config.storage_key, "photos");
        assert_eq!(config.capture.result_type, CameraResultType::Uri);
        assert_eq!(config.capture.quality, 100);
    }

    #[test]
    fn json_overrides_nested_fields() {
        let config = GalleryConfig::from_json_str(
            r#"{"platform":"web","storageKey":"gallery","capture":{"quality":80}}"#,
        )
        .unwrap();
        assert_eq!(config.platform, PlatformKind::Web);
        assert_eq!(config.storage_key, "gallery");
        assert_eq!(config.capture.quality, 80);
        assert_eq!(config.capture.result_type, CameraResultType::Uri);
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let err = GalleryConfig::from_json_str(r#"{"capture":{"quality":120}}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("GALLERY_DATA_DIR", "/tmp/gallery"),
            ("GALLERY_PLATFORM", "web"),
            ("GALLERY_CAPTURE_QUALITY", "90"),
        ]
        .into_iter()
        .collect();

        let config = GalleryConfig::default()
            .with_env_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/gallery")));
        assert_eq!(config.platform, PlatformKind::Web);
        assert_eq!(config.capture.quality, 90);
        assert_eq!(config.storage_key, "photos");
    }

    #[test]
    fn bad_env_platform_is_a_config_error() {
        let err = GalleryConfig::default()
            .with_env_overrides(|name| (name == "GALLERY_PLATFORM").then(|| "ios".to_string()))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }
}
