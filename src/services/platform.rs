//! Platform-specific halves of the gallery.
//!
//! A gallery runs either inside a native container ("hybrid": Tauri, a mobile
//! shell) or in a plain browser context ("web"). The two differ in how a
//! capture is read, what a saved record points at, and whether the renderable
//! path has to be rebuilt on load. Each side is one `PlatformStrategy`,
//! picked once when the gallery is built.

use crate::error::{AppError, ErrorKind};
use crate::models::capture_types::CameraPhoto;
use crate::models::fs_types::{Directory, WriteFileResult};
use crate::models::photo_types::Photo;
use crate::services::fetch_service::WebFetcher;
use crate::services::fs_service::{encode_base64, jpeg_data_uri, strip_data_url, uri_to_path, Filesystem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Hybrid,
    Web,
}

impl PlatformKind {
    /// Platform query in the style of `platform.is("hybrid")`.
    pub fn is(&self, name: &str) -> bool {
        match (self, name.to_ascii_lowercase().as_str()) {
            (PlatformKind::Hybrid, "hybrid" | "desktop" | "mobile" | "tauri") => true,
            (PlatformKind::Web, "web" | "mobileweb" | "browser") => true,
            _ => false,
        }
    }
}

impl FromStr for PlatformKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hybrid" => Ok(PlatformKind::Hybrid),
            "web" => Ok(PlatformKind::Web),
            other => Err(AppError::new(
                ErrorKind::Config,
                format!("Unknown platform '{}', expected 'hybrid' or 'web'", other),
            )),
        }
    }
}

/// Converts a native file URI into one the web view can load.
pub trait UriConverter: Send + Sync {
    fn convert(&self, native_uri: &str) -> String;
}

impl<F> UriConverter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn convert(&self, native_uri: &str) -> String {
        self(native_uri)
    }
}

/// Rewrites native paths onto an asset protocol, e.g.
/// `file:///data/1.jpeg` -> `asset://localhost/%2Fdata%2F1.jpeg`.
#[derive(Debug, Clone)]
pub struct AssetUriConverter {
    scheme: String,
    host: String,
}

impl AssetUriConverter {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }
}

impl Default for AssetUriConverter {
    #[cfg(windows)]
    fn default() -> Self {
        Self::new("http", "asset.localhost")
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        Self::new("asset", "localhost")
    }
}

impl UriConverter for AssetUriConverter {
    fn convert(&self, native_uri: &str) -> String {
        let path = uri_to_path(native_uri);
        let path = path.to_string_lossy();
        format!("{}://{}/{}", self.scheme, self.host, urlencoding::encode(&path))
    }
}

#[async_trait]
pub trait PlatformStrategy: Send + Sync {
    fn kind(&self) -> PlatformKind;

    /// Base64 payload of a fresh capture, without any data URL prefix.
    async fn read_capture(
        &self,
        fs: &dyn Filesystem,
        capture: &CameraPhoto,
    ) -> Result<String, AppError>;

    /// The record describing a capture that was just written as `file_name`.
    fn build_record(
        &self,
        file_name: &str,
        saved: &WriteFileResult,
        capture: &CameraPhoto,
    ) -> Result<Photo, AppError>;

    /// Bring a record loaded from storage up to date for rendering.
    async fn refresh(&self, fs: &dyn Filesystem, photo: &mut Photo) -> Result<(), AppError>;
}

fn inline_payload(capture: &CameraPhoto) -> Option<String> {
    capture
        .base64_string
        .as_deref()
        .map(|data| strip_data_url(data).to_string())
}

/// Native container: files are addressed by their native URI and rendered
/// through a converted URI that stays valid across launches.
pub struct HybridPlatform {
    converter: Arc<dyn UriConverter>,
}

impl HybridPlatform {
    pub fn new(converter: Arc<dyn UriConverter>) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl PlatformStrategy for HybridPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Hybrid
    }

    async fn read_capture(
        &self,
        fs: &dyn Filesystem,
        capture: &CameraPhoto,
    ) -> Result<String, AppError> {
        if let Some(data) = inline_payload(capture) {
            return Ok(data);
        }
        let path = capture.path.as_deref().ok_or_else(|| {
            AppError::new(ErrorKind::Io, "Captured photo has no native path")
        })?;
        Ok(fs.read_file(path, None).await?.data)
    }

    fn build_record(
        &self,
        _file_name: &str,
        saved: &WriteFileResult,
        _capture: &CameraPhoto,
    ) -> Result<Photo, AppError> {
        Ok(Photo::new(
            saved.uri.clone(),
            self.converter.convert(&saved.uri),
        ))
    }

    async fn refresh(&self, _fs: &dyn Filesystem, _photo: &mut Photo) -> Result<(), AppError> {
        Ok(())
    }
}

/// Browser context: records hold bare file names and are rendered from data
/// URIs rebuilt from the stored bytes on every load.
pub struct WebPlatform {
    fetcher: Arc<dyn WebFetcher>,
}

impl WebPlatform {
    pub fn new(fetcher: Arc<dyn WebFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl PlatformStrategy for WebPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Web
    }

    async fn read_capture(
        &self,
        _fs: &dyn Filesystem,
        capture: &CameraPhoto,
    ) -> Result<String, AppError> {
        if let Some(data) = inline_payload(capture) {
            return Ok(data);
        }
        let web_path = capture.web_path.as_deref().ok_or_else(|| {
            AppError::new(ErrorKind::Fetch, "Captured photo has no web path")
        })?;
        let bytes = self.fetcher.fetch(web_path).await?;
        Ok(encode_base64(&bytes))
    }

    fn build_record(
        &self,
        file_name: &str,
        _saved: &WriteFileResult,
        capture: &CameraPhoto,
    ) -> Result<Photo, AppError> {
        Ok(Photo::new(
            file_name,
            capture.web_path.clone().unwrap_or_default(),
        ))
    }

    async fn refresh(&self, fs: &dyn Filesystem, photo: &mut Photo) -> Result<(), AppError> {
        let file = fs.read_file(&photo.filepath, Some(Directory::Data)).await?;
        photo.webview_path = jpeg_data_uri(&file.data);
        Ok(())
    }
}

/// Pick the strategy for `kind`. Each side only takes the collaborator it uses.
pub fn select_strategy(
    kind: PlatformKind,
    converter: Arc<dyn UriConverter>,
    fetcher: Arc<dyn WebFetcher>,
) -> Arc<dyn PlatformStrategy> {
    match kind {
        PlatformKind::Hybrid => Arc::new(HybridPlatform::new(converter)),
        PlatformKind::Web => Arc::new(WebPlatform::new(fetcher)),
    }
}
