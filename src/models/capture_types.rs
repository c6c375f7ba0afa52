use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraResultType {
    /// A reference to a file the camera wrote.
    Uri,
    Base64,
    DataUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraSource {
    Prompt,
    Camera,
    Photos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureOptions {
    pub result_type: CameraResultType,
    pub source: CameraSource,
    /// JPEG quality, 0-100.
    pub quality: u8,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            result_type: CameraResultType::Uri,
            source: CameraSource::Camera,
            quality: 100,
        }
    }
}

/// What the camera hands back. Which fields are set depends on the
/// requested `CameraResultType` and the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPhoto {
    /// Native file path or `file://` URI.
    pub path: Option<String>,
    /// A path the web view can fetch.
    pub web_path: Option<String>,
    /// Bare base64 payload, set for `Base64` and `DataUrl` results.
    pub base64_string: Option<String>,
    pub format: String,
}
