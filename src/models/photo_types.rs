use serde::{Deserialize, Serialize};

/// A saved gallery entry.
///
/// `filepath` is a native file URI on hybrid platforms and a bare file name on
/// the web. `webview_path` is whatever the web view can render directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub filepath: String,
    #[serde(rename = "webviewPath", default)]
    pub webview_path: String,
}

impl Photo {
    pub fn new(filepath: impl Into<String>, webview_path: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            webview_path: webview_path.into(),
        }
    }
}
