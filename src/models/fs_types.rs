use serde::{Deserialize, Serialize};

/// Logical directories a `Filesystem` resolves relative paths against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Directory {
    /// Private per-app data directory.
    Data,
    Cache,
}

#[derive(Debug, Serialize, Clone)]
pub struct ReadFileResult {
    /// File contents, base64 encoded.
    pub data: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct WriteFileResult {
    pub uri: String,
}
