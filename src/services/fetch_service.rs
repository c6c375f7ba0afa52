use crate::error::{AppError, ErrorKind};
use crate::services::fs_service::{decode_base64, uri_to_path};
use async_trait::async_trait;
use futures::StreamExt;
use log::debug;

/// Upper bound on a fetched capture, so a bad URL can't exhaust memory.
const MAX_FETCH_BYTES: u64 = 64 * 1024 * 1024;

/// Fetches the bytes behind a web-accessible path.
#[async_trait]
pub trait WebFetcher: Send + Sync {
    async fn fetch(&self, web_path: &str) -> Result<Vec<u8>, AppError>;
}

/// Resolves `http(s)` through reqwest, decodes `data:` URLs inline and reads
/// anything else from the local disk.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::new(
                ErrorKind::Fetch,
                format!("Failed to fetch {}: HTTP {}", url, response.status()),
            ));
        }

        let declared = response.content_length().unwrap_or(0);
        if declared > MAX_FETCH_BYTES {
            return Err(too_large(url, declared));
        }

        let mut buffer = Vec::with_capacity(declared as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let received = buffer.len() as u64 + chunk.len() as u64;
            if received > MAX_FETCH_BYTES {
                return Err(too_large(url, received));
            }
            buffer.extend_from_slice(&chunk);
        }

        debug!("Fetched {} byte(s) from {}", buffer.len(), url);
        Ok(buffer)
    }

    async fn fetch_local(&self, web_path: &str) -> Result<Vec<u8>, AppError> {
        let path = uri_to_path(web_path);
        let unreadable = |e: std::io::Error| {
            AppError::new(
                ErrorKind::Fetch,
                format!("Failed to fetch {}: {}", path.display(), e),
            )
        };

        let size = tokio::fs::metadata(&path).await.map_err(unreadable)?.len();
        if size > MAX_FETCH_BYTES {
            return Err(too_large(&path.to_string_lossy(), size));
        }
        tokio::fs::read(&path).await.map_err(unreadable)
    }
}

fn too_large(source: &str, size: u64) -> AppError {
    AppError::new(
        ErrorKind::Fetch,
        format!("{} is {} bytes, over the {} byte limit", source, size, MAX_FETCH_BYTES),
    )
}

#[async_trait]
impl WebFetcher for HttpFetcher {
    async fn fetch(&self, web_path: &str) -> Result<Vec<u8>, AppError> {
        if web_path.starts_with("http://") || web_path.starts_with("https://") {
            return self.fetch_http(web_path).await;
        }
        if web_path.starts_with("data:") {
            return decode_base64(web_path);
        }
        self.fetch_local(web_path).await
    }
}
