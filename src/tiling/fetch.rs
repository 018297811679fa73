//! Source image retrieval over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::FetchError;

/// Default timeout for a whole fetch (connect + headers + body).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Default upper bound on the size of a fetched source image (256 MiB).
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 256 * 1024 * 1024;

/// Retrieves the raw bytes of a source image.
#[async_trait]
pub trait ImageFetcher: Send + Sync + 'static {
    /// Fetch `url` with a single GET. No retries.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// `reqwest`-backed fetcher.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpImageFetcher {
    /// Create a fetcher with the default timeout and size limit.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_limits(DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_SOURCE_BYTES)
    }

    /// Create a fetcher with a custom timeout and size limit.
    pub fn with_limits(timeout: Duration, max_bytes: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("data-formatting/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, max_bytes })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let network_err = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };
        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        };

        let mut response = self.client.get(url).send().await.map_err(network_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(too_large());
        }

        // Content-Length may be absent or wrong, so the limit is enforced
        // while reading as well.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(network_err)? {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, bytes = body.len(), "Fetched source image");
        Ok(Bytes::from(body))
    }
}
