//! Image fetching over HTTP.

use super::{FetchedImage, ImageFetcher};
use crate::error::{Error, Result};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`ImageFetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Create a fetcher with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("docfill/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Use an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchedImage> {
        let response = self.client.get(uri).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, uri));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        debug!(
            "fetched {} ({} bytes, {})",
            uri,
            bytes.len(),
            content_type.as_deref().unwrap_or("no content type")
        );

        let image = FetchedImage::new(bytes, content_type);
        image.ensure_image()?;
        Ok(image)
    }
}

/// Server errors and throttling may clear up; anything else will not.
fn status_error(status: StatusCode, uri: &str) -> Error {
    let msg = format!("{} returned {}", uri, status);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Error::TransientIo(msg)
    } else {
        Error::Other(msg)
    }
}
