// File: src/clients/ipfs.rs

//! IPFS HTTP API client used as the content-addressable store

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::error::FetchError;
use crate::traits::CasClient;

/// IPFS client configuration
#[derive(Debug, Clone)]
pub struct IpfsConfig {
    /// IPFS HTTP API base URL
    pub base_url: String,

    /// Fetch timeout (seconds); a timed out fetch counts as not found
    pub timeout_secs: u64,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout_secs: 10,
        }
    }
}

impl IpfsConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SIDETREE_IPFS_URL").unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("SIDETREE_IPFS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

pub struct IpfsCasClient {
    client: reqwest::Client,
    base_url: String,
}

impl IpfsCasClient {
    pub fn new(config: IpfsConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn map_error(e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::NotFound
        } else {
            FetchError::Unreachable(e.to_string())
        }
    }
}

/// CIDs are base58 (v0) or multibase (v1) strings
fn is_plausible_cid(uri: &str) -> bool {
    !uri.is_empty() && uri.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[async_trait]
impl CasClient for IpfsCasClient {
    async fn read(&self, uri: &str, max_size_bytes: usize) -> Result<Vec<u8>, FetchError> {
        if !is_plausible_cid(uri) {
            return Err(FetchError::InvalidHash);
        }

        let url = format!("{}/api/v0/cat", self.base_url);
        // Ask for one byte more than allowed so an oversized file is detectable
        let length = max_size_bytes.saturating_add(1).to_string();

        tracing::debug!(uri = %uri, max_size_bytes, "Fetching from IPFS");

        let mut response = self
            .client
            .post(&url)
            .query(&[("arg", uri), ("length", length.as_str())])
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::INTERNAL_SERVER_ERROR
                && (body.contains("is a directory") || body.contains("not a file"))
            {
                return Err(FetchError::NotAFile);
            }
            tracing::debug!(uri = %uri, status = %status, body = %body, "IPFS fetch failed");
            return Err(FetchError::NotFound);
        }

        let mut content = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(Self::map_error)? {
            content.extend_from_slice(&chunk);
            if content.len() > max_size_bytes {
                return Err(FetchError::MaxSizeExceeded(max_size_bytes));
            }
        }

        Ok(content)
    }
}
