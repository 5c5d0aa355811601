//! Content-addressable store client trait

use async_trait::async_trait;

use crate::error::FetchError;

/// Read side of the content-addressable store
#[async_trait]
pub trait CasClient: Send + Sync {
    /// Fetch the content behind `uri`, failing if it is larger than `max_size_bytes`
    async fn read(&self, uri: &str, max_size_bytes: usize) -> Result<Vec<u8>, FetchError>;
}
