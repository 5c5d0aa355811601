// File: src/observer/config.rs

/// Observer loop configuration
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Pause between observation cycles (seconds)
    pub interval_secs: u64,

    /// Soft bound on batch downloads in flight
    pub max_concurrent_downloads: usize,

    /// Unresolvable transactions retried per cycle
    pub max_retry_batch: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_concurrent_downloads: 20,
            max_retry_batch: 100,
        }
    }
}

impl ObserverConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            interval_secs: std::env::var("SIDETREE_OBSERVER_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            max_concurrent_downloads: std::env::var("SIDETREE_OBSERVER_MAX_CONCURRENT_DOWNLOADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            max_retry_batch: std::env::var("SIDETREE_OBSERVER_MAX_RETRY_BATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
        }
    }
}
