// File: src/storage/config.rs

/// Retry schedule for transactions whose batch files could not be fetched
#[derive(Debug, Clone)]
pub struct UnresolvableConfig {
    /// Base delay of the exponential backoff (milliseconds)
    pub exponential_delay_factor_ms: u64,
}

impl Default for UnresolvableConfig {
    fn default() -> Self {
        Self {
            exponential_delay_factor_ms: 60_000, // One minute, doubling per attempt
        }
    }
}

impl UnresolvableConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            exponential_delay_factor_ms: std::env::var("SIDETREE_RETRY_DELAY_FACTOR_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60_000),
        }
    }

    /// Delay before retry attempt `previous_attempts + 1`, before jitter
    pub fn base_delay_ms(&self, previous_attempts: u32) -> f64 {
        2f64.powi(previous_attempts.min(62) as i32) * self.exponential_delay_factor_ms as f64
    }
}
