// File: src/storage/sqlite/config.rs

use crate::storage::config::UnresolvableConfig;

/// SQLite storage backend configuration
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to database file (or ":memory:" for in-memory)
    pub path: String,

    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,

    /// Busy timeout in milliseconds
    pub busy_timeout_ms: u32,

    /// Retry schedule of the unresolvable transaction table
    pub unresolvable: UnresolvableConfig,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "sidetree.db".to_string(),
            wal_mode: true,
            busy_timeout_ms: 5000,
            unresolvable: UnresolvableConfig::default(),
        }
    }
}

impl SqliteConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            path: std::env::var("SIDETREE_DATABASE_PATH").unwrap_or_else(|_| "sidetree.db".to_string()),
            wal_mode: std::env::var("SIDETREE_SQLITE_WAL")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            busy_timeout_ms: std::env::var("SIDETREE_SQLITE_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            unresolvable: UnresolvableConfig::from_env(),
        }
    }
}
