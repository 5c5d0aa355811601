//! Service configuration

use crate::observer::ObserverConfig;

#[cfg(feature = "http")]
use crate::clients::{IpfsConfig, LedgerClientConfig};
#[cfg(feature = "sqlite")]
use crate::storage::SqliteConfig;

/// Observer service configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub observer: ObserverConfig,

    /// JSON file listing protocol versions (None = v1 parameters from genesis)
    pub versions_file: Option<String>,

    #[cfg(feature = "sqlite")]
    pub sqlite: SqliteConfig,

    #[cfg(feature = "http")]
    pub ledger: LedgerClientConfig,

    #[cfg(feature = "http")]
    pub ipfs: IpfsConfig,
}

impl Config {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self {
            observer: ObserverConfig::from_env(),
            versions_file: std::env::var("SIDETREE_VERSIONS_FILE").ok(),
            #[cfg(feature = "sqlite")]
            sqlite: SqliteConfig::from_env(),
            #[cfg(feature = "http")]
            ledger: LedgerClientConfig::from_env(),
            #[cfg(feature = "http")]
            ipfs: IpfsConfig::from_env(),
        }
    }
}
