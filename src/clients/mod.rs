//! Ledger and CAS clients
//!
//! HTTP implementations are behind the `http` feature. The in-memory mocks
//! are built for unit tests and behind the `test-util` feature.

pub mod error;
#[cfg(feature = "http")]
pub mod ipfs;
#[cfg(feature = "http")]
pub mod ledger;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use error::{FetchError, LedgerError};
#[cfg(feature = "http")]
pub use ipfs::{IpfsCasClient, IpfsConfig};
#[cfg(feature = "http")]
pub use ledger::{HttpLedgerClient, LedgerClientConfig};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockCasClient, MockLedgerClient};
