// File: src/observer/mod.rs

//! Ledger observer
//!
//! Polls the ledger for anchored transactions, resolves their batch files into
//! stored operations and recovers from ledger reorganizations.

pub mod config;
pub mod job;
pub mod processing;
mod recovery;

#[cfg(all(test, feature = "sqlite"))]
mod tests;

pub use config::ObserverConfig;
pub use job::Observer;
pub use processing::{ProcessingStatus, TransactionUnderProcessing};
