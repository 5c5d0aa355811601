//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure including:
//! - An observer node wired to a mock ledger, mock CAS and in-memory SQLite
//! - Batch publishing helpers that write valid batch files to the mock CAS
//! - Assertions over committed transactions and stored operations

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;

pub use std::sync::Arc;
