//! Storage module
//!
//! Store contracts live in `crate::traits::store`; this module holds the
//! SQLite backend and the retry schedule shared by backends.

pub mod config;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::UnresolvableConfig;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfig, SqliteStore};
