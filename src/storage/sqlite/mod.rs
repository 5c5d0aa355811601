// File: src/storage/sqlite/mod.rs

mod config;
mod confirmations;
mod convert;
mod operations;
mod schema;
mod store;
mod transactions;
mod unresolvable;

// Public exports
pub use config::SqliteConfig;
pub use store::SqliteStore;
