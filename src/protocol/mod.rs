//! Protocol rules for anchored batches
//!
//! Everything here is versioned: the parameters of the version active at a
//! transaction's ledger time decide how that transaction is validated.

pub mod anchored_data;
pub mod compressor;
pub mod encoding;
pub mod error;
pub mod fee;
pub mod files;
pub mod operation;
pub mod parameters;
pub mod resolver;
pub mod selector;
pub mod value_time_lock;
pub mod versions;

pub use anchored_data::AnchoredData;
pub use error::ProtocolError;
pub use operation::{AnchoredOperationModel, OperationType};
pub use parameters::ProtocolParameters;
pub use resolver::BatchFileResolver;
pub use selector::ThroughputLimiter;
pub use versions::{ProtocolVersion, ProtocolVersionManager, ProtocolVersions};
