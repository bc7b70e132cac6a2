//! Shared types for the relay executor.
//!
//! Everything the engine, the wallet adapters, the confirmation watchers and
//! the status poller exchange lives here: the quote data model, receipts,
//! remote request statuses, progress snapshots and the execution error
//! taxonomy.

pub mod chains;
pub mod errors;
pub mod phase;
pub mod progress;
pub mod quote;
pub mod receipt;
pub mod serde_helpers;
pub mod status;
pub mod validation;

pub use chains::*;
pub use errors::*;
pub use phase::*;
pub use progress::*;
pub use quote::*;
pub use receipt::*;
pub use status::*;
pub use validation::*;
