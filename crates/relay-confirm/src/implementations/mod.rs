//! Confirmation watcher implementations.
//!
//! - `evm`: receipt polling through an alloy provider, with call-trace
//!   enrichment of failures
//! - `svm`: `getSignatureStatuses` polling for Solana-family chains
//! - `sui`: `sui_getTransactionBlock` effects polling

pub mod evm;
pub mod sui;
pub mod svm;

pub use evm::EvmConfirmation;
pub use sui::SuiConfirmation;
pub use svm::SvmConfirmation;
