//! Quote execution for the relay executor.
//!
//! [`StepEngine`] walks a quote's steps through a [`relay_wallet::WalletAdapter`],
//! merging approve/deposit pairs into one atomic batch where the wallet allows
//! it, relaying Hyperliquid actions and waiting on the relay status endpoints
//! for remote fills. [`RelayClient`] layers quote requests and app-fee claims
//! on top.

pub mod actions;
pub mod batch;
pub mod engine;
pub mod event_bus;
pub mod hyperliquid;

pub use actions::{CallParams, RelayClient, TransferParams};
pub use batch::{is_batchable, prepare_batch};
pub use engine::{ExecuteOptions, ProgressCallback, StepEngine};
pub use event_bus::ProgressBus;
pub use hyperliquid::{HyperliquidRelay, HyperliquidSignRequest};
