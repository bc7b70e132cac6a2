//! Wallet adapter implementations.
//!
//! - `evm`: local private key with per-chain alloy providers
//! - `solana`: external instruction sender
//! - `bitcoin`: external PSBT signer, status-endpoint confirmation only
//! - `sui`: external transaction signer

pub mod bitcoin;
pub mod evm;
pub mod solana;
pub mod sui;

pub use bitcoin::{BitcoinWallet, PsbtSigner};
pub use evm::{create_evm_wallet, EvmChain, EvmWallet};
pub use solana::{SolanaSender, SolanaWallet};
pub use sui::{SuiSigner, SuiWallet};
