//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! QueryConfig (endpoint, optional private key)
//!     → wallet.rs (programmatic key or wallet bridge → ResolvedSigner)
//!     → transaction.rs (sendQuery request, broadcast, receipt)
//!
//! client.rs (RPC reads)
//!     → state.rs traits (block/account/storage state, mined submissions)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from configuration
//! - Never log private keys or sensitive data

pub mod client;
pub mod state;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use state::{MemoryState, StateSource, SubmissionSource};
pub use transaction::{QuerySubmitter, SubmittedQuery};
pub use types::{AccountState, BlockchainError, ChainId, SentQuery};
pub use wallet::{ResolvedSigner, RpcWalletBridge, SignerStrategy, WalletBridge};
