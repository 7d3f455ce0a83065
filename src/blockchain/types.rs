//! Chain-specific types and error definitions.

use alloy::primitives::{Bytes, B256, U256};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Invalid private key format or signing backend failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Neither a private key nor the wallet bridge produced an account.
    #[error("No signer available: {0}")]
    NoSignerAvailable(String),

    /// The node or contract refused the transaction.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// Transaction was mined but reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Account fields committed to by an account response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: B256,
    pub code_hash: B256,
}

/// The arguments of a mined `sendQuery` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentQuery {
    /// Response hash the submitter committed to.
    pub response_hash: B256,
    /// Encoded query bytes.
    pub query: Bytes,
}
