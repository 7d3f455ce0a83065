//! Query fragment types and error definitions.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::blockchain::types::BlockchainError;

/// Maximum number of fragments in one query (a depth-6 response tree).
pub const MAX_QUERY_FRAGMENTS: usize = 64;

/// Errors that can occur while assembling or resolving queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A fragment is missing a field its granularity requires.
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    /// `build` was called before any fragment was appended.
    #[error("Query has no fragments")]
    EmptyQuery,

    /// More fragments than a response tree can hold.
    #[error("Query exceeds {max} fragments")]
    QueryTooLarge { max: usize },

    /// Encoded query bytes or a slot string could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The transaction is not a recorded, finalized query submission.
    #[error("No query response recorded for transaction {0}")]
    ResponseNotFound(String),

    /// The rebuilt response tree does not match the submitted response hash.
    #[error("Response hash mismatch: submitted {submitted}, computed {computed}")]
    ResponseMismatch { submitted: B256, computed: B256 },

    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// A storage slot key.
///
/// Integers and decimal or `0x` hex strings are accepted and all map to the
/// same `U256`, so `StorageSlot::from(8u64)` equals `"0x8".parse()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StorageSlot(pub U256);

impl StorageSlot {
    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl From<u64> for StorageSlot {
    fn from(slot: u64) -> Self {
        Self(U256::from(slot))
    }
}

impl From<U256> for StorageSlot {
    fn from(slot: U256) -> Self {
        Self(slot)
    }
}

impl FromStr for StorageSlot {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16),
            Some(_) => return Err(QueryError::Decode(format!("Invalid slot '{}'", s))),
            None => U256::from_str_radix(trimmed, 10),
        };
        parsed
            .map(Self)
            .map_err(|e| QueryError::Decode(format!("Invalid slot '{}': {}", s, e)))
    }
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// How much state a fragment asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FragmentLevel {
    /// Block header only.
    Block = 0,
    /// Block header and account state.
    Account = 1,
    /// Block header, account state and one storage slot.
    Storage = 2,
}

impl TryFrom<u8> for FragmentLevel {
    type Error = QueryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Block),
            1 => Ok(Self::Account),
            2 => Ok(Self::Storage),
            other => Err(QueryError::Decode(format!("Unknown fragment level {}", other))),
        }
    }
}

/// Unvalidated input to [`QueryBuilder::append`](crate::query::QueryBuilder::append).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentRequest {
    pub block_number: Option<u64>,
    pub address: Option<Address>,
    pub slot: Option<StorageSlot>,
}

impl FragmentRequest {
    /// Request a block header.
    pub fn block(block_number: u64) -> Self {
        Self {
            block_number: Some(block_number),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_slot(mut self, slot: impl Into<StorageSlot>) -> Self {
        self.slot = Some(slot.into());
        self
    }
}

/// One validated unit of requested state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFragment {
    pub block_number: u32,
    pub address: Option<Address>,
    pub slot: Option<StorageSlot>,
}

impl QueryFragment {
    pub fn level(&self) -> FragmentLevel {
        match (self.address, self.slot) {
            (Some(_), Some(_)) => FragmentLevel::Storage,
            (Some(_), None) => FragmentLevel::Account,
            _ => FragmentLevel::Block,
        }
    }
}

impl TryFrom<FragmentRequest> for QueryFragment {
    type Error = QueryError;

    fn try_from(request: FragmentRequest) -> Result<Self, Self::Error> {
        let Some(block_number) = request.block_number else {
            return Err(QueryError::InvalidFragment(
                "block number is required".to_string(),
            ));
        };
        if request.slot.is_some() && request.address.is_none() {
            return Err(QueryError::InvalidFragment(
                "slot given without an address".to_string(),
            ));
        }
        let block_number = u32::try_from(block_number).map_err(|_| {
            QueryError::InvalidFragment(format!("block number {} exceeds u32", block_number))
        })?;

        Ok(Self {
            block_number,
            address: request.address,
            slot: request.slot,
        })
    }
}

/// A built query, ready for `sendQuery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledQuery {
    /// keccak of the three response tree roots (`keccakQueryResponse`).
    pub response_hash: B256,
    /// keccak of `encoded_query`.
    pub query_hash: B256,
    pub encoded_query: Bytes,
}
