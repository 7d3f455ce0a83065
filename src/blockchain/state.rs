//! Read access to historical chain state.
//!
//! Response trees are collected through [`StateSource`] and submissions are
//! looked up through [`SubmissionSource`]. [`BlockchainClient`] implements both
//! over JSON-RPC; [`MemoryState`] implements both from fixed data.
//!
//! [`BlockchainClient`]: crate::blockchain::BlockchainClient

use std::collections::HashMap;
use std::future::Future;

use alloy::primitives::{Address, TxHash, B256, U256};

use crate::blockchain::types::{AccountState, BlockchainError, BlockchainResult, SentQuery};

/// Historical block, account and storage lookups.
pub trait StateSource {
    /// Hash of the block at `block_number`.
    fn block_hash(&self, block_number: u64) -> impl Future<Output = BlockchainResult<B256>> + Send;

    /// Account state of `address` at the end of `block_number`.
    fn account(
        &self,
        block_number: u64,
        address: Address,
    ) -> impl Future<Output = BlockchainResult<AccountState>> + Send;

    /// Storage value of `address` at `slot` at the end of `block_number`.
    fn storage(
        &self,
        block_number: u64,
        address: Address,
        slot: U256,
    ) -> impl Future<Output = BlockchainResult<U256>> + Send;
}

/// Lookup of previously mined query submissions.
pub trait SubmissionSource {
    /// Returns `None` unless `tx_hash` is a successful, mined `sendQuery` call.
    fn sent_query(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = BlockchainResult<Option<SentQuery>>> + Send;
}

/// In-memory chain state.
///
/// Unknown accounts read as empty and unknown slots read as zero, which is what
/// a node returns for them. Unknown blocks are an error.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    blocks: HashMap<u64, B256>,
    accounts: HashMap<(u64, Address), AccountState>,
    storage: HashMap<(u64, Address, U256), U256>,
    submissions: HashMap<TxHash, SentQuery>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block_number: u64, hash: B256) -> Self {
        self.blocks.insert(block_number, hash);
        self
    }

    pub fn with_account(
        mut self,
        block_number: u64,
        address: Address,
        account: AccountState,
    ) -> Self {
        self.accounts.insert((block_number, address), account);
        self
    }

    pub fn with_storage(
        mut self,
        block_number: u64,
        address: Address,
        slot: U256,
        value: U256,
    ) -> Self {
        self.storage.insert((block_number, address, slot), value);
        self
    }

    /// Record a mined `sendQuery` transaction.
    pub fn record_submission(&mut self, tx_hash: TxHash, sent: SentQuery) {
        self.submissions.insert(tx_hash, sent);
    }
}

impl StateSource for MemoryState {
    async fn block_hash(&self, block_number: u64) -> BlockchainResult<B256> {
        self.blocks
            .get(&block_number)
            .copied()
            .ok_or_else(|| BlockchainError::Rpc(format!("Block {} not found", block_number)))
    }

    async fn account(&self, block_number: u64, address: Address) -> BlockchainResult<AccountState> {
        Ok(self
            .accounts
            .get(&(block_number, address))
            .copied()
            .unwrap_or_default())
    }

    async fn storage(
        &self,
        block_number: u64,
        address: Address,
        slot: U256,
    ) -> BlockchainResult<U256> {
        Ok(self
            .storage
            .get(&(block_number, address, slot))
            .copied()
            .unwrap_or_default())
    }
}

impl SubmissionSource for MemoryState {
    async fn sent_query(&self, tx_hash: TxHash) -> BlockchainResult<Option<SentQuery>> {
        Ok(self.submissions.get(&tx_hash).cloned())
    }
}
