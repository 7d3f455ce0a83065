//! Blockchain RPC client.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint
//! - Read historical block, account and storage state for response trees
//! - Look up mined `sendQuery` transactions

use alloy::consensus::Transaction as _;
use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{BlockId, BlockNumberOrTag};
use alloy::sol_types::SolCall;

use crate::blockchain::state::{StateSource, SubmissionSource};
use crate::blockchain::transaction::AxiomV1Query;
use crate::blockchain::types::{AccountState, BlockchainError, BlockchainResult, ChainId, SentQuery};
use crate::config::QueryConfig;

/// Read-only RPC client.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: DynProvider,
    rpc_url: String,
    chain_id: u64,
    query_address: Address,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// A chain ID mismatch or unreachable endpoint is logged, not fatal; the
    /// first real request reports the failure.
    pub async fn new(config: &QueryConfig) -> BlockchainResult<Self> {
        let url: url::Url = config.provider_uri.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.provider_uri, e))
        })?;
        let query_address = parse_address(&config.query_address)?;

        let client = Self {
            provider: ProviderBuilder::new().connect_http(url).erased(),
            rpc_url: config.provider_uri.clone(),
            chain_id: config.chain_id,
            query_address,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %client.rpc_url,
                    chain_id = client.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.provider
            .get_chain_id()
            .await
            .map(ChainId)
            .map_err(|e| BlockchainError::Rpc(format!("eth_chainId failed: {}", e)))
    }
}

impl StateSource for BlockchainClient {
    async fn block_hash(&self, block_number: u64) -> BlockchainResult<B256> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await
            .map_err(|e| BlockchainError::Rpc(format!("eth_getBlockByNumber failed: {}", e)))?
            .ok_or_else(|| BlockchainError::Rpc(format!("Block {} not found", block_number)))?;
        Ok(block.header.hash)
    }

    async fn account(&self, block_number: u64, address: Address) -> BlockchainResult<AccountState> {
        let proof = self
            .provider
            .get_proof(address, Vec::new())
            .block_id(BlockId::number(block_number))
            .await
            .map_err(|e| BlockchainError::Rpc(format!("eth_getProof failed: {}", e)))?;

        Ok(AccountState {
            nonce: proof.nonce,
            balance: proof.balance,
            storage_root: proof.storage_hash,
            code_hash: proof.code_hash,
        })
    }

    async fn storage(
        &self,
        block_number: u64,
        address: Address,
        slot: U256,
    ) -> BlockchainResult<U256> {
        self.provider
            .get_storage_at(address, slot)
            .block_id(BlockId::number(block_number))
            .await
            .map_err(|e| BlockchainError::Rpc(format!("eth_getStorageAt failed: {}", e)))
    }
}

impl SubmissionSource for BlockchainClient {
    async fn sent_query(&self, tx_hash: TxHash) -> BlockchainResult<Option<SentQuery>> {
        let Some(tx) = self
            .provider
            .get_transaction_by_hash(tx_hash)
            .await
            .map_err(|e| BlockchainError::Rpc(format!("eth_getTransactionByHash failed: {}", e)))?
        else {
            tracing::debug!(tx_hash = %tx_hash, "Transaction not found");
            return Ok(None);
        };

        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| BlockchainError::Rpc(format!("eth_getTransactionReceipt failed: {}", e)))?;
        match receipt {
            Some(receipt) if receipt.status() => {}
            Some(_) => {
                tracing::debug!(tx_hash = %tx_hash, "Transaction reverted");
                return Ok(None);
            }
            None => {
                tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                return Ok(None);
            }
        }

        if tx.to() != Some(self.query_address) {
            tracing::debug!(
                tx_hash = %tx_hash,
                to = ?tx.to(),
                "Transaction is not addressed to the query contract"
            );
            return Ok(None);
        }

        match AxiomV1Query::sendQueryCall::abi_decode(tx.input()) {
            Ok(call) => Ok(Some(SentQuery {
                response_hash: call.keccakQueryResponse,
                query: call.query,
            })),
            Err(e) => {
                tracing::debug!(
                    tx_hash = %tx_hash,
                    error = %e,
                    "Transaction is not a sendQuery call"
                );
                Ok(None)
            }
        }
    }
}

/// Parse a hex address from configuration.
pub fn parse_address(value: &str) -> BlockchainResult<Address> {
    value
        .parse()
        .map_err(|e| BlockchainError::Rpc(format!("Invalid address '{}': {}", value, e)))
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("query_address", &self.query_address)
            .finish()
    }
}
