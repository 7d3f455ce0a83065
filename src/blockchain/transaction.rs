//! `sendQuery` transaction building, submission and confirmation.
//!
//! # Responsibilities
//! - Encode the `sendQuery` call for an assembled query
//! - Attach the query fee and fixed gas price
//! - Broadcast without waiting, confirm on request
//!
//! No retries: a rejected submission is returned to the caller as-is.

use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{PendingTransactionBuilder, Provider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::client::parse_address;
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::wallet::ResolvedSigner;
use crate::config::QueryConfig;
use crate::query::AssembledQuery;

sol! {
    /// Query entry point of the `AxiomV1Query` contract.
    interface AxiomV1Query {
        function sendQuery(bytes32 keccakQueryResponse, address payable refundee, bytes calldata query) external payable;
    }
}

/// Builds and sends `sendQuery` transactions from one signer.
pub struct QuerySubmitter<'a> {
    signer: &'a ResolvedSigner,
    contract: Address,
    chain_id: u64,
    fee: U256,
    gas_price: u128,
}

impl<'a> QuerySubmitter<'a> {
    pub fn new(config: &QueryConfig, signer: &'a ResolvedSigner) -> BlockchainResult<Self> {
        Ok(Self {
            signer,
            contract: parse_address(&config.query_address)?,
            chain_id: config.chain_id,
            fee: U256::from(config.query_fee_wei),
            gas_price: config.gas_price_wei(),
        })
    }

    /// The `sendQuery` request for `query`, refunding to the signer.
    pub fn build_request(&self, query: &AssembledQuery) -> TransactionRequest {
        let call = AxiomV1Query::sendQueryCall {
            keccakQueryResponse: query.response_hash,
            refundee: self.signer.address(),
            query: query.encoded_query.clone(),
        };

        TransactionRequest::default()
            .with_from(self.signer.address())
            .with_to(self.contract)
            .with_value(self.fee)
            .with_input(call.abi_encode())
            .with_gas_price(self.gas_price)
            .with_chain_id(self.chain_id)
    }

    /// Broadcast the query. Returns once the node accepts the transaction.
    pub async fn submit(&self, query: &AssembledQuery) -> BlockchainResult<SubmittedQuery> {
        let request = self.build_request(query);
        tracing::info!(
            contract = %self.contract,
            from = %self.signer.address(),
            response_hash = %query.response_hash,
            "Sending query transaction"
        );

        let pending = self
            .signer
            .provider()
            .send_transaction(request.clone())
            .await
            .map_err(|e| BlockchainError::SubmissionRejected(e.to_string()))?;

        tracing::info!(tx_hash = %pending.tx_hash(), "Query transaction broadcast");
        Ok(SubmittedQuery { pending, request })
    }
}

/// A broadcast `sendQuery` transaction.
#[derive(Debug)]
pub struct SubmittedQuery {
    pending: PendingTransactionBuilder<Ethereum>,
    request: TransactionRequest,
}

impl SubmittedQuery {
    pub fn tx_hash(&self) -> TxHash {
        *self.pending.tx_hash()
    }

    /// The request as sent.
    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    /// Wait until mined.
    pub async fn wait(self) -> BlockchainResult<TransactionReceipt> {
        let tx_hash = self.tx_hash();
        let receipt = self
            .pending
            .get_receipt()
            .await
            .map_err(|e| BlockchainError::Rpc(format!("get_receipt failed: {}", e)))?;

        if !receipt.status() {
            return Err(BlockchainError::Reverted(format!("transaction {} reverted", tx_hash)));
        }

        tracing::info!(
            tx_hash = %tx_hash,
            block_number = ?receipt.block_number,
            "Query transaction confirmed"
        );
        Ok(receipt)
    }
}
