//! The two command flows, independent of the CLI.
//!
//! ```text
//! send_query:
//!     demo query → QueryBuilder::build (StateSource)
//!     → SignerStrategy::resolve → QuerySubmitter::submit
//!     → SignerStrategy::release (always)
//!
//! witness_report:
//!     tx hash → fetch_response_tree → validation_witness per target
//!     → WitnessReport
//! ```

use alloy::primitives::TxHash;

use crate::blockchain::state::{StateSource, SubmissionSource};
use crate::blockchain::transaction::{QuerySubmitter, SubmittedQuery};
use crate::blockchain::wallet::{SignerStrategy, WalletBridge};
use crate::config::QueryConfig;
use crate::query::demo::example_query;
use crate::query::{
    fetch_response_tree, validation_witness, AssembledQuery, QueryResult, WitnessTarget,
};
use crate::report::WitnessReport;

/// A broadcast query and what it committed to.
#[derive(Debug)]
pub struct QuerySubmission {
    pub query: AssembledQuery,
    pub submitted: SubmittedQuery,
}

/// Assemble the demonstration query at `block` and broadcast it.
///
/// The strategy's wallet bridge is released before returning, on success and
/// on every error.
pub async fn send_query<S, B>(
    config: &QueryConfig,
    state: &S,
    strategy: &SignerStrategy<B>,
    block: u64,
) -> QueryResult<QuerySubmission>
where
    S: StateSource,
    B: WalletBridge,
{
    let result = assemble_and_submit(config, state, strategy, block).await;
    strategy.release().await;
    result
}

async fn assemble_and_submit<S, B>(
    config: &QueryConfig,
    state: &S,
    strategy: &SignerStrategy<B>,
    block: u64,
) -> QueryResult<QuerySubmission>
where
    S: StateSource,
    B: WalletBridge,
{
    let query = example_query(block)?.build(state).await?;

    let signer = strategy.resolve(&config.provider_uri).await?;
    let submitter = QuerySubmitter::new(config, &signer)?;
    let submitted = submitter.submit(&query).await?;

    Ok(QuerySubmission { query, submitted })
}

/// Witnesses for `targets` in the response tree of `tx_hash`.
pub async fn witness_report<S>(
    source: &S,
    tx_hash: TxHash,
    targets: &[WitnessTarget],
    mock: bool,
) -> QueryResult<WitnessReport>
where
    S: StateSource + SubmissionSource,
{
    let tree = fetch_response_tree(source, tx_hash, mock).await?;

    let witnesses: Vec<_> = targets
        .iter()
        .map(|t| {
            let witness = validation_witness(&tree, t.block_number, t.address, t.slot);
            if witness.is_none() {
                tracing::warn!(
                    block_number = t.block_number,
                    address = %t.address,
                    slot = %t.slot,
                    "No storage response for target"
                );
            }
            witness
        })
        .collect();

    Ok(WitnessReport::new(&tree, &witnesses))
}
