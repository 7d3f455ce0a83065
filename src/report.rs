//! Command output on stdout.
//!
//! Logs go through `tracing` to stderr; this module owns stdout so the
//! witness report stays a single parseable JSON line.

use alloy::primitives::B256;
use serde::Serialize;

use crate::query::{normalize_hex, AssembledQuery, ResponseTree, ValidationWitness, WitnessFields};

/// Roots of the three response trees.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeccakResponses {
    pub keccak_block_response: B256,
    pub keccak_account_response: B256,
    pub keccak_storage_response: B256,
}

impl From<&ResponseTree> for KeccakResponses {
    fn from(tree: &ResponseTree) -> Self {
        Self {
            keccak_block_response: tree.keccak_block_response(),
            keccak_account_response: tree.keccak_account_response(),
            keccak_storage_response: tree.keccak_storage_response(),
        }
    }
}

/// Output of `get-witness`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessReport {
    pub keccak_responses: KeccakResponses,
    /// One entry per requested target, `null` when the tree has no match.
    pub storage_responses: Vec<Option<WitnessFields>>,
}

impl WitnessReport {
    /// Hex-normalize each witness's storage response.
    pub fn new(tree: &ResponseTree, witnesses: &[Option<ValidationWitness>]) -> Self {
        Self {
            keccak_responses: tree.into(),
            storage_responses: witnesses
                .iter()
                .map(|w| w.as_ref().map(|w| normalize_hex(&w.storage_response.fields())))
                .collect(),
        }
    }
}

/// Print `value` as one JSON line.
pub fn print_json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print `label: <json>`.
pub fn print_labeled<T: Serialize>(label: &str, value: &T) -> serde_json::Result<()> {
    println!("{}: {}", label, serde_json::to_string(value)?);
    Ok(())
}

pub fn print_assembled(query: &AssembledQuery) {
    println!("keccakQueryResponse: {}", query.response_hash);
    println!("queryHash: {}", query.query_hash);
    println!("query: {}", query.encoded_query);
}
