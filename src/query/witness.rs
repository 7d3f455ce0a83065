//! Validation witnesses for storage responses.

use std::collections::BTreeMap;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use serde::{Serialize, Serializer};

use crate::query::response::ResponseTree;
use crate::query::types::{QueryError, StorageSlot};

/// A single witness field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WitnessValue {
    Numeric(U256),
    Text(String),
    List(Vec<String>),
}

impl Serialize for WitnessValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WitnessValue::Numeric(n) => match u64::try_from(*n) {
                Ok(small) => serializer.serialize_u64(small),
                Err(_) => serializer.serialize_str(&n.to_string()),
            },
            WitnessValue::Text(s) => serializer.serialize_str(s),
            WitnessValue::List(items) => items.serialize(serializer),
        }
    }
}

/// Witness fields keyed by their wire names.
pub type WitnessFields = BTreeMap<String, WitnessValue>;

/// Replace every numeric field with its minimal `0x` hex form.
pub fn normalize_hex(fields: &WitnessFields) -> WitnessFields {
    fields
        .iter()
        .map(|(key, value)| {
            let value = match value {
                WitnessValue::Numeric(n) => WitnessValue::Text(format!("0x{:x}", n)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Storage slot response with its inclusion proof in the storage tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageResponse {
    pub block_number: u32,
    pub addr: Address,
    pub slot: StorageSlot,
    pub value: U256,
    pub leaf_idx: usize,
    pub proof: Vec<B256>,
}

impl StorageResponse {
    pub fn leaf(&self) -> B256 {
        crate::query::response::storage_leaf(self.block_number, self.addr, self.slot, self.value)
    }

    /// Field mapping in the shape the contract's `StorageResponse` struct uses.
    pub fn fields(&self) -> WitnessFields {
        let mut fields = WitnessFields::new();
        fields.insert("blockNumber".into(), WitnessValue::Numeric(U256::from(self.block_number)));
        fields.insert("addr".into(), WitnessValue::Text(self.addr.to_string()));
        fields.insert("slot".into(), WitnessValue::Numeric(self.slot.as_u256()));
        fields.insert(
            "value".into(),
            WitnessValue::Text(B256::from(self.value.to_be_bytes::<32>()).to_string()),
        );
        fields.insert("leafIdx".into(), WitnessValue::Numeric(U256::from(self.leaf_idx)));
        fields.insert(
            "proof".into(),
            WitnessValue::List(self.proof.iter().map(|p| p.to_string()).collect()),
        );
        fields
    }
}

/// Data needed to check one storage slot against a recorded query response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWitness {
    pub keccak_block_response: B256,
    pub keccak_account_response: B256,
    pub storage_response: StorageResponse,
}

impl ValidationWitness {
    /// Verify the storage proof against `storage_root`.
    pub fn verify(&self, storage_root: B256) -> bool {
        let response = &self.storage_response;
        crate::query::merkle::MerkleTree::verify(
            response.leaf(),
            response.leaf_idx,
            &response.proof,
            storage_root,
        )
    }
}

/// Find the storage response for `(block_number, address, slot)` in `tree`.
///
/// Returns `None` when no storage fragment of the query matches.
pub fn validation_witness(
    tree: &ResponseTree,
    block_number: u64,
    address: Address,
    slot: impl Into<StorageSlot>,
) -> Option<ValidationWitness> {
    let slot = slot.into();
    let (leaf_idx, response) = tree.responses().iter().enumerate().find(|(_, r)| {
        u64::from(r.fragment.block_number) == block_number
            && r.fragment.address == Some(address)
            && r.fragment.slot == Some(slot)
    })?;

    Some(ValidationWitness {
        keccak_block_response: tree.keccak_block_response(),
        keccak_account_response: tree.keccak_account_response(),
        storage_response: StorageResponse {
            block_number: response.fragment.block_number,
            addr: address,
            slot,
            value: response.value?,
            leaf_idx,
            proof: tree.storage_tree().proof(leaf_idx)?,
        },
    })
}

/// A `BLOCK:ADDRESS:SLOT` witness request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessTarget {
    pub block_number: u64,
    pub address: Address,
    pub slot: StorageSlot,
}

impl FromStr for WitnessTarget {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(block), Some(address), Some(slot)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(QueryError::Decode(format!(
                "Expected BLOCK:ADDRESS:SLOT, got '{}'",
                s
            )));
        };
        let block_number = block
            .trim()
            .parse()
            .map_err(|e| QueryError::Decode(format!("Invalid block number '{}': {}", block, e)))?;
        let address = address
            .trim()
            .parse()
            .map_err(|e| QueryError::Decode(format!("Invalid address '{}': {}", address, e)))?;

        Ok(Self {
            block_number,
            address,
            slot: slot.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::state::MemoryState;
    use crate::query::types::QueryFragment;
    use alloy::primitives::address;

    const ADDR: Address = address!("0x6337b3caf9c5236c7f3d1694410776119edaf9fa");

    async fn tree() -> ResponseTree {
        let state = MemoryState::new()
            .with_block(6_779_167, B256::repeat_byte(7))
            .with_storage(6_779_167, ADDR, U256::from(8), U256::from(0x1234));
        let fragments = vec![
            QueryFragment {
                block_number: 6_779_167,
                address: None,
                slot: None,
            },
            QueryFragment {
                block_number: 6_779_167,
                address: Some(ADDR),
                slot: Some(StorageSlot::from(8u64)),
            },
        ];
        ResponseTree::collect(&fragments, &state).await.unwrap()
    }

    #[test]
    fn test_normalize_numeric() {
        let mut fields = WitnessFields::new();
        fields.insert("amount".into(), WitnessValue::Numeric(U256::from(8)));
        let normalized = normalize_hex(&fields);
        assert_eq!(normalized["amount"], WitnessValue::Text("0x8".into()));
    }

    #[test]
    fn test_normalize_leaves_strings() {
        let mut fields = WitnessFields::new();
        fields.insert("slot".into(), WitnessValue::Text("0x8".into()));
        fields.insert("proof".into(), WitnessValue::List(vec!["0x01".into()]));
        assert_eq!(normalize_hex(&fields), fields);
    }

    #[test]
    fn test_normalize_idempotent() {
        let mut fields = WitnessFields::new();
        fields.insert("zero".into(), WitnessValue::Numeric(U256::ZERO));
        fields.insert("big".into(), WitnessValue::Numeric(U256::MAX));
        fields.insert("addr".into(), WitnessValue::Text("0xabc".into()));

        let once = normalize_hex(&fields);
        assert_eq!(normalize_hex(&once), once);
        assert_eq!(once["zero"], WitnessValue::Text("0x0".into()));
    }

    #[test]
    fn test_numeric_serialization() {
        let small = serde_json::to_string(&WitnessValue::Numeric(U256::from(8))).unwrap();
        assert_eq!(small, "8");
        let big = serde_json::to_string(&WitnessValue::Numeric(U256::MAX)).unwrap();
        assert!(big.starts_with('"'));
    }

    #[tokio::test]
    async fn test_slot_shapes_yield_same_witness() {
        let tree = tree().await;
        let hex_slot: StorageSlot = "0x8".parse().unwrap();

        let a = validation_witness(&tree, 6_779_167, ADDR, 8u64).unwrap();
        let b = validation_witness(&tree, 6_779_167, ADDR, hex_slot).unwrap();

        assert_eq!(
            normalize_hex(&a.storage_response.fields()),
            normalize_hex(&b.storage_response.fields())
        );
    }

    #[tokio::test]
    async fn test_witness_verifies_against_storage_root() {
        let tree = tree().await;
        let witness = validation_witness(&tree, 6_779_167, ADDR, 8u64).unwrap();

        assert_eq!(witness.storage_response.leaf_idx, 1);
        assert_eq!(witness.storage_response.value, U256::from(0x1234));
        assert!(witness.verify(tree.keccak_storage_response()));
        assert!(!witness.verify(tree.keccak_block_response()));
    }

    #[tokio::test]
    async fn test_unknown_slot_has_no_witness() {
        let tree = tree().await;
        assert!(validation_witness(&tree, 6_779_167, ADDR, 9u64).is_none());
        assert!(validation_witness(&tree, 7_778_167, ADDR, 8u64).is_none());
    }

    #[tokio::test]
    async fn test_extraction_is_repeatable() {
        let tree = tree().await;
        let first = validation_witness(&tree, 6_779_167, ADDR, 8u64);
        let second = validation_witness(&tree, 6_779_167, ADDR, 8u64);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_target() {
        let target: WitnessTarget = "6779167:0x6337b3caf9c5236c7f3d1694410776119edaf9fa:0x8"
            .parse()
            .unwrap();
        assert_eq!(target.block_number, 6_779_167);
        assert_eq!(target.address, ADDR);
        assert_eq!(target.slot, StorageSlot::from(8u64));

        assert!("6779167:0x6337".parse::<WitnessTarget>().is_err());
        assert!("abc:0x6337b3caf9c5236c7f3d1694410776119edaf9fa:8"
            .parse::<WitnessTarget>()
            .is_err());
    }
}
