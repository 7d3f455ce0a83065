//! Query responses and the three response trees.
//!
//! Fragment `i` owns leaf `i` of every tree. A fragment commits a block leaf
//! always, an account leaf when it names an address and a storage leaf when it
//! names a slot; absent leaves are zero.
//!
//! ```text
//! block leaf   = keccak(blockHash || blockNumber:u32)
//! account leaf = keccak(blockNumber:u32 || addr || stateHash)
//! stateHash    = keccak(nonce:u64 || balance:u96 || storageRoot || codeHash)
//! storage leaf = keccak(blockNumber:u32 || addr || slot:u256 || value:u256)
//! response     = keccak(blockRoot || accountRoot || storageRoot)
//! ```

use alloy::primitives::{keccak256, Address, B256, U256};

use crate::blockchain::state::StateSource;
use crate::blockchain::types::AccountState;
use crate::query::merkle::{MerkleTree, RESPONSE_TREE_DEPTH};
use crate::query::types::{QueryError, QueryFragment, QueryResult, StorageSlot};

/// Chain data answering one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentResponse {
    pub fragment: QueryFragment,
    pub block_hash: B256,
    pub account: Option<AccountState>,
    pub value: Option<U256>,
}

impl FragmentResponse {
    pub fn block_leaf(&self) -> B256 {
        let mut buf = Vec::with_capacity(36);
        buf.extend_from_slice(self.block_hash.as_slice());
        buf.extend_from_slice(&self.fragment.block_number.to_be_bytes());
        keccak256(buf)
    }

    pub fn account_leaf(&self) -> QueryResult<B256> {
        let (Some(address), Some(account)) = (self.fragment.address, self.account) else {
            return Ok(B256::ZERO);
        };
        let state_hash = account_state_hash(&account)?;

        let mut buf = Vec::with_capacity(56);
        buf.extend_from_slice(&self.fragment.block_number.to_be_bytes());
        buf.extend_from_slice(address.as_slice());
        buf.extend_from_slice(state_hash.as_slice());
        Ok(keccak256(buf))
    }

    pub fn storage_leaf(&self) -> B256 {
        let (Some(address), Some(slot), Some(value)) =
            (self.fragment.address, self.fragment.slot, self.value)
        else {
            return B256::ZERO;
        };
        storage_leaf(self.fragment.block_number, address, slot, value)
    }
}

pub(crate) fn storage_leaf(
    block_number: u32,
    address: Address,
    slot: StorageSlot,
    value: U256,
) -> B256 {
    let mut buf = Vec::with_capacity(88);
    buf.extend_from_slice(&block_number.to_be_bytes());
    buf.extend_from_slice(address.as_slice());
    buf.extend_from_slice(&slot.as_u256().to_be_bytes::<32>());
    buf.extend_from_slice(&value.to_be_bytes::<32>());
    keccak256(buf)
}

fn account_state_hash(account: &AccountState) -> QueryResult<B256> {
    if account.balance.bit_len() > 96 {
        return Err(QueryError::Decode(format!(
            "Balance {} does not fit in 96 bits",
            account.balance
        )));
    }
    let balance = account.balance.to_be_bytes::<32>();

    let mut buf = Vec::with_capacity(84);
    buf.extend_from_slice(&account.nonce.to_be_bytes());
    buf.extend_from_slice(&balance[20..]);
    buf.extend_from_slice(account.storage_root.as_slice());
    buf.extend_from_slice(account.code_hash.as_slice());
    Ok(keccak256(buf))
}

/// Responses to every fragment of a query plus the block, account and storage trees.
#[derive(Debug, Clone)]
pub struct ResponseTree {
    responses: Vec<FragmentResponse>,
    block_tree: MerkleTree,
    account_tree: MerkleTree,
    storage_tree: MerkleTree,
}

impl ResponseTree {
    /// Fetch chain data for `fragments` in order and build the trees.
    pub async fn collect<S: StateSource>(
        fragments: &[QueryFragment],
        state: &S,
    ) -> QueryResult<Self> {
        let mut responses = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let block_number = u64::from(fragment.block_number);
            let block_hash = state.block_hash(block_number).await?;

            let account = match fragment.address {
                Some(address) => Some(state.account(block_number, address).await?),
                None => None,
            };
            let value = match (fragment.address, fragment.slot) {
                (Some(address), Some(slot)) => {
                    Some(state.storage(block_number, address, slot.as_u256()).await?)
                }
                _ => None,
            };

            tracing::debug!(
                block_number,
                address = ?fragment.address,
                slot = ?fragment.slot.map(|s| s.to_string()),
                "Collected fragment response"
            );

            responses.push(FragmentResponse {
                fragment: *fragment,
                block_hash,
                account,
                value,
            });
        }
        Self::from_responses(responses)
    }

    pub fn from_responses(responses: Vec<FragmentResponse>) -> QueryResult<Self> {
        if responses.len() > 1 << RESPONSE_TREE_DEPTH {
            return Err(QueryError::QueryTooLarge {
                max: 1 << RESPONSE_TREE_DEPTH,
            });
        }

        let block_leaves = responses.iter().map(FragmentResponse::block_leaf).collect();
        let account_leaves = responses
            .iter()
            .map(FragmentResponse::account_leaf)
            .collect::<QueryResult<Vec<_>>>()?;
        let storage_leaves = responses.iter().map(FragmentResponse::storage_leaf).collect();

        Ok(Self {
            block_tree: MerkleTree::new(block_leaves, RESPONSE_TREE_DEPTH),
            account_tree: MerkleTree::new(account_leaves, RESPONSE_TREE_DEPTH),
            storage_tree: MerkleTree::new(storage_leaves, RESPONSE_TREE_DEPTH),
            responses,
        })
    }

    pub fn responses(&self) -> &[FragmentResponse] {
        &self.responses
    }

    pub fn block_tree(&self) -> &MerkleTree {
        &self.block_tree
    }

    pub fn account_tree(&self) -> &MerkleTree {
        &self.account_tree
    }

    pub fn storage_tree(&self) -> &MerkleTree {
        &self.storage_tree
    }

    pub fn keccak_block_response(&self) -> B256 {
        self.block_tree.root()
    }

    pub fn keccak_account_response(&self) -> B256 {
        self.account_tree.root()
    }

    pub fn keccak_storage_response(&self) -> B256 {
        self.storage_tree.root()
    }

    /// `keccakQueryResponse`, the value `sendQuery` commits to.
    pub fn keccak_query_response(&self) -> B256 {
        let mut buf = [0u8; 96];
        buf[..32].copy_from_slice(self.keccak_block_response().as_slice());
        buf[32..64].copy_from_slice(self.keccak_account_response().as_slice());
        buf[64..].copy_from_slice(self.keccak_storage_response().as_slice());
        keccak256(buf)
    }
}
