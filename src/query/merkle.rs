//! Fixed-depth keccak Merkle trees.
//!
//! Leaves are padded with `B256::ZERO` up to `2^depth`; parents are
//! `keccak256(left || right)`.

use alloy::primitives::{keccak256, B256};

/// Depth of every response tree.
pub const RESPONSE_TREE_DEPTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `layers[0]` holds the padded leaves, the last layer holds the root.
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Build a tree of `depth` over `leaves`, which must fit in `2^depth`.
    pub fn new(mut leaves: Vec<B256>, depth: usize) -> Self {
        let width = 1usize << depth;
        debug_assert!(leaves.len() <= width);
        leaves.resize(width, B256::ZERO);

        let mut layers = Vec::with_capacity(depth + 1);
        layers.push(leaves);
        for _ in 0..depth {
            let parents = layers[layers.len() - 1]
                .chunks_exact(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
            layers.push(parents);
        }

        Self { layers }
    }

    pub fn root(&self) -> B256 {
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaf(&self, index: usize) -> Option<B256> {
        self.layers[0].get(index).copied()
    }

    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Sibling hashes from the leaf up to (not including) the root.
    pub fn proof(&self, index: usize) -> Option<Vec<B256>> {
        if index >= self.layers[0].len() {
            return None;
        }
        let mut idx = index;
        let proof = self.layers[..self.depth()]
            .iter()
            .map(|layer| {
                let sibling = layer[idx ^ 1];
                idx >>= 1;
                sibling
            })
            .collect();
        Some(proof)
    }

    /// Check that `leaf` sits at `index` under `root`.
    pub fn verify(leaf: B256, index: usize, proof: &[B256], root: B256) -> bool {
        let mut idx = index;
        let computed = proof.iter().fold(leaf, |node, sibling| {
            let parent = if idx & 1 == 0 {
                hash_pair(&node, sibling)
            } else {
                hash_pair(sibling, &node)
            };
            idx >>= 1;
            parent
        });
        idx == 0 && computed == root
    }
}

fn hash_pair(left: &B256, right: &B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}
