//! Ordered Merkle tree over a block's receipts
//!
//! Leaves keep their position; each level pairs neighbours and hashes the
//! pair in sorted order, so a proof is just the list of sibling digests.
//! An unpaired last node is promoted to the next level unchanged.

use crate::model::Hash;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sibling digests from the level under the root down to the leaf's level
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedProof(pub Vec<Hash>);

/// A complete binary Merkle tree over an ordered list of digests
pub struct OrderedTree {
    /// levels[0] are the leaves, the last level holds only the root
    levels: Vec<Vec<Hash>>,
}

impl OrderedTree {
    /// Build every level over `values`, keeping their order
    pub fn new(values: &[Hash]) -> Self {
        let mut levels = vec![values.to_vec()];
        while levels.last().map_or(false, |level| level.len() > 1) {
            let next = levels.last().map(|level| collapse_level(level)).unwrap_or_default();
            levels.push(next);
        }
        OrderedTree { levels }
    }

    /// Root digest; [`Hash::ZERO`] for an empty tree
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash::ZERO)
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// Whether the tree has no leaves
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Sibling digests proving the leaf at `index`
    pub fn get_proof(&self, index: usize) -> Result<OrderedProof> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }

        let mut siblings = Vec::with_capacity(self.levels.len());
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            if let Some(sibling) = level.get(position ^ 1) {
                siblings.push(*sibling);
            }
            position /= 2;
        }
        siblings.reverse();
        Ok(OrderedProof(siblings))
    }
}

/// Root of the ordered tree over `values` without keeping the levels
pub fn ordered_root(values: &[Hash]) -> Hash {
    OrderedTree::new(values).root()
}

/// Check that `value` is a leaf of the tree committed to by `root`
pub fn verify_ordered(value: &Hash, proof: &OrderedProof, root: &Hash) -> Result<()> {
    let computed = proof
        .0
        .iter()
        .rev()
        .fold(*value, |current, sibling| hash_pair(&current, sibling));
    if computed != *root {
        return Err(Error::OrderedProofMismatch);
    }
    Ok(())
}

fn collapse_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(left, right),
            [single] => *single,
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    if a > b {
        Hash::digest_many(&[b.as_bytes(), a.as_bytes()])
    } else {
        Hash::digest_many(&[a.as_bytes(), b.as_bytes()])
    }
}
