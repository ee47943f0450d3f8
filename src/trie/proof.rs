//! Inclusion and exclusion proofs
//!
//! A proof is the list of node stand-ins visited while following a key from
//! the root. Each stand-in carries exactly the fields that enter the node
//! hash, so a verifier can replay the hash chain without the trie.

use super::node::node_hash;
use crate::model::{BitPath, Hash};
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// The hashed fields of one trie node, with children reduced to their hashes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    pub path: BitPath,
    pub value: Hash,
    /// Hash of the left child, or [`Hash::ZERO`]
    pub left: Hash,
    /// Hash of the right child, or [`Hash::ZERO`]
    pub right: Hash,
}

impl ProofNode {
    /// Recompute the hash of the node this stands in for
    pub fn hash(&self) -> Hash {
        node_hash(&self.path, &self.value, &self.left, &self.right)
    }

    /// Child hash selected by a branch bit
    pub fn branch(&self, bit: u8) -> Hash {
        if bit == 0 {
            self.left
        } else {
            self.right
        }
    }

    /// Whether a key ends at this node
    pub fn has_value(&self) -> bool {
        !self.value.is_empty_value()
    }
}

/// Ordered node stand-ins from the queried root down to the terminal node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    nodes: Vec<ProofNode>,
}

impl Proof {
    /// Wrap stand-ins received from elsewhere
    pub fn new(nodes: Vec<ProofNode>) -> Self {
        Proof { nodes }
    }

    /// The stand-ins, root first
    pub fn nodes(&self) -> &[ProofNode] {
        &self.nodes
    }

    /// Iterate over the stand-ins, root first
    pub fn iter(&self) -> impl Iterator<Item = &ProofNode> {
        self.nodes.iter()
    }

    /// Number of stand-ins, which is the depth reached
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the proof holds no stand-ins
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append the next stand-in down the path
    pub(crate) fn push(&mut self, node: ProofNode) {
        self.nodes.push(node);
    }
}

/// Check a proof for `key` against `root`
///
/// Returns `Ok(true)` when the proof shows `key` holding `value` (or, for
/// `value == Hash::EMPTY_VALUE`, shows `key` absent) and `Ok(false)` when it
/// shows otherwise. A hash chain that does not replay, a proof that ends
/// before reaching a decision, or one with entries past the node that decides
/// it, is an error rather than `false`.
pub fn verify_proof(root: &Hash, proof: &Proof, key: &[u8], value: &Hash) -> Result<bool> {
    let full_path = BitPath::from_key(key);
    let mut remaining: &[u8] = &full_path;
    let mut expected = *root;

    for (index, node) in proof.iter().enumerate() {
        if node.hash() != expected {
            debug!("proof for root {} breaks at node {}", root.short(), index);
            return Err(Error::MalformedProof {
                index,
                reason: format!("expected hash {}, computed {}", expected, node.hash()),
            });
        }

        if remaining == node.path.as_bits() {
            return decided(proof, index, node.value == *value);
        }
        if remaining.len() <= node.path.len() || !remaining.starts_with(&node.path) {
            return decided(proof, index, value.is_empty_value());
        }

        let bit = remaining[node.path.len()];
        expected = node.branch(bit);
        remaining = &remaining[node.path.len() + 1..];

        if expected.is_zero() {
            return decided(proof, index, value.is_empty_value());
        }
    }

    Err(Error::MalformedProof {
        index: proof.len(),
        reason: "proof ends before the key is resolved".to_string(),
    })
}

/// The terminal node must be the last entry of the proof
fn decided(proof: &Proof, index: usize, outcome: bool) -> Result<bool> {
    if index + 1 != proof.len() {
        return Err(Error::MalformedProof {
            index: index + 1,
            reason: "entries past the terminal node".to_string(),
        });
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::TrieNode;
    use std::sync::Arc;

    fn bits(s: &str) -> BitPath {
        let symbols: Vec<u8> = s.bytes().map(|b| b - b'0').collect();
        BitPath::from_bits(&symbols).unwrap()
    }

    /// root "0000" holding "a", right child "111" holding "b" (key 0x0f)
    fn two_node_trie() -> (Arc<TrieNode>, Arc<TrieNode>) {
        let child = Arc::new(TrieNode::leaf(bits("111"), Hash::digest(b"b")));
        let root = Arc::new(TrieNode::new(
            bits("0000"),
            Hash::digest(b"a"),
            None,
            Some(child.clone()),
        ));
        (root, child)
    }

    #[test]
    fn test_single_leaf_inclusion() {
        let leaf = TrieNode::leaf(BitPath::from_key(&[0x42]), Hash::digest(b"v"));
        let proof = Proof::new(vec![leaf.to_proof_node()]);

        assert!(verify_proof(&leaf.hash(), &proof, &[0x42], &Hash::digest(b"v")).unwrap());
        assert!(!verify_proof(&leaf.hash(), &proof, &[0x42], &Hash::digest(b"w")).unwrap());
        assert!(!verify_proof(&leaf.hash(), &proof, &[0x42], &Hash::EMPTY_VALUE).unwrap());
    }

    #[test]
    fn test_descend_into_child() {
        let (root, child) = two_node_trie();
        let proof = Proof::new(vec![root.to_proof_node(), child.to_proof_node()]);

        // 0000 1 111 = 0x0f
        assert!(verify_proof(&root.hash(), &proof, &[0x0f], &Hash::digest(b"b")).unwrap());
        // 0000 1 110 diverges inside the child path
        assert!(verify_proof(&root.hash(), &proof, &[0x0e], &Hash::EMPTY_VALUE).unwrap());
        assert!(!verify_proof(&root.hash(), &proof, &[0x0e], &Hash::digest(b"b")).unwrap());
    }

    #[test]
    fn test_missing_branch_is_exclusion() {
        let (root, _) = two_node_trie();
        let proof = Proof::new(vec![root.to_proof_node()]);

        // 0000 0 ... selects the absent left branch
        assert!(verify_proof(&root.hash(), &proof, &[0x07], &Hash::EMPTY_VALUE).unwrap());
        assert!(!verify_proof(&root.hash(), &proof, &[0x07], &Hash::digest(b"x")).unwrap());
    }

    #[test]
    fn test_tampered_value_is_malformed() {
        let (root, child) = two_node_trie();
        let mut forged = child.to_proof_node();
        forged.value = Hash::digest(b"forged");
        let proof = Proof::new(vec![root.to_proof_node(), forged]);

        let err = verify_proof(&root.hash(), &proof, &[0x0f], &Hash::digest(b"forged"));
        assert!(matches!(err, Err(Error::MalformedProof { index: 1, .. })));
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let (root, _) = two_node_trie();
        let proof = Proof::new(vec![root.to_proof_node()]);
        let err = verify_proof(&Hash::digest(b"other"), &proof, &[0x0f], &Hash::EMPTY_VALUE);
        assert!(matches!(err, Err(Error::MalformedProof { index: 0, .. })));
    }

    #[test]
    fn test_trailing_entries_are_malformed() {
        // keys 0x01 and 0x81 split at the first bit
        let left = Arc::new(TrieNode::leaf(bits("0000001"), Hash::digest(b"a")));
        let right = Arc::new(TrieNode::leaf(bits("0000001"), Hash::digest(b"b")));
        let root = TrieNode::new(BitPath::new(), Hash::EMPTY_VALUE, Some(left.clone()), Some(right));
        let junk = TrieNode::leaf(bits("1"), Hash::digest(b"junk")).to_proof_node();

        let genuine = Proof::new(vec![root.to_proof_node(), left.to_proof_node()]);
        assert!(verify_proof(&root.hash(), &genuine, &[0x01], &Hash::digest(b"a")).unwrap());
        let mut padded = genuine.clone();
        padded.push(junk.clone());
        let err = verify_proof(&root.hash(), &padded, &[0x01], &Hash::digest(b"a"));
        assert!(matches!(err, Err(Error::MalformedProof { index: 2, .. })));

        // 0x41 = 0 1000001 diverges inside the left leaf's path
        assert!(verify_proof(&root.hash(), &genuine, &[0x41], &Hash::EMPTY_VALUE).unwrap());
        let err = verify_proof(&root.hash(), &padded, &[0x41], &Hash::EMPTY_VALUE);
        assert!(matches!(err, Err(Error::MalformedProof { index: 2, .. })));

        // decided at the root by an absent branch
        let (lone_root, _) = two_node_trie();
        let mut padded = Proof::new(vec![lone_root.to_proof_node()]);
        padded.push(junk);
        let err = verify_proof(&lone_root.hash(), &padded, &[0x07], &Hash::EMPTY_VALUE);
        assert!(matches!(err, Err(Error::MalformedProof { index: 1, .. })));
    }

    #[test]
    fn test_truncated_proof_is_malformed() {
        let (root, _) = two_node_trie();
        let proof = Proof::new(vec![root.to_proof_node()]);
        let err = verify_proof(&root.hash(), &proof, &[0x0f], &Hash::digest(b"b"));
        assert!(matches!(err, Err(Error::MalformedProof { index: 1, .. })));

        let empty = Proof::default();
        assert!(verify_proof(&root.hash(), &empty, &[0x0f], &Hash::EMPTY_VALUE).is_err());
    }
}
