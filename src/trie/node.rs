//! Trie node types

use super::ProofNode;
use crate::model::{BitPath, Hash};
use std::sync::Arc;

/// An immutable node of the bit-radix trie
///
/// - `path` is the run of key bits consumed at this node, relative to the
///   branch bit that selected it from its parent
/// - `value` is [`Hash::EMPTY_VALUE`] when no key ends here
/// - children are shared between generations, so a node is never mutated
///   once built; its hash is computed in the constructor
#[derive(Debug)]
pub struct TrieNode {
    path: BitPath,
    value: Hash,
    left: Option<Arc<TrieNode>>,
    right: Option<Arc<TrieNode>>,
    hash: Hash,
}

impl TrieNode {
    /// Build a node and memoize its hash
    pub fn new(
        path: BitPath,
        value: Hash,
        left: Option<Arc<TrieNode>>,
        right: Option<Arc<TrieNode>>,
    ) -> Self {
        let hash = node_hash(&path, &value, &child_hash(&left), &child_hash(&right));
        TrieNode {
            path,
            value,
            left,
            right,
            hash,
        }
    }

    /// Create a childless node
    pub fn leaf(path: BitPath, value: Hash) -> Self {
        Self::new(path, value, None, None)
    }

    /// The canonical root of a trie holding no keys
    pub fn empty() -> Self {
        Self::leaf(BitPath::new(), Hash::EMPTY_VALUE)
    }

    /// Path fragment consumed at this node
    pub fn path(&self) -> &BitPath {
        &self.path
    }

    /// Value digest, or [`Hash::EMPTY_VALUE`]
    pub fn value(&self) -> Hash {
        self.value
    }

    /// Memoized node hash
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Child under bit 0
    pub fn left(&self) -> Option<&Arc<TrieNode>> {
        self.left.as_ref()
    }

    /// Child under bit 1
    pub fn right(&self) -> Option<&Arc<TrieNode>> {
        self.right.as_ref()
    }

    /// The child selected by a branch bit (0 = left, anything else = right)
    pub fn child(&self, bit: u8) -> Option<&Arc<TrieNode>> {
        if bit == 0 {
            self.left.as_ref()
        } else {
            self.right.as_ref()
        }
    }

    /// Whether the node has no children
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Whether a key ends at this node
    pub fn has_value(&self) -> bool {
        !self.value.is_empty_value()
    }

    /// The hash-replay stand-in for this node
    pub fn to_proof_node(&self) -> ProofNode {
        ProofNode {
            path: self.path.clone(),
            value: self.value,
            left: child_hash(&self.left),
            right: child_hash(&self.right),
        }
    }
}

/// `H(u32_be(path bits) || packed path || value || left || right)`
///
/// Absent children are passed as [`Hash::ZERO`]. Path lengths are bounded by
/// `ForestConfig::validate`, so the bit count always fits the `u32` prefix.
pub(crate) fn node_hash(path: &BitPath, value: &Hash, left: &Hash, right: &Hash) -> Hash {
    let path_len = (path.len() as u32).to_be_bytes();
    let packed = path.packed();
    Hash::digest_many(&[
        &path_len,
        &packed,
        value.as_bytes(),
        left.as_bytes(),
        right.as_bytes(),
    ])
}

fn child_hash(child: &Option<Arc<TrieNode>>) -> Hash {
    child.as_ref().map_or(Hash::ZERO, |n| n.hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> BitPath {
        let symbols: Vec<u8> = s.bytes().map(|b| b - b'0').collect();
        BitPath::from_bits(&symbols).unwrap()
    }

    #[test]
    fn test_node_hash_deterministic() {
        let n1 = TrieNode::leaf(bits("0101"), Hash::digest(b"value"));
        let n2 = TrieNode::leaf(bits("0101"), Hash::digest(b"value"));
        assert_eq!(n1.hash(), n2.hash());
    }

    #[test]
    fn test_different_nodes_different_hashes() {
        let n1 = TrieNode::leaf(bits("0101"), Hash::digest(b"value"));
        let n2 = TrieNode::leaf(bits("0100"), Hash::digest(b"value"));
        let n3 = TrieNode::leaf(bits("0101"), Hash::digest(b"other"));
        assert_ne!(n1.hash(), n2.hash());
        assert_ne!(n1.hash(), n3.hash());
    }

    #[test]
    fn test_path_length_is_hashed() {
        // "01" and "010" pack to the same byte
        let n1 = TrieNode::leaf(bits("01"), Hash::digest(b"v"));
        let n2 = TrieNode::leaf(bits("010"), Hash::digest(b"v"));
        assert_eq!(n1.path().packed(), n2.path().packed());
        assert_ne!(n1.hash(), n2.hash());
    }

    #[test]
    fn test_child_side_is_hashed() {
        let child = Arc::new(TrieNode::leaf(bits("1"), Hash::digest(b"v")));
        let as_left = TrieNode::new(bits(""), Hash::EMPTY_VALUE, Some(child.clone()), None);
        let as_right = TrieNode::new(bits(""), Hash::EMPTY_VALUE, None, Some(child));
        assert_ne!(as_left.hash(), as_right.hash());
    }

    #[test]
    fn test_proof_node_rehashes_to_node_hash() {
        let left = Arc::new(TrieNode::leaf(bits("11"), Hash::digest(b"l")));
        let right = Arc::new(TrieNode::leaf(bits("0"), Hash::digest(b"r")));
        let node = TrieNode::new(bits("10"), Hash::EMPTY_VALUE, Some(left), Some(right));
        assert_eq!(node.to_proof_node().hash(), node.hash());

        let leaf = TrieNode::empty();
        let stand_in = leaf.to_proof_node();
        assert_eq!(stand_in.left, Hash::ZERO);
        assert_eq!(stand_in.hash(), leaf.hash());
    }

    #[test]
    fn test_empty_node() {
        let empty = TrieNode::empty();
        assert!(empty.is_leaf());
        assert!(!empty.has_value());
        assert!(empty.path().is_empty());
        assert_eq!(empty.hash(), TrieNode::empty().hash());
    }
}
