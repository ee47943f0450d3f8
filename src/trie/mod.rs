//! Versioned, path-compressed Merkle trie
//!
//! This implements a content-addressed bit-radix trie where:
//! - Each node's hash covers its path, value and both children's hashes
//! - Unchanged subtrees are shared across generations
//! - The root hash uniquely identifies the whole key/value state

mod builder;
mod forest;
mod node;
mod proof;

pub use builder::WorkingSet;
pub use forest::Forest;
pub use node::TrieNode;
pub use proof::{verify_proof, Proof, ProofNode};
