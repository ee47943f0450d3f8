//! # merkle_forest
//!
//! The state-commitment layer of a blockchain node: a persistent, versioned,
//! path-compressed Merkle trie whose root hash summarizes the whole key/value
//! state at a block height.
//!
//! ## Core Concepts
//!
//! - **Forest**: retains several trie generations at once, sharing
//!   unchanged subtrees between them
//! - **Update**: applies a batch of key → value-digest diffs to one
//!   generation and yields the root of a new one
//! - **Proofs**: the node stand-ins along a key's path, enough for a remote
//!   verifier to check inclusion or exclusion against a root hash alone
//! - **Ordered trees**: positional Merkle commitments over receipts
//!
//! ## Example
//!
//! ```
//! use merkle_forest::{Forest, Hash, TrieDiff};
//!
//! let forest = Forest::new();
//! let root = forest.update(&Forest::empty_root(), &[TrieDiff::set_value(b"key".to_vec(), b"value")])?;
//! let proof = forest.get_proof(&root, b"key")?;
//! assert!(forest.verify(&root, &proof, b"key", &Hash::digest(b"value"))?);
//! # Ok::<(), merkle_forest::Error>(())
//! ```

pub mod config;
pub mod history;
pub mod model;
pub mod ordered;
pub mod trie;

mod error;

pub use config::ForestConfig;
pub use error::{Error, Result};
pub use history::{ContractStateDiff, Revision, RootHistory};
pub use model::{BitPath, Hash, TrieDiff};
pub use ordered::{ordered_root, verify_ordered, OrderedProof, OrderedTree};
pub use trie::{verify_proof, Forest, Proof, ProofNode, TrieNode, WorkingSet};
