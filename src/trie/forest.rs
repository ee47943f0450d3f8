//! Versioned registry of trie generations

use super::{verify_proof, Proof, TrieNode, WorkingSet};
use crate::config::ForestConfig;
use crate::model::{BitPath, Hash, TrieDiff};
use crate::{Error, Result};
use log::{debug, trace, warn};
use parking_lot::RwLock;
use std::sync::Arc;

/// A set of retained trie generations sharing structure
///
/// Each generation is identified by its root hash. Nodes are shared between
/// generations through `Arc`, so the reachable node graph of the retained
/// roots is the content-addressed node table: a node lives as long as some
/// retained generation (or an in-flight reader) still reaches it.
///
/// Readers take the generations lock only long enough to clone a root
/// handle; `update` builds the new generation outside the lock and takes the
/// write lock once to append it.
pub struct Forest {
    /// Retained roots, oldest first
    roots: RwLock<Vec<Arc<TrieNode>>>,
    config: ForestConfig,
}

impl Forest {
    /// Create a forest holding only the empty generation
    pub fn new() -> Self {
        Self::seeded(ForestConfig::default())
    }

    /// Create a forest with custom limits, rejecting an invalid config
    pub fn with_config(config: ForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::seeded(config))
    }

    /// Root hash of a trie with no keys
    pub fn empty_root() -> Hash {
        TrieNode::empty().hash()
    }

    /// Limits this forest enforces
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Apply a batch of diffs to a retained generation, returning the new root hash
    ///
    /// The whole batch is validated before anything is built; on error no
    /// generation is appended.
    pub fn update(&self, root: &Hash, diffs: &[TrieDiff]) -> Result<Hash> {
        for diff in diffs {
            self.validate_diff(diff)?;
        }

        let base = self.find_root(root)?;
        let mut working = WorkingSet::new(&base);
        for diff in diffs {
            working.apply(diff);
        }
        trace!(
            "update from {}: {} diffs touched {} nodes",
            root.short(),
            working.applied(),
            working.dirty_count()
        );
        let new_root = working.finish();
        let hash = new_root.hash();

        let mut roots = self.roots.write();
        roots.push(new_root);
        debug!(
            "appended generation {} ({} retained)",
            hash.short(),
            roots.len()
        );
        Ok(hash)
    }

    /// Collect the stand-ins along `key`'s path from `root`
    pub fn get_proof(&self, root: &Hash, key: &[u8]) -> Result<Proof> {
        let mut current = self.find_root(root)?;
        let path = BitPath::from_key(key);
        let mut remaining: &[u8] = &path;
        let mut proof = Proof::default();
        proof.push(current.to_proof_node());

        while remaining.starts_with(current.path()) {
            remaining = &remaining[current.path().len()..];
            let Some(&bit) = remaining.first() else {
                break;
            };
            let Some(child) = current.child(bit).cloned() else {
                break;
            };
            proof.push(child.to_proof_node());
            remaining = &remaining[1..];
            current = child;
        }

        Ok(proof)
    }

    /// Check `proof` for `key` against `root`; see [`verify_proof`]
    pub fn verify(&self, root: &Hash, proof: &Proof, key: &[u8], value: &Hash) -> Result<bool> {
        let result = verify_proof(root, proof, key, value);
        if let Err(ref err) = result {
            warn!("rejected proof against {}: {}", root.short(), err);
        }
        result
    }

    /// Drop the oldest retained generation with this root hash
    ///
    /// Returns whether a generation was removed. Nodes still reachable from
    /// other generations are unaffected.
    pub fn forget(&self, root: &Hash) -> bool {
        let mut roots = self.roots.write();
        match roots.iter().position(|r| r.hash() == *root) {
            Some(index) => {
                roots.remove(index);
                debug!("forgot generation {} ({} retained)", root.short(), roots.len());
                true
            }
            None => {
                debug!("forget of unretained root {}", root.short());
                false
            }
        }
    }

    /// Look up the value digest stored under `key`
    pub fn get(&self, root: &Hash, key: &[u8]) -> Result<Option<Hash>> {
        let mut current = self.find_root(root)?;
        let path = BitPath::from_key(key);
        let mut remaining: &[u8] = &path;

        loop {
            if remaining == current.path().as_bits() {
                return Ok(Some(current.value()).filter(|v| !v.is_empty_value()));
            }
            if remaining.len() <= current.path().len() || !remaining.starts_with(current.path()) {
                return Ok(None);
            }
            let bit = remaining[current.path().len()];
            remaining = &remaining[current.path().len() + 1..];
            match current.child(bit).cloned() {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
    }

    /// All byte-aligned key/value mappings of a generation, in key order
    pub fn entries(&self, root: &Hash) -> Result<Vec<(Vec<u8>, Hash)>> {
        let root = self.find_root(root)?;
        let mut results = Vec::new();
        collect_entries(&root, Vec::new(), &mut results);
        Ok(results)
    }

    /// Whether a generation with this root hash is retained
    pub fn contains_root(&self, root: &Hash) -> bool {
        self.roots.read().iter().any(|r| r.hash() == *root)
    }

    /// Retained root hashes, oldest first
    pub fn generations(&self) -> Vec<Hash> {
        self.roots.read().iter().map(|r| r.hash()).collect()
    }

    /// Number of retained generations, duplicates included
    pub fn generation_count(&self) -> usize {
        self.roots.read().len()
    }

    /// The root node of a retained generation, for inspection
    pub fn root_node(&self, root: &Hash) -> Option<Arc<TrieNode>> {
        self.find_root(root).ok()
    }

    // === Internal helpers ===

    fn seeded(config: ForestConfig) -> Self {
        Forest {
            roots: RwLock::new(vec![Arc::new(TrieNode::empty())]),
            config,
        }
    }

    fn find_root(&self, root: &Hash) -> Result<Arc<TrieNode>> {
        let roots = self.roots.read();
        match roots.iter().rev().find(|r| r.hash() == *root) {
            Some(node) => Ok(Arc::clone(node)),
            None => {
                debug!("unknown root {}", root.short());
                Err(Error::UnknownRoot(*root))
            }
        }
    }

    fn validate_diff(&self, diff: &TrieDiff) -> Result<()> {
        if diff.key.is_empty() {
            return Err(Error::InvalidDiff("empty key".into()));
        }
        if diff.key.len() > self.config.max_key_len {
            return Err(Error::InvalidDiff(format!(
                "key of {} bytes exceeds limit of {}",
                diff.key.len(),
                self.config.max_key_len
            )));
        }
        Ok(())
    }
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_entries(node: &TrieNode, prefix: Vec<u8>, results: &mut Vec<(Vec<u8>, Hash)>) {
    let mut current = prefix;
    current.extend_from_slice(node.path());

    if node.has_value() {
        if let Some(key) = BitPath::from_bits_unchecked(&current).to_key_bytes() {
            results.push((key, node.value()));
        }
    }

    for bit in [0u8, 1] {
        if let Some(child) = node.child(bit) {
            let mut child_prefix = current.clone();
            child_prefix.push(bit);
            collect_entries(child, child_prefix, results);
        }
    }
}
