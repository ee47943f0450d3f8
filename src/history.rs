//! Rolling root revisions by block height
//!
//! Drives a [`Forest`] the way a state-storage service does: one update per
//! committed block, a bounded window of recent revisions kept queryable, and
//! older generations forgotten as the window slides.

use crate::config::ForestConfig;
use crate::model::{Hash, TrieDiff};
use crate::trie::{Forest, Proof};
use crate::{Error, Result};
use log::{debug, info};
use std::collections::VecDeque;
use std::sync::Arc;

/// State changes of one contract in one block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractStateDiff {
    pub contract: String,
    /// `(state key, new raw value)`; an empty value removes the key
    pub records: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ContractStateDiff {
    /// An empty diff for `contract`
    pub fn new(contract: impl Into<String>) -> Self {
        ContractStateDiff {
            contract: contract.into(),
            records: Vec::new(),
        }
    }

    /// Add a record (builder style)
    pub fn with_record(mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.records.push((key.into(), value.into()));
        self
    }

    /// Trie key of a contract's state key: `H(contract || key)`
    pub fn trie_key(contract: &str, key: &[u8]) -> Vec<u8> {
        Hash::digest_many(&[contract.as_bytes(), key])
            .as_bytes()
            .to_vec()
    }

    /// Hashed trie diffs, one per record
    pub fn to_trie_diffs(&self) -> Vec<TrieDiff> {
        self.records
            .iter()
            .map(|(key, value)| TrieDiff::set_value(Self::trie_key(&self.contract, key), value))
            .collect()
    }
}

/// A committed root at a block height
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Revision {
    pub height: u64,
    pub root: Hash,
}

/// A sliding window of recent revisions over a shared forest
pub struct RootHistory {
    forest: Arc<Forest>,
    retention: usize,
    /// Revisions newer than `base`, oldest first
    revisions: VecDeque<Revision>,
    /// The newest revision that has slid out of the window
    base: Revision,
}

impl RootHistory {
    /// Start at height 0 with the empty root
    pub fn new(forest: Arc<Forest>, config: &ForestConfig) -> Self {
        RootHistory {
            forest,
            retention: config.history_retention,
            revisions: VecDeque::new(),
            base: Revision {
                height: 0,
                root: Forest::empty_root(),
            },
        }
    }

    /// The shared forest holding every retained revision
    pub fn forest(&self) -> &Arc<Forest> {
        &self.forest
    }

    /// Height of the newest revision
    pub fn current_height(&self) -> u64 {
        self.current().height
    }

    /// Root of the newest revision
    pub fn current_root(&self) -> Hash {
        self.current().root
    }

    /// Oldest height whose root can still be queried
    pub fn oldest_height(&self) -> u64 {
        self.base.height
    }

    /// Commit the diffs of block `height`, which must follow the current one
    pub fn add_revision(&mut self, height: u64, diffs: &[TrieDiff]) -> Result<Hash> {
        let expected = self.current_height() + 1;
        if height != expected {
            return Err(Error::InvalidHeight {
                expected,
                found: height,
            });
        }

        let root = self.forest.update(&self.current_root(), diffs)?;
        self.revisions.push_back(Revision { height, root });
        info!("committed revision {} with root {}", height, root.short());

        self.evict();
        Ok(root)
    }

    /// Root of a retained height
    pub fn root_at(&self, height: u64) -> Result<Hash> {
        if height == self.base.height {
            return Ok(self.base.root);
        }
        self.revisions
            .iter()
            .find(|r| r.height == height)
            .map(|r| r.root)
            .ok_or(Error::HeightUnavailable {
                requested: height,
                oldest: self.oldest_height(),
                newest: self.current_height(),
            })
    }

    /// Proof for `key` at a retained height
    pub fn proof_at(&self, height: u64, key: &[u8]) -> Result<Proof> {
        let root = self.root_at(height)?;
        self.forest.get_proof(&root, key)
    }

    fn current(&self) -> Revision {
        self.revisions.back().copied().unwrap_or(self.base)
    }

    fn evict(&mut self) {
        while self.revisions.len() > self.retention {
            let Some(oldest) = self.revisions.pop_front() else {
                break;
            };
            self.forest.forget(&self.base.root);
            debug!(
                "revision {} left the window, forgot root of height {}",
                oldest.height, self.base.height
            );
            self.base = oldest;
        }
    }
}
