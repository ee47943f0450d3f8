//! Key/value changes applied to a trie generation

use super::Hash;
use serde::{Deserialize, Serialize};

/// One change to apply in a batch update
///
/// A `value` equal to [`Hash::EMPTY_VALUE`] deletes the key; anything else
/// inserts or overwrites it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieDiff {
    /// Full key bytes
    pub key: Vec<u8>,
    /// Digest of the new value
    pub value: Hash,
}

impl TrieDiff {
    /// Set `key` to an already-hashed value
    pub fn set(key: impl Into<Vec<u8>>, value: Hash) -> Self {
        TrieDiff {
            key: key.into(),
            value,
        }
    }

    /// Set `key` to the digest of `value`
    pub fn set_value(key: impl Into<Vec<u8>>, value: &[u8]) -> Self {
        Self::set(key, Hash::digest(value))
    }

    /// Remove `key`
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::set(key, Hash::EMPTY_VALUE)
    }

    /// Whether this diff removes the key
    pub fn is_delete(&self) -> bool {
        self.value.is_empty_value()
    }
}
