//! Bit-radix path symbols
//!
//! Keys are consumed one bit at a time, most significant bit first. A path
//! fragment is stored unpacked (one symbol per byte, each 0 or 1) so that the
//! trie can slice it at any bit offset; it is packed only for hashing.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// A sequence of path symbols, each `0` (left) or `1` (right)
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BitPath(Vec<u8>);

impl BitPath {
    /// The empty path
    pub fn new() -> Self {
        BitPath(Vec::new())
    }

    /// Expand key bytes into their bit symbols
    pub fn from_key(key: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(key.len() * 8);
        for byte in key {
            for shift in (0..8).rev() {
                bits.push((byte >> shift) & 1);
            }
        }
        BitPath(bits)
    }

    /// Build a path from already-expanded symbols
    pub fn from_bits(bits: &[u8]) -> Result<Self> {
        if let Some(bad) = bits.iter().find(|b| **b > 1) {
            return Err(Error::InvalidPath(format!("symbol {} is not a bit", bad)));
        }
        Ok(BitPath(bits.to_vec()))
    }

    /// Build a path from symbols already known to be 0 or 1
    pub(crate) fn from_bits_unchecked(bits: &[u8]) -> Self {
        BitPath(bits.to_vec())
    }

    /// `prefix || bit || suffix`, used when a valueless node absorbs its only child
    pub(crate) fn joined(prefix: &[u8], bit: u8, suffix: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(prefix.len() + 1 + suffix.len());
        bits.extend_from_slice(prefix);
        bits.push(bit);
        bits.extend_from_slice(suffix);
        BitPath(bits)
    }

    /// The raw symbols
    pub fn as_bits(&self) -> &[u8] {
        &self.0
    }

    /// Pack the symbols MSB-first, zero-padding the final byte
    pub fn packed(&self) -> Vec<u8> {
        pack_bits(&self.0)
    }

    /// Recover the original key bytes, if the path is byte aligned
    pub fn to_key_bytes(&self) -> Option<Vec<u8>> {
        if self.0.len() % 8 != 0 {
            return None;
        }
        Some(pack_bits(&self.0))
    }
}

impl Deref for BitPath {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for BitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitPath({})", self)
    }
}

fn pack_bits(bits: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        out[i / 8] |= bit << (7 - (i % 8));
    }
    out
}

/// Length of the longest shared prefix of two symbol sequences
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
