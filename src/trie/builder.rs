//! Batched copy-on-write updates
//!
//! A [`WorkingSet`] turns one retained generation plus a batch of diffs into
//! a new generation. Nodes touched by the batch are copied into mutable
//! [`WorkNode`]s; everything else stays behind shared `Arc` handles. The
//! branch state doubles as the dirty set: only `Dirty` branches are visited
//! by the final collapse-and-rehash pass, so the work done is proportional
//! to the number of diffs times the trie depth.

use super::TrieNode;
use crate::model::{common_prefix_len, BitPath, Hash, TrieDiff};
use std::mem;
use std::sync::Arc;

/// One child slot of a node under construction
enum Branch {
    /// No child
    Empty,
    /// Untouched by this batch; its memoized hash is reused as is
    Clean(Arc<TrieNode>),
    /// Cloned or created by this batch; must be collapsed and rehashed
    Dirty(Box<WorkNode>),
}

impl Branch {
    fn from_shared(node: Option<&Arc<TrieNode>>) -> Self {
        match node {
            Some(node) => Branch::Clean(Arc::clone(node)),
            None => Branch::Empty,
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Branch::Empty)
    }
}

/// Mutable copy of a node, private to one batch
struct WorkNode {
    path: BitPath,
    value: Hash,
    left: Branch,
    right: Branch,
}

impl WorkNode {
    fn leaf(path: &[u8], value: Hash) -> Self {
        WorkNode {
            path: BitPath::from_bits_unchecked(path),
            value,
            left: Branch::Empty,
            right: Branch::Empty,
        }
    }

    /// Clone a shared node; its children stay shared
    fn from_shared(node: &TrieNode) -> Self {
        WorkNode {
            path: node.path().clone(),
            value: node.value(),
            left: Branch::from_shared(node.left()),
            right: Branch::from_shared(node.right()),
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    fn has_value(&self) -> bool {
        !self.value.is_empty_value()
    }

    fn branch_mut(&mut self, bit: u8) -> &mut Branch {
        if bit == 0 {
            &mut self.left
        } else {
            &mut self.right
        }
    }

    fn dirty_count(&self) -> usize {
        let below = |branch: &Branch| match branch {
            Branch::Dirty(child) => child.dirty_count(),
            _ => 0,
        };
        1 + below(&self.left) + below(&self.right)
    }
}

/// The mutation engine for a single `update` batch
pub struct WorkingSet {
    root: WorkNode,
    applied: usize,
}

impl WorkingSet {
    /// Start a batch on top of a retained root
    pub fn new(base: &TrieNode) -> Self {
        WorkingSet {
            root: WorkNode::from_shared(base),
            applied: 0,
        }
    }

    /// Apply one insert, overwrite or delete
    pub fn apply(&mut self, diff: &TrieDiff) {
        let path = BitPath::from_key(&diff.key);
        insert(&mut self.root, &path, diff.value);
        self.applied += 1;
    }

    /// Number of diffs applied so far
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Number of nodes copied or created by this batch so far
    pub fn dirty_count(&self) -> usize {
        self.root.dirty_count()
    }

    /// Collapse, prune and rehash the touched nodes, yielding the new root
    pub fn finish(self) -> Arc<TrieNode> {
        collapse_and_hash(self.root).unwrap_or_else(|| Arc::new(TrieNode::empty()))
    }
}

fn insert(node: &mut WorkNode, path: &[u8], value: Hash) {
    // exact match
    if node.path.as_bits() == path {
        node.value = value;
        return;
    }

    // node path is a proper prefix of the key: descend
    if path.starts_with(&node.path) {
        if !node.has_value() && node.is_leaf() {
            // a leaf holding nothing can simply take over the key
            node.path = BitPath::from_bits_unchecked(path);
            node.value = value;
            return;
        }

        let bit = path[node.path.len()];
        let rest = &path[node.path.len() + 1..];
        let slot = node.branch_mut(bit);
        match mem::replace(slot, Branch::Empty) {
            Branch::Dirty(mut child) => {
                insert(&mut child, rest, value);
                *slot = Branch::Dirty(child);
            }
            Branch::Clean(shared) => {
                let mut child = Box::new(WorkNode::from_shared(&shared));
                insert(&mut child, rest, value);
                *slot = Branch::Dirty(child);
            }
            Branch::Empty => {
                if !value.is_empty_value() {
                    *slot = Branch::Dirty(Box::new(WorkNode::leaf(rest, value)));
                }
            }
        }
        return;
    }

    // the key ends somewhere inside this node's path, or leaves it; either
    // way the key is not present, so a delete has nothing to do
    if value.is_empty_value() {
        return;
    }

    // key is a proper prefix of node path: new parent at the key
    if node.path.starts_with(path) {
        let bit = node.path[path.len()];
        let mut existing = mem::replace(node, WorkNode::leaf(path, value));
        existing.path = BitPath::from_bits_unchecked(&existing.path[path.len() + 1..]);
        *node.branch_mut(bit) = Branch::Dirty(Box::new(existing));
        return;
    }

    // divergent paths: new valueless parent at the common prefix
    let common = common_prefix_len(&node.path, path);
    let mut existing = mem::replace(node, WorkNode::leaf(&path[..common], Hash::EMPTY_VALUE));
    let existing_bit = existing.path[common];
    existing.path = BitPath::from_bits_unchecked(&existing.path[common + 1..]);
    *node.branch_mut(existing_bit) = Branch::Dirty(Box::new(existing));
    *node.branch_mut(path[common]) = Branch::Dirty(Box::new(WorkNode::leaf(&path[common + 1..], value)));
}

fn seal(branch: Branch) -> Option<Arc<TrieNode>> {
    match branch {
        Branch::Empty => None,
        Branch::Clean(node) => Some(node),
        Branch::Dirty(node) => collapse_and_hash(*node),
    }
}

fn collapse_and_hash(node: WorkNode) -> Option<Arc<TrieNode>> {
    let WorkNode {
        path,
        value,
        left,
        right,
    } = node;
    let left = seal(left);
    let right = seal(right);

    if value.is_empty_value() {
        match (left, right) {
            (None, None) => return None,
            (Some(only), None) => return Some(absorb(&path, 0, &only)),
            (None, Some(only)) => return Some(absorb(&path, 1, &only)),
            (left, right) => return Some(Arc::new(TrieNode::new(path, value, left, right))),
        }
    }

    Some(Arc::new(TrieNode::new(path, value, left, right)))
}

/// Replace a valueless single-child node by its child, extending the child's path
fn absorb(path: &[u8], bit: u8, child: &TrieNode) -> Arc<TrieNode> {
    Arc::new(TrieNode::new(
        BitPath::joined(path, bit, child.path()),
        child.value(),
        child.left().cloned(),
        child.right().cloned(),
    ))
}
