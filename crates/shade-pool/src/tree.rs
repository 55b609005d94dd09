//! commitment tree
//!
//! fixed-depth append-only merkle tree of note commitments.
//!
//! nodes live in an arena: one `Vec<Hash>` per level, indexed by position,
//! grown as leaves are appended. slots that were never written stand for
//! empty subtrees and read as the precomputed `zeros[level]`, so the root
//! over unfilled capacity stays deterministic. an insert touches exactly
//! `depth` ancestors.

use std::collections::VecDeque;

use crate::config::ConfigError;
use crate::error::PoolError;
use crate::hash::{empty_leaf, hash_newtype, hash_node, Hash};
use crate::note::Commitment;

/// deepest supported tree (2^32 leaves)
pub const MAX_DEPTH: u8 = 32;

hash_newtype!(
    /// merkle root of the commitment tree
    MerkleRoot
);

/// merkle membership proof
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MerkleProof {
    /// leaf index of the commitment
    pub leaf_index: u64,
    /// sibling hashes from leaf to root
    pub siblings: Vec<Hash>,
}

impl MerkleProof {
    /// root implied by this path for the given commitment
    pub fn compute_root(&self, commitment: &Commitment) -> MerkleRoot {
        let mut current = commitment.0;
        let mut pos = self.leaf_index;

        for (level, sibling) in self.siblings.iter().enumerate() {
            current = if pos & 1 == 0 {
                hash_node(level as u8, &current, sibling)
            } else {
                hash_node(level as u8, sibling, &current)
            };
            pos >>= 1;
        }

        MerkleRoot(current)
    }

    /// verify that commitment is in a tree with the given root
    pub fn verify(&self, commitment: &Commitment, root: &MerkleRoot) -> bool {
        self.compute_root(commitment) == *root
    }
}

/// bounded window of superseded roots, oldest first
#[derive(Clone, Debug, PartialEq, Eq)]
struct RootHistory {
    roots: VecDeque<MerkleRoot>,
    capacity: usize,
}

impl RootHistory {
    fn new(capacity: usize) -> Self {
        Self {
            roots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, root: MerkleRoot) {
        if self.capacity == 0 {
            return;
        }
        if self.roots.len() == self.capacity {
            self.roots.pop_front();
        }
        self.roots.push_back(root);
    }

    fn contains(&self, root: &MerkleRoot) -> bool {
        self.roots.contains(root)
    }
}

/// append-only commitment tree with recent-root window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentTree {
    depth: u8,
    /// levels[0] holds leaves, levels[depth] holds the root once written
    levels: Vec<Vec<Hash>>,
    /// zeros[l] = root of an empty subtree of height l
    zeros: Vec<Hash>,
    history: RootHistory,
}

impl CommitmentTree {
    /// create an empty tree of the given depth that remembers the last
    /// `root_history` superseded roots
    pub fn new(depth: u8, root_history: usize) -> Result<Self, ConfigError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(ConfigError::InvalidTreeDepth(depth));
        }

        let mut zeros = Vec::with_capacity(depth as usize + 1);
        zeros.push(empty_leaf());
        for level in 0..depth {
            let below = zeros[level as usize];
            zeros.push(hash_node(level, &below, &below));
        }

        Ok(Self {
            depth,
            levels: vec![Vec::new(); depth as usize + 1],
            zeros,
            history: RootHistory::new(root_history),
        })
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// number of leaves the tree can hold
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// number of commitments inserted so far
    pub fn len(&self) -> u64 {
        self.levels[0].len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn remaining(&self) -> u64 {
        self.capacity() - self.len()
    }

    /// whether `count` more leaves fit
    pub fn can_insert(&self, count: u64) -> bool {
        self.remaining() >= count
    }

    /// commitment stored at a leaf index
    pub fn leaf(&self, index: u64) -> Option<Commitment> {
        self.levels[0].get(index as usize).copied().map(Commitment)
    }

    pub fn current_root(&self) -> MerkleRoot {
        MerkleRoot(self.node(self.depth as usize, 0))
    }

    /// true for the current root and for the last `root_history` roots it
    /// replaced
    pub fn is_recent_root(&self, root: &MerkleRoot) -> bool {
        self.current_root() == *root || self.history.contains(root)
    }

    /// superseded roots still accepted, oldest first
    pub fn recent_roots(&self) -> Vec<MerkleRoot> {
        self.history.roots.iter().copied().collect()
    }

    /// append a commitment at the next free index
    pub(crate) fn insert(&mut self, commitment: Commitment) -> Result<(u64, MerkleRoot), PoolError> {
        let index = self.len();
        if index >= self.capacity() {
            return Err(PoolError::CapacityExceeded { capacity: self.capacity() });
        }

        let previous = self.current_root();
        self.levels[0].push(commitment.0);

        let mut pos = index as usize;
        let mut current = commitment.0;
        for level in 0..self.depth as usize {
            let sibling = self.node(level, pos ^ 1);
            current = if pos & 1 == 0 {
                hash_node(level as u8, &current, &sibling)
            } else {
                hash_node(level as u8, &sibling, &current)
            };
            pos >>= 1;

            // appends are sequential, so the parent is either the last
            // written slot or the next one
            let parents = &mut self.levels[level + 1];
            if pos < parents.len() {
                parents[pos] = current;
            } else {
                parents.push(current);
            }
        }

        self.history.push(previous);
        Ok((index, self.current_root()))
    }

    /// sibling path for the leaf at `leaf_index`
    pub fn prove_membership(&self, leaf_index: u64) -> Result<MerkleProof, PoolError> {
        if leaf_index >= self.len() {
            return Err(PoolError::UnknownLeaf(leaf_index));
        }

        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut pos = leaf_index as usize;
        for level in 0..self.depth as usize {
            siblings.push(self.node(level, pos ^ 1));
            pos >>= 1;
        }

        Ok(MerkleProof { leaf_index, siblings })
    }

    fn node(&self, level: usize, pos: usize) -> Hash {
        self.levels[level]
            .get(pos)
            .copied()
            .unwrap_or(self.zeros[level])
    }
}
