// src/graph/dbg.rs
//! The implicit de Bruijn graph over a Bloom filter.
//!
//! There is no adjacency structure anywhere: a vertex exists iff its k-mer's
//! hash values are present in the backing filter, and neighbours are found by
//! trial-extending each of the four bases and testing membership. Because the
//! rolling hash shifts in O(1), enumerating the at most four successors or
//! predecessors of a vertex costs a handful of table lookups per base.

use std::hash::{Hash, Hasher};

use ahash::AHashSet;

use crate::kmer::bloom::BloomFilter;
use crate::kmer::kmer::Kmer;
use crate::kmer::rolling::RollingHash;

/// Traversal direction through the graph, relative to a vertex's stored
/// orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// A graph vertex: a k-mer plus its rolling hash state.
///
/// The hash state is carried so that successor enumeration never recomputes
/// a hash from scratch. Equality and hashing use the k-mer alone; the state
/// is redundant with it by construction.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub kmer: Kmer,
    pub hash: RollingHash,
}

impl Vertex {
    pub fn new(kmer: Kmer, hash: RollingHash) -> Self {
        debug_assert_eq!(kmer.len(), hash.k());
        Vertex { kmer, hash }
    }

    /// Build a vertex from raw bases, computing the hash state.
    pub fn from_bases(window: &[u8], num_hashes: usize) -> Option<Self> {
        let kmer = Kmer::new(window)?;
        let hash = RollingHash::new(kmer.as_bytes(), num_hashes)?;
        Some(Vertex { kmer, hash })
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.kmer == other.kmer
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kmer.hash(state);
    }
}

/// Bases in neighbour iteration order.
const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// The de Bruijn graph defined by a Bloom filter of k-mers.
pub struct BloomDbg<'a> {
    filter: &'a BloomFilter,
}

impl<'a> BloomDbg<'a> {
    pub fn new(filter: &'a BloomFilter) -> Self {
        BloomDbg { filter }
    }

    #[inline]
    pub fn filter(&self) -> &BloomFilter {
        self.filter
    }

    /// Whether the vertex's k-mer is present in the backing filter.
    #[inline]
    pub fn contains(&self, v: &Vertex) -> bool {
        self.filter.contains(&v.hash.hashes())
    }

    /// Enumerate the neighbours of `v` in `dir`, in base order A < C < G < T.
    pub fn neighbours(&self, v: &Vertex, dir: Direction) -> Vec<Vertex> {
        let mut found = Vec::with_capacity(4);
        for &base in &BASES {
            let mut hash = v.hash;
            match dir {
                Direction::Forward => hash.roll_right(v.kmer.first_base(), base),
                Direction::Reverse => hash.roll_left(v.kmer.last_base(), base),
            }
            if self.filter.contains(&hash.hashes()) {
                let kmer = match dir {
                    Direction::Forward => v.kmer.shift_right(base),
                    Direction::Reverse => v.kmer.shift_left(base),
                };
                found.push(Vertex::new(kmer, hash));
            }
        }
        found
    }

    /// The neighbours of `v` in `dir` that root a true branch: at least
    /// `min_branch_len` distinct vertices reachable without revisiting `v`.
    ///
    /// Shorter branches are presumed to stem from Bloom filter false
    /// positives and are classified as tips.
    pub fn true_branches(&self, v: &Vertex, dir: Direction, min_branch_len: usize) -> Vec<Vertex> {
        let mut branches = self.neighbours(v, dir);
        branches.retain(|w| self.branch_reaches(w, v, dir, min_branch_len));
        branches
    }

    /// Bounded depth-first search: does the subgraph reachable from `root` in
    /// `dir`, never stepping onto `avoid`, contain at least `min_len`
    /// distinct vertices? The visited set never grows past `min_len`.
    fn branch_reaches(&self, root: &Vertex, avoid: &Vertex, dir: Direction, min_len: usize) -> bool {
        let mut visited: AHashSet<Vertex> = AHashSet::new();
        visited.insert(root.clone());
        if visited.len() >= min_len {
            return true;
        }
        let mut stack = vec![root.clone()];
        while let Some(v) = stack.pop() {
            for w in self.neighbours(&v, dir) {
                if &w == avoid || visited.contains(&w) {
                    continue;
                }
                visited.insert(w.clone());
                if visited.len() >= min_len {
                    return true;
                }
                stack.push(w);
            }
        }
        false
    }
}
