// src/graph/extend.rs
//! Paths through the implicit graph and their extension.
//!
//! A path is a run of vertices in which each consecutive pair overlaps by
//! k-1 bases. Extension pushes a path outwards in both directions until it
//! meets a dead end, a genuine branching point, or its own trail (a cycle).
//! Single candidates are followed directly; when a vertex has several
//! candidate neighbours the branch-length classifier decides which, if any,
//! is real and which are Bloom filter false-positive tips.

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::graph::dbg::{BloomDbg, Direction, Vertex};
use crate::kmer::kmer::Kmer;
use crate::kmer::rolling::RollingHashIterator;

/// An ordered run of overlapping vertices.
pub type Path = VecDeque<Vertex>;

/// Translate a DNA sequence to its path in the de Bruijn graph.
///
/// Returns `None` when the sequence is shorter than k or its k-mer stream is
/// broken by a non-ACGT character; a broken stream has no single path.
pub fn seq_to_path(seq: &str, k: usize, num_hashes: usize) -> Option<Path> {
    let bytes = seq.as_bytes();
    if bytes.len() < k {
        return None;
    }
    let mut path = Path::new();
    let mut expected = 0usize;
    for (pos, hash) in RollingHashIterator::new(bytes, k, num_hashes) {
        if pos != expected {
            return None;
        }
        let kmer = Kmer::new(&bytes[pos..pos + k])?;
        path.push_back(Vertex::new(kmer, hash));
        expected = pos + 1;
    }
    if expected != bytes.len() - k + 1 {
        return None;
    }
    Some(path)
}

/// Translate a path back to its DNA sequence: the first k-mer in full, then
/// the last base of each subsequent k-mer.
pub fn path_to_seq(path: &Path) -> String {
    debug_assert!(!path.is_empty());
    let mut seq = String::new();
    let mut vertices = path.iter();
    if let Some(first) = vertices.next() {
        seq.reserve(first.kmer.len() + path.len() - 1);
        seq.push_str(&first.kmer.to_string());
        for v in vertices {
            seq.push(v.kmer.last_base() as char);
        }
    }
    seq
}

/// Extend `path` in both directions until each end is closed off by a dead
/// end, a true branching point, or a cycle.
///
/// Each side is first chopped back by up to `min_branch_len` vertices and
/// re-grown, so that a terminal region that had run into a false-positive
/// dead end gets another chance to cross it. A side whose re-growth comes up
/// shorter than what was chopped is restored from the original vertices:
/// extension never shrinks a path. Each direction keeps its own visited
/// trail, which makes the final contig invariant under reverse-complementing
/// the input read.
pub fn extend_path(path: &mut Path, dbg: &BloomDbg, min_branch_len: usize) {
    if path.is_empty() {
        return;
    }

    // right side
    let chop = (path.len() - 1).min(min_branch_len);
    let saved_tail = path.split_off(path.len() - chop);
    let base_len = path.len();
    let mut visited: AHashSet<Vertex> = AHashSet::new();
    extend_dir(path, dbg, Direction::Forward, &mut visited, min_branch_len);
    if path.len() - base_len < saved_tail.len() {
        path.truncate(base_len);
        path.extend(saved_tail);
    }

    // left side
    let chop = (path.len() - 1).min(min_branch_len);
    let saved_head: Vec<Vertex> = path.drain(..chop).collect();
    let base_len = path.len();
    let mut visited: AHashSet<Vertex> = AHashSet::new();
    extend_dir(path, dbg, Direction::Reverse, &mut visited, min_branch_len);
    if path.len() - base_len < saved_head.len() {
        while path.len() > base_len {
            path.pop_front();
        }
        for v in saved_head.into_iter().rev() {
            path.push_front(v);
        }
    }
}

/// Grow one end of the path a vertex at a time.
fn extend_dir(
    path: &mut Path,
    dbg: &BloomDbg,
    dir: Direction,
    visited: &mut AHashSet<Vertex>,
    min_branch_len: usize,
) {
    let tip = match dir {
        Direction::Forward => path.back(),
        Direction::Reverse => path.front(),
    };
    let Some(tip) = tip else { return };
    visited.insert(tip.clone());

    loop {
        let current = match dir {
            Direction::Forward => path.back(),
            Direction::Reverse => path.front(),
        };
        let Some(current) = current.cloned() else { return };

        let candidates = dbg.neighbours(&current, dir);
        let next = match candidates.len() {
            // dead end
            0 => return,
            1 => candidates.into_iter().next(),
            _ => {
                let mut branches = dbg.true_branches(&current, dir, min_branch_len);
                match branches.len() {
                    // every candidate is a false-positive tip
                    0 => return,
                    1 => branches.pop(),
                    // genuine branching point
                    _ => return,
                }
            }
        };
        let Some(next) = next else { return };

        if visited.contains(&next) {
            // cycle closed
            return;
        }
        visited.insert(next.clone());
        match dir {
            Direction::Forward => path.push_back(next),
            Direction::Reverse => path.push_front(next),
        }
    }
}
