// src/graph/split.rs
//! Splitting paths at branching vertices.

use crate::graph::dbg::{BloomDbg, Direction};
use crate::graph::extend::Path;

/// Cut `path` at every vertex whose forward or reverse true-branch degree
/// exceeds one.
///
/// A branching vertex closes the current segment and opens the next, so
/// adjacent segments overlap by exactly that vertex. Segments of fewer than
/// two vertices are dropped. Splitting a read's path this way keeps later
/// extension from assembling across repeats.
pub fn split_path(path: &Path, dbg: &BloomDbg, min_branch_len: usize) -> Vec<Path> {
    let mut segments = Vec::new();
    let mut current = Path::new();
    for v in path {
        current.push_back(v.clone());
        let in_degree = dbg.true_branches(v, Direction::Reverse, min_branch_len).len();
        let out_degree = dbg.true_branches(v, Direction::Forward, min_branch_len).len();
        if in_degree > 1 || out_degree > 1 {
            if current.len() > 1 {
                segments.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            current.push_back(v.clone());
        }
    }
    if current.len() > 1 {
        segments.push(current);
    }
    segments
}
