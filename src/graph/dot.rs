// src/graph/dot.rs
//! Breadth-first traversal and GraphViz serialization.

use std::collections::VecDeque;
use std::io::{self, Write};

use ahash::AHashSet;

use crate::graph::dbg::{BloomDbg, Direction, Vertex};

/// Hooks invoked during a breadth-first traversal of the implicit graph.
pub trait BfsVisitor {
    /// Invoked when a vertex is visited for the first time.
    fn discover_vertex(&mut self, v: &Vertex) -> io::Result<()>;

    /// Invoked once per traversed edge.
    fn examine_edge(&mut self, u: &Vertex, v: &Vertex) -> io::Result<()>;
}

/// Breadth-first traversal from `start` along forward edges.
///
/// `visited` is shared across calls so that repeated traversals (one per
/// read, say) never re-emit a vertex.
pub fn breadth_first_search<V: BfsVisitor>(
    dbg: &BloomDbg,
    start: Vertex,
    visited: &mut AHashSet<Vertex>,
    visitor: &mut V,
) -> io::Result<()> {
    if !visited.insert(start.clone()) {
        return Ok(());
    }
    visitor.discover_vertex(&start)?;
    let mut queue = VecDeque::new();
    queue.push_back(start);
    while let Some(u) = queue.pop_front() {
        for w in dbg.neighbours(&u, Direction::Forward) {
            visitor.examine_edge(&u, &w)?;
            if visited.insert(w.clone()) {
                visitor.discover_vertex(&w)?;
                queue.push_back(w);
            }
        }
    }
    Ok(())
}

/// Visitor that serializes the traversal as a GraphViz `digraph`.
pub struct GraphvizVisitor<W: Write> {
    out: W,
    nodes_visited: usize,
    edges_visited: usize,
}

impl<W: Write> GraphvizVisitor<W> {
    /// Open the digraph block.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "digraph g {{")?;
        Ok(GraphvizVisitor { out, nodes_visited: 0, edges_visited: 0 })
    }

    /// Close the digraph block and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        writeln!(self.out, "}}")?;
        Ok(self.out)
    }

    /// Number of distinct vertices discovered.
    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited
    }

    /// Number of edges traversed.
    pub fn edges_visited(&self) -> usize {
        self.edges_visited
    }
}

impl<W: Write> BfsVisitor for GraphvizVisitor<W> {
    fn discover_vertex(&mut self, v: &Vertex) -> io::Result<()> {
        self.nodes_visited += 1;
        writeln!(self.out, "\t{};", v.kmer)
    }

    fn examine_edge(&mut self, u: &Vertex, v: &Vertex) -> io::Result<()> {
        self.edges_visited += 1;
        writeln!(self.out, "\t{} -> {};", u.kmer, v.kmer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::bloom::BloomFilter;
    use crate::kmer::screen::add_kmers_to_filter;

    #[test]
    fn test_graphviz_output_shape() {
        let filter = BloomFilter::new(4096, 1, 4);
        add_kmers_to_filter("ACGGTCAG", &filter);
        let dbg = BloomDbg::new(&filter);

        let mut visited = AHashSet::new();
        let mut visitor = GraphvizVisitor::new(Vec::new()).unwrap();
        let start = Vertex::from_bases(b"ACGG", 1).unwrap();
        breadth_first_search(&dbg, start, &mut visited, &mut visitor).unwrap();

        let nodes = visitor.nodes_visited();
        let out = visitor.finish().unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("digraph g {\n"));
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\tACGG;"));
        assert!(text.contains("\tACGG -> CGGT;"));
        // ACGGTCAG has five k-mers, all reachable from the first
        assert_eq!(nodes, 5);
    }

    #[test]
    fn test_traversal_skips_visited_starts() {
        let filter = BloomFilter::new(4096, 1, 4);
        add_kmers_to_filter("ACGGTCAG", &filter);
        let dbg = BloomDbg::new(&filter);

        let mut visited = AHashSet::new();
        let mut visitor = GraphvizVisitor::new(Vec::new()).unwrap();
        let start = Vertex::from_bases(b"ACGG", 1).unwrap();
        breadth_first_search(&dbg, start.clone(), &mut visited, &mut visitor).unwrap();
        let after_first = visitor.nodes_visited();
        breadth_first_search(&dbg, start, &mut visited, &mut visitor).unwrap();
        assert_eq!(visitor.nodes_visited(), after_first);
    }
}
