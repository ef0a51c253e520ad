// src/pipeline/visualize.rs
//! GraphViz serialization of the de Bruijn graph reachable from the reads.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use ahash::AHashSet;

use crate::graph::dbg::{BloomDbg, Vertex};
use crate::graph::dot::{breadth_first_search, GraphvizVisitor};
use crate::io::fasta::{FastaConcat, FastaRecord};
use crate::kmer::bloom::BloomFilter;
use crate::kmer::kmer::reverse_complement;
use crate::kmer::screen::trim_seq;

/// Print a progress message after processing this many reads.
const PROGRESS_STEP: usize = 1000;

/// Write a GraphViz `digraph` of every vertex and edge reachable from the
/// reads in the given FASTA files.
pub fn output_graph_files<W: Write>(
    inputs: &[String],
    filter: &BloomFilter,
    out: W,
    verbose: bool,
) -> Result<(usize, usize)> {
    output_graph(FastaConcat::new(inputs), filter, out, verbose)
}

/// As [`output_graph_files`], over an arbitrary record stream.
///
/// Each read is first trimmed to its longest run of filter-positive k-mers;
/// the traversal then starts from both the trimmed read's first k-mer and
/// that of its reverse complement, so both strands' neighbourhoods appear.
/// Returns (vertices, edges) written.
pub fn output_graph<I, W>(
    records: I,
    filter: &BloomFilter,
    out: W,
    verbose: bool,
) -> Result<(usize, usize)>
where
    I: Iterator<Item = io::Result<FastaRecord>>,
    W: Write,
{
    let k = filter.kmer_size();
    let num_hashes = filter.hash_num();
    let dbg = BloomDbg::new(filter);
    let mut visited: AHashSet<Vertex> = AHashSet::new();
    let mut visitor = GraphvizVisitor::new(out).context("writing GraphViz header")?;

    if verbose {
        info!("Generating GraphViz output...");
    }

    let mut reads_processed = 0usize;
    for item in records {
        let record = item.context("reading FASTA input")?;
        let seq = trim_seq(&record.seq, filter);
        if !seq.is_empty() {
            if let Some(start) = Vertex::from_bases(&seq.as_bytes()[..k], num_hashes) {
                breadth_first_search(&dbg, start, &mut visited, &mut visitor)
                    .context("writing GraphViz output")?;
            }
            let rc = reverse_complement(seq);
            if let Some(start) = Vertex::from_bases(&rc.as_bytes()[..k], num_hashes) {
                breadth_first_search(&dbg, start, &mut visited, &mut visitor)
                    .context("writing GraphViz output")?;
            }
        }
        reads_processed += 1;
        if verbose && reads_processed % PROGRESS_STEP == 0 {
            info!(
                "processed {} reads (k-mers visited: {}, edges visited: {})",
                reads_processed,
                visitor.nodes_visited(),
                visitor.edges_visited()
            );
        }
    }

    let nodes = visitor.nodes_visited();
    let edges = visitor.edges_visited();
    visitor.finish().context("writing GraphViz footer")?;
    if verbose {
        info!(
            "processed {} reads (k-mers visited: {}, edges visited: {})",
            reads_processed, nodes, edges
        );
        info!("GraphViz generation complete");
    }
    Ok((nodes, edges))
}
