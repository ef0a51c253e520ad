// src/pipeline/assemble.rs
//! The read-driven assembly loop.
//!
//! Contigs are generated by converting each read to a path in the implicit
//! graph, splitting the path at genuine branching points, extending the
//! terminal segments, and emitting anything whose k-mers have not already
//! been assembled. Reads are processed by parallel workers; the only
//! serialised regions are the pull from the input stream and the
//! emit-plus-dedupe commit on the output side.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use rayon::iter::{ParallelBridge, ParallelIterator};
use tracing::info;

use crate::graph::dbg::BloomDbg;
use crate::graph::extend::{extend_path, path_to_seq, seq_to_path};
use crate::graph::split::split_path;
use crate::io::fasta::{FastaConcat, FastaRecord, FastaWriter};
use crate::kmer::bloom::BloomFilter;
use crate::kmer::screen::{add_kmers_to_filter, all_kmers_in_filter};

/// Print a progress message after processing this many reads.
const PROGRESS_STEP: usize = 1000;

/// Assembly configuration.
pub struct AssembleOpts {
    pub k: usize,
    pub num_hashes: usize,
    /// Approximate genome size in bp; sizes the assembled-k-mer filter.
    pub genome_size: usize,
    pub verbose: bool,
}

/// Totals reported when assembly completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblySummary {
    pub reads_processed: usize,
    pub reads_extended: usize,
    pub bases_assembled: usize,
    pub contigs: usize,
}

/// Counters tracking assembly progress, updated atomically by the workers.
#[derive(Default)]
struct AssemblyCounters {
    reads_extended: AtomicUsize,
    reads_processed: AtomicUsize,
    bases_assembled: AtomicUsize,
}

impl AssemblyCounters {
    fn progress_message(&self) {
        let extended = self.reads_extended.load(Ordering::Relaxed);
        let processed = self.reads_processed.load(Ordering::Relaxed);
        let bases = self.bases_assembled.load(Ordering::Relaxed);
        let percent = if processed > 0 {
            100.0 * extended as f64 / processed as f64
        } else {
            0.0
        };
        info!(
            "Extended {} of {} reads ({:.1}%), assembled {} bp so far",
            extended, processed, percent, bases
        );
    }
}

/// Output-side state mutated only inside the "out" critical section.
struct OutputState<'a, W: Write> {
    writer: &'a mut FastaWriter<W>,
    contig_id: usize,
    error: Option<io::Error>,
}

/// Assemble all reads from the given FASTA files.
pub fn assemble_files<W: Write + Send>(
    inputs: &[String],
    good: &BloomFilter,
    opts: &AssembleOpts,
    writer: &mut FastaWriter<W>,
) -> Result<AssemblySummary> {
    assemble_stream(FastaConcat::new(inputs), good, opts, writer)
}

/// Assemble a stream of reads into contigs written to `writer`.
///
/// The good-k-mer filter is read-only; its parameters must match the
/// configuration. The stream is consumed by parallel workers, so contig IDs
/// follow emission order, not input order.
pub fn assemble_stream<I, W>(
    records: I,
    good: &BloomFilter,
    opts: &AssembleOpts,
    writer: &mut FastaWriter<W>,
) -> Result<AssemblySummary>
where
    I: Iterator<Item = io::Result<FastaRecord>> + Send,
    W: Write + Send,
{
    if good.kmer_size() != opts.k || good.hash_num() != opts.num_hashes {
        bail!(
            "good k-mer filter was built with k={}, {} hashes, but the configuration says k={}, {} hashes",
            good.kmer_size(),
            good.hash_num(),
            opts.k,
            opts.num_hashes
        );
    }

    let min_branch_len = opts.k + 1;
    if opts.verbose {
        info!(
            "Treating branches shorter than {} k-mers as Bloom filter false positives",
            min_branch_len
        );
    }

    // k-mers of previously assembled contigs
    let assembled = BloomFilter::new(opts.genome_size, opts.num_hashes, opts.k);
    let graph = BloomDbg::new(good);
    let counters = AssemblyCounters::default();
    let out = Mutex::new(OutputState { writer, contig_id: 0, error: None });
    let read_error: Mutex<Option<io::Error>> = Mutex::new(None);

    let records = records.map_while(|item| match item {
        Ok(record) => Some(record),
        Err(e) => {
            *read_error.lock().unwrap() = Some(e);
            None
        }
    });
    records.par_bridge().for_each(|record: FastaRecord| {
        process_read(&record, &graph, &assembled, opts, min_branch_len, &counters, &out);
    });

    if let Some(e) = read_error.into_inner().unwrap() {
        return Err(e).context("reading FASTA input");
    }
    let out = out.into_inner().unwrap();
    if let Some(e) = out.error {
        return Err(e).context("writing contigs");
    }
    out.writer.flush().context("flushing contig output")?;

    if opts.verbose {
        counters.progress_message();
        info!("Assembly complete");
    }
    Ok(AssemblySummary {
        reads_processed: counters.reads_processed.load(Ordering::Relaxed),
        reads_extended: counters.reads_extended.load(Ordering::Relaxed),
        bases_assembled: counters.bases_assembled.load(Ordering::Relaxed),
        contigs: out.contig_id,
    })
}

/// Process one read: screen it, walk it through the graph, emit new contigs.
fn process_read<W: Write>(
    record: &FastaRecord,
    graph: &BloomDbg,
    assembled: &BloomFilter,
    opts: &AssembleOpts,
    min_branch_len: usize,
    counters: &AssemblyCounters,
    out: &Mutex<OutputState<W>>,
) {
    let seq = &record.seq;
    let good = graph.filter();

    let mut skip = seq.len() < opts.k;
    // only extend error-free reads
    if !skip && !all_kmers_in_filter(seq, good) {
        skip = true;
    }
    // skip reads lying entirely in previously assembled regions
    if !skip && all_kmers_in_filter(seq, assembled) {
        skip = true;
    }

    if !skip {
        if let Some(path) = seq_to_path(seq, opts.k, opts.num_hashes) {
            // split at branching points to prevent over-assembly
            let segments = split_path(&path, graph, min_branch_len);
            let last = segments.len().saturating_sub(1);
            for (i, mut segment) in segments.into_iter().enumerate() {
                // interior segments are already bounded by true branches
                if i == 0 || i == last {
                    extend_path(&mut segment, graph, min_branch_len);
                }
                let contig = path_to_seq(&segment);

                let mut out = out.lock().unwrap();
                // re-test under the lock: another worker may have assembled
                // this region since the cheap pre-check above
                if !all_kmers_in_filter(&contig, assembled) {
                    add_kmers_to_filter(&contig, assembled);
                    let id = format!("{} read:{}", out.contig_id, record.id);
                    out.contig_id += 1;
                    if let Err(e) = out.writer.write_record(&id, &contig) {
                        if out.error.is_none() {
                            out.error = Some(e);
                        }
                    }
                    counters.bases_assembled.fetch_add(contig.len(), Ordering::Relaxed);
                }
            }
        }
        counters.reads_extended.fetch_add(1, Ordering::Relaxed);
    }

    let processed = counters.reads_processed.fetch_add(1, Ordering::Relaxed) + 1;
    if opts.verbose && processed % PROGRESS_STEP == 0 {
        counters.progress_message();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::screen::add_kmers_to_filter;

    fn good_filter(seqs: &[&str], bits: usize, k: usize) -> BloomFilter {
        let filter = BloomFilter::new(bits, 1, k);
        for seq in seqs {
            add_kmers_to_filter(seq, &filter);
        }
        filter
    }

    fn record(id: &str, seq: &str) -> io::Result<FastaRecord> {
        Ok(FastaRecord { id: id.to_string(), seq: seq.to_string() })
    }

    fn run(
        reads: Vec<io::Result<FastaRecord>>,
        good: &BloomFilter,
        opts: &AssembleOpts,
    ) -> (AssemblySummary, String) {
        let mut writer = FastaWriter::from_writer(Vec::new());
        let summary = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| assemble_stream(reads.into_iter(), good, opts, &mut writer).unwrap());
        (summary, String::from_utf8(writer.into_inner()).unwrap())
    }

    fn opts(k: usize, genome_size: usize) -> AssembleOpts {
        AssembleOpts { k, num_hashes: 1, genome_size, verbose: false }
    }

    #[test]
    fn test_parameter_mismatch_is_fatal() {
        let good = good_filter(&[], 64, 5);
        let mut writer = FastaWriter::from_writer(Vec::new());
        let result = assemble_stream(Vec::new().into_iter(), &good, &opts(4, 64), &mut writer);
        assert!(result.is_err());
    }

    #[test]
    fn test_skips_are_counted_but_silent() {
        let good = good_filter(&["CGGAGGATAC"], 4096, 4);
        let reads = vec![
            record("short", "CGG"),
            record("error", "CGGAGGANAC"),
            record("ok", "CGGAGGATAC"),
        ];
        let (summary, output) = run(reads, &good, &opts(4, 4096));
        assert_eq!(summary.reads_processed, 3);
        assert_eq!(summary.reads_extended, 1);
        assert_eq!(summary.contigs, 1);
        assert_eq!(output, ">0 read:ok\nCGGAGGATAC\n");
    }

    #[test]
    fn test_malformed_input_is_fatal() {
        let good = good_filter(&["CGGAGGATAC"], 4096, 4);
        let reads = vec![
            record("ok", "CGGAGGATAC"),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad record")),
        ];
        let mut writer = FastaWriter::from_writer(Vec::new());
        let result = assemble_stream(reads.into_iter(), &good, &opts(4, 4096), &mut writer);
        assert!(result.is_err());
    }

    #[test]
    fn test_contig_ids_and_bases() {
        let good = good_filter(&["GCACACGACC", "GGCGTCGGAG"], 8192, 4);
        let reads = vec![record("r1", "GCACACGACC"), record("r2", "GGCGTCGGAG")];
        let (summary, output) = run(reads, &good, &opts(4, 8192));
        assert_eq!(summary.contigs, 2);
        assert!(output.starts_with(">0 read:r1\nGCACACGACC\n"));
        assert!(output.contains(">1 read:r2\nGGCGTCGGAG\n"));
        assert_eq!(summary.bases_assembled, 20);
    }
}
