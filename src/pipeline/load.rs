// src/pipeline/load.rs
//! Building the good-k-mer filter from the input reads.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use rayon::iter::{ParallelBridge, ParallelIterator};
use tracing::info;

use crate::io::fasta::{FastaConcat, FastaRecord};
use crate::kmer::bloom::{BloomFilter, CountingBloomFilter};
use crate::kmer::rolling::RollingHashIterator;

/// Print a progress message after loading this many reads.
const LOAD_PROGRESS_STEP: usize = 10_000;

/// Parameters for good-k-mer filter construction.
pub struct LoadOpts {
    pub k: usize,
    pub num_hashes: usize,
    /// Size of the filter in bits.
    pub filter_bits: usize,
    /// Minimum multiplicity for a k-mer to count as good.
    pub min_count: u8,
    pub verbose: bool,
}

/// Build the good-k-mer filter by streaming every input file once.
///
/// Each k-mer is counted in a 4-bit counting filter; once its estimated
/// count reaches `min_count` it is promoted into the returned plain filter.
/// K-mers below the threshold (mostly sequencing errors) never promote.
pub fn build_good_filter(inputs: &[String], opts: &LoadOpts) -> Result<BloomFilter> {
    if opts.min_count as usize > CountingBloomFilter::MAX_COUNT as usize {
        bail!(
            "--min-count {} exceeds the counting filter maximum of {}",
            opts.min_count,
            CountingBloomFilter::MAX_COUNT
        );
    }

    let good = BloomFilter::new(opts.filter_bits, opts.num_hashes, opts.k);
    let counts = if opts.min_count > 1 {
        Some(CountingBloomFilter::new(opts.filter_bits, opts.num_hashes, opts.k))
    } else {
        None
    };
    if opts.verbose {
        info!(
            "Counting k-mers (k={}, {} hashes, {} MB filter)",
            opts.k,
            opts.num_hashes,
            (good.memory_bytes() + counts.as_ref().map_or(0, |c| c.memory_bytes())) / (1024 * 1024)
        );
    }

    let read_count = AtomicUsize::new(0);
    let read_error: Mutex<Option<io::Error>> = Mutex::new(None);

    let records = FastaConcat::new(inputs).map_while(|item| match item {
        Ok(record) => Some(record),
        Err(e) => {
            *read_error.lock().unwrap() = Some(e);
            None
        }
    });
    records.par_bridge().for_each(|record: FastaRecord| {
        load_seq(&record.seq, &good, counts.as_ref(), opts.min_count);
        let loaded = read_count.fetch_add(1, Ordering::Relaxed) + 1;
        if opts.verbose && loaded % LOAD_PROGRESS_STEP == 0 {
            info!("Loaded {} reads into k-mer filter", loaded);
        }
    });

    if let Some(e) = read_error.into_inner().unwrap() {
        return Err(e).context("reading FASTA input");
    }
    if opts.verbose {
        info!(
            "Loaded {} reads; filter occupancy gives an estimated false positive rate of {:.2e}",
            read_count.load(Ordering::Relaxed),
            good.estimated_fp_rate()
        );
    }
    Ok(good)
}

/// Count one read's k-mers, promoting those that reach the threshold.
fn load_seq(seq: &str, good: &BloomFilter, counts: Option<&CountingBloomFilter>, min_count: u8) {
    for (_, hash) in RollingHashIterator::new(seq.as_bytes(), good.kmer_size(), good.hash_num()) {
        let hashes = hash.hashes();
        match counts {
            Some(counts) => {
                if counts.insert(&hashes) >= min_count {
                    good.insert(&hashes);
                }
            }
            None => good.insert(&hashes),
        }
    }
}
