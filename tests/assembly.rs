//! Assembly scenarios over the in-memory record stream.

use std::collections::HashSet;
use std::io;

use shrike::graph::dbg::{BloomDbg, Direction, Vertex};
use shrike::graph::extend::{extend_path, path_to_seq, seq_to_path};
use shrike::io::fasta::{FastaRecord, FastaWriter};
use shrike::kmer::bloom::BloomFilter;
use shrike::kmer::kmer::Kmer;
use shrike::kmer::screen::add_kmers_to_filter;
use shrike::pipeline::assemble::{assemble_stream, AssembleOpts, AssemblySummary};

fn good_filter(seqs: &[&str], bits: usize, k: usize) -> BloomFilter {
    let filter = BloomFilter::new(bits, 1, k);
    for seq in seqs {
        add_kmers_to_filter(seq, &filter);
    }
    filter
}

fn records(reads: &[(&str, &str)]) -> Vec<io::Result<FastaRecord>> {
    reads
        .iter()
        .map(|(id, seq)| Ok(FastaRecord { id: id.to_string(), seq: seq.to_string() }))
        .collect()
}

/// Run the assembly single-threaded and return the summary plus parsed
/// (id, seq) contigs.
fn assemble(
    reads: &[(&str, &str)],
    good: &BloomFilter,
    genome_size: usize,
) -> (AssemblySummary, Vec<(String, String)>) {
    let opts = AssembleOpts {
        k: good.kmer_size(),
        num_hashes: good.hash_num(),
        genome_size,
        verbose: false,
    };
    let mut writer = FastaWriter::from_writer(Vec::new());
    let summary = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| assemble_stream(records(reads).into_iter(), good, &opts, &mut writer).unwrap());
    let text = String::from_utf8(writer.into_inner()).unwrap();
    let mut contigs = Vec::new();
    let mut lines = text.lines();
    while let (Some(header), Some(seq)) = (lines.next(), lines.next()) {
        contigs.push((header.trim_start_matches('>').to_string(), seq.to_string()));
    }
    (summary, contigs)
}

#[test]
fn single_linear_contig() {
    let good = good_filter(&["ACGTACGTAC"], 64, 4);
    let (summary, contigs) = assemble(&[("r1", "ACGTACGTAC")], &good, 64);
    assert_eq!(summary.contigs, 1);
    assert_eq!(contigs.len(), 1);
    assert_eq!(contigs[0].0, "0 read:r1");
    assert_eq!(contigs[0].1, "ACGTACGTAC");
}

#[test]
fn error_read_is_skipped() {
    let good = good_filter(&["ACGTACGTAC"], 64, 4);
    let (summary, contigs) = assemble(&[("r1", "ACGTAXGTAC")], &good, 64);
    assert!(contigs.is_empty());
    assert_eq!(summary.reads_processed, 1);
    assert_eq!(summary.reads_extended, 0);
}

#[test]
fn duplicate_reads_are_deduplicated() {
    let good = good_filter(&["ACGTACGTAC"], 64, 4);
    let reads = [("r1", "ACGTACGTAC"), ("r2", "ACGTACGTAC")];
    let (summary, contigs) = assemble(&reads, &good, 64);
    assert_eq!(summary.reads_processed, 2);
    assert_eq!(contigs.len(), 1);
    assert_eq!(contigs[0].1, "ACGTACGTAC");
}

#[test]
fn true_branches_halt_extension() {
    // two arms diverge after AAAA; with a permissive branch threshold the
    // junction has more than one real branch, so a read ending there stays put
    let filter = good_filter(&["GCCTTAAAA", "AAAACCCC", "AAAATTTT"], 4096, 4);
    let dbg = BloomDbg::new(&filter);

    let junction = Vertex::from_bases(b"AAAA", 1).unwrap();
    assert!(dbg.true_branches(&junction, Direction::Forward, 3).len() >= 2);

    let mut path = seq_to_path("GCCTTAAAA", 4, 1).unwrap();
    extend_path(&mut path, &dbg, 3);
    assert_eq!(path_to_seq(&path), "GCCTTAAAA");
}

#[test]
fn false_positive_tip_is_ignored() {
    // the spurious ACGA forms a one-vertex tip off the main run
    let good = good_filter(&["ACGTACGTACGT", "ACGA"], 64, 4);
    let (_, contigs) = assemble(&[("r1", "ACGTACGTACGT")], &good, 64);
    assert_eq!(contigs.len(), 1);
    assert_eq!(contigs[0].1, "ACGTACGTACGT");
}

#[test]
fn cycle_yields_a_finite_contig() {
    // ACAC and CACA form a two-vertex cycle in k-mer space
    let good = good_filter(&["ACACACACAC"], 64, 4);
    let (_, contigs) = assemble(&[("r1", "ACACACAC")], &good, 64);
    assert_eq!(contigs.len(), 1);
    let contig = &contigs[0].1;
    for window in contig.as_bytes().windows(4) {
        assert!(window == b"ACAC" || window == b"CACA");
    }
}

#[test]
fn overlapping_reads_merge_into_one_contig() {
    let genome = "TGTAGGCGAAATAGTA";
    let good = good_filter(&[genome], 4096, 5);
    let reads = [("a", &genome[..12]), ("b", &genome[4..])];
    let (summary, contigs) = assemble(&reads, &good, 4096);
    assert_eq!(summary.reads_extended, 1);
    assert_eq!(contigs.len(), 1);
    assert_eq!(contigs[0].1, genome);
}

#[test]
fn every_contig_contributes_new_kmers() {
    let genome = "TGTAGGCGAAATAGTA";
    let good = good_filter(&[genome], 4096, 5);
    let reads = [("a", &genome[..12]), ("a2", &genome[..12]), ("b", &genome[4..])];
    let (_, contigs) = assemble(&reads, &good, 4096);

    let mut seen: HashSet<Kmer> = HashSet::new();
    for (_, contig) in &contigs {
        let kmers: Vec<Kmer> = contig
            .as_bytes()
            .windows(5)
            .map(|w| Kmer::new(w).unwrap())
            .collect();
        assert!(
            kmers.iter().any(|k| !seen.contains(k)),
            "contig {} added no new k-mers",
            contig
        );
        seen.extend(kmers);
    }
}

#[test]
fn single_thread_runs_are_deterministic() {
    let good = good_filter(&["GCACACGACC", "GGCGTCGGAG"], 8192, 4);
    let reads = [("a", "GCACACGACC"), ("b", "GGCGTCGGAG")];
    let first = assemble(&reads, &good, 8192);
    let second = assemble(&reads, &good, 8192);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(first.1[0].1, "GCACACGACC");
    assert_eq!(first.1[1].1, "GGCGTCGGAG");
}
