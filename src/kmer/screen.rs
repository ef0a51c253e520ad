// src/kmer/screen.rs
//! Screening reads against a k-mer filter.

use crate::kmer::bloom::BloomFilter;
use crate::kmer::rolling::RollingHashIterator;

/// Return true iff every k-mer of `seq` is contained in `filter`.
///
/// The k-mer stream must also be unbroken: a window skipped over a non-ACGT
/// byte fails the whole sequence, since the read then has no contiguous path
/// through the graph. Sequences shorter than k have no k-mers and fail.
pub fn all_kmers_in_filter(seq: &str, filter: &BloomFilter) -> bool {
    let k = filter.kmer_size();
    let bytes = seq.as_bytes();
    if bytes.len() < k {
        return false;
    }
    let mut expected = 0usize;
    for (pos, hash) in RollingHashIterator::new(bytes, k, filter.hash_num()) {
        if pos != expected {
            return false;
        }
        if !filter.contains(&hash.hashes()) {
            return false;
        }
        expected = pos + 1;
    }
    expected == bytes.len() - k + 1
}

/// Insert every k-mer of `seq` into `filter`.
pub fn add_kmers_to_filter(seq: &str, filter: &BloomFilter) {
    let bytes = seq.as_bytes();
    for (_, hash) in RollingHashIterator::new(bytes, filter.kmer_size(), filter.hash_num()) {
        filter.insert(&hash.hashes());
    }
}

/// Trim `seq` down to its longest substring whose k-mers are all present in
/// `filter` at consecutive positions.
///
/// Non-ACGT characters break the k-mer stream, so a run never spans them.
/// Ties go to the first run. Returns the empty string when the sequence is
/// shorter than k or no k-mer matches.
pub fn trim_seq<'a>(seq: &'a str, filter: &BloomFilter) -> &'a str {
    let k = filter.kmer_size();
    let bytes = seq.as_bytes();
    if bytes.len() < k {
        return "";
    }

    let mut prev_pos: Option<usize> = None;
    let mut run_start: Option<usize> = None;
    let mut run_len = 0usize;
    let mut best: Option<(usize, usize)> = None;

    let close_run = |start: Option<usize>, len: usize, best: &mut Option<(usize, usize)>| {
        if let Some(start) = start {
            if len > best.map_or(0, |(_, l)| l) {
                *best = Some((start, len));
            }
        }
    };

    for (pos, hash) in RollingHashIterator::new(bytes, k, filter.hash_num()) {
        let hit = filter.contains(&hash.hashes());
        let gapped = prev_pos.is_some_and(|prev| pos - prev > 1);
        if !hit || gapped {
            close_run(run_start, run_len, &mut best);
            run_start = None;
            run_len = 0;
        }
        if hit {
            if run_start.is_none() {
                run_start = Some(pos);
            }
            run_len += 1;
        }
        prev_pos = Some(pos);
    }
    close_run(run_start, run_len, &mut best);

    match best {
        Some((start, len)) => &seq[start..start + len + k - 1],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_of(seqs: &[&str], bits: usize, k: usize) -> BloomFilter {
        let filter = BloomFilter::new(bits, 1, k);
        for seq in seqs {
            add_kmers_to_filter(seq, &filter);
        }
        filter
    }

    #[test]
    fn test_all_kmers_present() {
        let filter = filter_of(&["ACGTACGTAC"], 64, 4);
        assert!(all_kmers_in_filter("ACGTACGTAC", &filter));
        assert!(all_kmers_in_filter("CGTACG", &filter));
    }

    #[test]
    fn test_missing_kmer_fails() {
        let filter = filter_of(&["ACGTACGTAC"], 1024, 4);
        assert!(!all_kmers_in_filter("ACGTAGGTAC", &filter));
    }

    #[test]
    fn test_gap_fails_the_read() {
        let filter = filter_of(&["ACGTACGTAC"], 64, 4);
        // every surviving k-mer is present, but the X breaks the stream
        assert!(!all_kmers_in_filter("ACGTAXGTAC", &filter));
        assert!(!all_kmers_in_filter("XACGTACGTAC", &filter));
        assert!(!all_kmers_in_filter("ACGTACGTACX", &filter));
    }

    #[test]
    fn test_short_read_fails() {
        let filter = filter_of(&["ACGTACGTAC"], 64, 4);
        assert!(!all_kmers_in_filter("ACG", &filter));
    }

    #[test]
    fn test_trim_keeps_whole_matching_read() {
        let filter = filter_of(&["ACGTACGTAC"], 64, 4);
        assert_eq!(trim_seq("ACGTACGTAC", &filter), "ACGTACGTAC");
    }

    #[test]
    fn test_trim_finds_longest_run() {
        // good k-mers cover GGATCCA; the leading/trailing context does not match
        let filter = filter_of(&["GGATCCA"], 1024, 4);
        assert_eq!(trim_seq("AAAAGGATCCAAAA", &filter), "GGATCCA");
    }

    #[test]
    fn test_trim_breaks_at_invalid_bases() {
        let filter = filter_of(&["ACGTAC", "GTACGT"], 1024, 4);
        // the N splits two matching runs; the longer (second) run wins
        assert_eq!(trim_seq("ACGTANGTACGT", &filter), "GTACGT");
    }

    #[test]
    fn test_trim_first_run_wins_ties() {
        let filter = filter_of(&["AAGGCC", "TTCCGG"], 4096, 4);
        let trimmed = trim_seq("AAGGCCNTTCCGG", &filter);
        assert_eq!(trimmed, "AAGGCC");
    }

    #[test]
    fn test_trim_empty_results() {
        let filter = filter_of(&["ACGTACGTAC"], 64, 4);
        assert_eq!(trim_seq("ACG", &filter), "");
        let empty = BloomFilter::new(64, 1, 4);
        assert_eq!(trim_seq("ACGTACGTAC", &empty), "");
    }
}
