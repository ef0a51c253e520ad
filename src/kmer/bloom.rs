// src/kmer/bloom.rs
//! Bloom filters over rolling-hash k-mer values.
//!
//! Bloom filters allow probabilistic membership testing with no false
//! negatives, which is what lets the de Bruijn graph stay implicit: a k-mer
//! is a vertex iff its hash values are all present. False positives show up
//! as short spurious branches and are handled downstream by branch-length
//! classification, not here.
//!
//! Both filters take pre-computed hash values (the rolling hash already
//! produces `num_hashes` independent values per k-mer), and both support
//! concurrent use through shared references: bits are set with an atomic OR,
//! so an insert can never erase a bit that a racing insert just set.

use std::sync::atomic::{AtomicU64, Ordering};

/// Round `num` up to the nearest multiple of `base`.
pub fn round_up_to_multiple(num: usize, base: usize) -> usize {
    if base == 0 {
        return num;
    }
    let remainder = num % base;
    if remainder == 0 {
        num
    } else {
        num + base - remainder
    }
}

/// A plain Bloom filter keyed by k-mer hash values.
pub struct BloomFilter {
    /// Bit vector storing the filter state
    bits: Vec<AtomicU64>,
    /// Number of bits in the filter
    num_bits: usize,
    /// Number of hash values consulted per k-mer
    num_hashes: usize,
    /// K-mer size the stored hashes were computed with
    k: usize,
}

impl BloomFilter {
    /// Create a filter with at least `num_bits` bits (rounded up to a
    /// multiple of 64 for u64 storage).
    pub fn new(num_bits: usize, num_hashes: usize, k: usize) -> Self {
        let num_bits = round_up_to_multiple(num_bits.max(64), 64);
        let num_words = num_bits / 64;
        BloomFilter {
            bits: (0..num_words).map(|_| AtomicU64::new(0)).collect(),
            num_bits,
            num_hashes: num_hashes.max(1),
            k,
        }
    }

    /// Check whether all hash-indexed bits are set.
    ///
    /// Returns `true` if the k-mer might be present (could be a false
    /// positive), `false` if it is definitely absent.
    #[inline]
    pub fn contains(&self, hashes: &[u64]) -> bool {
        debug_assert!(hashes.len() >= self.num_hashes);
        hashes[..self.num_hashes].iter().all(|&h| {
            let idx = (h % self.num_bits as u64) as usize;
            self.bits[idx / 64].load(Ordering::Relaxed) & (1u64 << (idx % 64)) != 0
        })
    }

    /// Set all hash-indexed bits.
    #[inline]
    pub fn insert(&self, hashes: &[u64]) {
        debug_assert!(hashes.len() >= self.num_hashes);
        for &h in &hashes[..self.num_hashes] {
            let idx = (h % self.num_bits as u64) as usize;
            self.bits[idx / 64].fetch_or(1u64 << (idx % 64), Ordering::Relaxed);
        }
    }

    /// Number of bits in the filter.
    #[inline]
    pub fn size(&self) -> usize {
        self.num_bits
    }

    #[inline]
    pub fn hash_num(&self) -> usize {
        self.num_hashes
    }

    #[inline]
    pub fn kmer_size(&self) -> usize {
        self.k
    }

    /// Memory usage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.bits.len() * 8
    }

    /// Estimate the current false positive rate from the fill ratio.
    pub fn estimated_fp_rate(&self) -> f64 {
        let bits_set: usize = self
            .bits
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum();
        let fill_ratio = bits_set as f64 / self.num_bits as f64;
        fill_ratio.powi(self.num_hashes as i32)
    }
}

/// A counting Bloom filter tracking approximate k-mer multiplicities.
///
/// Uses 4 bits per counter (16 counters per u64), saturating at 15. Used to
/// screen out k-mers below the multiplicity threshold when building the
/// good-k-mer filter; sequencing errors mostly produce k-mers seen once.
pub struct CountingBloomFilter {
    /// 4-bit counters packed into u64s
    counters: Vec<AtomicU64>,
    /// Number of counters
    num_counters: usize,
    /// Number of hash values consulted per k-mer
    num_hashes: usize,
    /// K-mer size the stored hashes were computed with
    k: usize,
}

impl CountingBloomFilter {
    /// Counter saturation value.
    pub const MAX_COUNT: u8 = 15;

    pub fn new(num_counters: usize, num_hashes: usize, k: usize) -> Self {
        let num_counters = round_up_to_multiple(num_counters.max(16), 16);
        let num_words = num_counters / 16;
        CountingBloomFilter {
            counters: (0..num_words).map(|_| AtomicU64::new(0)).collect(),
            num_counters,
            num_hashes: num_hashes.max(1),
            k,
        }
    }

    /// Increment the counters for a k-mer.
    ///
    /// Returns the minimum count across its positions after the increment,
    /// i.e. the best available estimate of the k-mer's multiplicity.
    pub fn insert(&self, hashes: &[u64]) -> u8 {
        debug_assert!(hashes.len() >= self.num_hashes);
        let mut min_count = Self::MAX_COUNT;
        for &h in &hashes[..self.num_hashes] {
            let idx = (h % self.num_counters as u64) as usize;
            min_count = min_count.min(self.bump(idx));
        }
        min_count
    }

    /// Estimated count for a k-mer: the minimum across its positions.
    pub fn count(&self, hashes: &[u64]) -> u8 {
        debug_assert!(hashes.len() >= self.num_hashes);
        let mut min_count = Self::MAX_COUNT;
        for &h in &hashes[..self.num_hashes] {
            let idx = (h % self.num_counters as u64) as usize;
            let word = self.counters[idx / 16].load(Ordering::Relaxed);
            let shift = (idx % 16) * 4;
            min_count = min_count.min(((word >> shift) & 0xF) as u8);
        }
        min_count
    }

    /// Memory usage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.counters.len() * 8
    }

    /// Atomically increment one nibble, saturating at 15.
    fn bump(&self, idx: usize) -> u8 {
        let word_idx = idx / 16;
        let shift = (idx % 16) * 4;
        let mut current = self.counters[word_idx].load(Ordering::Relaxed);
        loop {
            let count = ((current >> shift) & 0xF) as u8;
            if count == Self::MAX_COUNT {
                return Self::MAX_COUNT;
            }
            match self.counters[word_idx].compare_exchange_weak(
                current,
                current + (1u64 << shift),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return count + 1,
                Err(now) => current = now,
            }
        }
    }
}
