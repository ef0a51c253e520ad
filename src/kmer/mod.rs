//! K-mer primitives: canonical k-mers, rolling hashes, Bloom filters.

pub mod bloom;
pub mod kmer;
pub mod rolling;
pub mod screen;
