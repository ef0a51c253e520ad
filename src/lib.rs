//! Shrike: memory-efficient de Bruijn graph assembly over a Bloom filter.
//!
//! The de Bruijn graph is never materialised. A Bloom filter of the "good"
//! k-mers (those seen above a multiplicity threshold) defines the vertex
//! set, and a canonical rolling hash enumerates a vertex's neighbours in
//! constant time by trial-extending each base. Reads are walked through
//! this implicit graph and extended until a dead end, a genuine branching
//! point, or a cycle; short spurious branches caused by Bloom filter false
//! positives are classified away by branch length.

pub mod graph;
pub mod io;
pub mod kmer;
pub mod pipeline;
