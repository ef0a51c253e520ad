use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "shrike", version, about = "Memory-efficient Bloom filter de Bruijn graph assembler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble reads into contigs
    Assemble {
        /// Input FASTA(.gz) files
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output FASTA(.gz) file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// K-mer size
        #[arg(short, long, default_value_t = 31)]
        k: usize,

        /// Number of Bloom filter hash functions
        #[arg(long, default_value_t = 4)]
        num_hashes: usize,

        /// Approximate genome size in bp
        #[arg(short, long)]
        genome_size: usize,

        /// Minimum k-mer multiplicity to survive error screening
        #[arg(long, default_value_t = 2)]
        min_count: u8,

        /// Good-k-mer filter size in MB (default: derived from genome size)
        #[arg(long)]
        filter_mem: Option<usize>,

        /// Number of threads
        #[arg(long, default_value_t = num_cpus::get())]
        threads: usize,

        /// Print progress messages
        #[arg(short, long)]
        verbose: bool,
    },

    /// Dump the de Bruijn graph in GraphViz format
    Graph {
        /// Input FASTA(.gz) files
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output .dot file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// K-mer size
        #[arg(short, long, default_value_t = 31)]
        k: usize,

        /// Number of Bloom filter hash functions
        #[arg(long, default_value_t = 4)]
        num_hashes: usize,

        /// Approximate genome size in bp
        #[arg(short, long)]
        genome_size: usize,

        /// Minimum k-mer multiplicity to survive error screening
        #[arg(long, default_value_t = 2)]
        min_count: u8,

        /// Good-k-mer filter size in MB (default: derived from genome size)
        #[arg(long)]
        filter_mem: Option<usize>,

        /// Print progress messages
        #[arg(short, long)]
        verbose: bool,
    },
}
