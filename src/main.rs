mod cli_main;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::ThreadPoolBuilder;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use cli_main::{Cli, Commands};
use shrike::io::fasta::create_output;
use shrike::kmer::rolling::MAX_HASHES;
use shrike::pipeline::assemble::{assemble_files, AssembleOpts};
use shrike::pipeline::load::{build_good_filter, LoadOpts};
use shrike::pipeline::visualize::output_graph_files;

/// Bits per genome base reserved for the good-k-mer filter when no explicit
/// size is given.
const DEFAULT_BITS_PER_BASE: usize = 8;

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Setting tracing default failed");

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Assemble {
            inputs,
            output,
            k,
            num_hashes,
            genome_size,
            min_count,
            filter_mem,
            threads,
            verbose,
        } => {
            validate_params(k, num_hashes, genome_size)?;
            ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .context("building thread pool")?;

            let start = std::time::Instant::now();
            let load_opts = LoadOpts {
                k,
                num_hashes,
                filter_bits: filter_bits(filter_mem, genome_size),
                min_count,
                verbose,
            };
            let good = build_good_filter(&inputs, &load_opts)?;

            let mut writer = create_output(output.as_deref()).context("opening contig output")?;
            let opts = AssembleOpts { k, num_hashes, genome_size, verbose };
            let summary = assemble_files(&inputs, &good, &opts, &mut writer)?;
            info!(
                "Assembled {} contigs ({} bp) from {} of {} reads in {:.2}s",
                summary.contigs,
                summary.bases_assembled,
                summary.reads_extended,
                summary.reads_processed,
                start.elapsed().as_secs_f32()
            );
            Ok(())
        }

        Commands::Graph {
            inputs,
            output,
            k,
            num_hashes,
            genome_size,
            min_count,
            filter_mem,
            verbose,
        } => {
            validate_params(k, num_hashes, genome_size)?;
            let load_opts = LoadOpts {
                k,
                num_hashes,
                filter_bits: filter_bits(filter_mem, genome_size),
                min_count,
                verbose,
            };
            let good = build_good_filter(&inputs, &load_opts)?;

            let writer = create_output(output.as_deref()).context("opening GraphViz output")?;
            let (nodes, edges) = output_graph_files(&inputs, &good, writer.into_inner(), verbose)?;
            info!("Wrote {} vertices and {} edges", nodes, edges);
            Ok(())
        }
    }
}

fn validate_params(k: usize, num_hashes: usize, genome_size: usize) -> Result<()> {
    if k == 0 || k > 255 {
        bail!("k must be between 1 and 255, got {}", k);
    }
    if num_hashes == 0 || num_hashes > MAX_HASHES {
        bail!("--num-hashes must be between 1 and {}, got {}", MAX_HASHES, num_hashes);
    }
    if genome_size == 0 {
        bail!("--genome-size must be positive");
    }
    Ok(())
}

fn filter_bits(filter_mem: Option<usize>, genome_size: usize) -> usize {
    match filter_mem {
        Some(mb) => mb.saturating_mul(8 * 1024 * 1024),
        None => genome_size.saturating_mul(DEFAULT_BITS_PER_BASE),
    }
}
