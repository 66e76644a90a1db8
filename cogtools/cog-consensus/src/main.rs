//! Consensus engine for bacterial genome functional annotation
//!
//! This binary reconciles the per-feature claims of three independent
//! annotation tools -- an ortholog mapper, an operon mapper and a curated
//! domain-search tool -- into one consensus record per genomic feature.
//!
//! Features are aligned across tools by start coordinate (complete genomes)
//! or protein id (draft genomes); when a draft run shares no ids with the
//! operon tool, records are paired through a bounded similarity search
//! instead. Disagreements are settled by a fixed voting protocol that trusts
//! the curated domain database first and the ortholog mapper second, and
//! ambiguous multi-letter functional categories are reduced to a single
//! letter by a configurable policy. The final table lists every input
//! feature exactly once, ready for downstream visualization.

use clap::{self, Parser};
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use cog_consensus::cli::{Args, SubArgs};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .unwrap();

    match args.command {
        SubArgs::Genome { args } => {
            use cog_consensus::core::run_genome;

            args.check().unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });

            run_genome(args).unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });
        }
        SubArgs::Draft { args } => {
            use cog_consensus::core::run_draft;

            args.check().unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });

            run_draft(args).unwrap_or_else(|e| {
                error!("{}", e);
                std::process::exit(1);
            });
        }
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
