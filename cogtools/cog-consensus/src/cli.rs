use clap::{Parser, Subcommand};
use config::{ArgCheck, CliError, MATCH_WINDOW, MIN_MATCH_IDENTITY};
use std::path::PathBuf;

use crate::core::selector::Policy;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubArgs,

    #[arg(
        short = 't',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub threads: usize,
}

impl Args {}

#[derive(Debug, Subcommand)]
pub enum SubArgs {
    #[command(name = "genome")]
    Genome {
        #[command(flatten)]
        args: GenomeArgs,
    },
    #[command(name = "draft")]
    Draft {
        #[command(flatten)]
        args: DraftArgs,
    },
}

#[derive(Debug, Parser)]
pub struct GenomeArgs {
    #[arg(
        short = 'n',
        long = "name",
        required = true,
        value_name = "NAME",
        help = "Organism name used to derive output file names"
    )]
    pub name: String,

    #[arg(
        short = 'm',
        long = "mapper",
        required = false,
        value_name = "PATH",
        help = "Path to the normalized ortholog-mapper table"
    )]
    pub mapper: Option<PathBuf>,

    #[arg(
        short = 'p',
        long = "operon",
        required = false,
        value_name = "PATH",
        help = "Path to the normalized operon-mapper table"
    )]
    pub operon: Option<PathBuf>,

    #[arg(
        short = 'd',
        long = "domain",
        required = false,
        value_name = "PATH",
        help = "Path to the normalized domain-search table"
    )]
    pub domain: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "cogs",
        required = true,
        value_name = "PATH",
        help = "Path to the canonical group -> category table"
    )]
    pub cogs: PathBuf,

    #[arg(
        long = "gff",
        required = false,
        value_name = "PATH",
        help = "Path to the organism feature table [needed by --pseudo/--ncrna]"
    )]
    pub gff: Option<PathBuf>,

    #[arg(
        long = "fasta",
        required = false,
        value_name = "PATH",
        help = "Path to the genomic sequence, appended verbatim after the records"
    )]
    pub fasta: Option<PathBuf>,

    #[arg(
        long = "pseudo",
        help = "Retype features listed as pseudogenes in the feature table"
    )]
    pub pseudo: bool,

    #[arg(
        long = "ncrna",
        help = "Append ncRNA features from the feature table"
    )]
    pub ncrna: bool,

    #[arg(
        long = "choice",
        value_enum,
        default_value = "first",
        value_name = "POLICY",
        help = "Policy to reduce ambiguous multi-letter categories"
    )]
    pub choice: Policy,

    #[arg(
        long = "seed",
        required = false,
        value_name = "SEED",
        help = "Seed for the random category policy"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = ".",
        help = "Output directory"
    )]
    pub output: PathBuf,
}

impl ArgCheck for GenomeArgs {
    fn check(&self) -> Result<(), CliError> {
        if (self.pseudo || self.ncrna) && self.gff.is_none() {
            return Err(CliError::InvalidInput(
                "--pseudo/--ncrna need the organism feature table (--gff)".to_string(),
            ));
        }

        self.check_shape()?;
        self.check_paths()
    }

    fn get_tools(&self) -> Vec<Option<&PathBuf>> {
        vec![
            self.mapper.as_ref(),
            self.operon.as_ref(),
            self.domain.as_ref(),
        ]
    }

    fn get_extra(&self) -> Vec<&PathBuf> {
        let mut extra = vec![&self.cogs];
        extra.extend(self.gff.as_ref());
        extra.extend(self.fasta.as_ref());
        extra
    }
}

#[derive(Debug, Parser)]
pub struct DraftArgs {
    #[arg(
        short = 'n',
        long = "name",
        required = true,
        value_name = "NAME",
        help = "Organism name used to derive output file names"
    )]
    pub name: String,

    #[arg(
        short = 'm',
        long = "mapper",
        required = false,
        value_name = "PATH",
        help = "Path to the normalized ortholog-mapper table"
    )]
    pub mapper: Option<PathBuf>,

    #[arg(
        short = 'p',
        long = "operon",
        required = false,
        value_name = "PATH",
        help = "Path to the normalized operon-mapper table"
    )]
    pub operon: Option<PathBuf>,

    #[arg(
        short = 'd',
        long = "domain",
        required = false,
        value_name = "PATH",
        help = "Path to the normalized domain-search table"
    )]
    pub domain: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "cogs",
        required = true,
        value_name = "PATH",
        help = "Path to the canonical group -> category table"
    )]
    pub cogs: PathBuf,

    #[arg(
        long = "proteins",
        required = true,
        value_name = "PATH",
        help = "Path to the downloaded reference proteins (FASTA)"
    )]
    pub proteins: PathBuf,

    #[arg(
        long = "operon-proteins",
        required = false,
        value_name = "PATH",
        help = "Path to the operon-mapper predicted proteins (FASTA); enables similarity matching when the operon table shares no ids with the reference"
    )]
    pub operon_proteins: Option<PathBuf>,

    #[arg(
        long = "window",
        value_name = "N",
        default_value_t = MATCH_WINDOW,
        help = "Forward search window for similarity matching"
    )]
    pub window: usize,

    #[arg(
        long = "min-identity",
        value_name = "FRAC",
        default_value_t = MIN_MATCH_IDENTITY,
        help = "Minimum alignment score over the shorter sequence length"
    )]
    pub min_identity: f64,

    #[arg(
        long = "choice",
        value_enum,
        default_value = "first",
        value_name = "POLICY",
        help = "Policy to reduce ambiguous multi-letter categories"
    )]
    pub choice: Policy,

    #[arg(
        long = "seed",
        required = false,
        value_name = "SEED",
        help = "Seed for the random category policy"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = ".",
        help = "Output directory"
    )]
    pub output: PathBuf,
}

impl ArgCheck for DraftArgs {
    fn get_tools(&self) -> Vec<Option<&PathBuf>> {
        vec![
            self.mapper.as_ref(),
            self.operon.as_ref(),
            self.domain.as_ref(),
        ]
    }

    fn get_extra(&self) -> Vec<&PathBuf> {
        let mut extra = vec![&self.cogs, &self.proteins];
        extra.extend(self.operon_proteins.as_ref());
        extra
    }
}
