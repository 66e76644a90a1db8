use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// numeric values
pub const MIN_THREADS: usize = 1;
pub const MATCH_WINDOW: usize = 10;
pub const MIN_MATCH_IDENTITY: f64 = 0.90;
pub const MIN_GFF_FIELDS: usize = 9;
pub const MIN_DRAFT_FIELDS: usize = 4;

// sentinels
pub const ABSENT: &str = "-";
pub const UNKNOWN_CATEGORY: char = '-';

/// functional category alphabet shared by every annotation tool;
/// the trailing '-' is the explicit "no category" symbol
pub const CATEGORIES: [char; 27] = [
    'J', 'A', 'K', 'L', 'B', 'D', 'Y', 'V', 'T', 'M', 'N', 'Z', 'W', 'U', 'O', 'X', 'C', 'G', 'E',
    'F', 'H', 'I', 'P', 'Q', 'R', 'S', '-',
];

// file names
pub const GENOME_OUT_SUFFIX: &str = "_file_to_plot.txt";
pub const DRAFT_OUT_PREFIX: &str = "consensus_";
pub const DRAFT_HEADER: &str = "protein_id\tsource\tcog\tcat";

// feature types
pub const CDS: &str = "CDS";
pub const PSEUDOGENE: &str = "pseudogene";
pub const NCRNA: &str = "ncRNA";

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progressbar_style = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} ETA {eta_precise} ")
        .expect("no template error");

    let progress_bar = ProgressBar::new(length);

    progress_bar.set_style(progressbar_style);
    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// write header lines and a collection of records to a file
pub fn write_collection(headers: &[String], data: &[String], fname: &PathBuf) {
    log::info!("Records in {:?}: {}. Writing...", fname, data.len());
    let f = match File::create(fname) {
        Ok(f) => f,
        Err(e) => panic!("Error creating file: {}", e),
    };
    let mut writer = BufWriter::new(f);

    for line in headers.iter().chain(data.iter()) {
        writeln!(writer, "{}", line).unwrap_or_else(|e| {
            panic!("Error writing to file: {}", e);
        });
    }
}

/// argument checker for all subcommands
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.check_shape()?;
        self.check_paths()
    }

    /// the consensus protocol accepts zero, one or three tool tables;
    /// two tables cannot be voted on and must not be guessed around
    fn check_shape(&self) -> Result<(), CliError> {
        match self.get_tools().iter().flatten().count() {
            2 => Err(CliError::InvalidInput(
                "exactly two tool tables were supplied; consensus needs zero, one or three"
                    .to_string(),
            )),
            0 => {
                log::warn!("No tool tables provided. Output will carry no assignments...");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_paths(&self) -> Result<(), CliError> {
        for path in self.get_tools().into_iter().flatten() {
            validate(path)?;
        }
        for path in self.get_extra() {
            validate(path)?;
        }

        Ok(())
    }

    /// the three tool-table slots in fixed order: mapper, operon, domain
    fn get_tools(&self) -> Vec<Option<&PathBuf>>;

    /// any other input files the subcommand consumes
    fn get_extra(&self) -> Vec<&PathBuf> {
        Vec::new()
    }
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// argument validation
pub fn validate(arg: &PathBuf) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!(
            "ERROR: {:?} does not exist",
            arg
        )));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!(
            "ERROR: {:?} is not a file",
            arg
        )));
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => Err(CliError::InvalidInput(format!(
            "ERROR: file {:?} is empty",
            arg
        ))),
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Dummy {
        tools: Vec<Option<PathBuf>>,
    }

    impl ArgCheck for Dummy {
        fn get_tools(&self) -> Vec<Option<&PathBuf>> {
            self.tools.iter().map(|t| t.as_ref()).collect()
        }
    }

    #[test]
    fn test_two_tables_is_rejected() {
        let args = Dummy {
            tools: vec![Some(PathBuf::from("a")), Some(PathBuf::from("b")), None],
        };

        assert!(args.check_shape().is_err());
    }

    #[test]
    fn test_zero_one_and_three_tables_pass_shape_check() {
        for present in [0, 1, 3] {
            let tools = (0..3)
                .map(|i| (i < present).then(|| PathBuf::from("x")))
                .collect();
            let args = Dummy { tools };

            assert!(args.check_shape().is_ok(), "{} tables rejected", present);
        }
    }
}
