//! Typed record layer for the consensus engine.
//!
//! Normalized per-tool tables come in two shapes: 9-column GFF-style rows
//! keyed by start coordinate (complete-genome mode) and 4-column TSV rows
//! keyed by protein id (draft mode). Both are parsed here, once, into
//! [`ToolCall`] values; everything downstream works on typed records.

use hashbrown::HashMap;
use log::{info, warn};

use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub mod record;
pub use record::{AlignedTriple, ConsensusRecord, FeatureKey, GffFields, Tool, ToolCall};

/// one tool's table: keyed calls plus the keys in input order
#[derive(Debug, Clone)]
pub struct ToolTable {
    pub tool: Tool,
    pub keys: Vec<FeatureKey>,
    pub calls: HashMap<FeatureKey, ToolCall>,
}

impl ToolTable {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            keys: Vec::new(),
            calls: HashMap::new(),
        }
    }

    /// first occurrence of a key wins; later duplicates are dropped loudly
    pub fn insert(&mut self, key: FeatureKey, call: ToolCall) {
        if self.calls.contains_key(&key) {
            warn!("{}: duplicate key {}, keeping the first row", self.tool, key);
            return;
        }

        self.keys.push(key.clone());
        self.calls.insert(key, call);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn reader<P: AsRef<Path> + Debug>(file: P) -> Result<String, Box<dyn std::error::Error>> {
    let mut file = File::open(file)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// comment lines and the column-header line the upstream processors emit
fn is_data_line(line: &str) -> bool {
    let line = line.trim_start();
    !line.is_empty()
        && !line.starts_with('#')
        && !line.starts_with("seqname\t")
        && !line.starts_with("protein_id\t")
}

fn pack<P, F>(path: P, tool: Tool, parse: F) -> Result<ToolTable, anyhow::Error>
where
    P: AsRef<Path> + Debug,
    F: Fn(&str, Tool) -> Result<(FeatureKey, ToolCall), record::RecordError>,
{
    let contents = reader(&path).map_err(|e| anyhow::anyhow!("{:?}: {}", path, e))?;
    let mut table = ToolTable::new(tool);

    for line in contents.lines().filter(|l| is_data_line(l)) {
        match parse(line, tool) {
            Ok((key, call)) => table.insert(key, call),
            Err(e) => warn!("{}: skipping row -> {}", tool, e),
        }
    }

    info!("{}: {} records in {:?}", tool, table.len(), path);
    Ok(table)
}

/// load a normalized complete-genome table keyed by start coordinate
pub fn pack_genomic<P: AsRef<Path> + Debug>(path: P, tool: Tool) -> Result<ToolTable, anyhow::Error> {
    pack(path, tool, ToolCall::from_genomic)
}

/// load a normalized draft table keyed by protein id
pub fn pack_draft<P: AsRef<Path> + Debug>(path: P, tool: Tool) -> Result<ToolTable, anyhow::Error> {
    pack(path, tool, ToolCall::from_draft)
}
