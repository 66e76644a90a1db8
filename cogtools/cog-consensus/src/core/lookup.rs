use hashbrown::HashMap;
use log::{info, warn};

use std::path::Path;

/// canonical orthologous-group -> functional-category table, loaded once at
/// startup and read-only for the rest of the run
#[derive(Debug, Default)]
pub struct CategoryTable {
    groups: HashMap<String, String>,
}

impl CategoryTable {
    /// load the two-column tab-separated table (`group_id  letters`)
    pub fn load<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read category table {:?}: {}", path, e))?;
        let table = Self::from_lines(&contents);

        info!("Category table: {} groups in {:?}", table.len(), path);
        Ok(table)
    }

    pub fn from_lines(contents: &str) -> Self {
        let mut groups = HashMap::new();

        for line in contents
            .lines()
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
        {
            let mut fields = line.split('\t');
            match (fields.next(), fields.next()) {
                (Some(id), Some(cats)) if !cats.trim().is_empty() => {
                    groups.insert(id.trim().to_string(), cats.trim().to_string());
                }
                _ => warn!("skipping malformed category line: {}", line),
            }
        }

        Self { groups }
    }

    /// a miss is the normal outcome for groups assigned from a tool's own
    /// internal database; callers fall back to the tool-native category
    pub fn lookup(&self, group: &str) -> Option<&str> {
        self.groups.get(group).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
