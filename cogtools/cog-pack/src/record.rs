use thiserror::Error;

use std::fmt;

use config::{ABSENT, MIN_DRAFT_FIELDS, MIN_GFF_FIELDS};

/// the three annotation sources, in fixed priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Mapper,
    Operon,
    Domain,
}

impl Tool {
    pub fn tag(&self) -> &'static str {
        match self {
            Tool::Mapper => "ortholog_mapper",
            Tool::Operon => "operon_mapper",
            Tool::Domain => "domain_search",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// a feature identity: genomic start coordinate in complete-genome mode,
/// protein id in draft mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKey {
    Coord(u64),
    Protein(String),
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Coord(start) => write!(f, "{}", start),
            FeatureKey::Protein(id) => write!(f, "{}", id),
        }
    }
}

/// positional fields of a complete-genome record, kept verbatim so the
/// chosen tool's row can be reconstructed on output
#[derive(Debug, Clone, PartialEq)]
pub struct GffFields {
    pub seqname: String,
    pub source: String,
    pub ftype: String,
    pub start: u64,
    pub end: u64,
    pub score: String,
    pub strand: String,
    pub frame: String,
}

/// one tool's claim about one feature
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: Tool,
    pub id: String,
    pub group: Option<String>,
    pub cats: Option<String>,
    pub desc: Option<String>,
    pub gff: Option<GffFields>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("truncated row ({0} fields): {1}")]
    Truncated(usize, String),
    #[error("bad coordinate in row: {0}")]
    BadCoord(String),
}

/// '-' is the shared absent sentinel across all tool outputs
fn sentinel(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() || field == ABSENT {
        None
    } else {
        Some(field.to_string())
    }
}

/// split an `ID=..;COG=..;CAT=..;desc=..` attribute into its typed parts;
/// done once here so the engine never re-parses free text
fn parse_attribute(attr: &str) -> (Option<String>, Option<String>, Option<String>, Option<String>) {
    let (mut id, mut group, mut cats, mut desc) = (None, None, None, None);

    for pair in attr.split(';') {
        let mut kv = pair.splitn(2, '=');
        match (kv.next().map(str::trim), kv.next()) {
            (Some("ID"), Some(v)) => id = sentinel(v),
            (Some("COG"), Some(v)) => group = sentinel(v),
            (Some("CAT"), Some(v)) => cats = sentinel(v),
            (Some("desc"), Some(v)) => desc = sentinel(v),
            _ => {}
        }
    }

    (id, group, cats, desc)
}

impl ToolCall {
    /// parse a 9-column complete-genome row keyed by start coordinate
    pub fn from_genomic(line: &str, tool: Tool) -> Result<(FeatureKey, Self), RecordError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_GFF_FIELDS {
            return Err(RecordError::Truncated(fields.len(), line.to_string()));
        }

        let start: u64 = fields[3]
            .trim()
            .parse()
            .map_err(|_| RecordError::BadCoord(line.to_string()))?;
        let end: u64 = fields[4]
            .trim()
            .parse()
            .map_err(|_| RecordError::BadCoord(line.to_string()))?;

        let (id, group, cats, desc) = parse_attribute(fields[8]);
        let gff = GffFields {
            seqname: fields[0].to_string(),
            source: fields[1].to_string(),
            ftype: fields[2].to_string(),
            start,
            end,
            score: fields[5].to_string(),
            strand: fields[6].to_string(),
            frame: fields[7].to_string(),
        };

        Ok((
            FeatureKey::Coord(start),
            Self {
                tool,
                id: id.unwrap_or_else(|| ABSENT.to_string()),
                group,
                cats,
                desc,
                gff: Some(gff),
            },
        ))
    }

    /// parse a 4-column draft row (`protein_id  source  cog  cat`) keyed by
    /// protein id; the source column is redundant with the table's origin
    pub fn from_draft(line: &str, tool: Tool) -> Result<(FeatureKey, Self), RecordError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_DRAFT_FIELDS {
            return Err(RecordError::Truncated(fields.len(), line.to_string()));
        }

        let id = fields[0].trim().to_string();

        Ok((
            FeatureKey::Protein(id.clone()),
            Self {
                tool,
                id,
                group: sentinel(fields[2]),
                cats: sentinel(fields[3]),
                desc: None,
                gff: None,
            },
        ))
    }
}

/// up to three calls for the same feature; any slot may be empty
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTriple {
    pub key: FeatureKey,
    pub mapper: Option<ToolCall>,
    pub operon: Option<ToolCall>,
    pub domain: Option<ToolCall>,
}

/// the final per-feature verdict; after category selection `cat` holds
/// exactly one symbol of the canonical alphabet
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusRecord {
    pub key: FeatureKey,
    pub id: String,
    pub source: Option<Tool>,
    pub group: Option<String>,
    pub cat: String,
    pub desc: Option<String>,
    pub gff: Option<GffFields>,
    /// verbatim attribute for records adopted from the feature table
    pub attribute: Option<String>,
}

impl ConsensusRecord {
    pub fn from_call(key: &FeatureKey, call: &ToolCall) -> Self {
        Self {
            key: key.clone(),
            id: call.id.clone(),
            source: Some(call.tool),
            group: call.group.clone(),
            cat: call.cats.clone().unwrap_or_else(|| ABSENT.to_string()),
            desc: call.desc.clone(),
            gff: call.gff.clone(),
            attribute: None,
        }
    }

    /// marker for a feature no tool could be matched to
    pub fn unmatched(key: FeatureKey) -> Self {
        Self {
            id: key.to_string(),
            key,
            source: None,
            group: None,
            cat: ABSENT.to_string(),
            desc: None,
            gff: None,
            attribute: None,
        }
    }

    pub fn group_str(&self) -> &str {
        self.group.as_deref().unwrap_or(ABSENT)
    }

    pub fn source_str(&self) -> &str {
        self.source.map(|t| t.tag()).unwrap_or(ABSENT)
    }

    /// 9-column output row with the attribute rebuilt from the typed fields
    pub fn fmt_genomic(&self) -> String {
        let attribute = match &self.attribute {
            Some(raw) => raw.clone(),
            None => match &self.desc {
                Some(desc) => format!(
                    "ID={};COG={};CAT={};desc={}",
                    self.id,
                    self.group_str(),
                    self.cat,
                    desc
                ),
                None => format!("ID={};COG={};CAT={};", self.id, self.group_str(), self.cat),
            },
        };

        match &self.gff {
            Some(g) => format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                g.seqname, g.source, g.ftype, g.start, g.end, g.score, g.strand, g.frame, attribute
            ),
            // degenerate safety row: the position survives even without a
            // reconstructable source record
            None => format!(
                "{}\t{}\t{}\t{}\t{}\t.\t.\t.\t{}",
                ABSENT, ABSENT, ABSENT, self.key, self.key, attribute
            ),
        }
    }

    /// 4-column draft output row
    pub fn fmt_draft(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.id,
            self.source_str(),
            self.group_str(),
            self.cat
        )
    }
}
