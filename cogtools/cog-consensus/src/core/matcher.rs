use bio::alignment::pairwise::Aligner;
use hashbrown::HashSet;
use log::warn;

use config::{MATCH_WINDOW, MIN_MATCH_IDENTITY};
use packcog::{AlignedTriple, FeatureKey, Tool, ToolCall, ToolTable};

/// alignment penalties for the similarity oracle
const MATCH_SCORE: i32 = 1;
const MISMATCH_SCORE: i32 = -1;
const GAP_OPEN: i32 = -1;
const GAP_EXTEND: i32 = -1;

/// a named amino-acid sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Protein {
    pub id: String,
    pub seq: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchParams {
    pub window: usize,
    pub min_identity: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            window: MATCH_WINDOW,
            min_identity: MIN_MATCH_IDENTITY,
        }
    }
}

/// outer-join up to three tool tables (plus the universe of keys that must
/// appear in the output) into one triple per feature
///
/// Keys keep their first-appearance order across (mapper, operon, domain,
/// universe); complete-genome callers pass `sort` to restore genomic
/// position order instead. Absence from a table fills the slot with `None`
/// -- partial coverage is meaningful, never an error.
pub fn outer_join(
    mapper: ToolTable,
    operon: ToolTable,
    domain: ToolTable,
    universe: Vec<FeatureKey>,
    sort: bool,
) -> Vec<AlignedTriple> {
    let mut keys: Vec<FeatureKey> = Vec::new();
    let mut seen: HashSet<FeatureKey> = HashSet::new();

    for key in mapper
        .keys
        .iter()
        .chain(operon.keys.iter())
        .chain(domain.keys.iter())
        .chain(universe.iter())
    {
        if seen.insert(key.clone()) {
            keys.push(key.clone());
        }
    }

    if sort {
        keys.sort();
    }

    let (mut m, mut o, mut d) = (mapper.calls, operon.calls, domain.calls);

    keys.into_iter()
        .map(|key| AlignedTriple {
            mapper: m.remove(&key),
            operon: o.remove(&key),
            domain: d.remove(&key),
            key,
        })
        .collect()
}

/// pair each reference protein with a candidate from a near-sequential list
///
/// For every reference protein the next `window` candidates past the cursor
/// are tried for exact sequence equality or a local-alignment score over the
/// shorter sequence above `min_identity`; the first hit advances the cursor
/// to its position. This amortizes to a near-linear scan tolerant of small
/// insertions and deletions in tool ordering. Best effort by construction:
/// one missed match can offset the window for everything after it, so
/// misses are surfaced (as `None`) rather than silently absorbed.
pub fn pair_by_similarity(
    reference: &[Protein],
    candidates: &[Protein],
    params: &MatchParams,
) -> Vec<Option<usize>> {
    let mut hits = Vec::with_capacity(reference.len());
    let mut cursor: isize = -1;

    for protein in reference {
        let mut found = None;

        for offset in 1..=params.window {
            let idx = (cursor + offset as isize) as usize;
            let candidate = match candidates.get(idx) {
                Some(c) => c,
                None => break,
            };

            if protein.seq == candidate.seq
                || identity(&protein.seq, &candidate.seq) > params.min_identity
            {
                found = Some(idx);
                break;
            }
        }

        if let Some(idx) = found {
            cursor = idx as isize;
        }
        hits.push(found);
    }

    hits
}

/// local alignment score normalized by the shorter sequence length
fn identity(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let score = |x: u8, y: u8| {
        if x == y {
            MATCH_SCORE
        } else {
            MISMATCH_SCORE
        }
    };
    let mut aligner = Aligner::with_capacity(a.len(), b.len(), GAP_OPEN, GAP_EXTEND, &score);

    aligner.local(a, b).score as f64 / a.len().min(b.len()) as f64
}

/// re-key an operon table from tool-internal protein ids to the reference
/// ids it was paired with; unmatched reference proteins keep no operon slot
pub fn rekey_by_similarity(
    table: ToolTable,
    reference: &[Protein],
    candidates: &[Protein],
    params: &MatchParams,
) -> ToolTable {
    let hits = pair_by_similarity(reference, candidates, params);
    let mut rekeyed = ToolTable::new(table.tool);
    let mut missed = 0;

    for (i, hit) in hits.iter().enumerate() {
        let idx = match hit {
            Some(idx) => *idx,
            None => {
                missed += 1;
                continue;
            }
        };

        let id = reference[i].id.clone();
        let call = table
            .calls
            .get(&FeatureKey::Protein(candidates[idx].id.clone()))
            .map(|c| ToolCall {
                id: id.clone(),
                ..c.clone()
            })
            // paired protein without a group row: an explicit no-call
            .unwrap_or_else(|| ToolCall {
                tool: Tool::Operon,
                id: id.clone(),
                group: None,
                cats: None,
                desc: None,
                gff: None,
            });

        rekeyed.insert(FeatureKey::Protein(id), call);
    }

    if missed > 0 {
        warn!(
            "{} reference proteins had no counterpart within the search window",
            missed
        );
    }

    rekeyed
}
