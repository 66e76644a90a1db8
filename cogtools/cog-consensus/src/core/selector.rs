use clap::ValueEnum;
use hashbrown::HashMap;
use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use config::{CATEGORIES, CDS, UNKNOWN_CATEGORY};
use packcog::ConsensusRecord;

/// how a record carrying several candidate category letters is reduced to one
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// first letter as listed by the winning tool
    First,
    /// uniform choice among the candidates
    Random,
    /// the candidate most frequent across the whole result set
    MostFrequent,
    /// the candidate least frequent across the whole result set
    LeastFrequent,
}

/// reduce every ambiguous category assignment to a single letter
///
/// Records with one candidate (including the "-" sentinel) pass through
/// unchanged under every policy. The frequency policies are two-stage by
/// construction: the corpus-wide count must be complete before any single
/// record can be finalized, so stage one runs sequentially over the full set
/// and only stage two fans out.
pub fn select_categories(records: &mut [ConsensusRecord], policy: Policy, seed: Option<u64>) {
    match policy {
        Policy::First => {
            records.par_iter_mut().for_each(|rec| {
                if rec.cat.len() > 1 {
                    rec.cat.truncate(1);
                }
            });
        }
        Policy::Random => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            for rec in records.iter_mut() {
                if rec.cat.len() > 1 {
                    let letters: Vec<char> = rec.cat.chars().collect();
                    rec.cat = letters[rng.gen_range(0..letters.len())].to_string();
                }
            }
        }
        Policy::MostFrequent => pick_by_count(records, true),
        Policy::LeastFrequent => pick_by_count(records, false),
    }
}

/// a record contributes to the corpus statistics when it is a coding
/// feature; draft records carry no feature type and always count
fn counts_toward_corpus(rec: &ConsensusRecord) -> bool {
    match &rec.gff {
        Some(gff) => gff.ftype == CDS,
        None => true,
    }
}

fn pick_by_count(records: &mut [ConsensusRecord], most: bool) {
    // stage 1: corpus-wide letter frequencies, every occurrence counted,
    // multi-letter assignments contributing one count per letter
    let mut counts: HashMap<char, u64> = CATEGORIES.iter().map(|c| (*c, 0)).collect();

    for rec in records.iter().filter(|r| counts_toward_corpus(r)) {
        for letter in rec.cat.chars() {
            match counts.get_mut(&letter) {
                Some(n) => *n += 1,
                None => warn!(
                    "category letter {:?} is outside the canonical alphabet",
                    letter
                ),
            }
        }
    }

    // stage 2: per-record resolution against the frozen count table
    records.par_iter_mut().for_each(|rec| {
        if rec.cat.len() > 1 {
            rec.cat = pick_candidate(&rec.cat, &counts, most).to_string();
        }
    });
}

/// ties go to the earliest candidate as listed in the record
fn pick_candidate(cats: &str, counts: &HashMap<char, u64>, most: bool) -> char {
    let mut best: Option<(char, u64)> = None;
    let mut seen: Vec<char> = Vec::with_capacity(cats.len());

    for letter in cats.chars() {
        if seen.contains(&letter) {
            continue;
        }
        seen.push(letter);

        let n = counts.get(&letter).copied().unwrap_or(0);
        match best {
            None => best = Some((letter, n)),
            Some((_, m)) if (most && n > m) || (!most && n < m) => best = Some((letter, n)),
            _ => {}
        }
    }

    best.map(|(letter, _)| letter).unwrap_or(UNKNOWN_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packcog::{FeatureKey, GffFields};

    fn record(id: &str, cat: &str) -> ConsensusRecord {
        let mut rec = ConsensusRecord::unmatched(FeatureKey::Protein(id.to_string()));
        rec.cat = cat.to_string();
        rec
    }

    fn corpus() -> Vec<ConsensusRecord> {
        // L occurs 3 times, K once, J twice
        vec![
            record("p1", "L"),
            record("p2", "L"),
            record("p3", "J"),
            record("p4", "KL"),
            record("p5", "JK"),
        ]
    }

    #[test]
    fn test_first_policy_takes_leading_letter() {
        let mut records = vec![record("p1", "KLM")];
        select_categories(&mut records, Policy::First, None);

        assert_eq!(records[0].cat, "K");
    }

    #[test]
    fn test_single_candidate_is_untouched_by_every_policy() {
        for policy in [
            Policy::First,
            Policy::Random,
            Policy::MostFrequent,
            Policy::LeastFrequent,
        ] {
            let mut records = vec![record("p1", "J"), record("p2", "-")];
            select_categories(&mut records, policy, Some(7));

            assert_eq!(records[0].cat, "J");
            assert_eq!(records[1].cat, "-");
        }
    }

    #[test]
    fn test_most_frequent_is_deterministic() {
        let mut a = corpus();
        let mut b = corpus();

        select_categories(&mut a, Policy::MostFrequent, None);
        select_categories(&mut b, Policy::MostFrequent, None);

        assert_eq!(a, b);
        // L=3 beats K=2 for p4
        assert_eq!(a[3].cat, "L");
    }

    #[test]
    fn test_least_frequent_prefers_rarest_candidate() {
        let mut records = corpus();
        select_categories(&mut records, Policy::LeastFrequent, None);

        // K(2) < L(3) for p4; J(2) == K(2) for p5 -> earliest candidate wins
        assert_eq!(records[3].cat, "K");
        assert_eq!(records[4].cat, "J");
    }

    #[test]
    fn test_tie_goes_to_earliest_candidate() {
        let mut records = vec![record("p1", "XY"), record("p2", "YX")];
        select_categories(&mut records, Policy::MostFrequent, None);

        assert_eq!(records[0].cat, "X");
        assert_eq!(records[1].cat, "Y");
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = vec![record("p1", "JKLMN"), record("p2", "ACDEF")];
        let mut b = a.clone();

        select_categories(&mut a, Policy::Random, Some(42));
        select_categories(&mut b, Policy::Random, Some(42));

        assert_eq!(a, b);
        assert_eq!(a[0].cat.len(), 1);
    }

    #[test]
    fn test_noncoding_records_do_not_shape_the_corpus() {
        let gff = GffFields {
            seqname: "chr".to_string(),
            source: "operon-mapper".to_string(),
            ftype: "tRNA".to_string(),
            start: 1,
            end: 75,
            score: ".".to_string(),
            strand: "+".to_string(),
            frame: "0".to_string(),
        };

        // without the tRNA rows K would dominate; with them excluded L wins
        let mut trna_k = record("t1", "K");
        trna_k.gff = Some(gff.clone());
        let mut trna_k2 = record("t2", "K");
        trna_k2.gff = Some(gff);

        let mut records = vec![record("p1", "L"), record("p2", "L"), trna_k, trna_k2];
        records.push(record("p3", "KL"));

        select_categories(&mut records, Policy::MostFrequent, None);

        assert_eq!(records[4].cat, "L");
    }
}
