use log::debug;

use packcog::{AlignedTriple, ConsensusRecord, FeatureKey, ToolCall};

use crate::core::lookup::CategoryTable;

/// complete-genome runs must keep every position in the output; draft runs
/// mark unmatched proteins instead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Genome,
    Draft,
}

/// pick the authoritative record for one feature
///
/// A slot only casts a vote when it carries a group assignment: an empty
/// slot and a present row whose group is the "-" sentinel are both silent.
/// The protocol trusts the curated domain search whenever it agrees with
/// anything or stands alone against disagreement; the ortholog mapper wins
/// only when it pairs with the operon mapper against the domain call, and
/// its vocabulary is then translated through the canonical table. This never
/// fails: a group id outside the table simply keeps its reported category.
pub fn resolve(triple: AlignedTriple, lookup: &CategoryTable, mode: Mode) -> ConsensusRecord {
    let m = triple.mapper.as_ref().filter(|c| c.group.is_some());
    let o = triple.operon.as_ref().filter(|c| c.group.is_some());
    let d = triple.domain.as_ref().filter(|c| c.group.is_some());

    match (m, o, d) {
        // all three voted: only a mapper+operon pair overrides the domain call
        (Some(m), Some(o), Some(d)) => {
            if m.group == o.group && m.group != d.group {
                remapped(&triple.key, m, lookup)
            } else {
                ConsensusRecord::from_call(&triple.key, d)
            }
        }
        // one tool silent: the domain call keeps precedence while present
        (None, Some(_), Some(d)) | (Some(_), None, Some(d)) => {
            ConsensusRecord::from_call(&triple.key, d)
        }
        (Some(m), Some(_), None) => remapped(&triple.key, m, lookup),
        // a single voice: take it; mapper/operon vocabularies go through the table
        (Some(m), None, None) => remapped(&triple.key, m, lookup),
        (None, Some(o), None) => remapped(&triple.key, o, lookup),
        (None, None, Some(d)) => ConsensusRecord::from_call(&triple.key, d),
        (None, None, None) => fallback(&triple, mode),
    }
}

/// swap the call's category for the canonical one when its group is known
fn remapped(key: &FeatureKey, call: &ToolCall, lookup: &CategoryTable) -> ConsensusRecord {
    let mut rec = ConsensusRecord::from_call(key, call);

    if let Some(group) = call.group.as_deref() {
        match lookup.lookup(group) {
            Some(cats) => rec.cat = cats.to_string(),
            None => debug!(
                "{} is outside the canonical group table, keeping category {}",
                group, rec.cat
            ),
        }
    }

    rec
}

/// no tool voted for this feature
fn fallback(triple: &AlignedTriple, mode: Mode) -> ConsensusRecord {
    match mode {
        // the operon table covers every predicted position, so its raw row
        // keeps the position represented even with no assignment
        Mode::Genome => {
            let call = triple
                .operon
                .as_ref()
                .or(triple.mapper.as_ref())
                .or(triple.domain.as_ref());
            match call {
                Some(call) => ConsensusRecord::from_call(&triple.key, call),
                None => ConsensusRecord::unmatched(triple.key.clone()),
            }
        }
        Mode::Draft => ConsensusRecord::unmatched(triple.key.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packcog::{GffFields, Tool};

    fn call(tool: Tool, group: Option<&str>, cats: Option<&str>) -> ToolCall {
        ToolCall {
            tool,
            id: "feat_1".to_string(),
            group: group.map(str::to_string),
            cats: cats.map(str::to_string),
            desc: None,
            gff: None,
        }
    }

    fn triple(
        mapper: Option<ToolCall>,
        operon: Option<ToolCall>,
        domain: Option<ToolCall>,
    ) -> AlignedTriple {
        AlignedTriple {
            key: FeatureKey::Protein("feat_1".to_string()),
            mapper,
            operon,
            domain,
        }
    }

    fn lookup() -> CategoryTable {
        CategoryTable::from_lines("COG0001\tJ\nCOG0002\tH\nCOG0099\tS\n")
    }

    #[test]
    fn test_three_way_disagreement_takes_domain_unmodified() {
        let t = triple(
            Some(call(Tool::Mapper, Some("COG0002"), Some("K"))),
            Some(call(Tool::Operon, Some("COG0099"), Some("S"))),
            Some(call(Tool::Domain, Some("COG0001"), Some("J"))),
        );

        let rec = resolve(t, &lookup(), Mode::Draft);

        assert_eq!(rec.source, Some(Tool::Domain));
        assert_eq!(rec.group.as_deref(), Some("COG0001"));
        assert_eq!(rec.cat, "J");
    }

    #[test]
    fn test_unanimous_vote_takes_domain() {
        let t = triple(
            Some(call(Tool::Mapper, Some("COG0001"), Some("J"))),
            Some(call(Tool::Operon, Some("COG0001"), Some("J"))),
            Some(call(Tool::Domain, Some("COG0001"), Some("J"))),
        );

        assert_eq!(resolve(t, &lookup(), Mode::Draft).source, Some(Tool::Domain));
    }

    #[test]
    fn test_mapper_operon_pair_overrides_domain_and_remaps() {
        let t = triple(
            Some(call(Tool::Mapper, Some("COG0002"), Some("K"))),
            Some(call(Tool::Operon, Some("COG0002"), Some("K"))),
            Some(call(Tool::Domain, Some("COG0001"), Some("J"))),
        );

        let rec = resolve(t, &lookup(), Mode::Draft);

        assert_eq!(rec.source, Some(Tool::Mapper));
        // COG0002 is canonical, so the category comes from the table
        assert_eq!(rec.cat, "H");
    }

    #[test]
    fn test_mapper_operon_pair_keeps_native_category_on_lookup_miss() {
        let t = triple(
            Some(call(Tool::Mapper, Some("2QVKP"), Some("K"))),
            Some(call(Tool::Operon, Some("2QVKP"), Some("K"))),
            Some(call(Tool::Domain, Some("COG0001"), Some("J"))),
        );

        let rec = resolve(t, &lookup(), Mode::Draft);

        assert_eq!(rec.source, Some(Tool::Mapper));
        assert_eq!(rec.cat, "K");
    }

    #[test]
    fn test_pair_including_domain_takes_domain() {
        let t = triple(
            Some(call(Tool::Mapper, Some("COG0099"), Some("S"))),
            Some(call(Tool::Operon, Some("COG0001"), Some("J"))),
            Some(call(Tool::Domain, Some("COG0001"), Some("J"))),
        );

        let rec = resolve(t, &lookup(), Mode::Draft);

        assert_eq!(rec.source, Some(Tool::Domain));
        assert_eq!(rec.cat, "J");
    }

    #[test]
    fn test_silent_operon_takes_domain_unchanged() {
        // mapper and domain agree on COG0001; operon made no call
        let t = triple(
            Some(call(Tool::Mapper, Some("COG0001"), Some("J"))),
            Some(call(Tool::Operon, None, None)),
            Some(call(Tool::Domain, Some("COG0001"), Some("J"))),
        );

        let rec = resolve(t, &lookup(), Mode::Draft);

        assert_eq!(rec.source, Some(Tool::Domain));
        assert_eq!(rec.cat, "J");
    }

    #[test]
    fn test_silent_domain_takes_mapper_with_remap_fallback() {
        let t = triple(
            Some(call(Tool::Mapper, Some("COG0002"), Some("K"))),
            Some(call(Tool::Operon, Some("COG0099"), Some("S"))),
            None,
        );

        let rec = resolve(t, &lookup(), Mode::Draft);

        assert_eq!(rec.source, Some(Tool::Mapper));
        assert_eq!(rec.cat, "H");

        // same shape with a group outside the table keeps the native letter
        let t = triple(
            Some(call(Tool::Mapper, Some("28PHR"), Some("K"))),
            Some(call(Tool::Operon, Some("COG0099"), Some("S"))),
            None,
        );

        assert_eq!(resolve(t, &lookup(), Mode::Draft).cat, "K");
    }

    #[test]
    fn test_single_voice_is_taken_and_remapped() {
        let t = triple(None, Some(call(Tool::Operon, Some("COG0099"), Some("-"))), None);
        let rec = resolve(t, &lookup(), Mode::Draft);

        assert_eq!(rec.source, Some(Tool::Operon));
        assert_eq!(rec.cat, "S");

        let t = triple(None, None, Some(call(Tool::Domain, Some("COG0002"), Some("X"))));
        let rec = resolve(t, &lookup(), Mode::Draft);

        // the domain vocabulary is already canonical, no remap happens
        assert_eq!(rec.cat, "X");
    }

    #[test]
    fn test_no_votes_in_genome_mode_falls_back_to_operon_raw_record() {
        let mut operon = call(Tool::Operon, None, None);
        operon.gff = Some(GffFields {
            seqname: "chr".to_string(),
            source: "operon-mapper".to_string(),
            ftype: "tRNA".to_string(),
            start: 500,
            end: 575,
            score: ".".to_string(),
            strand: "+".to_string(),
            frame: "0".to_string(),
        });

        let t = AlignedTriple {
            key: FeatureKey::Coord(500),
            mapper: None,
            operon: Some(operon),
            domain: None,
        };

        let rec = resolve(t, &lookup(), Mode::Genome);

        assert_eq!(rec.source, Some(Tool::Operon));
        assert_eq!(rec.cat, "-");
        assert_eq!(rec.gff.as_ref().unwrap().ftype, "tRNA");
    }

    #[test]
    fn test_no_votes_in_draft_mode_yields_unmatched_marker() {
        let t = AlignedTriple {
            key: FeatureKey::Protein("WP_5.1".to_string()),
            mapper: None,
            operon: None,
            domain: None,
        };

        let rec = resolve(t, &lookup(), Mode::Draft);

        assert!(rec.source.is_none());
        assert_eq!(rec.group, None);
        assert_eq!(rec.cat, "-");
    }
}
