use anyhow::Result;
use dashmap::DashMap;
use log::{info, warn};
use rayon::prelude::*;

use config::get_progress_bar;
use packcog::{ConsensusRecord, FeatureKey, Tool, ToolTable};

use crate::cli::{DraftArgs, GenomeArgs};
use crate::core::lookup::CategoryTable;
use crate::core::matcher::MatchParams;
use crate::core::resolver::Mode;
use crate::utils;

pub mod lookup;
pub mod matcher;
pub mod resolver;
pub mod selector;

/// consensus over a complete genome, keyed by start coordinate
pub fn run_genome(args: GenomeArgs) -> Result<()> {
    let lookup = CategoryTable::load(&args.cogs)?;
    let tables = utils::load_genomic_tables(&args)?;

    let mut records = consensus(tables, Vec::new(), &lookup, Mode::Genome);
    selector::select_categories(&mut records, args.choice, args.seed);

    if args.pseudo || args.ncrna {
        if let Some(gff) = &args.gff {
            utils::enrich_from_gff(&mut records, gff, args.pseudo, args.ncrna)?;
        }
    }

    // position order is the output contract, also after ncRNA appending
    records.sort_by(|a, b| a.key.cmp(&b.key));

    utils::write_genomic(&records, &args)?;
    Ok(())
}

/// consensus over a draft genome, keyed by protein id
pub fn run_draft(args: DraftArgs) -> Result<()> {
    let lookup = CategoryTable::load(&args.cogs)?;
    let proteins = utils::load_proteins(&args.proteins)?;
    let mut tables = utils::load_draft_tables(&args)?;

    // no shared ids between the operon output and the downloaded reference:
    // pair the protein lists and re-key the operon table first
    if let Some(op_fasta) = &args.operon_proteins {
        if let Some(operon) = tables[1].take() {
            let candidates = utils::load_proteins(op_fasta)?;
            let params = MatchParams {
                window: args.window,
                min_identity: args.min_identity,
            };

            info!(
                "No shared ids with the operon output; pairing {} reference proteins by similarity",
                proteins.len()
            );
            tables[1] = Some(matcher::rekey_by_similarity(
                operon,
                &proteins,
                &candidates,
                &params,
            ));
        }
    }

    let universe = proteins
        .iter()
        .map(|p| FeatureKey::Protein(p.id.clone()))
        .collect();

    let mut records = consensus(tables, universe, &lookup, Mode::Draft);
    selector::select_categories(&mut records, args.choice, args.seed);

    utils::write_draft(&records, &args)?;
    Ok(())
}

/// dispatch on the input shape: 0, 1 or 3 tool tables (2 is rejected at the
/// CLI boundary before this point)
fn consensus(
    tables: [Option<ToolTable>; 3],
    universe: Vec<FeatureKey>,
    lookup: &CategoryTable,
    mode: Mode,
) -> Vec<ConsensusRecord> {
    match tables.iter().flatten().count() {
        0 => {
            warn!("Nothing to reconcile: no tool tables were supplied");
            universe
                .into_iter()
                .map(ConsensusRecord::unmatched)
                .collect()
        }
        1 => {
            // single-tool runs skip the vote; the table's own calls are the
            // consensus and only category selection applies
            let table = tables.into_iter().flatten().next().unwrap();
            info!("Single table from {}: passing calls through", table.tool);

            table
                .keys
                .iter()
                .filter_map(|key| {
                    table
                        .calls
                        .get(key)
                        .map(|call| ConsensusRecord::from_call(key, call))
                })
                .collect()
        }
        _ => {
            let [mapper, operon, domain] = tables;
            let triples = matcher::outer_join(
                mapper.unwrap_or_else(|| ToolTable::new(Tool::Mapper)),
                operon.unwrap_or_else(|| ToolTable::new(Tool::Operon)),
                domain.unwrap_or_else(|| ToolTable::new(Tool::Domain)),
                universe,
                mode == Mode::Genome,
            );

            resolve_all(triples, lookup, mode)
        }
    }
}

/// resolve every triple in parallel; output order follows triple order
fn resolve_all(
    triples: Vec<packcog::AlignedTriple>,
    lookup: &CategoryTable,
    mode: Mode,
) -> Vec<ConsensusRecord> {
    let pb = get_progress_bar(triples.len() as u64, "Resolving consensus...");
    let stats = ResolveStats::default();

    let records: Vec<ConsensusRecord> = triples
        .into_par_iter()
        .map(|triple| {
            let rec = resolver::resolve(triple, lookup, mode);
            stats.inc(rec.source);
            pb.inc(1);
            rec
        })
        .collect();

    pb.finish_and_clear();
    stats.log();

    records
}

/// per-source tally of chosen records, filled from the parallel loop
#[derive(Default)]
struct ResolveStats {
    chosen: DashMap<&'static str, u64>,
}

impl ResolveStats {
    fn inc(&self, source: Option<Tool>) {
        let tag = source.map(|t| t.tag()).unwrap_or("unmatched");
        *self.chosen.entry(tag).or_insert(0) += 1;
    }

    fn log(&self) {
        for entry in self.chosen.iter() {
            info!("{}: {} records chosen", entry.key(), entry.value());
        }
    }
}
