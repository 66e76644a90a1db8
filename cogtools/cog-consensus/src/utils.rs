use anyhow::Result;
use bio::io::fasta;
use hashbrown::HashMap;
use log::{info, warn};

use std::path::{Path, PathBuf};

use config::{
    write_collection, ABSENT, DRAFT_HEADER, DRAFT_OUT_PREFIX, GENOME_OUT_SUFFIX, MIN_GFF_FIELDS,
    NCRNA, PSEUDOGENE, VERSION,
};
use packcog::{
    pack_draft, pack_genomic, ConsensusRecord, FeatureKey, GffFields, Tool, ToolTable,
};

use crate::cli::{DraftArgs, GenomeArgs};
use crate::core::matcher::Protein;

/// load the three (or fewer) normalized complete-genome tables in slot order
pub fn load_genomic_tables(args: &GenomeArgs) -> Result<[Option<ToolTable>; 3]> {
    Ok([
        args.mapper
            .as_ref()
            .map(|p| pack_genomic(p, Tool::Mapper))
            .transpose()?,
        args.operon
            .as_ref()
            .map(|p| pack_genomic(p, Tool::Operon))
            .transpose()?,
        args.domain
            .as_ref()
            .map(|p| pack_genomic(p, Tool::Domain))
            .transpose()?,
    ])
}

/// load the three (or fewer) normalized draft tables in slot order
pub fn load_draft_tables(args: &DraftArgs) -> Result<[Option<ToolTable>; 3]> {
    Ok([
        args.mapper
            .as_ref()
            .map(|p| pack_draft(p, Tool::Mapper))
            .transpose()?,
        args.operon
            .as_ref()
            .map(|p| pack_draft(p, Tool::Operon))
            .transpose()?,
        args.domain
            .as_ref()
            .map(|p| pack_draft(p, Tool::Domain))
            .transpose()?,
    ])
}

/// read a protein FASTA; predicted proteins carry a trailing stop symbol
/// that must not count against sequence equality
pub fn load_proteins<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Vec<Protein>> {
    let reader = fasta::Reader::from_file(&path)
        .map_err(|e| anyhow::anyhow!("cannot read proteins {:?}: {}", path, e))?;

    let mut proteins = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut seq = record.seq().to_vec();

        if seq.last() == Some(&b'*') {
            seq.pop();
        }

        proteins.push(Protein {
            id: record.id().to_string(),
            seq,
        });
    }

    info!("{} proteins in {:?}", proteins.len(), path);
    Ok(proteins)
}

/// fold the organism feature table into the consensus output: features
/// listed as pseudogenes are retyped in place, ncRNA features are appended
/// with their attribute kept verbatim
pub fn enrich_from_gff(
    records: &mut Vec<ConsensusRecord>,
    path: &PathBuf,
    pseudo: bool,
    ncrna: bool,
) -> Result<()> {
    let contents = std::fs::read_to_string(path)?;

    let index: HashMap<u64, usize> = records
        .iter()
        .enumerate()
        .filter_map(|(i, rec)| match rec.key {
            FeatureKey::Coord(start) => Some((start, i)),
            FeatureKey::Protein(_) => None,
        })
        .collect();

    let mut retyped = 0;
    let mut appended = 0;

    for line in contents
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
    {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_GFF_FIELDS {
            warn!("skipping truncated feature row: {}", line);
            continue;
        }

        let start: u64 = match fields[3].trim().parse() {
            Ok(start) => start,
            Err(_) => {
                warn!("skipping feature row with bad coordinate: {}", line);
                continue;
            }
        };

        match fields[2] {
            PSEUDOGENE if pseudo => {
                if let Some(&i) = index.get(&start) {
                    if let Some(gff) = &mut records[i].gff {
                        gff.ftype = PSEUDOGENE.to_string();
                        retyped += 1;
                    }
                }
            }
            NCRNA if ncrna => {
                let end: u64 = fields[4].trim().parse().unwrap_or(start);
                records.push(ConsensusRecord {
                    key: FeatureKey::Coord(start),
                    id: ABSENT.to_string(),
                    source: None,
                    group: None,
                    cat: ABSENT.to_string(),
                    desc: None,
                    gff: Some(GffFields {
                        seqname: fields[0].to_string(),
                        source: fields[1].to_string(),
                        ftype: NCRNA.to_string(),
                        start,
                        end,
                        score: fields[5].to_string(),
                        strand: fields[6].to_string(),
                        frame: fields[7].to_string(),
                    }),
                    attribute: Some(fields[8].to_string()),
                });
                appended += 1;
            }
            _ => {}
        }
    }

    info!(
        "Feature table: {} pseudogenes retyped, {} ncRNAs appended",
        retyped, appended
    );
    Ok(())
}

fn header(accession: &str) -> Vec<String> {
    vec![
        format!("# created with cogtools {}", VERSION),
        format!("# AC number: {}", accession),
        "# COG annotation".to_string(),
    ]
}

/// write the complete-genome output table, optionally followed by the
/// genomic sequence the downstream plotter expects in the same file
pub fn write_genomic(records: &[ConsensusRecord], args: &GenomeArgs) -> Result<()> {
    let accession = records
        .iter()
        .find_map(|r| r.gff.as_ref().map(|g| g.seqname.clone()))
        .unwrap_or_else(|| "unknown".to_string());

    let mut data: Vec<String> = records.iter().map(|r| r.fmt_genomic()).collect();

    if let Some(fasta) = &args.fasta {
        data.push(String::new());
        data.push(std::fs::read_to_string(fasta)?.trim_end().to_string());
    }

    let fname = args
        .output
        .join(format!("{}{}", args.name, GENOME_OUT_SUFFIX));
    write_collection(&header(&accession), &data, &fname);

    Ok(())
}

/// write the draft output table with its column header
pub fn write_draft(records: &[ConsensusRecord], args: &DraftArgs) -> Result<()> {
    let mut headers = header("unknown");
    headers.push(DRAFT_HEADER.to_string());

    let data: Vec<String> = records.iter().map(|r| r.fmt_draft()).collect();

    let fname = args
        .output
        .join(format!("{}{}.txt", DRAFT_OUT_PREFIX, args.name));
    write_collection(&headers, &data, &fname);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_proteins_trims_stop_symbol() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">WP_1.1 some description").unwrap();
        writeln!(file, "MKTAYIAKQR*").unwrap();
        writeln!(file, ">WP_2.1").unwrap();
        writeln!(file, "GDGTQDNLSG").unwrap();

        let proteins = load_proteins(file.path()).unwrap();

        assert_eq!(proteins.len(), 2);
        assert_eq!(proteins[0].id, "WP_1.1");
        assert_eq!(proteins[0].seq, b"MKTAYIAKQR".to_vec());
        assert_eq!(proteins[1].seq, b"GDGTQDNLSG".to_vec());
    }

    #[test]
    fn test_enrich_from_gff() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# feature table").unwrap();
        writeln!(
            file,
            "chr\tena\tpseudogene\t100\t400\t.\t+\t.\tID=gene_1;pseudo=true"
        )
        .unwrap();
        writeln!(file, "chr\tena\tncRNA\t900\t975\t.\t-\t.\tID=rna_1").unwrap();

        let call = packcog::ToolCall {
            tool: Tool::Operon,
            id: "gene_1".to_string(),
            group: None,
            cats: None,
            desc: None,
            gff: Some(GffFields {
                seqname: "chr".to_string(),
                source: "operon-mapper".to_string(),
                ftype: "CDS".to_string(),
                start: 100,
                end: 400,
                score: ".".to_string(),
                strand: "+".to_string(),
                frame: "0".to_string(),
            }),
        };
        let mut records = vec![ConsensusRecord::from_call(&FeatureKey::Coord(100), &call)];

        enrich_from_gff(&mut records, &file.path().to_path_buf(), true, true).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gff.as_ref().unwrap().ftype, "pseudogene");
        assert_eq!(records[1].key, FeatureKey::Coord(900));
        assert_eq!(records[1].attribute.as_deref(), Some("ID=rna_1"));
        assert!(records[1].fmt_genomic().ends_with("ID=rna_1"));
    }
}
