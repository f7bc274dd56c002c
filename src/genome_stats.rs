// src/genome_stats.rs

use ahash::AHashMap;

use crate::error::{CoverageError, Result};
use crate::mapping::{GenomeRecord, MappingTable};
use crate::types::{GenomeStat, Metadata, ProteinStat, ProteinSummary};

/// Protein- and genome-level output of one run, both in mapping-file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rollup {
    pub proteins: Vec<ProteinSummary>,
    pub genomes: Vec<GenomeStat>,
}

/// Running length-weighted sums for one genome.
#[derive(Default, Debug, Clone)]
struct GenomeTotals {
    total_length: u64,
    total_proteins: usize,
    detected_proteins: usize,
    nreads: u64,
    coverage: f64,
    depth: f64,
    pctid: f64,
    bitscore: f64,
    alen: f64,
}

impl GenomeTotals {
    fn add_protein(&mut self, length: usize, stat: Option<&ProteinStat>) {
        self.total_length += length as u64;
        self.total_proteins += 1;

        // Undetected proteins still weigh in through total_length
        if let Some(stat) = stat {
            let w = length as f64;
            if stat.coverage > 0.0 {
                self.detected_proteins += 1;
            }
            self.nreads += stat.nreads;
            self.coverage += stat.coverage * w;
            self.depth += stat.depth * w;
            self.pctid += stat.pctid * w;
            self.bitscore += stat.bitscore * w;
            self.alen += stat.alen * w;
        }
    }

    fn finish(self, genome: String, metadata: Metadata) -> GenomeStat {
        let denom = self.total_length as f64;
        GenomeStat {
            genome,
            total_length: self.total_length,
            total_proteins: self.total_proteins,
            detected_proteins: self.detected_proteins,
            nreads: self.nreads,
            coverage: self.coverage / denom,
            depth: self.depth / denom,
            pctid: self.pctid / denom,
            bitscore: self.bitscore / denom,
            alen: self.alen / denom,
            metadata,
        }
    }
}

/// Genome-level pass-through attributes. Constant columns are copied; columns
/// with several distinct values are joined with `"; "` when `join_multi_valued`
/// is set and dropped otherwise.
pub fn genome_metadata(record: &GenomeRecord, join_multi_valued: bool) -> Metadata {
    let mut out = Vec::with_capacity(record.attributes.len());
    for (column, values) in &record.attributes {
        if let Some(value) = record.constant_value(column) {
            out.push((column.clone(), value.to_string()));
        } else if let Some(joined) = record.display_value(column) {
            if join_multi_valued {
                out.push((column.clone(), joined));
            } else {
                log::warn!(
                    "Genome {} has {} distinct values for '{}'; leaving it out",
                    record.genome,
                    values.len(),
                    column
                );
            }
        }
    }
    Metadata(out)
}

/// Roll detected proteins up to their genomes.
///
/// Every protein in `protein_stats` must be declared in `mapping`. Genomes
/// where no member protein has coverage are left out entirely, and so are
/// their proteins.
pub fn summarize_genomes(
    protein_stats: Vec<ProteinStat>,
    mapping: &MappingTable,
    join_multi_valued: bool,
) -> Result<Rollup> {
    // 1. Index the detected proteins and validate them against the mapping
    let mut by_protein: AHashMap<String, ProteinStat> = AHashMap::with_capacity(protein_stats.len());
    for stat in protein_stats {
        let entry = mapping.protein(&stat.protein).ok_or_else(|| {
            CoverageError::consistency(&stat.protein, "protein has no entry in the mapping table")
        })?;
        if entry.length != stat.length {
            return Err(CoverageError::consistency(
                &stat.protein,
                format!(
                    "aligned subject length {} differs from declared length {}",
                    stat.length, entry.length
                ),
            ));
        }
        by_protein.insert(stat.protein.clone(), stat);
    }

    // 2. Left-join onto every declared protein, genome by genome
    let proteins = mapping.proteins();
    let mut genomes = Vec::new();
    let mut kept_metadata: AHashMap<&str, Metadata> = AHashMap::new();

    for record in mapping.genomes() {
        let mut totals = GenomeTotals::default();
        for &ix in &record.proteins {
            let entry = &proteins[ix];
            totals.add_protein(entry.length, by_protein.get(&entry.protein));
        }

        if totals.detected_proteins == 0 {
            log::debug!("Genome {} has no detected proteins", record.genome);
            continue;
        }

        let metadata = genome_metadata(record, join_multi_valued);
        kept_metadata.insert(record.genome.as_str(), metadata.clone());
        genomes.push(totals.finish(record.genome.clone(), metadata));
    }

    // 3. Protein rows in mapping order, annotated with their genome
    let mut protein_rows = Vec::with_capacity(by_protein.len());
    for entry in proteins {
        let Some(metadata) = kept_metadata.get(entry.genome.as_str()) else {
            continue;
        };
        if let Some(stat) = by_protein.remove(&entry.protein) {
            protein_rows.push(ProteinSummary {
                stat,
                genome: Some(entry.genome.clone()),
                metadata: metadata.clone(),
            });
        }
    }

    log::info!(
        "Summarized {} genomes from {} detected proteins",
        genomes.len(),
        protein_rows.len()
    );

    Ok(Rollup {
        proteins: protein_rows,
        genomes,
    })
}

/// Protein rows without a mapping: statistics only, in stream order.
pub fn unannotated(protein_stats: Vec<ProteinStat>) -> Rollup {
    Rollup {
        proteins: protein_stats
            .into_iter()
            .map(|stat| ProteinSummary {
                stat,
                genome: None,
                metadata: Metadata::default(),
            })
            .collect(),
        genomes: Vec::new(),
    }
}
