// src/lib.rs
pub mod alignment;
pub mod config;
pub mod coverage;
pub mod error;
pub mod genome_stats;
pub mod logging;
pub mod mapping;
pub mod output;
pub mod reader;
pub mod types;

use std::fmt::Write as FmtWrite;
use std::io::BufRead;
use std::path::Path;

use crate::alignment::AlignmentParser;
use crate::config::{LengthSource, SummaryOptions};
use crate::coverage::{accumulate, accumulate_parallel, summarize_subjects, LengthResolver};
use crate::error::{CoverageError, Result};
use crate::genome_stats::{summarize_genomes, unannotated};
use crate::mapping::MappingTable;
use crate::reader::open_text;
use crate::types::{GenomeStat, Metadata, ProteinSummary};

pub use crate::error::ErrorKind;

/// Protein- and genome-level summaries of one alignment file.
/// Text renderings are generated on demand from the structured rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageResults {
    /// One row per detected protein, in mapping-file order (stream order
    /// when no mapping was given).
    pub proteins: Vec<ProteinSummary>,

    /// One row per genome with at least one detected protein.
    pub genomes: Vec<GenomeStat>,

    /// Extra mapping columns, used as trailing TSV columns.
    pub metadata_columns: Vec<String>,
}

impl CoverageResults {
    /// Number of alignment records that contributed to the protein rows.
    pub fn total_alignments(&self) -> u64 {
        self.proteins.iter().map(|p| p.stat.nreads).sum()
    }

    /// Generate the protein table as TSV
    pub fn get_protein_table(&self) -> String {
        let mut output = String::new();
        output.push_str("protein\tcoverage\tdepth\tpctid\talen\tbitscore\tnreads\tlength\tgenome");
        push_metadata_header(&mut output, &self.metadata_columns);

        for row in &self.proteins {
            let s = &row.stat;
            write!(
                output,
                "{}\t{:.6}\t{:.6}\t{:.4}\t{:.4}\t{:.4}\t{}\t{}\t{}",
                s.protein,
                s.coverage,
                s.depth,
                s.pctid,
                s.alen,
                s.bitscore,
                s.nreads,
                s.length,
                row.genome.as_deref().unwrap_or("")
            )
            .unwrap();
            push_metadata_values(&mut output, &self.metadata_columns, &row.metadata);
        }
        output
    }

    /// Generate the genome table as TSV
    pub fn get_genome_table(&self) -> String {
        let mut output = String::new();
        output.push_str(
            "genome\ttotal_length\ttotal_proteins\tdetected_proteins\tnreads\tcoverage\tdepth\tpctid\tbitscore\talen",
        );
        push_metadata_header(&mut output, &self.metadata_columns);

        for g in &self.genomes {
            write!(
                output,
                "{}\t{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{:.4}\t{:.4}\t{:.4}",
                g.genome,
                g.total_length,
                g.total_proteins,
                g.detected_proteins,
                g.nreads,
                g.coverage,
                g.depth,
                g.pctid,
                g.bitscore,
                g.alen
            )
            .unwrap();
            push_metadata_values(&mut output, &self.metadata_columns, &g.metadata);
        }
        output
    }
}

fn push_metadata_header(output: &mut String, columns: &[String]) {
    for c in columns {
        output.push('\t');
        output.push_str(c);
    }
    output.push('\n');
}

fn push_metadata_values(output: &mut String, columns: &[String], metadata: &Metadata) {
    for c in columns {
        output.push('\t');
        output.push_str(metadata.get(c).unwrap_or(""));
    }
    output.push('\n');
}

/// Summarize an alignment file, optionally rolling proteins up to genomes.
pub fn summarize_alignments<P: AsRef<Path>>(
    alignments_path: P,
    mapping: Option<&MappingTable>,
    options: &SummaryOptions,
) -> Result<CoverageResults> {
    let path = alignments_path.as_ref();
    log::info!("Reading from {}", path.display());
    let reader = open_text(path)?;
    summarize_reader(reader, mapping, options).map_err(|e| match e {
        CoverageError::Io { source, .. } => CoverageError::io(path, source),
        other => other,
    })
}

/// Same as [`summarize_alignments`], reading from any buffered source.
pub fn summarize_reader<R: BufRead>(
    reader: R,
    mapping: Option<&MappingTable>,
    options: &SummaryOptions,
) -> Result<CoverageResults> {
    // 1. Decide where subject lengths come from
    let resolver = match (options.length_source, mapping) {
        (LengthSource::Table, Some(table)) => LengthResolver::Table(table),
        (LengthSource::Table, None) => {
            return Err(CoverageError::Config(
                "table length source needs a mapping table".to_string(),
            ))
        }
        (LengthSource::Inline, _) => LengthResolver::Inline,
    };
    let parser = AlignmentParser::new(options.columns, options.length_source);

    // 2. Accumulate coverage, sequentially or sharded
    let acc = if options.threads == 0 {
        accumulate(reader, &parser, resolver)?
    } else {
        accumulate_parallel(reader, &parser, resolver, options.threads, options.batch_size)?
    };

    // 3. Per-protein statistics
    let protein_stats = summarize_subjects(acc);

    // 4. Genome rollup when a mapping is known
    let (rollup, metadata_columns) = match mapping {
        Some(table) => (
            summarize_genomes(protein_stats, table, options.join_multi_valued_metadata)?,
            table.extra_columns().to_vec(),
        ),
        None => (unannotated(protein_stats), Vec::new()),
    };

    Ok(CoverageResults {
        proteins: rollup.proteins,
        genomes: rollup.genomes,
        metadata_columns,
    })
}
