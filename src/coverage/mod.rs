pub mod accumulate;
pub mod parallel;
pub mod protein_stats;

use std::io::BufRead;

use crate::alignment::AlignmentParser;
use crate::error::{CoverageError, Result};
use crate::mapping::SubjectLengths;
use crate::types::AlignmentRecord;

pub use accumulate::{CoverageAccumulator, SubjectAccumulator};
pub use parallel::accumulate_parallel;
pub use protein_stats::summarize_subjects;

/// Sizes a subject's coverage array the first time it is seen.
#[derive(Clone, Copy)]
pub enum LengthResolver<'a> {
    /// Look lengths up in an external table.
    Table(&'a (dyn SubjectLengths + Sync)),
    /// Take the length from the record's own subject-length column.
    Inline,
}

impl LengthResolver<'_> {
    pub fn resolve(&self, record: &AlignmentRecord<'_>, line_no: usize) -> Result<usize> {
        match self {
            LengthResolver::Table(lengths) => {
                lengths.subject_length(record.subject).ok_or_else(|| {
                    CoverageError::consistency(
                        record.subject,
                        format!("line {line_no}: subject has no entry in the length table"),
                    )
                })
            }
            LengthResolver::Inline => record.slen.ok_or_else(|| {
                CoverageError::format(line_no, "subject length column is missing")
            }),
        }
    }
}

impl std::fmt::Debug for LengthResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthResolver::Table(_) => f.write_str("LengthResolver::Table"),
            LengthResolver::Inline => f.write_str("LengthResolver::Inline"),
        }
    }
}

/// Single-threaded pass: parse each record and fold it into the accumulator.
pub fn accumulate<'a, R: BufRead>(
    reader: R,
    parser: &AlignmentParser,
    resolver: LengthResolver<'a>,
) -> Result<CoverageAccumulator<'a>> {
    let mut acc = CoverageAccumulator::new(resolver);
    parser.for_each_record(reader, |record, line_no| acc.add(record, line_no))?;
    log::info!("Accumulated coverage for {} subjects", acc.len());
    Ok(acc)
}
