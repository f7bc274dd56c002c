//src/alignment.rs

use std::io::BufRead;

use crate::config::{AlignmentColumns, LengthSource};
use crate::error::{parse_field, parse_finite, CoverageError, Result};
use crate::types::AlignmentRecord;

/// How often (in records) parsing progress is logged.
pub const PROGRESS_EVERY: usize = 1_000_000;

/// Splits header-less, tab-delimited alignment rows into [`AlignmentRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentParser {
    columns: AlignmentColumns,
    length_source: LengthSource,
    required: usize,
}

impl AlignmentParser {
    pub fn new(columns: AlignmentColumns, length_source: LengthSource) -> Self {
        Self {
            columns,
            length_source,
            required: columns.required_fields(length_source),
        }
    }

    /// Parse one line (without its terminator). Blank lines yield `None`.
    pub fn parse_line<'a>(&self, line: &'a str, line_no: usize) -> Result<Option<AlignmentRecord<'a>>> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < self.required {
            return Err(CoverageError::format(
                line_no,
                format!(
                    "expected at least {} tab-separated fields, found {}",
                    self.required,
                    fields.len()
                ),
            ));
        }

        let c = &self.columns;
        let slen = match self.length_source {
            LengthSource::Inline => Some(parse_field(fields[c.slen], "slen", line_no)?),
            LengthSource::Table => None,
        };

        Ok(Some(AlignmentRecord {
            subject: fields[c.subject],
            pctid: parse_finite(fields[c.pctid], "pctid", line_no)?,
            alen: parse_field(fields[c.alen], "alen", line_no)?,
            sstart: parse_field(fields[c.sstart], "sstart", line_no)?,
            send: parse_field(fields[c.send], "send", line_no)?,
            bitscore: parse_finite(fields[c.bitscore], "bitscore", line_no)?,
            slen,
        }))
    }

    /// Stream every record of `reader` through `on_record`, stopping at the
    /// first error. Returns the number of records parsed.
    pub fn for_each_record<R, F>(&self, mut reader: R, mut on_record: F) -> Result<usize>
    where
        R: BufRead,
        F: FnMut(&AlignmentRecord<'_>, usize) -> Result<()>,
    {
        let mut line = String::new();
        let mut line_no = 0usize;
        let mut n_records = 0usize;

        loop {
            line.clear();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| CoverageError::io("<alignments>", e))?;
            if n == 0 {
                break; // EOF
            }
            line_no += 1;

            let trimmed = line.strip_suffix('\n').unwrap_or(line.as_str());
            if let Some(record) = self.parse_line(trimmed, line_no)? {
                on_record(&record, line_no)?;
                n_records += 1;
                if n_records % PROGRESS_EVERY == 0 {
                    log::info!("Parsed {} alignments", n_records);
                }
            }
        }

        log::info!("Parsed {} alignments", n_records);
        Ok(n_records)
    }
}

impl Default for AlignmentParser {
    fn default() -> Self {
        Self::new(AlignmentColumns::default(), LengthSource::Table)
    }
}
