//src/config.rs

/// Zero-based column indices of the tab-delimited alignment table.
///
/// The defaults match the aligner's 12-column layout:
/// ```text
/// qseqid sseqid pident length qstart qend sstart send evalue bitscore qlen slen
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentColumns {
    pub subject: usize,
    pub pctid: usize,
    pub alen: usize,
    pub sstart: usize,
    pub send: usize,
    pub bitscore: usize,
    /// Only read when the length source is [`LengthSource::Inline`].
    pub slen: usize,
}

impl Default for AlignmentColumns {
    fn default() -> Self {
        Self {
            subject: 1,
            pctid: 2,
            alen: 3,
            sstart: 6,
            send: 7,
            bitscore: 9,
            slen: 11,
        }
    }
}

impl AlignmentColumns {
    /// Minimum number of fields a record must carry.
    pub fn required_fields(&self, length_source: LengthSource) -> usize {
        let mut max_ix = self
            .subject
            .max(self.pctid)
            .max(self.alen)
            .max(self.sstart)
            .max(self.send)
            .max(self.bitscore);
        if length_source == LengthSource::Inline {
            max_ix = max_ix.max(self.slen);
        }
        max_ix + 1
    }
}

/// Where the size of a subject's coverage array comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthSource {
    /// Declared lengths from the mapping table (or a standalone length map).
    #[default]
    Table,
    /// The record's own subject-length column.
    Inline,
}

/// Knobs for a full summarization run.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub columns: AlignmentColumns,
    pub length_source: LengthSource,
    /// 0 runs the sequential path; N > 0 shards batches over N rayon workers.
    pub threads: usize,
    /// Records per batch handed to the sharded path.
    pub batch_size: usize,
    /// Emit multi-valued genome metadata as a `"; "`-joined string instead of dropping it.
    pub join_multi_valued_metadata: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            columns: AlignmentColumns::default(),
            length_source: LengthSource::Table,
            threads: 0,
            batch_size: 1_000_000,
            join_multi_valued_metadata: false,
        }
    }
}
