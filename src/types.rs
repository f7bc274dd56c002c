//src/types.rs

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One parsed row of the alignment table. Consumed immediately by the
/// accumulator and never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord<'a> {
    pub subject: &'a str,
    pub pctid: f64,
    pub alen: u32,
    /// 1-based inclusive, as emitted by the aligner.
    pub sstart: i64,
    /// 1-based inclusive, as emitted by the aligner.
    pub send: i64,
    pub bitscore: f64,
    /// Present only when the length source is inline.
    pub slen: Option<usize>,
}

impl AlignmentRecord<'_> {
    /// Convert the aligner's 1-based closed coordinates to a 0-based
    /// half-open interval `[start - 1, end)`. Reverse-strand hits
    /// (sstart > send) cover the same positions as their forward form.
    /// Coordinates below 1 have no interval.
    pub fn interval(&self) -> Option<(usize, usize)> {
        let (lo, hi) = if self.sstart <= self.send {
            (self.sstart, self.send)
        } else {
            (self.send, self.sstart)
        };
        if lo < 1 {
            return None;
        }
        Some(((lo - 1) as usize, hi as usize))
    }
}

/// Ordered column name -> value pairs, serialized as a flat map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(pub Vec<(String, String)>);

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Summary of one subject with at least one alignment.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProteinStat {
    pub protein: String,
    /// Fraction of positions with nonzero depth.
    pub coverage: f64,
    /// Mean depth over all positions, zero-covered ones included.
    pub depth: f64,
    pub pctid: f64,
    pub alen: f64,
    pub bitscore: f64,
    pub nreads: u64,
    pub length: usize,
}

/// A protein row as handed to serialization: the statistics plus the owning
/// genome and that genome's pass-through metadata, when a mapping is known.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProteinSummary {
    #[serde(flatten)]
    pub stat: ProteinStat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genome: Option<String>,
    #[serde(flatten)]
    pub metadata: Metadata,
}

/// Length-weighted rollup of a genome's proteins.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GenomeStat {
    pub genome: String,
    pub total_length: u64,
    pub total_proteins: usize,
    pub detected_proteins: usize,
    pub nreads: u64,
    pub coverage: f64,
    pub depth: f64,
    pub pctid: f64,
    pub bitscore: f64,
    pub alen: f64,
    #[serde(flatten)]
    pub metadata: Metadata,
}
