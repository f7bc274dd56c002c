// src/coverage/accumulate.rs

use ahash::AHashMap;

use super::LengthResolver;
use crate::error::{CoverageError, Result};
use crate::types::AlignmentRecord;

/// Raw per-subject state: a fixed-size depth array plus the samples needed
/// for the per-protein means.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectAccumulator {
    /// One counter per subject position; its length never changes.
    depth: Vec<u32>,
    pctid: Vec<f64>,
    alen: Vec<u32>,
    bitscore: Vec<f64>,
}

impl SubjectAccumulator {
    pub fn new(length: usize) -> Self {
        Self {
            depth: vec![0; length],
            pctid: Vec::new(),
            alen: Vec::new(),
            bitscore: Vec::new(),
        }
    }

    pub fn length(&self) -> usize {
        self.depth.len()
    }

    pub fn nreads(&self) -> usize {
        self.pctid.len()
    }

    pub fn depth(&self) -> &[u32] {
        &self.depth
    }

    pub fn pctid_samples(&self) -> &[f64] {
        &self.pctid
    }

    pub fn alen_samples(&self) -> &[u32] {
        &self.alen
    }

    pub fn bitscore_samples(&self) -> &[f64] {
        &self.bitscore
    }

    /// Check that `record` fits and return its half-open interval.
    fn checked_interval(
        length: usize,
        record: &AlignmentRecord<'_>,
        line_no: usize,
    ) -> Result<(usize, usize)> {
        let bounds_error = || CoverageError::Bounds {
            line: line_no,
            subject: record.subject.to_string(),
            start: record.sstart,
            end: record.send,
            length,
        };
        let (start, end) = record.interval().ok_or_else(bounds_error)?;
        if end > length {
            return Err(bounds_error());
        }
        Ok((start, end))
    }

    fn add_interval(&mut self, record: &AlignmentRecord<'_>, start: usize, end: usize) {
        for count in &mut self.depth[start..end] {
            *count += 1;
        }
        self.pctid.push(record.pctid);
        self.alen.push(record.alen);
        self.bitscore.push(record.bitscore);
    }

    /// Fold another shard's state for the same subject into this one.
    pub fn merge(&mut self, subject: &str, mut other: SubjectAccumulator) -> Result<()> {
        if other.length() != self.length() {
            return Err(CoverageError::consistency(
                subject,
                format!(
                    "shards disagree on subject length ({} vs {})",
                    self.length(),
                    other.length()
                ),
            ));
        }
        for (a, b) in self.depth.iter_mut().zip(&other.depth) {
            *a += *b;
        }
        self.pctid.append(&mut other.pctid);
        self.alen.append(&mut other.alen);
        self.bitscore.append(&mut other.bitscore);
        Ok(())
    }
}

/// Every subject seen in an alignment stream, in order of first sight.
#[derive(Debug, Clone)]
pub struct CoverageAccumulator<'a> {
    resolver: LengthResolver<'a>,
    subjects: Vec<(String, SubjectAccumulator)>,
    index: AHashMap<String, usize>,
}

impl<'a> CoverageAccumulator<'a> {
    pub fn new(resolver: LengthResolver<'a>) -> Self {
        Self {
            resolver,
            subjects: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Record one alignment. The subject's array is created on first sight;
    /// afterwards any interval beyond its length is a hard error.
    pub fn add(&mut self, record: &AlignmentRecord<'_>, line_no: usize) -> Result<()> {
        if let Some(&ix) = self.index.get(record.subject) {
            let acc = &mut self.subjects[ix].1;
            if let (LengthResolver::Inline, Some(slen)) = (self.resolver, record.slen) {
                if slen != acc.length() {
                    return Err(CoverageError::consistency(
                        record.subject,
                        format!(
                            "line {line_no}: subject length {slen} differs from earlier length {}",
                            acc.length()
                        ),
                    ));
                }
            }
            let (start, end) = SubjectAccumulator::checked_interval(acc.length(), record, line_no)?;
            acc.add_interval(record, start, end);
            return Ok(());
        }

        let length = self.resolver.resolve(record, line_no)?;
        let (start, end) = SubjectAccumulator::checked_interval(length, record, line_no)?;
        let mut acc = SubjectAccumulator::new(length);
        acc.add_interval(record, start, end);

        self.index.insert(record.subject.to_string(), self.subjects.len());
        self.subjects.push((record.subject.to_string(), acc));
        Ok(())
    }

    /// Merge a later shard into this one. Subjects new to `self` are appended
    /// in the order `other` first saw them, so merging shards in stream order
    /// reproduces the sequential result exactly.
    pub fn merge(&mut self, other: CoverageAccumulator<'_>) -> Result<()> {
        for (subject, acc) in other.subjects {
            match self.index.get(&subject) {
                Some(&ix) => self.subjects[ix].1.merge(&subject, acc)?,
                None => {
                    self.index.insert(subject.clone(), self.subjects.len());
                    self.subjects.push((subject, acc));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, subject: &str) -> Option<&SubjectAccumulator> {
        self.index.get(subject).map(|&ix| &self.subjects[ix].1)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SubjectAccumulator)> {
        self.subjects.iter().map(|(s, acc)| (s.as_str(), acc))
    }

    /// Finalize: hand over the subjects in first-seen order.
    pub fn into_subjects(self) -> Vec<(String, SubjectAccumulator)> {
        self.subjects
    }
}
