// src/coverage/protein_stats.rs

use super::{CoverageAccumulator, SubjectAccumulator};
use crate::types::ProteinStat;

/// How often (in subjects) summarization progress is logged.
const SUMMARY_PROGRESS_EVERY: usize = 1_000;

fn mean_f64(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl ProteinStat {
    /// Reduce a finalized accumulator. Accumulators only exist after their
    /// first hit, so every sample list is non-empty and the length is > 0.
    pub fn from_accumulator(protein: String, acc: &SubjectAccumulator) -> Self {
        let length = acc.length();
        debug_assert!(length > 0 && acc.nreads() > 0);

        let covered = acc.depth().iter().filter(|&&c| c > 0).count();
        let total_depth: u64 = acc.depth().iter().map(|&c| c as u64).sum();
        let alen_sum: u64 = acc.alen_samples().iter().map(|&a| a as u64).sum();

        ProteinStat {
            protein,
            coverage: covered as f64 / length as f64,
            depth: total_depth as f64 / length as f64,
            pctid: mean_f64(acc.pctid_samples()),
            alen: alen_sum as f64 / acc.nreads() as f64,
            bitscore: mean_f64(acc.bitscore_samples()),
            nreads: acc.nreads() as u64,
            length,
        }
    }
}

/// Turn every accumulated subject into a [`ProteinStat`], keeping first-seen order.
pub fn summarize_subjects(acc: CoverageAccumulator<'_>) -> Vec<ProteinStat> {
    let subjects = acc.into_subjects();
    let mut output = Vec::with_capacity(subjects.len());

    for (ix, (protein, sub)) in subjects.into_iter().enumerate() {
        output.push(ProteinStat::from_accumulator(protein, &sub));
        if ix > 0 && ix % SUMMARY_PROGRESS_EVERY == 0 {
            log::info!("Summarized coverage for {} subjects", ix);
        }
    }

    log::info!("Summarized coverage for {} subjects", output.len());
    output
}
