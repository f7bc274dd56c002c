use rayon::prelude::*;
use std::io::BufRead;

use super::{CoverageAccumulator, LengthResolver};
use crate::alignment::{AlignmentParser, PROGRESS_EVERY};
use crate::error::{CoverageError, Result};

/// Sharded accumulation.
///
/// Lines are read in batches of `batch_size`; each batch is split into one
/// contiguous shard per worker, every shard builds its own
/// [`CoverageAccumulator`], and the shards are merged back in stream order.
/// Counters are summed and sample lists concatenated, so the result is
/// identical to [`super::accumulate`] on the same input.
pub fn accumulate_parallel<'a, R: BufRead>(
    mut reader: R,
    parser: &AlignmentParser,
    resolver: LengthResolver<'a>,
    threads: usize,
    batch_size: usize,
) -> Result<CoverageAccumulator<'a>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    let batch_size = batch_size.max(1);

    let mut global = CoverageAccumulator::new(resolver);
    let mut batch: Vec<String> = Vec::with_capacity(batch_size);
    let mut lines_read = 0usize;
    let mut n_records = 0usize;
    let mut next_report = PROGRESS_EVERY;

    loop {
        // 1. Fill a batch, remembering the line number of its first entry
        batch.clear();
        let first_line = lines_read + 1;
        while batch.len() < batch_size {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| CoverageError::io("<alignments>", e))?;
            if n == 0 {
                break; // EOF
            }
            if line.ends_with('\n') {
                line.pop();
            }
            batch.push(line);
        }
        if batch.is_empty() {
            break;
        }
        lines_read += batch.len();

        // 2. One shard per worker, built in parallel
        let shard_len = batch.len().div_ceil(pool.current_num_threads().max(1));
        let shards: Vec<Result<(CoverageAccumulator<'a>, usize)>> = pool.install(|| {
            batch
                .par_chunks(shard_len)
                .enumerate()
                .map(|(shard_ix, chunk)| -> Result<(CoverageAccumulator<'a>, usize)> {
                    let mut local = CoverageAccumulator::new(resolver);
                    let mut local_records = 0usize;
                    let base = first_line + shard_ix * shard_len;
                    for (offset, line) in chunk.iter().enumerate() {
                        let line_no = base + offset;
                        if let Some(record) = parser.parse_line(line, line_no)? {
                            local.add(&record, line_no)?;
                            local_records += 1;
                        }
                    }
                    Ok((local, local_records))
                })
                .collect()
        });

        // 3. Merge in shard order; the earliest failing shard wins
        for shard in shards {
            let (local, local_records) = shard?;
            global.merge(local)?;
            n_records += local_records;
        }
        log::debug!("Merged batch ending at line {}", lines_read);
        while n_records >= next_report {
            log::info!("Parsed {} alignments", next_report);
            next_report += PROGRESS_EVERY;
        }
    }

    log::info!("Parsed {} alignments", n_records);
    log::info!("Accumulated coverage for {} subjects", global.len());
    Ok(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::accumulate;
    use crate::error::ErrorKind;
    use ahash::AHashMap;

    fn synthetic_alignments() -> String {
        let mut text = String::new();
        for i in 0..500usize {
            let subject = format!("p{}", i % 7);
            let start = 1 + (i * 13) % 80;
            let end = start + (i % 19);
            text.push_str(&format!(
                "r{i}\t{subject}\t{}\t{}\t1\t100\t{start}\t{end}\t1e-5\t{}\n",
                70.0 + (i % 30) as f64,
                end - start + 1,
                20.0 + (i % 11) as f64 * 0.5,
            ));
            if i % 50 == 0 {
                text.push('\n');
            }
        }
        text
    }

    fn lengths() -> AHashMap<String, usize> {
        (0..7).map(|i| (format!("p{i}"), 100usize)).collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let text = synthetic_alignments();
        let table = lengths();
        let parser = AlignmentParser::default();

        let seq = accumulate(text.as_bytes(), &parser, LengthResolver::Table(&table)).unwrap();
        for (threads, batch) in [(1, 1000), (3, 64), (4, 7)] {
            let par = accumulate_parallel(
                text.as_bytes(),
                &parser,
                LengthResolver::Table(&table),
                threads,
                batch,
            )
            .unwrap();
            assert_eq!(par.clone().into_subjects(), seq.clone().into_subjects());
        }
    }

    #[test]
    fn test_parallel_reports_global_line_number() {
        let mut text = synthetic_alignments();
        text.push_str("bad\tline\n");
        let total_lines = text.lines().count();
        let table = lengths();
        let err = accumulate_parallel(
            text.as_bytes(),
            &AlignmentParser::default(),
            LengthResolver::Table(&table),
            2,
            37,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains(&format!("line {total_lines}")));
    }
}
