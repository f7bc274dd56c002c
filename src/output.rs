//src/output.rs

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{CoverageError, Result};
use crate::types::{GenomeStat, ProteinSummary};

#[derive(Debug, Serialize)]
pub struct ResultsBody<'a> {
    pub proteins: &'a [ProteinSummary],
    pub genomes: &'a [GenomeStat],
}

/// The JSON document written at the end of a run.
#[derive(Debug, Serialize)]
pub struct ResultsEnvelope<'a> {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub output_path: String,
    pub total_alignments: u64,
    pub results: ResultsBody<'a>,
    pub time_elapsed: f64,
    /// Log lines emitted during the run, in order.
    pub logs: Vec<String>,
}

/// Serialize `envelope` as JSON into `path`, gzip-compressed when the path
/// ends in `.gz`.
pub fn write_json<P: AsRef<Path>>(envelope: &ResultsEnvelope<'_>, path: P) -> Result<()> {
    let path = path.as_ref();
    let io_err = |e: std::io::Error| CoverageError::io(path, e);

    let file = File::create(path).map_err(io_err)?;
    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    if is_gz {
        let mut enc = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut enc, envelope).map_err(|e| io_err(e.into()))?;
        enc.finish().map_err(io_err)?.flush().map_err(io_err)?;
    } else {
        let mut w = BufWriter::new(file);
        serde_json::to_writer(&mut w, envelope).map_err(|e| io_err(e.into()))?;
        w.flush().map_err(io_err)?;
    }

    log::info!("Wrote results to {}", path.display());
    Ok(())
}
