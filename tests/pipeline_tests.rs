use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::{tempdir, TempDir};

use protcov::config::{LengthSource, SummaryOptions};
use protcov::mapping::MappingTable;
use protcov::output::{write_json, ResultsBody, ResultsEnvelope};
use protcov::{summarize_alignments, ErrorKind};

const GENOME: &str = "NC_001422.1";
const N_RECORDS: usize = 20_833;

/// 11 proteins of one genome, 2,327 residues in total.
fn fixture_proteins() -> Vec<(String, usize)> {
    let mut proteins: Vec<(String, usize)> = (0..10)
        .map(|i| (format!("NP_0408{i:02}.1"), 200))
        .collect();
    proteins.push(("NP_040810.1".to_string(), 327));
    proteins
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

fn mapping_text(extra_genome: bool) -> String {
    let mut text = String::from("protein\tgenome\tlength\tname\n");
    for (protein, length) in fixture_proteins() {
        text.push_str(&format!("{protein}\t{GENOME}\t{length}\tEnterobacteria phage phiX174\n"));
    }
    if extra_genome {
        text.push_str("XP_000001.1\tNC_999999.1\t150\tUnseen virus\n");
        text.push_str("XP_000002.1\tNC_999999.1\t90\tUnseen virus\n");
    }
    text
}

/// Deterministic alignments spread over every fixture protein; every record
/// carries its subject length in the last column.
fn alignment_text() -> (String, HashMap<String, u64>) {
    let proteins = fixture_proteins();
    let mut text = String::new();
    let mut per_subject: HashMap<String, u64> = HashMap::new();
    for i in 0..N_RECORDS {
        let (protein, length) = &proteins[i % proteins.len()];
        let alen = 20 + (i % 17);
        let sstart = 1 + (i * 7) % (length - alen);
        let send = sstart + alen - 1;
        text.push_str(&format!(
            "read{i}\t{protein}\t{:.1}\t{alen}\t1\t{}\t{sstart}\t{send}\t1.2e-8\t{:.1}\t{}\t{length}\n",
            60.0 + (i % 40) as f64,
            alen * 3,
            30.0 + (i % 25) as f64,
            alen * 3,
        ));
        *per_subject.entry(protein.clone()).or_default() += 1;
    }
    (text, per_subject)
}

fn run(aln: &Path, mapping: &MappingTable, options: &SummaryOptions) -> protcov::CoverageResults {
    summarize_alignments(aln, Some(mapping), options).expect("summarization failed")
}

#[test]
fn test_reference_fixture_scenario() {
    let dir = tempdir().unwrap();
    let (aln, per_subject) = alignment_text();
    let aln_path = write_file(&dir, "example.aln", &aln);
    let mapping = MappingTable::from_path(write_file(&dir, "example.tsv", &mapping_text(false))).unwrap();

    let results = run(&aln_path, &mapping, &SummaryOptions::default());

    assert_eq!(results.proteins.len(), 11);
    for row in &results.proteins {
        let s = &row.stat;
        assert!(s.nreads > 0);
        assert_eq!(s.nreads, per_subject[&s.protein]);
        assert!(s.coverage > 0.0 && s.coverage <= 1.0);
        assert!(s.depth > 0.0);
        assert!(s.pctid > 0.0 && s.alen > 0.0 && s.bitscore > 0.0);
        assert_eq!(row.genome.as_deref(), Some(GENOME));
    }

    assert_eq!(results.genomes.len(), 1);
    let g = &results.genomes[0];
    assert_eq!(g.genome, GENOME);
    assert_eq!(g.nreads, N_RECORDS as u64);
    assert_eq!(g.total_proteins, 11);
    assert_eq!(g.detected_proteins, 11);
    assert_eq!(g.total_length, 2327);
    assert_eq!(g.metadata.get("name"), Some("Enterobacteria phage phiX174"));
}

#[test]
fn test_genome_without_alignments_is_dropped() {
    let dir = tempdir().unwrap();
    let (aln, _) = alignment_text();
    let aln_path = write_file(&dir, "example.aln", &aln);
    let mapping = MappingTable::from_path(write_file(&dir, "example.tsv", &mapping_text(true))).unwrap();

    let results = run(&aln_path, &mapping, &SummaryOptions::default());

    assert_eq!(results.genomes.len(), 1);
    assert!(results.genomes.iter().all(|g| g.genome != "NC_999999.1"));
    assert!(results
        .proteins
        .iter()
        .all(|p| !p.stat.protein.starts_with("XP_")));
    assert_eq!(results.proteins.len(), 11);
}

#[test]
fn test_sharded_run_matches_sequential() {
    let dir = tempdir().unwrap();
    let (aln, _) = alignment_text();
    let aln_path = write_file(&dir, "example.aln", &aln);
    let mapping = MappingTable::from_reader(mapping_text(false).as_bytes()).unwrap();

    let sequential = run(&aln_path, &mapping, &SummaryOptions::default());
    let sharded = run(
        &aln_path,
        &mapping,
        &SummaryOptions {
            threads: 4,
            batch_size: 3_001,
            ..Default::default()
        },
    );
    assert_eq!(sequential, sharded);
}

#[test]
fn test_inline_lengths_and_gzip_input() {
    let dir = tempdir().unwrap();
    let (aln, _) = alignment_text();
    let gz_path = dir.path().join("example.aln.gz");
    let mut enc = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
    enc.write_all(aln.as_bytes()).unwrap();
    enc.finish().unwrap();
    let plain_path = write_file(&dir, "example.aln", &aln);

    let mapping = MappingTable::from_reader(mapping_text(false).as_bytes()).unwrap();
    let inline = SummaryOptions {
        length_source: LengthSource::Inline,
        ..Default::default()
    };

    let from_gz = run(&gz_path, &mapping, &inline);
    let from_table = run(&plain_path, &mapping, &SummaryOptions::default());
    assert_eq!(from_gz, from_table);
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempdir().unwrap();
    let (aln, _) = alignment_text();
    let aln_path = write_file(&dir, "example.aln", &aln);
    let mapping = MappingTable::from_reader(mapping_text(true).as_bytes()).unwrap();

    let mut outputs = Vec::new();
    for run_ix in 0..2 {
        let results = run(&aln_path, &mapping, &SummaryOptions::default());
        let out = dir.path().join(format!("run{run_ix}.json"));
        let envelope = ResultsEnvelope {
            input: "example.aln".into(),
            metadata: Some("example.tsv".into()),
            output_path: "run.json".into(),
            total_alignments: results.total_alignments(),
            results: ResultsBody {
                proteins: &results.proteins,
                genomes: &results.genomes,
            },
            time_elapsed: 0.0,
            logs: Vec::new(),
        };
        write_json(&envelope, &out).unwrap();
        outputs.push(std::fs::read(&out).unwrap());
        assert_eq!(results.total_alignments(), N_RECORDS as u64);
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_first_ten_residues_exactly() {
    let dir = tempdir().unwrap();
    let mapping = MappingTable::from_reader("protein\tgenome\tlength\np\tG\t100\n".as_bytes()).unwrap();
    let aln_path = write_file(&dir, "one.aln", "q\tp\t100\t10\t1\t30\t1\t10\t1e-9\t25\n");

    let results = run(&aln_path, &mapping, &SummaryOptions::default());
    let s = &results.proteins[0].stat;
    assert!((s.coverage - 0.10).abs() < 1e-12);
    assert!((s.depth - 0.10).abs() < 1e-12);
    assert_eq!(s.nreads, 1);
}

#[test]
fn test_errors_abort_the_run() {
    let dir = tempdir().unwrap();
    let mapping = MappingTable::from_reader("protein\tgenome\tlength\np\tG\t100\n".as_bytes()).unwrap();
    let ok = "q\tp\t100\t10\t1\t30\t1\t10\t1e-9\t25\n";

    let cases = [
        ("short.aln", format!("{ok}q\tp\t100\n"), ErrorKind::Format),
        ("nan.aln", format!("{ok}q\tp\tNA\t10\t1\t30\t1\t10\t1e-9\t25\n"), ErrorKind::Parse),
        ("inf.aln", format!("{ok}q\tp\tnan\t10\t1\t30\t1\t10\t1e-9\tinf\n"), ErrorKind::Parse),
        ("oob.aln", format!("{ok}q\tp\t100\t10\t1\t30\t95\t101\t1e-9\t25\n"), ErrorKind::Bounds),
        ("neg.aln", format!("{ok}q\tp\t100\t10\t1\t30\t-3\t10\t1e-9\t25\n"), ErrorKind::Bounds),
        ("unknown.aln", format!("{ok}q\tzz\t100\t10\t1\t30\t1\t10\t1e-9\t25\n"), ErrorKind::Consistency),
    ];
    for (name, text, kind) in cases {
        let path = write_file(&dir, name, &text);
        for threads in [0, 2] {
            let opts = SummaryOptions {
                threads,
                ..Default::default()
            };
            let err = summarize_alignments(&path, Some(&mapping), &opts).unwrap_err();
            assert_eq!(err.kind(), kind, "{name} with {threads} threads");
            assert!(err.to_string().contains("line 2") || kind == ErrorKind::Consistency);
        }
    }
}
