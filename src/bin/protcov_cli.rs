use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use protcov::config::{LengthSource, SummaryOptions};
use protcov::logging::init_logger;
use protcov::mapping::MappingTable;
use protcov::output::{write_json, ResultsBody, ResultsEnvelope};
use protcov::summarize_alignments;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LengthArg {
    /// Declared lengths from the metadata table
    Table,
    /// The alignment's own subject-length column
    Inline,
}

#[derive(Parser, Debug)]
#[command(name = "protcov")]
#[command(about = "Per-protein and per-genome coverage from tabular protein alignments")]
struct Cli {
    /// Tab-delimited alignments (optionally .gz)
    #[arg(short, long)]
    alignments: PathBuf,

    /// TSV linking proteins to genomes (columns: protein, genome, length, ...)
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Results file; ends in .json or .json.gz
    #[arg(short, long)]
    output: PathBuf,

    /// Where subject lengths come from
    #[arg(long, value_enum, default_value = "table")]
    length_source: LengthArg,

    /// Worker threads for sharded accumulation (0 = single-threaded)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Join multi-valued genome metadata with "; " instead of dropping it
    #[arg(long)]
    join_metadata: bool,

    /// Also write <prefix>.proteins.tsv and <prefix>.genomes.tsv
    #[arg(long)]
    tsv_prefix: Option<String>,
}

fn spinner(color: &str, msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(msg);
    spinner
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let capture = init_logger()?;
    let cli = Cli::parse();
    let start_time = Instant::now();

    // 1. Mapping table
    let mapping = match &cli.metadata {
        Some(path) => {
            let sp = spinner("blue", "Reading metadata...");
            let table = MappingTable::from_path(path)?;
            sp.finish_with_message(format!("Loaded {} proteins.", table.len()));
            Some(table)
        }
        None => None,
    };

    // 2. Alignments -> proteins -> genomes
    let options = SummaryOptions {
        length_source: match cli.length_source {
            LengthArg::Table => LengthSource::Table,
            LengthArg::Inline => LengthSource::Inline,
        },
        threads: cli.threads,
        join_multi_valued_metadata: cli.join_metadata,
        ..Default::default()
    };
    let sp = spinner("green", "Summarizing alignments...");
    let results = summarize_alignments(&cli.alignments, mapping.as_ref(), &options)?;
    sp.finish_with_message(format!(
        "{} proteins, {} genomes.",
        results.proteins.len(),
        results.genomes.len()
    ));

    // 3. Outputs
    let sp = spinner("yellow", "Writing output files...");
    if let Some(prefix) = &cli.tsv_prefix {
        fs::write(format!("{prefix}.proteins.tsv"), results.get_protein_table())?;
        fs::write(format!("{prefix}.genomes.tsv"), results.get_genome_table())?;
    }

    let envelope = ResultsEnvelope {
        input: cli.alignments.display().to_string(),
        metadata: cli.metadata.as_ref().map(|p| p.display().to_string()),
        output_path: cli.output.display().to_string(),
        total_alignments: results.total_alignments(),
        results: ResultsBody {
            proteins: &results.proteins,
            genomes: &results.genomes,
        },
        time_elapsed: start_time.elapsed().as_secs_f64(),
        logs: capture.lines(),
    };
    write_json(&envelope, &cli.output)?;
    sp.finish_with_message("Output files created.");

    log::info!("Done");
    Ok(())
}
