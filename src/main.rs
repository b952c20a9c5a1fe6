//! wordchunk: split text streams into numbered files of N words each.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use wordchunk::{
    ChunkError, ConfigFile, Delimiter, Encoding, Pipeline, PipelineConfig, ProgressLogger,
    RunReport, StatsObserver,
};

/// Progress is logged every this many words per input
const PROGRESS_EVERY: u64 = 100_000;

/// Split text into files of a fixed number of words.
#[derive(Parser)]
#[command(name = "wordchunk", version, about)]
struct Cli {
    /// Input files, or `-` for stdin
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Words per output file
    #[arg(short, long)]
    words: Option<u64>,

    /// Output directory (default: ./chunks)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// File name stem (default: the input's file stem)
    #[arg(long)]
    stem: Option<String>,

    /// Output file extension, e.g. ".txt"
    #[arg(long)]
    ext: Option<String>,

    /// Split on this literal string instead of whitespace
    #[arg(long, conflicts_with = "pattern")]
    delimiter: Option<String>,

    /// Split on matches of this regular expression
    #[arg(long)]
    pattern: Option<String>,

    /// Written between words (escapes: \n \t \\)
    #[arg(long)]
    output_delimiter: Option<String>,

    /// Text encoding of input and output: any WHATWG label, e.g. utf-8, latin1, shift_jis
    #[arg(long)]
    encoding: Option<Encoding>,

    /// Index of the first output file
    #[arg(long)]
    start_index: Option<u64>,

    /// Zero-padded width of the file index
    #[arg(long)]
    index_width: Option<usize>,

    /// TOML file with defaults for the options above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output reports as JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

enum Input {
    Stdin,
    File(PathBuf),
}

struct Job {
    label: String,
    input: Input,
    config: PipelineConfig,
}

#[derive(Serialize)]
struct InputReport {
    input: String,
    stem: String,
    input_size: Option<u64>,
    files: Vec<PathBuf>,
    #[serde(flatten)]
    run: RunReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("wordchunk={level}"))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let jobs = plan_jobs(&cli)?;
    let total = jobs.len();

    let mut set = JoinSet::new();
    for (position, job) in jobs.into_iter().enumerate() {
        set.spawn(async move {
            let label = job.label.clone();
            (position, label, run_job(job).await)
        });
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = set.join_next().await {
        outcomes.push(joined.context("Chunking task panicked")?);
    }
    outcomes.sort_by_key(|(position, _, _)| *position);

    let mut reports = Vec::new();
    let mut failed = 0;
    for (_, label, outcome) in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                let e = anyhow::Error::new(e);
                error!("{label}: {e:#}");
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} inputs failed");
    }
    Ok(())
}

/// Resolve one pipeline configuration per input
fn plan_jobs(cli: &Cli) -> Result<Vec<Job>> {
    let file_config = match &cli.config {
        Some(path) => Some(ConfigFile::load(path)?),
        None => None,
    };

    if cli.stem.is_some() && cli.inputs.len() > 1 {
        bail!("--stem can only be used with a single input");
    }
    let stdin_count = cli.inputs.iter().filter(|p| is_stdin(p)).count();
    if stdin_count > 1 {
        bail!("stdin (`-`) can only be read once");
    }

    let mut stems = HashSet::new();
    let mut jobs = Vec::with_capacity(cli.inputs.len());

    for path in &cli.inputs {
        let (input, stem) = if is_stdin(path) {
            let stem = cli.stem.clone().context("Reading stdin requires --stem")?;
            (Input::Stdin, stem)
        } else {
            let stem = match &cli.stem {
                Some(stem) => stem.clone(),
                None => path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .with_context(|| format!("Cannot derive a stem from {}", path.display()))?,
            };
            (Input::File(path.clone()), stem)
        };

        if !stems.insert(stem.clone()) {
            bail!(
                "Two inputs would both write chunks named {stem:?}; \
                 rename one or chunk them separately"
            );
        }

        let config = build_config(cli, file_config.as_ref(), stem)
            .with_context(|| format!("Invalid options for {}", path.display()))?;
        jobs.push(Job {
            label: path.display().to_string(),
            input,
            config,
        });
    }

    Ok(jobs)
}

/// Defaults, then the config file, then flags
fn build_config(cli: &Cli, file: Option<&ConfigFile>, stem: String) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder(stem);
    if let Some(file) = file {
        builder = file.apply(builder)?;
    }

    if let Some(literal) = &cli.delimiter {
        builder = builder.delimiter(Delimiter::literal(unescape(literal))?);
    }
    if let Some(pattern) = &cli.pattern {
        builder = builder.delimiter(Delimiter::pattern(pattern)?);
    }
    if let Some(words) = cli.words {
        builder = builder.words_per_chunk(words);
    }
    if let Some(dir) = &cli.out_dir {
        builder = builder.out_dir(dir.clone());
    }
    if let Some(ext) = &cli.ext {
        builder = builder.extension(ext.clone());
    }
    if let Some(delimiter) = &cli.output_delimiter {
        builder = builder.output_delimiter(unescape(delimiter));
    }
    if let Some(encoding) = cli.encoding {
        builder = builder.encoding(encoding);
    }
    if let Some(index) = cli.start_index {
        builder = builder.start_index(index);
    }
    if let Some(width) = cli.index_width {
        builder = builder.index_width(width);
    }

    Ok(builder.build()?)
}

async fn run_job(job: Job) -> Result<InputReport, ChunkError> {
    let Job { label, input, config } = job;
    let stem = config.stem().to_string();
    let first_index = config.start_index();
    let chunk_paths = config.clone();

    let stats = Arc::new(StatsObserver::new());
    let pipeline = Pipeline::new(config)
        .with_observer(stats.clone())
        .with_observer(Arc::new(ProgressLogger::new(label.clone(), PROGRESS_EVERY)));

    let started = Instant::now();
    let (snapshot, input_size) = match input {
        Input::Stdin => (pipeline.run(tokio::io::stdin()).await?, None),
        Input::File(path) => {
            let file = tokio::fs::File::open(&path).await.map_err(ChunkError::Input)?;
            let size = file.metadata().await.ok().map(|m| m.len());
            debug!(input = %label, size, "Opened input");
            (pipeline.run(file).await?, size)
        }
    };
    let run = RunReport::compute(&snapshot, &stats.summary(), started.elapsed());

    let files = (0..snapshot.chunks)
        .map(|offset| chunk_paths.chunk_path(first_index + offset))
        .collect();

    Ok(InputReport {
        input: label,
        stem,
        input_size,
        files,
        run,
    })
}

fn print_report(report: &InputReport) {
    let dir = report
        .files
        .first()
        .and_then(|p| p.parent())
        .unwrap_or_else(|| Path::new("."));

    println!("{}", report.input);
    println!("  Files created:   {} in {}", report.files.len(), dir.display());
    println!("  Words:           {}", report.run.words);
    match report.input_size {
        Some(size) => println!("  Bytes:           {} of {}", report.run.bytes_consumed, size),
        None => println!("  Bytes:           {}", report.run.bytes_consumed),
    }
    println!(
        "  Rate:            {:.0} words/s, {:.1} MiB/s",
        report.run.words_per_sec,
        report.run.bytes_per_sec / (1024.0 * 1024.0)
    );
    println!(
        "  Avg words/file:  {:.1} [{:.2}s]",
        report.run.mean_words_per_chunk,
        report.run.elapsed_ms as f64 / 1000.0
    );
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Expand `\n`, `\t`, `\r` and `\\` so separators can be typed on a shell
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"\n"), "\n");
        assert_eq!(unescape(r"a\tb"), "a\tb");
        assert_eq!(unescape(r"\\n"), "\\n");
        assert_eq!(unescape(r"\x"), "\\x");
        assert_eq!(unescape("trailing\\"), "trailing\\");
        assert_eq!(unescape(","), ",");
    }

    #[test]
    fn test_stems_from_file_names() {
        let cli = Cli::parse_from(["wordchunk", "data/a.txt", "b.log"]);
        let jobs = plan_jobs(&cli).unwrap();
        let stems: Vec<&str> = jobs.iter().map(|j| j.config.stem()).collect();
        assert_eq!(stems, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_stems_rejected() {
        let cli = Cli::parse_from(["wordchunk", "one/notes.txt", "two/notes.md"]);
        assert!(plan_jobs(&cli).is_err());
    }

    #[test]
    fn test_stdin_needs_stem() {
        let cli = Cli::parse_from(["wordchunk", "-"]);
        assert!(plan_jobs(&cli).is_err());

        let cli = Cli::parse_from(["wordchunk", "-", "--stem", "piped"]);
        let jobs = plan_jobs(&cli).unwrap();
        assert!(matches!(jobs[0].input, Input::Stdin));
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = ConfigFile::parse("words = 50\nextension = \".md\"").unwrap();
        let cli = Cli::parse_from(["wordchunk", "in.txt", "-w", "7", "--output-delimiter", r"\n"]);

        let config = build_config(&cli, Some(&file), "in".to_string()).unwrap();
        assert_eq!(config.words_per_chunk(), 7);
        assert_eq!(config.extension(), ".md");
        assert_eq!(config.output_delimiter(), "\n");
    }

    #[test]
    fn test_delimiter_and_pattern_conflict() {
        let parsed = Cli::try_parse_from([
            "wordchunk",
            "in.txt",
            "--delimiter",
            ",",
            "--pattern",
            ";",
        ]);
        assert!(parsed.is_err());
    }
}
