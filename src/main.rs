use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use msaeval::config::ScoringConfig;
use msaeval::corrected_reads::{record_lengths, CorrectedReads};
use msaeval::msa::{open_input, MsaReader};
use msaeval::pipeline::compute_metrics;
use msaeval::report::{
    create_output, output_path, write_profile, write_size_distribution, write_summary,
    PerReadWriter, LOG_FILE, MSA_PROFILE, PER_READ_METRICS, READ_SIZE_DISTRIBUTION,
};

/// Parse a percentage (0-100, optional trailing '%') into a fraction
fn parse_percent(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim_end_matches('%')
        .parse()
        .map_err(|e| format!("Invalid percentage: {e}"))?;
    if !(0.0..100.0).contains(&value) {
        return Err(format!("Percentage {value} must be in [0, 100)"));
    }
    Ok(value / 100.0)
}

/// msaeval - Evaluate long-read correction from reference/uncorrected/corrected alignments
///
/// Scores each alignment column of every read and reports recall, precision,
/// correct-base rate, error counts, homopolymer indels and trimmed reads
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Alignment file with reference, uncorrected and corrected rows per read ('-' for stdin)
    #[clap(value_name = "MSA")]
    msa: String,

    /// Raw corrected reads (case-marked FASTA, may be gzipped)
    #[clap(short = 'c', long = "corrected")]
    corrected: PathBuf,

    /// Uncorrected reads; enables the read size distribution output
    #[clap(short = 'u', long = "uncorrected")]
    uncorrected: Option<PathBuf>,

    /// Output directory
    #[clap(short = 'o', long = "output", default_value = ".")]
    output: PathBuf,

    /// Corrector name, used to prefix output files and tag the profile
    #[clap(long = "corrector")]
    corrector: Option<String>,

    /// Corrected gap run that opens a candidate trimmed stretch
    #[clap(long = "gap-open", default_value = "5")]
    gap_open: usize,

    /// Width a gap stretch must exceed to count as trimmed
    #[clap(long = "gap-confirm", default_value = "20")]
    gap_confirm: usize,

    /// Minimum length of a reported homopolymer indel run
    #[clap(long = "homopolymer-threshold", default_value = "5")]
    homopolymer_threshold: usize,

    /// Skip fragments shorter than this percentage of their reference span
    #[clap(long = "min-size", default_value = "10", value_parser = parse_percent)]
    min_size: f64,

    /// Verbosity (-v = info, -vv = debug)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only, no summary on stdout)
    #[clap(long = "quiet")]
    quiet: bool,
}

fn init_logger(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn load_reads(path: &Path) -> Result<CorrectedReads> {
    let reader = open_input(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reads = CorrectedReads::from_reader(reader)
        .with_context(|| format!("Failed to parse reads from {}", path.display()))?;
    info!(
        "Loaded {} fragments of {} reads from {}",
        reads.fragment_count(),
        reads.len(),
        path.display()
    );
    Ok(reads)
}

fn read_lengths(path: &Path) -> Result<Vec<usize>> {
    let reader = open_input(path).with_context(|| format!("Failed to open {}", path.display()))?;
    record_lengths(reader).with_context(|| format!("Failed to read lengths from {}", path.display()))
}

fn open_msa(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    open_input(path).with_context(|| format!("Failed to open alignment file {path}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose, args.quiet);

    let config = ScoringConfig::default()
        .with_gap_thresholds(args.gap_open, args.gap_confirm)
        .with_homopolymer_threshold(args.homopolymer_threshold)
        .with_min_size_fraction(args.min_size);
    config.validate()?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;
    let corrector = args.corrector.as_deref();

    let mut log_file = create_output(&args.output.join(LOG_FILE))?;
    writeln!(log_file, "msaeval {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        log_file,
        "Command line: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    )?;
    writeln!(
        log_file,
        "Started: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(log_file)?;

    let reads = load_reads(&args.corrected)?;

    // Per-read lines are staged and only land under their final name if every record scores
    let per_read_path = output_path(&args.output, corrector, PER_READ_METRICS);
    let staged = tempfile::NamedTempFile::new_in(&args.output).with_context(|| {
        format!("Failed to create temporary file in {}", args.output.display())
    })?;
    let mut per_read = PerReadWriter::new(BufWriter::new(staged))?;

    info!("Scoring alignments from {}", args.msa);
    let summary = compute_metrics(
        MsaReader::new(open_msa(&args.msa)?),
        &reads,
        &config,
        |read| per_read.write_read(read),
    )
    .with_context(|| format!("Failed to score alignments from {}", args.msa))?;
    let staged = per_read
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to write {}", per_read_path.display()))?;
    staged
        .persist(&per_read_path)
        .with_context(|| format!("Failed to write {}", per_read_path.display()))?;

    let mut profile = create_output(&output_path(&args.output, corrector, MSA_PROFILE))?;
    write_profile(&mut profile, corrector, &summary)?;
    profile.flush()?;

    write_summary(&mut log_file, &summary)?;
    log_file.flush()?;
    if !args.quiet {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_summary(&mut handle, &summary)?;
    }

    if let Some(ref path) = args.uncorrected {
        let uncorrected = read_lengths(path)?;
        let corrected = read_lengths(&args.corrected)?;
        let mut sizes = create_output(&output_path(&args.output, corrector, READ_SIZE_DISTRIBUTION))?;
        write_size_distribution(&mut sizes, uncorrected, corrected)?;
        sizes.flush()?;
    }

    info!("Results written to {}", args.output.display());
    Ok(())
}
