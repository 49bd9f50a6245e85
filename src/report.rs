//! Text outputs of a metrics run
use crate::aggregate::{ReadMetrics, Summary};
use crate::classify::{EditCounts, RunStats};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const PER_READ_METRICS: &str = "per_read_metrics.txt";
pub const MSA_PROFILE: &str = "msa_profile.txt";
pub const READ_SIZE_DISTRIBUTION: &str = "read_size_distribution.txt";
pub const LOG_FILE: &str = "log";

/// Output path, prefixed with the corrector name when several tools share a directory
pub fn output_path(dir: &Path, corrector: Option<&str>, name: &str) -> PathBuf {
    match corrector {
        Some(tool) if !tool.is_empty() => dir.join(format!("{tool}_{name}")),
        _ => dir.join(name),
    }
}

pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Streams `"<value> <metric>"` lines, one triple per finalized read
pub struct PerReadWriter<W: Write> {
    writer: W,
    reads: u64,
}

impl<W: Write> PerReadWriter<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "metric score")?;
        Ok(PerReadWriter { writer, reads: 0 })
    }

    pub fn write_read(&mut self, read: &ReadMetrics) -> io::Result<()> {
        // `{:?}` keeps the decimal point on whole values ("1.0 recall")
        writeln!(self.writer, "{:?} recall", read.recall)?;
        writeln!(self.writer, "{:?} precision", read.precision)?;
        writeln!(self.writer, "{:?} correct_rate", read.correct_rate)?;
        self.reads += 1;
        Ok(())
    }

    pub fn reads_written(&self) -> u64 {
        self.reads
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Compact profile used to compare correctors side by side
pub fn write_profile<W: Write>(
    writer: &mut W,
    corrector: Option<&str>,
    summary: &Summary,
) -> io::Result<()> {
    writeln!(writer, "***********SUMMARY***********")?;
    let tag = corrector.map(|t| format!("[{t}]")).unwrap_or_default();
    writeln!(
        writer,
        "{}Recall {:.5} Precision {:.5} Number of trimmed reads {} Mean missing size in trimmed reads {:.1}",
        tag,
        summary.recall,
        summary.precision,
        summary.trimmed_reads(),
        summary.mean_missing_size()
    )
}

fn write_edits<W: Write>(writer: &mut W, label: &str, edits: &EditCounts) -> io::Result<()> {
    writeln!(writer, "{label}:")?;
    writeln!(writer, "  Insertions:            {:>12}", edits.insertions)?;
    writeln!(writer, "  Deletions:             {:>12}", edits.deletions)?;
    writeln!(writer, "  Substitutions:         {:>12}", edits.substitutions)
}

fn write_runs<W: Write>(writer: &mut W, label: &str, runs: &RunStats) -> io::Result<()> {
    writeln!(
        writer,
        "  {:<22}{:>12}  (mean length {:.2})",
        format!("{label}:"),
        runs.count,
        runs.mean_len()
    )
}

/// Human-readable summary of every global metric
pub fn write_summary<W: Write>(writer: &mut W, summary: &Summary) -> io::Result<()> {
    writeln!(writer, "Correction metrics")?;
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer, "Reads scored:            {:>12}", summary.reads)?;
    writeln!(writer, "Fragments scored:        {:>12}", summary.fragments)?;
    writeln!(writer, "Small fragments skipped: {:>12}", summary.small_fragments)?;
    writeln!(writer, "Recall:                  {:>12.5}", summary.recall)?;
    writeln!(writer, "Precision:               {:>12.5}", summary.precision)?;
    writeln!(writer, "Correct base rate:       {:>12.5}", summary.correct_rate)?;
    writeln!(writer, "Trimmed/split reads:     {:>12}", summary.trimmed_reads())?;
    writeln!(writer, "Mean missing size:       {:>12.1}", summary.mean_missing_size())?;
    writeln!(writer, "%GC reference:           {:>11.2}%", summary.gc_reference * 100.0)?;
    writeln!(writer, "%GC corrected:           {:>11.2}%", summary.gc_corrected * 100.0)?;

    writeln!(writer)?;
    write_edits(writer, "Uncorrected read errors", &summary.uncorrected_edits)?;
    write_edits(writer, "Corrected read errors", &summary.corrected_edits)?;

    let hp = &summary.homopolymers;
    writeln!(writer)?;
    writeln!(writer, "Homopolymer indels:")?;
    write_runs(writer, "Uncorrected insertions", &hp.uncorrected_insertions)?;
    write_runs(writer, "Uncorrected deletions", &hp.uncorrected_deletions)?;
    write_runs(writer, "Corrected insertions", &hp.corrected_insertions)?;
    write_runs(writer, "Corrected deletions", &hp.corrected_deletions)
}

/// `"<len> uncorrected"` / `"<len> corrected"` lines for plotting size distributions
pub fn write_size_distribution<W, U, C>(writer: &mut W, uncorrected: U, corrected: C) -> io::Result<()>
where
    W: Write,
    U: IntoIterator<Item = usize>,
    C: IntoIterator<Item = usize>,
{
    writeln!(writer, "size type")?;
    for len in uncorrected {
        writeln!(writer, "{len} uncorrected")?;
    }
    for len in corrected {
        writeln!(writer, "{len} corrected")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::HomopolymerStats;

    fn summary() -> Summary {
        Summary {
            reads: 4,
            fragments: 5,
            small_fragments: 1,
            recall: 0.123456,
            precision: 0.9,
            correct_rate: 0.95,
            gc_reference: 0.41,
            gc_corrected: 0.4,
            missing_sizes: vec![30, 45],
            uncorrected_edits: EditCounts {
                insertions: 10,
                deletions: 4,
                substitutions: 2,
            },
            corrected_edits: EditCounts::default(),
            homopolymers: HomopolymerStats::default(),
        }
    }

    #[test]
    fn test_output_path_prefix() {
        let dir = Path::new("out");
        assert_eq!(output_path(dir, None, MSA_PROFILE), dir.join("msa_profile.txt"));
        assert_eq!(
            output_path(dir, Some("lordec"), MSA_PROFILE),
            dir.join("lordec_msa_profile.txt")
        );
        assert_eq!(output_path(dir, Some(""), LOG_FILE), dir.join("log"));
    }

    #[test]
    fn test_profile_format() {
        let mut out = Vec::new();
        write_profile(&mut out, Some("tool"), &summary()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "***********SUMMARY***********\n\
             [tool]Recall 0.12346 Precision 0.90000 Number of trimmed reads 2 Mean missing size in trimmed reads 37.5\n"
        );
    }

    #[test]
    fn test_per_read_lines() {
        let read = ReadMetrics {
            read_id: "r1".to_string(),
            fragments: 1,
            recall: 0.5,
            precision: 1.0,
            correct_rate: 0.75,
            missing: 0,
            corrected_columns: 4,
            gc_reference: 0.5,
            gc_corrected: 0.5,
        };
        let mut writer = PerReadWriter::new(Vec::new()).unwrap();
        writer.write_read(&read).unwrap();
        assert_eq!(writer.reads_written(), 1);
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "metric score\n0.5 recall\n1.0 precision\n0.75 correct_rate\n");
    }

    #[test]
    fn test_summary_mentions_every_section() {
        let mut out = Vec::new();
        write_summary(&mut out, &summary()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let value_of = |label: &str| {
            text.lines()
                .find(|l| l.trim_start().starts_with(label))
                .and_then(|l| l.split_whitespace().last())
                .map(str::to_string)
        };
        assert_eq!(value_of("Trimmed/split reads:").as_deref(), Some("2"));
        assert_eq!(value_of("Insertions:").as_deref(), Some("10"));
        assert_eq!(value_of("%GC reference:").as_deref(), Some("41.00%"));
        assert!(text
            .lines()
            .any(|l| l.contains("Corrected deletions:") && l.ends_with("(mean length 0.00)")));
    }

    #[test]
    fn test_size_distribution() {
        let mut out = Vec::new();
        write_size_distribution(&mut out, vec![100, 120], vec![90]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "size type\n100 uncorrected\n120 uncorrected\n90 corrected\n"
        );
    }
}
