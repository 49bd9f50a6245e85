//! Per-read and global aggregation of fragment scores
//!
//! Fragments of one read are contiguous in the alignment file. The open read is
//! finalized when a fragment with another id arrives and once more at the end of
//! input, so the last read is always counted.

use crate::classify::{EditCounts, FragmentScore, HomopolymerStats};
use crate::error::MsaError;
use crate::gap_stretch::PositionMasks;
use log::debug;
use std::collections::HashSet;

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Recall/precision counters of one fragment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FragmentTally {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub correct_bases: u64,
    pub uncorrected_bases: u64,
}

impl From<&FragmentScore> for FragmentTally {
    fn from(score: &FragmentScore) -> Self {
        FragmentTally {
            true_positives: score.true_positives,
            false_positives: score.false_positives,
            false_negatives: score.false_negatives,
            correct_bases: score.correct_bases,
            uncorrected_bases: score.uncorrected_bases,
        }
    }
}

/// Final metrics of one logical read
#[derive(Debug, Clone, PartialEq)]
pub struct ReadMetrics {
    pub read_id: String,
    pub fragments: usize,
    pub recall: f64,
    pub precision: f64,
    pub correct_rate: f64,
    /// Columns where no fragment of the corrected read is present
    pub missing: u64,
    /// Columns marked as corrected in at least one fragment
    pub corrected_columns: u64,
    pub gc_reference: f64,
    pub gc_corrected: f64,
}

/// OR `other` into `merged` over their common width
fn union_masks(merged: &mut Vec<bool>, other: &[bool]) {
    merged.truncate(other.len());
    for (m, &o) in merged.iter_mut().zip(other) {
        *m |= o;
    }
}

/// Open state of a read while its fragments are being scored
#[derive(Debug, Clone)]
pub struct ReadAccumulator {
    read_id: String,
    fragments: Vec<FragmentTally>,
    present: Vec<bool>,
    corrected: Vec<bool>,
    gc_reference: u64,
    reference_len: u64,
    gc_corrected: u64,
    corrected_len: u64,
}

impl ReadAccumulator {
    pub fn open(read_id: impl Into<String>, score: &FragmentScore, masks: PositionMasks) -> Self {
        ReadAccumulator {
            read_id: read_id.into(),
            fragments: vec![FragmentTally::from(score)],
            present: masks.present,
            corrected: masks.corrected,
            gc_reference: score.gc_reference,
            reference_len: score.reference_len,
            gc_corrected: score.gc_corrected,
            corrected_len: score.corrected_len,
        }
    }

    pub fn read_id(&self) -> &str {
        &self.read_id
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Add another fragment of the same read
    pub fn append(&mut self, score: &FragmentScore, masks: &PositionMasks) {
        if masks.len() != self.present.len() {
            debug!(
                "Fragments of {} have alignment widths {} and {}, merging over the shorter",
                self.read_id,
                self.present.len(),
                masks.len()
            );
        }
        self.fragments.push(FragmentTally::from(score));
        union_masks(&mut self.present, &masks.present);
        union_masks(&mut self.corrected, &masks.corrected);
        self.gc_reference += score.gc_reference;
        self.reference_len += score.reference_len;
        self.gc_corrected += score.gc_corrected;
        self.corrected_len += score.corrected_len;
    }

    pub fn finalize(self) -> ReadMetrics {
        let total = self
            .fragments
            .iter()
            .fold(FragmentTally::default(), |acc, f| FragmentTally {
                true_positives: acc.true_positives + f.true_positives,
                false_positives: acc.false_positives + f.false_positives,
                false_negatives: acc.false_negatives + f.false_negatives,
                correct_bases: acc.correct_bases + f.correct_bases,
                uncorrected_bases: acc.uncorrected_bases + f.uncorrected_bases,
            });

        ReadMetrics {
            fragments: self.fragments.len(),
            recall: ratio(
                total.true_positives,
                total.true_positives + total.false_negatives,
            ),
            precision: ratio(
                total.true_positives,
                total.true_positives + total.false_positives,
            ),
            correct_rate: ratio(
                total.correct_bases,
                total.correct_bases + total.uncorrected_bases,
            ),
            missing: self.present.iter().filter(|&&p| !p).count() as u64,
            corrected_columns: self.corrected.iter().filter(|&&c| c).count() as u64,
            gc_reference: ratio(self.gc_reference, self.reference_len),
            gc_corrected: ratio(self.gc_corrected, self.corrected_len),
            read_id: self.read_id,
        }
    }
}

/// Run-wide accumulators
#[derive(Debug, Default)]
pub struct GlobalMetrics {
    recall_sum: f64,
    precision_sum: f64,
    correct_rate_sum: f64,
    reads: u64,
    fragments: u64,
    small_fragments: u64,
    missing_sizes: Vec<u64>,
    gc_reference_sum: f64,
    gc_corrected_sum: f64,
    uncorrected_edits: EditCounts,
    corrected_edits: EditCounts,
    homopolymers: HomopolymerStats,
}

impl GlobalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edits and homopolymer runs are totalled per fragment
    pub fn add_fragment(&mut self, score: &FragmentScore) {
        self.fragments += 1;
        self.uncorrected_edits.merge(&score.uncorrected_edits);
        self.corrected_edits.merge(&score.corrected_edits);
        self.homopolymers.merge(&score.homopolymers);
    }

    pub fn add_small_fragment(&mut self) {
        self.small_fragments += 1;
    }

    pub fn add_read(&mut self, read: &ReadMetrics) {
        self.reads += 1;
        self.recall_sum += read.recall;
        self.precision_sum += read.precision;
        self.correct_rate_sum += read.correct_rate;
        self.gc_reference_sum += read.gc_reference;
        self.gc_corrected_sum += read.gc_corrected;
        if read.missing > 0 {
            self.missing_sizes.push(read.missing);
        }
    }

    pub fn finalize(self) -> Summary {
        let per_read = |sum: f64| {
            if self.reads == 0 {
                0.0
            } else {
                sum / self.reads as f64
            }
        };
        Summary {
            reads: self.reads,
            fragments: self.fragments,
            small_fragments: self.small_fragments,
            recall: per_read(self.recall_sum),
            precision: per_read(self.precision_sum),
            correct_rate: per_read(self.correct_rate_sum),
            gc_reference: per_read(self.gc_reference_sum),
            gc_corrected: per_read(self.gc_corrected_sum),
            missing_sizes: self.missing_sizes,
            uncorrected_edits: self.uncorrected_edits,
            corrected_edits: self.corrected_edits,
            homopolymers: self.homopolymers,
        }
    }
}

/// Final report values of a metrics run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub reads: u64,
    pub fragments: u64,
    pub small_fragments: u64,
    /// Mean of per-read recall
    pub recall: f64,
    /// Mean of per-read precision
    pub precision: f64,
    pub correct_rate: f64,
    pub gc_reference: f64,
    pub gc_corrected: f64,
    /// Missing column count of every trimmed or split read
    pub missing_sizes: Vec<u64>,
    pub uncorrected_edits: EditCounts,
    pub corrected_edits: EditCounts,
    pub homopolymers: HomopolymerStats,
}

impl Summary {
    pub fn trimmed_reads(&self) -> usize {
        self.missing_sizes.len()
    }

    pub fn mean_missing_size(&self) -> f64 {
        ratio(
            self.missing_sizes.iter().sum(),
            self.missing_sizes.len() as u64,
        )
    }
}

/// Drives the open/append/finalize cycle over fragments in file order
#[derive(Debug, Default)]
pub struct ReadAggregator {
    open: Option<ReadAccumulator>,
    finalized: HashSet<String>,
    metrics: GlobalMetrics,
}

impl ReadAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scored fragment; returns the previous read if this fragment closed it
    pub fn push(
        &mut self,
        read_id: &str,
        score: &FragmentScore,
        masks: PositionMasks,
    ) -> Result<Option<ReadMetrics>, MsaError> {
        if let Some(open) = self.open.as_mut() {
            if open.read_id() == read_id {
                open.append(score, &masks);
                self.metrics.add_fragment(score);
                return Ok(None);
            }
        }
        if self.finalized.contains(read_id) {
            return Err(MsaError::NonContiguousRead {
                read_id: read_id.to_string(),
            });
        }

        self.metrics.add_fragment(score);
        let closed = self.close_open();
        self.open = Some(ReadAccumulator::open(read_id, score, masks));
        Ok(closed)
    }

    /// Count a fragment excluded from scoring
    pub fn skip_small(&mut self) {
        self.metrics.add_small_fragment();
    }

    fn close_open(&mut self) -> Option<ReadMetrics> {
        let read = self.open.take()?.finalize();
        debug!(
            "Read {}: {} fragment(s), recall {:.4}, precision {:.4}, correct rate {:.4}, missing {}",
            read.read_id, read.fragments, read.recall, read.precision, read.correct_rate, read.missing
        );
        self.metrics.add_read(&read);
        self.finalized.insert(read.read_id.clone());
        Some(read)
    }

    /// Finalize the last open read and produce the summary
    pub fn finish(mut self) -> (Option<ReadMetrics>, Summary) {
        let last = self.close_open();
        (last, self.metrics.finalize())
    }
}
