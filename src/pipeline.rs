//! Streaming metrics run over an alignment file
//!
//! Records are consumed in file order with bounded state: one open read plus the
//! set of ids already finalized.

use crate::aggregate::{ReadAggregator, ReadMetrics, Summary};
use crate::classify::score_fragment;
use crate::config::ScoringConfig;
use crate::corrected_reads::CorrectedReads;
use crate::error::MsaError;
use crate::evidence::correction_mask;
use crate::gap_stretch::{find_gap_stretches, PositionMasks};
use crate::msa::{ungapped_len, AlignedTriplet};
use log::{debug, info, warn};
use std::io;

/// Fragment counter for consecutive records sharing an id
#[derive(Debug, Default)]
struct FragmentIndex {
    read_id: Option<String>,
    next: usize,
}

impl FragmentIndex {
    fn advance(&mut self, read_id: &str) -> usize {
        if self.read_id.as_deref() != Some(read_id) {
            self.read_id = Some(read_id.to_string());
            self.next = 0;
        }
        let index = self.next;
        self.next += 1;
        index
    }
}

/// Whether the corrected fragment is too short relative to its reference span
fn is_small_fragment(triplet: &AlignedTriplet, config: &ScoringConfig) -> bool {
    let reference_len = ungapped_len(triplet.reference(), config.gap_symbol) as f64;
    let corrected_len = ungapped_len(triplet.corrected(), config.gap_symbol) as f64;
    corrected_len < config.min_size_fraction * reference_len
}

/// Scores alignment records and reports each read as soon as it is finalized
pub struct MetricsRun<'a> {
    reads: &'a CorrectedReads,
    config: &'a ScoringConfig,
    aggregator: ReadAggregator,
    fragment_index: FragmentIndex,
}

impl<'a> MetricsRun<'a> {
    pub fn new(reads: &'a CorrectedReads, config: &'a ScoringConfig) -> Self {
        MetricsRun {
            reads,
            config,
            aggregator: ReadAggregator::new(),
            fragment_index: FragmentIndex::default(),
        }
    }

    /// Score one record; returns the previous read if this record closed it
    pub fn push(&mut self, triplet: &AlignedTriplet) -> Result<Option<ReadMetrics>, MsaError> {
        let read_id = triplet.read_id();
        let index = self.fragment_index.advance(read_id);

        let raw = self.reads.fragment(read_id, index);
        if raw.is_none() {
            warn!(
                "No corrected sequence for fragment {} of read {}, treating it as uncorrected",
                index, read_id
            );
        }

        if is_small_fragment(triplet, self.config) {
            debug!(
                "Skipping small fragment {} of read {} ({} of {} reference bases)",
                index,
                read_id,
                ungapped_len(triplet.corrected(), self.config.gap_symbol),
                ungapped_len(triplet.reference(), self.config.gap_symbol)
            );
            self.aggregator.skip_small();
            return Ok(None);
        }

        let corrected = correction_mask(triplet.corrected(), raw, self.config.gap_symbol);
        let stretches = find_gap_stretches(
            triplet.corrected(),
            triplet.reference(),
            self.config.gap_symbol,
            self.config.gap_open_threshold,
            self.config.gap_confirm_threshold,
        );
        if !stretches.is_empty() {
            debug!(
                "Read {} fragment {}: {} gap stretch(es) covering {} columns",
                read_id,
                index,
                stretches.len(),
                stretches.iter().map(|s| s.width()).sum::<usize>()
            );
        }
        let masks = PositionMasks::new(read_id, corrected, &stretches)?;
        let score = score_fragment(triplet, &masks, self.config)?;

        self.aggregator.push(read_id, &score, masks)
    }

    /// Finalize the last read
    pub fn finish(self) -> (Option<ReadMetrics>, Summary) {
        self.aggregator.finish()
    }
}

/// Run every record through the scorer, handing each finalized read to `on_read`
pub fn compute_metrics<I, F>(
    records: I,
    reads: &CorrectedReads,
    config: &ScoringConfig,
    mut on_read: F,
) -> Result<Summary, MsaError>
where
    I: IntoIterator<Item = Result<AlignedTriplet, MsaError>>,
    F: FnMut(&ReadMetrics) -> io::Result<()>,
{
    let mut run = MetricsRun::new(reads, config);
    let mut records_seen = 0usize;

    for record in records {
        let triplet = record?;
        records_seen += 1;
        if let Some(read) = run.push(&triplet)? {
            on_read(&read)?;
        }
        if records_seen % 100_000 == 0 {
            info!("Processed {} alignment records", records_seen);
        }
    }

    let (last, summary) = run.finish();
    if let Some(read) = last {
        on_read(&read)?;
    }

    info!(
        "Scored {} reads from {} fragments ({} small fragments skipped)",
        summary.reads, summary.fragments, summary.small_fragments
    );
    Ok(summary)
}
