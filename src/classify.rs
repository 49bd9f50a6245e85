//! Column-by-column classification of an aligned triplet
//!
//! Every column is scored twice for edits (reference vs uncorrected, reference
//! vs corrected) and once for correction quality (true/false positive, false
//! negative or correct base). Homopolymer indel runs are tracked per side with a
//! small state value that is passed into and returned from each column step.

use crate::config::ScoringConfig;
use crate::error::MsaError;
use crate::gap_stretch::PositionMasks;
use crate::msa::{ungapped_len, AlignedTriplet};

/// Edit of a read row relative to the reference at one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Base present in the read, gap in the reference
    Insertion(u8),
    /// Reference base missing from the read
    Deletion(u8),
    Substitution,
}

/// Classify the difference between a reference and a read character
pub fn edit_between(reference: u8, read: u8, gap: u8) -> Option<Edit> {
    if reference == read {
        None
    } else if reference == gap {
        Some(Edit::Insertion(read))
    } else if read == gap {
        Some(Edit::Deletion(reference))
    } else {
        Some(Edit::Substitution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndelKind {
    Insertion,
    Deletion,
}

/// A run of identical inserted or deleted bases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomopolymerRun {
    pub kind: IndelKind,
    pub base: u8,
    pub len: usize,
}

/// Open homopolymer run of one read row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HomopolymerTracker {
    active: Option<HomopolymerRun>,
}

impl HomopolymerTracker {
    /// Feed one edit; returns the updated tracker and the run this edit closed,
    /// if that run reached `threshold`
    pub fn observe(self, edit: Edit, threshold: usize) -> (Self, Option<HomopolymerRun>) {
        let (kind, base) = match edit {
            Edit::Insertion(base) => (IndelKind::Insertion, base),
            Edit::Deletion(base) => (IndelKind::Deletion, base),
            // Substitutions break the run without reporting it
            Edit::Substitution => return (HomopolymerTracker { active: None }, None),
        };

        match self.active {
            Some(run) if run.kind == kind && run.base == base => {
                let extended = HomopolymerRun {
                    len: run.len + 1,
                    ..run
                };
                (
                    HomopolymerTracker {
                        active: Some(extended),
                    },
                    None,
                )
            }
            previous => {
                let closed = previous.filter(|run| run.len >= threshold);
                let started = HomopolymerRun { kind, base, len: 1 };
                (
                    HomopolymerTracker {
                        active: Some(started),
                    },
                    closed,
                )
            }
        }
    }

    pub fn active(&self) -> Option<HomopolymerRun> {
        self.active
    }
}

/// Homopolymer state of both read rows, threaded through a record scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    pub uncorrected: HomopolymerTracker,
    pub corrected: HomopolymerTracker,
}

/// Recall/precision class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Inside the correction mask, no error before or after
    Correct,
    /// Error in the uncorrected read fixed by the corrector
    TruePositive,
    /// Corrector changed an error-free base or replaced an error with another
    FalsePositive,
    /// Error left as it was
    FalseNegative,
    /// Corrected read present but not marked as corrected; only counts toward
    /// the correct-base rate
    Unscored { matches: bool },
    /// Corrected read absent (trimmed or split)
    Absent,
}

impl Outcome {
    /// Whether the column adds to the correct-base tally, the erroneous-base
    /// tally, or neither
    pub fn base_tally(&self) -> Option<bool> {
        match self {
            Outcome::Correct => Some(true),
            Outcome::TruePositive | Outcome::FalsePositive | Outcome::FalseNegative => Some(false),
            Outcome::Unscored { matches } => Some(*matches),
            Outcome::Absent => None,
        }
    }
}

/// Everything one column contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnResult {
    pub outcome: Outcome,
    pub uncorrected_edit: Option<Edit>,
    pub corrected_edit: Option<Edit>,
    pub uncorrected_run: Option<HomopolymerRun>,
    pub corrected_run: Option<HomopolymerRun>,
}

/// Recall/precision class of a column given both mask bits
pub fn classify_outcome(
    reference: u8,
    uncorrected: u8,
    corrected: u8,
    in_corrected: bool,
    present: bool,
) -> Outcome {
    if in_corrected {
        if reference == uncorrected {
            if uncorrected == corrected {
                Outcome::Correct
            } else {
                Outcome::FalsePositive
            }
        } else if reference == corrected {
            Outcome::TruePositive
        } else if uncorrected == corrected {
            Outcome::FalseNegative
        } else {
            Outcome::FalsePositive
        }
    } else if present {
        Outcome::Unscored {
            matches: reference == corrected,
        }
    } else {
        Outcome::Absent
    }
}

/// Score one column
pub fn classify_column(
    column: (u8, u8, u8),
    in_corrected: bool,
    present: bool,
    state: ScanState,
    config: &ScoringConfig,
) -> (ScanState, ColumnResult) {
    let (reference, uncorrected, corrected) = column;
    let mut next = state;
    let mut result = ColumnResult {
        outcome: classify_outcome(reference, uncorrected, corrected, in_corrected, present),
        uncorrected_edit: None,
        corrected_edit: None,
        uncorrected_run: None,
        corrected_run: None,
    };

    // Edits only count where the corrected read exists
    if present {
        result.uncorrected_edit = edit_between(reference, uncorrected, config.gap_symbol);
        if let Some(edit) = result.uncorrected_edit {
            let (tracker, closed) = state.uncorrected.observe(edit, config.homopolymer_threshold);
            next.uncorrected = tracker;
            result.uncorrected_run = closed;
        }

        result.corrected_edit = edit_between(reference, corrected, config.gap_symbol);
        if let Some(edit) = result.corrected_edit {
            let (tracker, closed) = state.corrected.observe(edit, config.homopolymer_threshold);
            next.corrected = tracker;
            result.corrected_run = closed;
        }
    }

    (next, result)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditCounts {
    pub insertions: u64,
    pub deletions: u64,
    pub substitutions: u64,
}

impl EditCounts {
    pub fn record(&mut self, edit: Edit) {
        match edit {
            Edit::Insertion(_) => self.insertions += 1,
            Edit::Deletion(_) => self.deletions += 1,
            Edit::Substitution => self.substitutions += 1,
        }
    }

    pub fn merge(&mut self, other: &EditCounts) {
        self.insertions += other.insertions;
        self.deletions += other.deletions;
        self.substitutions += other.substitutions;
    }
}

/// Count and summed length of completed homopolymer runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub count: u64,
    pub total_len: u64,
}

impl RunStats {
    pub fn mean_len(&self) -> f64 {
        if self.count > 0 {
            self.total_len as f64 / self.count as f64
        } else {
            0.0
        }
    }

    fn merge(&mut self, other: &RunStats) {
        self.count += other.count;
        self.total_len += other.total_len;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HomopolymerStats {
    pub uncorrected_insertions: RunStats,
    pub uncorrected_deletions: RunStats,
    pub corrected_insertions: RunStats,
    pub corrected_deletions: RunStats,
}

impl HomopolymerStats {
    fn record(&mut self, run: HomopolymerRun, corrected: bool) {
        let stats = match (corrected, run.kind) {
            (false, IndelKind::Insertion) => &mut self.uncorrected_insertions,
            (false, IndelKind::Deletion) => &mut self.uncorrected_deletions,
            (true, IndelKind::Insertion) => &mut self.corrected_insertions,
            (true, IndelKind::Deletion) => &mut self.corrected_deletions,
        };
        stats.count += 1;
        stats.total_len += run.len as u64;
    }

    pub fn merge(&mut self, other: &HomopolymerStats) {
        self.uncorrected_insertions.merge(&other.uncorrected_insertions);
        self.uncorrected_deletions.merge(&other.uncorrected_deletions);
        self.corrected_insertions.merge(&other.corrected_insertions);
        self.corrected_deletions.merge(&other.corrected_deletions);
    }
}

/// Column totals for one alignment record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentScore {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub correct_bases: u64,
    pub uncorrected_bases: u64,
    /// Columns present but outside the correction mask
    pub unscored: u64,
    pub absent: u64,
    pub uncorrected_edits: EditCounts,
    pub corrected_edits: EditCounts,
    pub homopolymers: HomopolymerStats,
    pub gc_reference: u64,
    pub gc_corrected: u64,
    pub reference_len: u64,
    pub corrected_len: u64,
}

impl FragmentScore {
    fn record(&mut self, result: &ColumnResult) {
        match result.outcome {
            Outcome::Correct => {}
            Outcome::TruePositive => self.true_positives += 1,
            Outcome::FalsePositive => self.false_positives += 1,
            Outcome::FalseNegative => self.false_negatives += 1,
            Outcome::Unscored { .. } => self.unscored += 1,
            Outcome::Absent => self.absent += 1,
        }
        match result.outcome.base_tally() {
            Some(true) => self.correct_bases += 1,
            Some(false) => self.uncorrected_bases += 1,
            None => {}
        }

        if let Some(edit) = result.uncorrected_edit {
            self.uncorrected_edits.record(edit);
        }
        if let Some(edit) = result.corrected_edit {
            self.corrected_edits.record(edit);
        }
        if let Some(run) = result.uncorrected_run {
            self.homopolymers.record(run, false);
        }
        if let Some(run) = result.corrected_run {
            self.homopolymers.record(run, true);
        }
    }
}

fn is_gc(base: u8) -> bool {
    matches!(base.to_ascii_uppercase(), b'G' | b'C')
}

/// Score every column of a record against its position masks
pub fn score_fragment(
    triplet: &AlignedTriplet,
    masks: &PositionMasks,
    config: &ScoringConfig,
) -> Result<FragmentScore, MsaError> {
    for mask_len in [masks.corrected.len(), masks.present.len()] {
        if mask_len != triplet.len() {
            return Err(MsaError::MaskLengthMismatch {
                read_id: triplet.read_id().to_string(),
                expected: triplet.len(),
                found: mask_len,
            });
        }
    }

    let mut score = FragmentScore {
        reference_len: ungapped_len(triplet.reference(), config.gap_symbol) as u64,
        corrected_len: ungapped_len(triplet.corrected(), config.gap_symbol) as u64,
        ..Default::default()
    };
    let mut state = ScanState::default();

    for (i, column) in triplet.columns().enumerate() {
        if is_gc(column.0) {
            score.gc_reference += 1;
        }
        if is_gc(column.2) {
            score.gc_corrected += 1;
        }

        let (next, result) =
            classify_column(column, masks.corrected[i], masks.present[i], state, config);
        state = next;
        score.record(&result);
    }

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triplet(reference: &str, uncorrected: &str, corrected: &str) -> AlignedTriplet {
        AlignedTriplet::new(
            "r1",
            0,
            reference.as_bytes().to_vec(),
            uncorrected.as_bytes().to_vec(),
            corrected.as_bytes().to_vec(),
        )
        .unwrap()
    }

    fn full_masks(len: usize) -> PositionMasks {
        PositionMasks {
            corrected: vec![true; len],
            present: vec![true; len],
        }
    }

    #[test]
    fn test_edit_between() {
        assert_eq!(edit_between(b'A', b'A', b'.'), None);
        assert_eq!(edit_between(b'.', b'G', b'.'), Some(Edit::Insertion(b'G')));
        assert_eq!(edit_between(b'T', b'.', b'.'), Some(Edit::Deletion(b'T')));
        assert_eq!(edit_between(b'T', b'C', b'.'), Some(Edit::Substitution));
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(classify_outcome(b'A', b'A', b'A', true, true), Outcome::Correct);
        assert_eq!(classify_outcome(b'A', b'A', b'C', true, true), Outcome::FalsePositive);
        assert_eq!(classify_outcome(b'A', b'C', b'A', true, true), Outcome::TruePositive);
        assert_eq!(classify_outcome(b'A', b'C', b'C', true, true), Outcome::FalseNegative);
        assert_eq!(classify_outcome(b'A', b'C', b'G', true, true), Outcome::FalsePositive);
        assert_eq!(
            classify_outcome(b'A', b'C', b'A', false, true),
            Outcome::Unscored { matches: true }
        );
        assert_eq!(
            classify_outcome(b'A', b'A', b'C', false, true),
            Outcome::Unscored { matches: false }
        );
        assert_eq!(classify_outcome(b'A', b'A', b'.', false, false), Outcome::Absent);
    }

    #[test]
    fn test_fixed_substitution() {
        let t = triplet("ACGTACGT", "ACGAACGT", "ACGTACGT");
        let score = score_fragment(&t, &full_masks(8), &ScoringConfig::default()).unwrap();
        assert_eq!(score.true_positives, 1);
        assert_eq!(score.false_positives, 0);
        assert_eq!(score.false_negatives, 0);
        assert_eq!(score.correct_bases, 7);
        assert_eq!(score.uncorrected_edits.substitutions, 1);
        assert_eq!(score.corrected_edits, EditCounts::default());
    }

    #[test]
    fn test_uncorrected_substitution() {
        let t = triplet("ACGTACGT", "ACGAACGT", "ACGAACGT");
        let score = score_fragment(&t, &full_masks(8), &ScoringConfig::default()).unwrap();
        assert_eq!(score.true_positives, 0);
        assert_eq!(score.false_negatives, 1);
        assert_eq!(score.correct_bases, 7);
        assert_eq!(score.corrected_edits.substitutions, 1);
    }

    #[test]
    fn test_homopolymer_insertion_closed_by_other_base() {
        let config = ScoringConfig::default();
        let mut tracker = HomopolymerTracker::default();
        for _ in 0..5 {
            let (next, closed) = tracker.observe(Edit::Insertion(b'A'), config.homopolymer_threshold);
            assert_eq!(closed, None);
            tracker = next;
        }
        let (_, closed) = tracker.observe(Edit::Insertion(b'C'), config.homopolymer_threshold);
        assert_eq!(
            closed,
            Some(HomopolymerRun {
                kind: IndelKind::Insertion,
                base: b'A',
                len: 5
            })
        );
    }

    #[test]
    fn test_short_run_not_reported() {
        let mut tracker = HomopolymerTracker::default();
        for _ in 0..4 {
            tracker = tracker.observe(Edit::Deletion(b'T'), 5).0;
        }
        let (tracker, closed) = tracker.observe(Edit::Deletion(b'G'), 5);
        assert_eq!(closed, None);
        assert_eq!(tracker.active().map(|r| (r.base, r.len)), Some((b'G', 1)));
    }

    #[test]
    fn test_substitution_resets_run() {
        let mut tracker = HomopolymerTracker::default();
        for _ in 0..6 {
            tracker = tracker.observe(Edit::Insertion(b'A'), 5).0;
        }
        let (tracker, closed) = tracker.observe(Edit::Substitution, 5);
        assert_eq!(closed, None);
        assert_eq!(tracker.active(), None);
    }

    #[test]
    fn test_homopolymer_deletion_in_record() {
        // Six T deleted from the corrected read, then a G deleted
        let t = triplet("ATTTTTTGA", "ATTTTTTGA", "A.......A");
        let score = score_fragment(&t, &full_masks(9), &ScoringConfig::default()).unwrap();
        assert_eq!(score.corrected_edits.deletions, 7);
        assert_eq!(score.homopolymers.corrected_deletions, RunStats { count: 1, total_len: 6 });
        assert_eq!(score.homopolymers.uncorrected_deletions, RunStats::default());
    }

    #[test]
    fn test_absent_columns_skip_edits() {
        let t = triplet("ACGTACGT", "ACGTACGT", "ACG.....");
        let masks = PositionMasks {
            corrected: vec![true, true, true, false, false, false, false, false],
            present: vec![true, true, true, false, false, false, false, false],
        };
        let score = score_fragment(&t, &masks, &ScoringConfig::default()).unwrap();
        assert_eq!(score.absent, 5);
        assert_eq!(score.corrected_edits.deletions, 0);
        assert_eq!(score.correct_bases, 3);
        assert_eq!(score.uncorrected_bases, 0);
    }

    #[test]
    fn test_gc_counts_ignore_gaps() {
        let t = triplet("GC.AT", "GCAAT", "gc..T");
        let score = score_fragment(&t, &full_masks(5), &ScoringConfig::default()).unwrap();
        assert_eq!((score.gc_reference, score.reference_len), (2, 4));
        assert_eq!((score.gc_corrected, score.corrected_len), (2, 3));
    }

    #[test]
    fn test_mask_length_checked() {
        let t = triplet("ACGT", "ACGT", "ACGT");
        let result = score_fragment(&t, &full_masks(3), &ScoringConfig::default());
        assert!(matches!(
            result,
            Err(MsaError::MaskLengthMismatch { expected: 4, found: 3, .. })
        ));
    }
}
