use anyhow::{bail, Result};

/// Alignment gap symbol used by the multiple aligner
pub const GAP: u8 = b'.';

/// Scoring configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub gap_open_threshold: usize,    // --gap-open: run length that opens a candidate stretch
    pub gap_confirm_threshold: usize, // --gap-confirm: width a stretch must exceed to be kept
    pub homopolymer_threshold: usize, // --homopolymer-threshold
    pub min_size_fraction: f64,       // --min-size / 100
    pub gap_symbol: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            gap_open_threshold: 5,
            gap_confirm_threshold: 20,
            homopolymer_threshold: 5,
            min_size_fraction: 0.1,
            gap_symbol: GAP,
        }
    }
}

impl ScoringConfig {
    pub fn with_gap_thresholds(mut self, open: usize, confirm: usize) -> Self {
        self.gap_open_threshold = open;
        self.gap_confirm_threshold = confirm;
        self
    }

    pub fn with_homopolymer_threshold(mut self, threshold: usize) -> Self {
        self.homopolymer_threshold = threshold;
        self
    }

    pub fn with_min_size_fraction(mut self, fraction: f64) -> Self {
        self.min_size_fraction = fraction;
        self
    }

    /// Reject threshold combinations the scanners cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.gap_open_threshold == 0 {
            bail!("Gap-stretch open threshold must be at least 1");
        }
        if self.gap_confirm_threshold < self.gap_open_threshold {
            bail!(
                "Gap-stretch confirm threshold ({}) must not be below the open threshold ({})",
                self.gap_confirm_threshold,
                self.gap_open_threshold
            );
        }
        if self.homopolymer_threshold == 0 {
            bail!("Homopolymer reporting threshold must be at least 1");
        }
        if !(0.0..1.0).contains(&self.min_size_fraction) {
            bail!(
                "Minimum corrected size must be a fraction in [0, 1), got {}",
                self.min_size_fraction
            );
        }
        Ok(())
    }
}
