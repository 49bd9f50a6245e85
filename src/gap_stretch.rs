/// Detection of long gap runs in the corrected row (trimmed or split reads)
///
/// A run of gaps in the corrected row that is not mirrored by a run of gaps in
/// the reference row means the corrector emitted nothing for that region.
/// When both rows are gapped the column belongs to an insertion of the
/// uncorrected read and says nothing about the corrected output.
use crate::error::MsaError;

/// Half-open column interval where the corrected read is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapStretch {
    pub start: usize,
    pub end: usize,
}

impl GapStretch {
    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

/// Find gap stretches of the corrected row wider than `confirm_threshold`
///
/// A candidate opens once the corrected gap run reaches `open_threshold` while
/// the reference gap run is still below it, and grows with the corrected run
/// for as long as that holds.
pub fn find_gap_stretches(
    corrected: &[u8],
    reference: &[u8],
    gap: u8,
    open_threshold: usize,
    confirm_threshold: usize,
) -> Vec<GapStretch> {
    let mut stretches = Vec::new();
    let mut candidate: Option<GapStretch> = None;
    let mut corrected_run = 0usize;
    let mut reference_run = 0usize;

    let confirm = |candidate: Option<GapStretch>, stretches: &mut Vec<GapStretch>| {
        if let Some(stretch) = candidate {
            if stretch.width() > confirm_threshold {
                stretches.push(stretch);
            }
        }
    };

    for (pos, (&c, &r)) in corrected.iter().zip(reference).enumerate() {
        if c == gap {
            corrected_run += 1;
        } else {
            corrected_run = 0;
            confirm(candidate.take(), &mut stretches);
        }
        if r == gap {
            reference_run += 1;
        } else {
            reference_run = 0;
        }

        if corrected_run >= open_threshold && reference_run < open_threshold {
            match candidate.as_mut() {
                Some(stretch) => stretch.end = pos + 1,
                None => {
                    candidate = Some(GapStretch {
                        start: pos + 1 - open_threshold,
                        end: pos + 1,
                    })
                }
            }
        }
    }
    confirm(candidate, &mut stretches);

    stretches
}

/// Column masks consumed by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMasks {
    /// Columns inside a span the corrector marked as corrected
    pub corrected: Vec<bool>,
    /// Columns where the corrected read has content
    pub present: Vec<bool>,
}

impl PositionMasks {
    /// Build the presence mask and clear both masks over every stretch
    ///
    /// Absence takes precedence: a corrected span falling inside a stretch is
    /// no longer counted as corrected.
    pub fn new(
        read_id: &str,
        mut corrected: Vec<bool>,
        stretches: &[GapStretch],
    ) -> Result<Self, MsaError> {
        let len = corrected.len();
        let mut present = vec![true; len];
        for stretch in stretches {
            if stretch.start > stretch.end || stretch.end > len {
                return Err(MsaError::StretchOutOfBounds {
                    read_id: read_id.to_string(),
                    start: stretch.start,
                    end: stretch.end,
                    len,
                });
            }
            present[stretch.start..stretch.end].fill(false);
            corrected[stretch.start..stretch.end].fill(false);
        }
        Ok(PositionMasks { corrected, present })
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Number of columns where the corrected read is absent
    pub fn missing(&self) -> usize {
        self.present.iter().filter(|&&p| !p).count()
    }
}
