/// Correction evidence: which alignment columns the corrector actually corrected
///
/// The raw corrected read and the corrected alignment row are walked in
/// lock-step. Each raw base consumes one non-gap column. An upper-case raw base
/// switches the "corrected" state on, a lower-case base switches it off, and
/// gap columns inherit the state unless the next raw base is lower-case.
/// Column mask of corrector-marked positions for one aligned corrected row
pub fn correction_mask(corrected_row: &[u8], raw: Option<&[u8]>, gap: u8) -> Vec<bool> {
    let raw = match raw {
        Some(raw) => raw,
        None => return vec![false; corrected_row.len()],
    };

    let mut mask = Vec::with_capacity(corrected_row.len());
    let mut raw_pos = 0;
    let mut in_corrected = false;

    for &col in corrected_row {
        let Some(&base) = raw.get(raw_pos) else {
            mask.push(false);
            continue;
        };

        if base.is_ascii_lowercase() {
            in_corrected = false;
        } else if col != gap {
            in_corrected = true;
        }
        mask.push(in_corrected);

        if col != gap {
            raw_pos += 1;
        }
    }

    mask
}

/// Number of raw bases flagged as corrected (upper-case)
pub fn marked_bases(raw: &[u8]) -> usize {
    raw.iter().filter(|b| !b.is_ascii_lowercase()).count()
}
