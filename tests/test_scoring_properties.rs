/// Property-based tests for the column scorer
///
/// Uses proptest to check invariants that must hold for any alignment:
/// every column is classified once, case marks map one-to-one onto columns,
/// and gap stretches respect their thresholds.
use msaeval::classify::score_fragment;
use msaeval::config::{ScoringConfig, GAP};
use msaeval::evidence::{correction_mask, marked_bases};
use msaeval::gap_stretch::{find_gap_stretches, PositionMasks};
use msaeval::msa::AlignedTriplet;
use proptest::prelude::*;

fn alignment_symbol() -> impl Strategy<Value = u8> {
    prop_oneof![
        Just(b'A'),
        Just(b'C'),
        Just(b'G'),
        Just(b'T'),
        Just(GAP)
    ]
}

fn gap_heavy_symbol() -> impl Strategy<Value = u8> {
    prop_oneof![3 => Just(GAP), 1 => Just(b'A'), 1 => Just(b'C')]
}

/// Property: each column adds to exactly one base tally or is absent
#[test]
fn prop_every_column_classified_once() {
    proptest!(|(
        columns in prop::collection::vec(
            (alignment_symbol(), alignment_symbol(), alignment_symbol(), any::<bool>(), any::<bool>()),
            1..200
        )
    )| {
        let reference: Vec<u8> = columns.iter().map(|c| c.0).collect();
        let uncorrected: Vec<u8> = columns.iter().map(|c| c.1).collect();
        let corrected: Vec<u8> = columns.iter().map(|c| c.2).collect();
        let present: Vec<bool> = columns.iter().map(|c| c.4).collect();
        // A corrected span never survives inside an absent region
        let in_corrected: Vec<bool> = columns.iter().map(|c| c.3 && c.4).collect();

        let triplet = AlignedTriplet::new("p1", 0, reference, uncorrected, corrected).unwrap();
        let masks = PositionMasks { corrected: in_corrected.clone(), present: present.clone() };
        let score = score_fragment(&triplet, &masks, &ScoringConfig::default()).unwrap();

        let len = triplet.len() as u64;
        let absent = present.iter().filter(|&&p| !p).count() as u64;
        let marked = in_corrected.iter().filter(|&&m| m).count() as u64;

        prop_assert_eq!(score.correct_bases + score.uncorrected_bases + score.absent, len);
        prop_assert_eq!(score.absent, absent);
        prop_assert_eq!(score.unscored, len - absent - marked);
        prop_assert!(score.true_positives + score.false_positives + score.false_negatives <= marked);
    });
}

/// Property: without correction marks there is nothing to recall or to blame
#[test]
fn prop_unmarked_read_has_no_outcomes() {
    proptest!(|(
        columns in prop::collection::vec(
            (alignment_symbol(), alignment_symbol(), alignment_symbol()),
            1..200
        )
    )| {
        let triplet = AlignedTriplet::new(
            "p2",
            0,
            columns.iter().map(|c| c.0).collect(),
            columns.iter().map(|c| c.1).collect(),
            columns.iter().map(|c| c.2).collect(),
        ).unwrap();
        let masks = PositionMasks::new("p2", vec![false; triplet.len()], &[]).unwrap();
        let score = score_fragment(&triplet, &masks, &ScoringConfig::default()).unwrap();

        prop_assert_eq!(score.true_positives, 0);
        prop_assert_eq!(score.false_positives, 0);
        prop_assert_eq!(score.false_negatives, 0);
    });
}

/// Property: marked non-gap columns equal upper-case raw bases
#[test]
fn prop_mask_matches_case_marks() {
    proptest!(|(
        row in prop::collection::vec(alignment_symbol(), 0..300),
        upper in prop::collection::vec(any::<bool>(), 300)
    )| {
        let raw: Vec<u8> = row
            .iter()
            .filter(|&&c| c != GAP)
            .zip(&upper)
            .map(|(&c, &up)| if up { c } else { c.to_ascii_lowercase() })
            .collect();

        let mask = correction_mask(&row, Some(raw.as_slice()), GAP);
        prop_assert_eq!(mask.len(), row.len());

        let marked_columns = row
            .iter()
            .zip(&mask)
            .filter(|&(&c, &m)| c != GAP && m)
            .count();
        prop_assert_eq!(marked_columns, marked_bases(&raw));
    });
}

/// Property: reported stretches are wide, in bounds, ordered and fully gapped
#[test]
fn prop_gap_stretches_well_formed() {
    proptest!(|(
        columns in prop::collection::vec((gap_heavy_symbol(), gap_heavy_symbol()), 0..400),
        open in 1usize..8,
        extra in 0usize..30
    )| {
        let corrected: Vec<u8> = columns.iter().map(|c| c.0).collect();
        let reference: Vec<u8> = columns.iter().map(|c| c.1).collect();
        let confirm = open + extra;

        let stretches = find_gap_stretches(&corrected, &reference, GAP, open, confirm);

        let mut previous_end = 0;
        for stretch in &stretches {
            prop_assert!(stretch.width() > confirm);
            prop_assert!(stretch.end <= corrected.len());
            prop_assert!(stretch.start >= previous_end);
            prop_assert!(corrected[stretch.start..stretch.end].iter().all(|&c| c == GAP));
            previous_end = stretch.end;
        }

        let masks = PositionMasks::new("p4", vec![true; corrected.len()], &stretches).unwrap();
        let covered: usize = stretches.iter().map(|s| s.width()).sum();
        prop_assert_eq!(masks.missing(), covered);
    });
}

/// Property: a lone corrected gap run next to an ungapped reference is found iff wider than T2
#[test]
fn prop_single_run_threshold() {
    proptest!(|(
        left in 1usize..20,
        run in 0usize..60,
        right in 1usize..20
    )| {
        let mut corrected = vec![b'A'; left];
        corrected.extend(std::iter::repeat(GAP).take(run));
        corrected.extend(std::iter::repeat(b'C').take(right));
        let reference = vec![b'G'; corrected.len()];

        let stretches = find_gap_stretches(&corrected, &reference, GAP, 5, 20);
        if run > 20 {
            prop_assert_eq!(stretches.len(), 1);
            prop_assert_eq!(stretches[0].start, left);
            prop_assert_eq!(stretches[0].width(), run);
        } else {
            prop_assert!(stretches.is_empty());
        }
    });
}
