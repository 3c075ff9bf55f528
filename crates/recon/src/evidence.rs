use crate::model::{ResolveSummary, Selected};

/// Compute summary statistics for one resolve run.
///
/// `null_plate_rows` is the number of registration rows skipped for having
/// no plate; every other row not in `selected` is a dropped duplicate.
pub fn compute_summary(
    registration_rows: usize,
    null_plate_rows: usize,
    locality_rows: usize,
    join_rows: usize,
    selected: &[Selected],
) -> ResolveSummary {
    let mut matched = 0;
    let mut unmatched = 0;
    let mut ambiguous_plates = 0;

    for s in selected {
        if s.join.locality.is_some() {
            matched += 1;
        } else {
            unmatched += 1;
        }
        if s.candidates > 1 {
            ambiguous_plates += 1;
        }
    }

    ResolveSummary {
        registration_rows,
        locality_rows,
        null_plate_rows,
        join_rows,
        output_rows: selected.len(),
        matched,
        unmatched,
        duplicate_rows_dropped: registration_rows
            .saturating_sub(null_plate_rows)
            .saturating_sub(selected.len()),
        ambiguous_plates,
    }
}
