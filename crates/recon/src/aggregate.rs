use std::collections::HashMap;

use crate::model::{JoinRow, PlateKey, Selected, Table};

/// Reduce the join stream to one row per plate.
///
/// The first join row seen for a plate wins. Output order is the order in
/// which plates first appear. Rows with a null plate have no plate to keep
/// and are skipped. `candidates` counts how many join rows the
/// winning registration row produced, so callers can report ambiguity.
pub fn first_per_plate(join_rows: &[JoinRow], registrations: &Table, plate_col: usize) -> Vec<Selected> {
    let mut by_plate: HashMap<PlateKey, usize> = HashMap::new();
    let mut selected: Vec<Selected> = Vec::new();

    for jr in join_rows {
        let Some(row) = registrations.row(jr.registration) else {
            continue;
        };
        let Some(key) = PlateKey::of(&row[plate_col]) else {
            continue;
        };

        match by_plate.get(&key) {
            Some(&slot) => {
                let winner = &mut selected[slot];
                if winner.join.registration == jr.registration {
                    winner.candidates += 1;
                }
            }
            None => {
                by_plate.insert(key, selected.len());
                selected.push(Selected { join: *jr, candidates: 1 });
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn plates(values: &[Value]) -> Table {
        Table::new(
            vec!["no_polisi".into()],
            values.iter().map(|v| vec![v.clone()]).collect(),
        )
        .unwrap()
    }

    fn jr(registration: usize, locality: Option<usize>) -> JoinRow {
        JoinRow { registration, locality }
    }

    #[test]
    fn keeps_first_join_row_per_plate() {
        let t = plates(&[Value::text("B1"), Value::text("B2"), Value::text("B1")]);
        let rows = vec![jr(0, Some(3)), jr(0, Some(1)), jr(1, None), jr(2, Some(0))];
        let out = first_per_plate(&rows, &t, 0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].join, jr(0, Some(3)));
        assert_eq!(out[0].candidates, 2);
        assert_eq!(out[1].join, jr(1, None));
        assert_eq!(out[1].candidates, 1);
    }

    #[test]
    fn later_duplicate_rows_do_not_count_as_candidates() {
        let t = plates(&[Value::text("B2"), Value::text("B2")]);
        let rows = vec![jr(0, None), jr(1, Some(0)), jr(1, Some(1))];
        let out = first_per_plate(&rows, &t, 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].join, jr(0, None));
        assert_eq!(out[0].candidates, 1);
    }

    #[test]
    fn null_plates_are_skipped() {
        let t = plates(&[Value::Null, Value::text("B1"), Value::Null]);
        let rows = vec![jr(0, Some(0)), jr(1, None), jr(2, None)];
        let out = first_per_plate(&rows, &t, 0);
        let regs: Vec<usize> = out.iter().map(|s| s.join.registration).collect();
        assert_eq!(regs, vec![1]);
    }

    #[test]
    fn numeric_and_text_plates_stay_distinct() {
        let t = plates(&[Value::Number(7.0), Value::text("7")]);
        let rows = vec![jr(0, None), jr(1, None)];
        assert_eq!(first_per_plate(&rows, &t, 0).len(), 2);
    }
}
