use crate::aggregate::first_per_plate;
use crate::config::ResolveOptions;
use crate::error::ResolveError;
use crate::evidence::compute_summary;
use crate::matcher::join;
use crate::model::{ResolveOutcome, ResolveWarning, Selected, Table, Value};
use crate::schema::plan_columns;

/// Join registrations to localities and keep one row per plate.
///
/// 1. Left-outer join in (registration row, locality row) order.
/// 2. First join row per plate wins; rows with a null plate are left out.
/// 3. Registration columns then locality columns, suffixed on collision;
///    unmatched rows get nulls on the locality side.
///
/// An empty result is reported through [`ResolveWarning::EmptyResult`], not
/// as an error.
pub fn resolve(
    registrations: &Table,
    localities: &Table,
    options: &ResolveOptions,
) -> Result<ResolveOutcome, ResolveError> {
    options.validate()?;
    let schema = plan_columns(registrations, localities, options)?;

    let joined = join(
        registrations,
        schema.address,
        localities,
        schema.locality,
        options.match_mode,
    );
    log::debug!(
        "join ({}): {} registration row(s) x {} locality row(s) -> {} join row(s)",
        options.match_mode,
        registrations.len(),
        localities.len(),
        joined.len()
    );

    let selected = first_per_plate(&joined, registrations, schema.plate);
    let null_plate_rows = registrations
        .rows()
        .iter()
        .filter(|row| row[schema.plate].is_null())
        .count();
    if null_plate_rows > 0 {
        log::debug!("skipped {} registration row(s) with no plate", null_plate_rows);
    }

    let rows = selected
        .iter()
        .map(|s| assemble_row(registrations, localities, s))
        .collect();
    let table = Table::new(schema.columns, rows)?;

    let summary = compute_summary(
        registrations.len(),
        null_plate_rows,
        localities.len(),
        joined.len(),
        &selected,
    );
    if summary.ambiguous_plates > 0 {
        log::debug!(
            "{} plate(s) matched more than one locality; kept the lowest locality row",
            summary.ambiguous_plates
        );
    }

    let mut warnings = Vec::new();
    if table.is_empty() {
        log::info!("resolve produced no rows");
        warnings.push(ResolveWarning::EmptyResult);
    }

    Ok(ResolveOutcome {
        table,
        summary,
        warnings,
    })
}

fn assemble_row(registrations: &Table, localities: &Table, selected: &Selected) -> Vec<Value> {
    let mut row = Vec::with_capacity(registrations.width() + localities.width());
    if let Some(reg) = registrations.row(selected.join.registration) {
        row.extend(reg.iter().cloned());
    }
    match selected.join.locality.and_then(|li| localities.row(li)) {
        Some(loc) => row.extend(loc.iter().cloned()),
        None => row.resize(registrations.width() + localities.width(), Value::Null),
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchMode;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Value::text(*v)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn registrations(rows: &[&[&str]]) -> Table {
        table(&["no_polisi", "full_address", "merk"], rows)
    }

    fn localities(rows: &[&[&str]]) -> Table {
        table(&["kelurahan", "kecamatan"], rows)
    }

    #[test]
    fn first_locality_in_table_order_wins() {
        let r = registrations(&[&["B1", "Jl Mawar, Kel. Melati", "Honda"]]);
        let l = localities(&[&["Melati", "Kec. A"], &["Mawar", "Kec. B"]]);
        let out = resolve(&r, &l, &ResolveOptions::default()).unwrap();

        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.get(0, "kelurahan"), Some(&Value::text("Melati")));
        assert_eq!(out.table.get(0, "kecamatan"), Some(&Value::text("Kec. A")));
        assert_eq!(out.summary.ambiguous_plates, 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn duplicate_plate_keeps_first_row() {
        let r = registrations(&[
            &["B2", "Jl Anggrek", "Honda"],
            &["B2", "Jl Melati", "Yamaha"],
        ]);
        let l = localities(&[&["Melati", "Kec. A"]]);
        let out = resolve(&r, &l, &ResolveOptions::default()).unwrap();

        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.get(0, "merk"), Some(&Value::text("Honda")));
        assert_eq!(out.table.get(0, "kelurahan"), Some(&Value::Null));
        assert_eq!(out.summary.duplicate_rows_dropped, 1);
    }

    #[test]
    fn unmatched_rows_keep_registration_fields() {
        let r = registrations(&[&["B3", "Jl Kenanga", "Suzuki"]]);
        let l = localities(&[&["Melati", "Kec. A"]]);
        let out = resolve(&r, &l, &ResolveOptions::default()).unwrap();

        let row = out.table.row(0).unwrap();
        assert_eq!(
            row,
            &[
                Value::text("B3"),
                Value::text("Jl Kenanga"),
                Value::text("Suzuki"),
                Value::Null,
                Value::Null,
            ]
        );
        assert_eq!(out.summary.unmatched, 1);
    }

    #[test]
    fn rows_without_plate_are_left_out() {
        let r = Table::new(
            vec!["no_polisi".into(), "full_address".into(), "merk".into()],
            vec![
                vec![Value::Null, Value::text("Jl Melati"), Value::Null],
                vec![Value::text("B1"), Value::text("Jl Melati"), Value::text("Honda")],
                vec![Value::Null, Value::Null, Value::Null],
            ],
        )
        .unwrap();
        let l = localities(&[&["Melati", "Kec. A"]]);
        let out = resolve(&r, &l, &ResolveOptions::default()).unwrap();

        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.get(0, "no_polisi"), Some(&Value::text("B1")));
        assert_eq!(out.summary.null_plate_rows, 2);
        assert_eq!(out.summary.duplicate_rows_dropped, 0);
    }

    #[test]
    fn only_null_plates_give_empty_result() {
        let r = Table::new(
            vec!["no_polisi".into(), "full_address".into()],
            vec![vec![Value::Null, Value::text("Jl Melati")]],
        )
        .unwrap();
        let l = localities(&[&["Melati", "Kec. A"]]);
        let out = resolve(&r, &l, &ResolveOptions::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn empty_registrations_warn_instead_of_failing() {
        let r = registrations(&[]);
        let l = localities(&[&["Melati", "Kec. A"]]);
        let out = resolve(&r, &l, &ResolveOptions::default()).unwrap();

        assert!(out.table.is_empty());
        assert_eq!(out.warnings, vec![ResolveWarning::EmptyResult]);
        assert!(out.is_empty());
        assert_eq!(out.table.columns().len(), 5);
    }

    #[test]
    fn exact_mode_ignores_substrings() {
        let r = registrations(&[&["B1", "Kel. Melati", "Honda"], &["B4", "Melati", "Honda"]]);
        let l = localities(&[&["Melati", "Kec. A"]]);
        let options = ResolveOptions {
            match_mode: MatchMode::Exact,
            ..Default::default()
        };
        let out = resolve(&r, &l, &options).unwrap();
        assert_eq!(out.table.get(0, "kelurahan"), Some(&Value::Null));
        assert_eq!(out.table.get(1, "kelurahan"), Some(&Value::text("Melati")));
    }

    #[test]
    fn colliding_columns_are_suffixed() {
        let r = table(&["no_polisi", "full_address", "kode"], &[&["B1", "Melati", "R1"]]);
        let l = table(&["kelurahan", "kode"], &[&["Melati", "L1"]]);
        let out = resolve(&r, &l, &ResolveOptions::default()).unwrap();
        assert_eq!(
            out.table.columns(),
            &["no_polisi", "full_address", "kode_dr", "kelurahan", "kode_mk"]
        );
        assert_eq!(out.table.get(0, "kode_dr"), Some(&Value::text("R1")));
        assert_eq!(out.table.get(0, "kode_mk"), Some(&Value::text("L1")));
    }

    #[test]
    fn missing_address_column_is_schema_error() {
        let r = table(&["no_polisi"], &[&["B1"]]);
        let l = localities(&[]);
        let err = resolve(&r, &l, &ResolveOptions::default()).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let r = registrations(&[]);
        let l = localities(&[]);
        let options = ResolveOptions {
            plate_column: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&r, &l, &options),
            Err(ResolveError::ConfigValidation(_))
        ));
    }
}
