use std::borrow::Cow;
use std::collections::HashMap;

use crate::config::MatchMode;
use crate::model::{JoinRow, Table};

/// Left-outer join of registrations against localities.
///
/// Enumeration order is fixed: registration rows in input order, and for each
/// registration the matching localities in input order. A registration with
/// no match yields one row with `locality: None`.
pub fn join(
    registrations: &Table,
    address_col: usize,
    localities: &Table,
    locality_col: usize,
    mode: MatchMode,
) -> Vec<JoinRow> {
    match mode {
        MatchMode::Contains => join_contains(registrations, address_col, localities, locality_col),
        MatchMode::Exact => join_exact(registrations, address_col, localities, locality_col),
    }
}

/// Non-null, non-empty locality names with their row index.
fn locality_names(localities: &Table, locality_col: usize) -> Vec<(usize, Cow<'_, str>)> {
    localities
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let name = row[locality_col].as_match_text()?;
            if name.is_empty() {
                None
            } else {
                Some((i, name))
            }
        })
        .collect()
}

fn join_contains(
    registrations: &Table,
    address_col: usize,
    localities: &Table,
    locality_col: usize,
) -> Vec<JoinRow> {
    let names = locality_names(localities, locality_col);
    let mut out = Vec::with_capacity(registrations.len());

    for (ri, row) in registrations.rows().iter().enumerate() {
        let before = out.len();
        if let Some(address) = row[address_col].as_match_text() {
            for (li, name) in &names {
                if address.contains(&**name) {
                    out.push(JoinRow { registration: ri, locality: Some(*li) });
                }
            }
        }
        if out.len() == before {
            out.push(JoinRow { registration: ri, locality: None });
        }
    }

    out
}

fn join_exact(
    registrations: &Table,
    address_col: usize,
    localities: &Table,
    locality_col: usize,
) -> Vec<JoinRow> {
    // Hash join; index lists stay in locality row order.
    let mut index: HashMap<Cow<'_, str>, Vec<usize>> = HashMap::new();
    for (li, name) in locality_names(localities, locality_col) {
        index.entry(name).or_default().push(li);
    }

    let mut out = Vec::with_capacity(registrations.len());
    for (ri, row) in registrations.rows().iter().enumerate() {
        let hits = row[address_col]
            .as_match_text()
            .and_then(|address| index.get(&*address));
        match hits {
            Some(hits) => {
                out.extend(hits.iter().map(|li| JoinRow { registration: ri, locality: Some(*li) }))
            }
            None => out.push(JoinRow { registration: ri, locality: None }),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn regs(addresses: &[Option<&str>]) -> Table {
        let rows = addresses
            .iter()
            .map(|a| vec![a.map(Value::text).unwrap_or(Value::Null)])
            .collect();
        Table::new(vec!["full_address".into()], rows).unwrap()
    }

    fn locs(names: &[Option<&str>]) -> Table {
        let rows = names
            .iter()
            .map(|n| vec![n.map(Value::text).unwrap_or(Value::Null)])
            .collect();
        Table::new(vec!["kelurahan".into()], rows).unwrap()
    }

    fn pairs(rows: &[JoinRow]) -> Vec<(usize, Option<usize>)> {
        rows.iter().map(|r| (r.registration, r.locality)).collect()
    }

    #[test]
    fn contains_enumerates_in_locality_order() {
        let r = regs(&[Some("Jl Mawar, Kel. Melati")]);
        let l = locs(&[Some("Melati"), Some("Mawar"), Some("Anggrek")]);
        let out = join(&r, 0, &l, 0, MatchMode::Contains);
        assert_eq!(pairs(&out), vec![(0, Some(0)), (0, Some(1))]);
    }

    #[test]
    fn contains_is_directional() {
        // locality contains address must not match
        let r = regs(&[Some("Mawar")]);
        let l = locs(&[Some("Kel. Mawar Indah")]);
        let out = join(&r, 0, &l, 0, MatchMode::Contains);
        assert_eq!(pairs(&out), vec![(0, None)]);
    }

    #[test]
    fn contains_is_case_sensitive() {
        let r = regs(&[Some("jl mawar")]);
        let l = locs(&[Some("Mawar")]);
        let out = join(&r, 0, &l, 0, MatchMode::Contains);
        assert_eq!(pairs(&out), vec![(0, None)]);
    }

    #[test]
    fn empty_and_null_localities_never_match() {
        let r = regs(&[Some("Jl Mawar")]);
        let l = locs(&[None, Some("")]);
        let out = join(&r, 0, &l, 0, MatchMode::Contains);
        assert_eq!(pairs(&out), vec![(0, None)]);
    }

    #[test]
    fn null_address_is_unmatched() {
        let r = regs(&[None, Some("Melati")]);
        let l = locs(&[Some("Melati")]);
        let out = join(&r, 0, &l, 0, MatchMode::Contains);
        assert_eq!(pairs(&out), vec![(0, None), (1, Some(0))]);
    }

    #[test]
    fn exact_requires_equality() {
        let r = regs(&[Some("Melati"), Some("Kel. Melati"), Some("Mawar")]);
        let l = locs(&[Some("Melati"), Some("Mawar"), Some("Melati")]);
        let out = join(&r, 0, &l, 0, MatchMode::Exact);
        assert_eq!(
            pairs(&out),
            vec![(0, Some(0)), (0, Some(2)), (1, None), (2, Some(1))]
        );
    }

    #[test]
    fn numeric_cells_compare_by_display_text() {
        let r = Table::new(vec!["a".into()], vec![vec![Value::text("RT 12 RW 3")]]).unwrap();
        let l = Table::new(vec!["k".into()], vec![vec![Value::Number(12.0)]]).unwrap();
        let out = join(&r, 0, &l, 0, MatchMode::Contains);
        assert_eq!(pairs(&out), vec![(0, Some(0))]);
    }

    #[test]
    fn empty_registrations_yield_nothing() {
        let r = regs(&[]);
        let l = locs(&[Some("Melati")]);
        assert!(join(&r, 0, &l, 0, MatchMode::Contains).is_empty());
        assert!(join(&r, 0, &l, 0, MatchMode::Exact).is_empty());
    }
}
