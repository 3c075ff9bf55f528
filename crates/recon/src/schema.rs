use std::collections::HashSet;

use crate::config::ResolveOptions;
use crate::error::ResolveError;
use crate::model::{Table, TableRole};

/// Output header plus the positions of the key columns in each input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    /// Registration columns first, then locality columns.
    pub columns: Vec<String>,
    pub plate: usize,
    pub address: usize,
    pub locality: usize,
}

/// Locate the key columns and build the merged, collision-free header.
pub fn plan_columns(
    registrations: &Table,
    localities: &Table,
    options: &ResolveOptions,
) -> Result<OutputSchema, ResolveError> {
    let plate = require(registrations, TableRole::Registrations, &options.plate_column)?;
    let address = require(registrations, TableRole::Registrations, &options.address_column)?;
    let locality = require(localities, TableRole::Localities, &options.locality_column)?;

    let left: HashSet<&str> = registrations.columns().iter().map(String::as_str).collect();
    let right: HashSet<&str> = localities.columns().iter().map(String::as_str).collect();

    let mut columns = Vec::with_capacity(registrations.width() + localities.width());
    for name in registrations.columns() {
        if right.contains(name.as_str()) {
            columns.push(format!("{name}{}", options.suffixes.registration));
        } else {
            columns.push(name.clone());
        }
    }
    for name in localities.columns() {
        if left.contains(name.as_str()) {
            columns.push(format!("{name}{}", options.suffixes.locality));
        } else {
            columns.push(name.clone());
        }
    }

    // e.g. "id" in both tables plus a literal "id_dr" on the left
    let mut seen = HashSet::new();
    for name in &columns {
        if !seen.insert(name.as_str()) {
            return Err(ResolveError::ColumnCollision { column: name.clone() });
        }
    }

    Ok(OutputSchema {
        columns,
        plate,
        address,
        locality,
    })
}

fn require(table: &Table, role: TableRole, column: &str) -> Result<usize, ResolveError> {
    table.column_index(column).ok_or_else(|| ResolveError::MissingColumn {
        table: role,
        column: column.to_string(),
    })
}
