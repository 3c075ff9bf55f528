use std::borrow::Cow;
use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};

use crate::error::ResolveError;

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A single cell. Empty cells are `Null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
    /// Spreadsheet date/time serial (days since 1899-12-30, 1900 date system).
    DateTime(#[serde(serialize_with = "serialize_serial")] f64),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text used when a cell takes part in address/locality comparison.
    /// `None` for nulls.
    pub fn as_match_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) => Some(Cow::Owned(format_number(*n))),
            Self::DateTime(serial) => Some(Cow::Owned(format_serial(*serial))),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => write!(f, "{s}"),
            Self::DateTime(serial) => write!(f, "{}", format_serial(*serial)),
        }
    }
}

/// Integral values print without a decimal point (`12`, not `12.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Convert a 1900-system serial to a calendar date-time.
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// `2024-03-15`, `08:30:00` or `2024-03-15 08:30:00` depending on which
/// parts the serial carries.
pub fn format_serial(serial: f64) -> String {
    let Some(dt) = serial_to_datetime(serial) else {
        return format_number(serial);
    };
    if serial.fract() == 0.0 {
        dt.format("%Y-%m-%d").to_string()
    } else if serial.trunc() == 0.0 {
        dt.format("%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn serialize_serial<S: Serializer>(serial: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_serial(*serial))
}

/// Grouping key for a plate cell. Numbers, dates and text never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlateKey {
    Number(u64),
    Text(String),
    DateTime(u64),
}

impl PlateKey {
    /// `None` for a null plate: such rows carry no plate and are not kept.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            // -0.0 and 0.0 are the same plate
            Value::Number(n) if *n == 0.0 => Some(Self::Number(0.0f64.to_bits())),
            Value::Number(n) => Some(Self::Number(n.to_bits())),
            Value::Text(s) => Some(Self::Text(s.clone())),
            Value::DateTime(serial) => Some(Self::DateTime(serial.to_bits())),
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Ordered column names plus ordered rows, one value per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ResolveError> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ResolveError::DuplicateColumn { column: name.clone() });
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ResolveError::RaggedRow {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Table with a header and no rows.
    pub fn empty(columns: Vec<String>) -> Result<Self, ResolveError> {
        Self::new(columns, Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Cell lookup by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Which input a schema problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Registrations,
    Localities,
}

impl std::fmt::Display for TableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registrations => write!(f, "registrations"),
            Self::Localities => write!(f, "localities"),
        }
    }
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// One row of the left-outer join: a registration row index and the index of
/// the locality it matched, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRow {
    pub registration: usize,
    pub locality: Option<usize>,
}

/// The representative join row chosen for one plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selected {
    pub join: JoinRow,
    /// Join rows the selected registration row produced (1 when unmatched).
    pub candidates: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveWarning {
    /// Resolve produced zero rows. Informational, not a failure.
    EmptyResult,
}

impl std::fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResult => write!(f, "result is empty"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveSummary {
    pub registration_rows: usize,
    pub locality_rows: usize,
    /// Registration rows with a null plate, left out of the result.
    pub null_plate_rows: usize,
    pub join_rows: usize,
    pub output_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub duplicate_rows_dropped: usize,
    pub ambiguous_plates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveOutcome {
    pub table: Table,
    pub summary: ResolveSummary,
    pub warnings: Vec<ResolveWarning>,
}

impl ResolveOutcome {
    pub fn is_empty(&self) -> bool {
        self.warnings.contains(&ResolveWarning::EmptyResult)
    }
}
