// Excel import (calamine) and single-sheet XLSX export (rust_xlsxwriter)

use std::io::Cursor;
use std::time::Instant;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use regmatch_recon::model::{format_number, format_serial};
use regmatch_recon::{Table, Value};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use crate::{normalize_headers, ExportError, LoadError};

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import the first sheet of a workbook (xlsx, xlsm, xlsb, xls, ods).
///
/// The first row of the used range is the header.
pub fn import_bytes(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| LoadError::Workbook(format!("Failed to open Excel file: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::Workbook("Excel file contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::Workbook(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

    let mut rows_iter = range.rows();
    let header = rows_iter.next().ok_or(LoadError::Empty)?;
    let columns = normalize_headers(header.iter().map(header_text).collect());
    let width = columns.len();

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|row| {
            (0..width)
                .map(|i| row.get(i).map(cell_value).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    log::debug!("sheet '{}': {} row(s) x {} column(s)", sheet_name, rows.len(), width);
    Ok(Table::new(columns, rows)?)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::text(if *b { "TRUE" } else { "FALSE" }),
        // Durations have no calendar meaning; keep the raw serial
        Data::DateTime(dt) if dt.is_duration() => Value::Number(dt.as_f64()),
        Data::DateTime(dt) => Value::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// A large number that was exported as text to preserve precision
#[derive(Debug, Clone)]
pub struct PrecisionWarning {
    /// Cell address (e.g., "B5")
    pub address: String,
    /// The number as written
    pub value: String,
}

/// Result of an Excel export operation
#[derive(Debug, Default)]
pub struct ExportResult {
    /// The encoded workbook
    pub bytes: Vec<u8>,
    /// Data rows written (header excluded)
    pub rows_exported: usize,
    /// Non-blank cells written, header included
    pub cells_exported: usize,
    /// Numbers exported as text due to precision limits (>15 digits)
    pub precision_warnings: Vec<PrecisionWarning>,
    /// Export duration in milliseconds
    pub export_duration_ms: u128,
}

impl ExportResult {
    /// Returns a summary message suitable for display
    pub fn summary(&self) -> String {
        format!(
            "{} row{}, {} cells",
            self.rows_exported,
            if self.rows_exported == 1 { "" } else { "s" },
            self.cells_exported
        )
    }

    /// Returns a single-line warning, if any
    pub fn warning_summary(&self) -> Option<String> {
        if self.precision_warnings.is_empty() {
            None
        } else {
            Some(format!("{} numbers as text", self.precision_warnings.len()))
        }
    }
}

/// Check if a number exceeds Excel's safe precision (15 significant digits)
/// Returns true if the integer part has more than 15 digits
fn exceeds_excel_precision(n: f64) -> bool {
    if !n.is_finite() {
        return false;
    }
    n.trunc().abs() >= 1e15
}

/// Number format for a date serial, matching the parts it carries.
fn date_format(serial: f64) -> Format {
    let pattern = if serial.fract() == 0.0 {
        "yyyy-mm-dd"
    } else if serial.trunc() == 0.0 {
        "hh:mm:ss"
    } else {
        "yyyy-mm-dd hh:mm:ss"
    };
    Format::new().set_num_format(pattern)
}

/// Encode a table as a workbook with one named sheet: a bold header row in
/// column order, then one row per table row. No index column. Nulls are left
/// blank; date serials get a date number format.
///
/// A row whose cells are all null writes no cells, so a reader sees it only
/// if a later row has data. Resolved tables never contain one: every row
/// carries its plate.
pub fn export_bytes(table: &Table, sheet_name: &str) -> Result<ExportResult, ExportError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();

    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header_format = Format::new().set_bold();
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
        result.cells_exported += 1;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col16 = col as u16;
            match value {
                Value::Null => continue,
                Value::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                Value::Number(n) if !n.is_finite() => continue,
                Value::Number(n) if exceeds_excel_precision(*n) => {
                    let text_value = format_number(*n);
                    worksheet.write_string(row32, col16, &text_value)?;
                    result.precision_warnings.push(PrecisionWarning {
                        address: cell_address(row_idx + 1, col),
                        value: text_value,
                    });
                }
                Value::Number(n) => {
                    worksheet.write_number(row32, col16, *n)?;
                }
                Value::DateTime(serial) if !serial.is_finite() => continue,
                Value::DateTime(serial) => {
                    worksheet.write_number_with_format(row32, col16, *serial, &date_format(*serial))?;
                }
            }
            result.cells_exported += 1;
        }
        result.rows_exported += 1;
    }

    worksheet.autofit();

    result.bytes = xlsx_workbook.save_to_buffer()?;
    result.export_duration_ms = start_time.elapsed().as_millis();
    Ok(result)
}

/// Convert column index to Excel column letter (0 = A, 25 = Z, 26 = AA, etc.)
fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert row/col to Excel cell address (e.g., "A1", "B5", "AA100")
fn cell_address(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}
