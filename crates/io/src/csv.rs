// CSV/TSV import/export

use std::borrow::Cow;

use regmatch_recon::model::format_number;
use regmatch_recon::{Table, Value};

use crate::{normalize_headers, ExportError, LoadError};

pub fn import_bytes(bytes: &[u8]) -> Result<Table, LoadError> {
    let content = decode_utf8(bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = sniff_delimiter(content);
    import_from_str(content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header's field count, weighted by that count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Decode as UTF-8, falling back to Windows-1252 (common for Excel-exported CSVs)
fn decode_utf8(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded
        }
    }
}

fn import_from_str(content: &str, delimiter: u8) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| LoadError::Csv(e.to_string()))?,
        None => return Err(LoadError::Empty),
    };
    let columns = normalize_headers(header.iter().map(str::to_string).collect());
    let width = columns.len();

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| LoadError::Csv(e.to_string()))?;
        if record.len() > width {
            return Err(LoadError::Csv(format!(
                "line {}: expected {} field(s), found {}",
                idx + 2,
                width,
                record.len()
            )));
        }
        // Short rows are padded with nulls
        let row = (0..width)
            .map(|i| record.get(i).map(parse_field).unwrap_or(Value::Null))
            .collect();
        rows.push(row);
    }

    Ok(Table::new(columns, rows)?)
}

/// Empty fields are null; text that reads back identically as a number is a
/// number; everything else stays text.
///
/// `0123`, `1.50` and `+5` stay text so leading zeros and formatting survive.
pub fn parse_field(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    match canonical_number(field) {
        Some(n) => Value::Number(n),
        None => Value::Text(field.to_string()),
    }
}

fn canonical_number(field: &str) -> Option<f64> {
    if !field.bytes().all(|b| b.is_ascii_digit() || b == b'-' || b == b'.') {
        return None;
    }
    let n: f64 = field.parse().ok()?;
    if format_number(n) == field {
        Some(n)
    } else {
        None
    }
}

pub fn export_bytes(table: &Table) -> Result<Vec<u8>, ExportError> {
    export_with_delimiter(table, b',')
}

pub fn export_with_delimiter(table: &Table, delimiter: u8) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}
