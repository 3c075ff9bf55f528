// File I/O: uploaded CSV / Excel bytes in, .xlsx bytes out

pub mod csv;
pub mod xlsx;

use std::collections::HashSet;
use std::path::Path;

use regmatch_recon::{ResolveError, Table};
use thiserror::Error;

/// Suggested download name for the resolved table.
pub const DEFAULT_OUTPUT_FILE: &str = "hasil_proses_data.xlsx";

/// Name of the single sheet in the exported workbook.
pub const DEFAULT_SHEET_NAME: &str = "Hasil Proses";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    /// Neither CSV nor a spreadsheet format applies.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("CSV parse error: {0}")]
    Csv(String),
    #[error("Excel read error: {0}")]
    Workbook(String),
    /// No header row.
    #[error("file is empty")]
    Empty,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Table(#[from] ResolveError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write XLSX: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Delimited text (comma, semicolon, tab or pipe).
    Csv,
    /// Excel / OpenDocument workbook (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
}

impl Format {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            "" => Err(LoadError::UnsupportedFormat(format!(
                "{}: no file extension",
                path.display()
            ))),
            other => Err(LoadError::UnsupportedFormat(format!(".{other} (expected CSV or Excel)"))),
        }
    }

    /// Infer the format from content. Workbooks are ZIP (xlsx, ods) or OLE2
    /// (xls) containers; anything else must at least look like text.
    pub fn sniff(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            return Ok(Self::Workbook);
        }
        let sample = &bytes[..bytes.len().min(4096)];
        if sample.contains(&0) {
            return Err(LoadError::UnsupportedFormat("unrecognized binary content".into()));
        }
        Ok(Self::Csv)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load_bytes(bytes: &[u8], format: Format) -> Result<Table, LoadError> {
    match format {
        Format::Csv => csv::import_bytes(bytes),
        Format::Workbook => xlsx::import_bytes(bytes),
    }
}

/// Load a file, trusting a known extension and sniffing content otherwise.
pub fn load_path(path: &Path) -> Result<Table, LoadError> {
    let bytes = std::fs::read(path)?;
    let format = match Format::from_path(path) {
        Ok(format) => format,
        Err(e) => {
            let sniffed = Format::sniff(&bytes).map_err(|_| e)?;
            log::debug!("{}: sniffed format {:?}", path.display(), sniffed);
            sniffed
        }
    };
    let table = load_bytes(&bytes, format)?;
    log::debug!(
        "{}: loaded {} row(s) x {} column(s)",
        path.display(),
        table.len(),
        table.width()
    );
    Ok(table)
}

/// Make header names usable as unique column names.
///
/// Blank names become `Unnamed: <index>`; repeats get `.1`, `.2`, ... appended.
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.CSV")).unwrap(), Format::Csv);
        assert_eq!(Format::from_path(Path::new("a.xlsx")).unwrap(), Format::Workbook);
        assert_eq!(Format::from_path(Path::new("a.ods")).unwrap(), Format::Workbook);
        assert!(matches!(
            Format::from_path(Path::new("a.pdf")),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(Format::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn sniff_content() {
        assert_eq!(Format::sniff(b"PK\x03\x04rest").unwrap(), Format::Workbook);
        assert_eq!(Format::sniff(OLE_MAGIC).unwrap(), Format::Workbook);
        assert_eq!(Format::sniff(b"a,b\n1,2\n").unwrap(), Format::Csv);
        assert!(matches!(
            Format::sniff(b"\x89PNG\r\n\x1a\n\0\0\0"),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn headers_blank_and_repeated() {
        assert_eq!(
            normalize_headers(names(&["a", "", "a", "a", " "])),
            names(&["a", "Unnamed: 1", "a.1", "a.2", "Unnamed: 4"])
        );
    }

    #[test]
    fn load_path_sniffs_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload.dat");
        fs::write(&path, "no_polisi,full_address\nB1,Jl Mawar\n").unwrap();

        let table = load_path(&path).unwrap();
        assert_eq!(table.columns(), &["no_polisi", "full_address"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn load_path_rejects_binary_with_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();

        let err = load_path(&path).unwrap_err();
        match err {
            LoadError::UnsupportedFormat(msg) => assert!(msg.contains(".png")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_path_missing_file_is_io_error() {
        let err = load_path(Path::new("/nonexistent/dataregis.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
