//! `regmatch columns` and `regmatch run`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use regmatch_io::{csv, load_path, xlsx, XLSX_MIME};
use regmatch_recon::{resolve, MatchMode, ResolveOptions, ResolveOutcome, Table, Value};
use serde_json::json;
use unicode_width::UnicodeWidthStr;

use crate::CliError;

/// Preview cells wider than this are cut with an ellipsis.
const MAX_PREVIEW_WIDTH: usize = 30;

pub struct RunArgs {
    pub registrations: PathBuf,
    pub localities: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub match_mode: Option<MatchMode>,
    pub plate_column: Option<String>,
    pub address_column: Option<String>,
    pub locality_column: Option<String>,
    pub sheet_name: String,
    pub preview: usize,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Result<Self, CliError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            _ => Err(CliError::args(format!(
                "unsupported output file {}",
                path.display()
            ))
            .with_hint("use a .xlsx or .csv file name")),
        }
    }

    fn mime(self) -> &'static str {
        match self {
            Self::Xlsx => XLSX_MIME,
            Self::Csv => "text/csv",
        }
    }
}

// ============================================================================
// columns
// ============================================================================

pub fn cmd_columns(file: PathBuf, json_output: bool) -> Result<(), CliError> {
    let table = load_path(&file).map_err(|e| CliError::load(&file, e))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json_output {
        let doc = serde_json::to_string(table.columns()).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{}", doc).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        for name in table.columns() {
            writeln!(out, "{}", name).map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    Ok(())
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let options = build_options(&args)?;
    let output_format = OutputFormat::from_path(&args.output)?;

    let registrations = load_path(&args.registrations).map_err(|e| CliError::load(&args.registrations, e))?;
    let localities = load_path(&args.localities).map_err(|e| CliError::load(&args.localities, e))?;

    let human = !args.json && !args.quiet;
    if human {
        println!("Registration columns: {}", registrations.columns().join(", "));
        println!("Locality columns:     {}", localities.columns().join(", "));
        println!();
    }

    let outcome = resolve(&registrations, &localities, &options)
        .map_err(|e| CliError::resolve(e, registrations.columns(), localities.columns()))?;

    if outcome.is_empty() {
        let stale = args.output.exists();
        log::info!("empty result; {} not written", args.output.display());
        if stale {
            log::warn!("{} is from an earlier run and was left unchanged", args.output.display());
        }
        if args.json {
            print_json(&outcome, &options, None)?;
        } else if stale {
            println!(
                "Result is empty; no file written. {} is from an earlier run and was left unchanged.",
                args.output.display()
            );
        } else {
            println!("Result is empty; no file written.");
        }
        return Ok(());
    }

    let bytes = encode(&outcome.table, output_format, &args.sheet_name)?;
    std::fs::write(&args.output, &bytes)
        .map_err(|e| CliError::io(format!("{}: {}", args.output.display(), e)))?;
    log::debug!(
        "wrote {} ({} bytes, {})",
        args.output.display(),
        bytes.len(),
        output_format.mime()
    );

    if args.json {
        print_json(&outcome, &options, Some(args.output.as_path()))?;
    } else {
        print_summary(&outcome, &options, &args.output);
        if !args.quiet && args.preview > 0 {
            println!();
            print_preview(&outcome.table, args.preview);
        }
    }

    Ok(())
}

/// Defaults, then the config file, then individual flags.
fn build_options(args: &RunArgs) -> Result<ResolveOptions, CliError> {
    let mut options = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
            ResolveOptions::from_toml(&text).map_err(|e| CliError::resolve(e, &[], &[]))?
        }
        None => ResolveOptions::default(),
    };

    if let Some(mode) = args.match_mode {
        options.match_mode = mode;
    }
    if let Some(name) = &args.plate_column {
        options.plate_column = name.clone();
    }
    if let Some(name) = &args.address_column {
        options.address_column = name.clone();
    }
    if let Some(name) = &args.locality_column {
        options.locality_column = name.clone();
    }

    options.validate().map_err(|e| CliError::resolve(e, &[], &[]))?;
    Ok(options)
}

fn encode(table: &Table, format: OutputFormat, sheet_name: &str) -> Result<Vec<u8>, CliError> {
    match format {
        OutputFormat::Csv => csv::export_bytes(table).map_err(|e| CliError::export(e.to_string())),
        OutputFormat::Xlsx => {
            let result = xlsx::export_bytes(table, sheet_name).map_err(|e| CliError::export(e.to_string()))?;
            if let Some(warning) = result.warning_summary() {
                log::warn!("{}", warning);
            }
            log::debug!("xlsx export: {} in {} ms", result.summary(), result.export_duration_ms);
            Ok(result.bytes)
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn print_json(outcome: &ResolveOutcome, options: &ResolveOptions, output: Option<&Path>) -> Result<(), CliError> {
    let columns = outcome.table.columns();
    let rows: Vec<serde_json::Value> = outcome
        .table
        .rows()
        .iter()
        .map(|row| {
            let obj: serde_json::Map<String, serde_json::Value> = columns
                .iter()
                .zip(row)
                .map(|(name, value)| (name.clone(), json_value(value)))
                .collect();
            serde_json::Value::Object(obj)
        })
        .collect();

    let warnings: Vec<String> = outcome.warnings.iter().map(|w| w.to_string()).collect();

    let doc = json!({
        "match_mode": options.match_mode.to_string(),
        "output": output.map(|p| p.display().to_string()),
        "summary": outcome.summary,
        "warnings": warnings,
        "columns": columns,
        "rows": rows,
    });

    let text = serde_json::to_string_pretty(&doc).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn json_value(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn print_summary(outcome: &ResolveOutcome, options: &ResolveOptions, output: &Path) {
    let s = &outcome.summary;
    println!("Match mode:       {}", options.match_mode);
    println!("Registrations:    {} row(s)", s.registration_rows);
    println!("Localities:       {} row(s)", s.locality_rows);
    println!("Plates:           {} ({} matched, {} unmatched)", s.output_rows, s.matched, s.unmatched);
    if s.null_plate_rows > 0 {
        println!("No plate:         {} row(s) skipped", s.null_plate_rows);
    }
    if s.duplicate_rows_dropped > 0 {
        println!("Duplicates:       {} row(s) dropped", s.duplicate_rows_dropped);
    }
    if s.ambiguous_plates > 0 {
        println!("Ambiguous:        {} plate(s) matched several localities", s.ambiguous_plates);
    }
    println!("Written:          {}", output.display());
}

fn print_preview(table: &Table, limit: usize) {
    let shown = table.len().min(limit);
    let cells: Vec<Vec<String>> = table.rows()[..shown]
        .iter()
        .map(|row| row.iter().map(|v| truncate_to_width(&v.to_string(), MAX_PREVIEW_WIDTH)).collect())
        .collect();
    let header: Vec<String> = table
        .columns()
        .iter()
        .map(|c| truncate_to_width(c, MAX_PREVIEW_WIDTH))
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    println!("{}", pad_row(&header, &widths));
    for row in &cells {
        println!("{}", pad_row(row, &widths));
    }
    if table.len() > shown {
        println!("... {} more row(s)", table.len() - shown);
    }
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{}{}", cell, " ".repeat(w.saturating_sub(cell.width()))))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate_to_width("Melati", 30), "Melati");
        let cut = truncate_to_width("Jl Mawar No. 3, Kel. Melati, Kec. Tebet", 10);
        assert_eq!(cut, "Jl Mawar …");
        assert_eq!(cut.width(), 10);
    }

    #[test]
    fn pad_row_aligns_columns() {
        let row = vec!["B1".to_string(), "Melati".to_string()];
        assert_eq!(pad_row(&row, &[4, 8]), "B1    Melati");
    }

    #[test]
    fn output_format_by_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("hasil.XLSX")).unwrap(), OutputFormat::Xlsx);
        assert_eq!(OutputFormat::from_path(Path::new("hasil.csv")).unwrap(), OutputFormat::Csv);
        let err = OutputFormat::from_path(Path::new("hasil.pdf")).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }
}
