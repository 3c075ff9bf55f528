// regmatch CLI - match vehicle registrations to localities, one row per plate

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use regmatch_io::{LoadError, DEFAULT_OUTPUT_FILE, DEFAULT_SHEET_NAME};
use regmatch_recon::{MatchMode, ResolveError, TableRole};

use exit_codes::{EXIT_CONFIG, EXIT_EXPORT, EXIT_FORMAT, EXIT_IO, EXIT_SCHEMA, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "regmatch")]
#[command(about = "Match vehicle registrations to localities, one row per plate")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the column names of a CSV or Excel file
    #[command(after_help = "\
Examples:
  regmatch columns dataregis.csv
  regmatch columns masterkel.xlsx --json")]
    Columns {
        /// CSV or Excel file
        file: PathBuf,

        /// Output a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Join registrations to localities and write one row per plate
    #[command(after_help = "\
Examples:
  regmatch run dataregis.csv masterkel.xlsx
  regmatch run dataregis.xlsx masterkel.xlsx --output hasil.xlsx
  regmatch run dataregis.csv masterkel.csv --match-mode exact --json
  regmatch run dataregis.csv masterkel.csv --config regmatch.toml")]
    Run {
        /// Registration table (CSV or Excel)
        registrations: PathBuf,

        /// Locality master table (CSV or Excel)
        localities: PathBuf,

        /// Output file (.xlsx, or .csv)
        #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,

        /// TOML options file (column names, match mode, suffixes)
        #[arg(long)]
        config: Option<PathBuf>,

        /// How locality names are tested against addresses
        #[arg(long, value_enum)]
        match_mode: Option<MatchModeArg>,

        /// Registration column holding the plate
        #[arg(long)]
        plate_column: Option<String>,

        /// Registration column holding the address
        #[arg(long)]
        address_column: Option<String>,

        /// Locality column holding the locality name
        #[arg(long)]
        locality_column: Option<String>,

        /// Sheet name in the exported workbook
        #[arg(long, default_value = DEFAULT_SHEET_NAME)]
        sheet_name: String,

        /// Rows shown in the human-readable preview
        #[arg(long, default_value_t = 10)]
        preview: usize,

        /// Output a single JSON document to stdout
        #[arg(long)]
        json: bool,

        /// Suppress the preview and column listing
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MatchModeArg {
    /// Address contains the locality name
    Contains,
    /// Address equals the locality name
    Exact,
}

impl From<MatchModeArg> for MatchMode {
    fn from(arg: MatchModeArg) -> Self {
        match arg {
            MatchModeArg::Contains => MatchMode::Contains,
            MatchModeArg::Exact => MatchMode::Exact,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  regmatch-recon ", env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: regmatch <command> [options]");
            eprintln!("       regmatch --help for more information");
            Ok(())
        }
        Some(Commands::Columns { file, json }) => run::cmd_columns(file, json),
        Some(Commands::Run {
            registrations,
            localities,
            output,
            config,
            match_mode,
            plate_column,
            address_column,
            locality_column,
            sheet_name,
            preview,
            json,
            quiet,
        }) => run::cmd_run(run::RunArgs {
            registrations,
            localities,
            output,
            config,
            match_mode: match_mode.map(MatchMode::from),
            plate_column,
            address_column,
            locality_column,
            sheet_name,
            preview,
            json,
            quiet,
        }),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self { code: EXIT_EXPORT, message: msg.into(), hint: None }
    }

    /// Loader failure for `path`, passed through with its own message.
    pub fn load(path: &std::path::Path, err: LoadError) -> Self {
        let message = format!("{}: {}", path.display(), err);
        match err {
            LoadError::Io(_) => Self::io(message),
            LoadError::Table(_) => Self { code: EXIT_SCHEMA, message, hint: None },
            LoadError::UnsupportedFormat(_) => Self { code: EXIT_FORMAT, message, hint: None }
                .with_hint("upload a CSV or Excel (.xlsx) file"),
            LoadError::Csv(_) | LoadError::Workbook(_) | LoadError::Empty => {
                Self { code: EXIT_FORMAT, message, hint: None }
            }
        }
    }

    /// Resolve failure. `columns` lists what each input actually has, for the hint.
    pub fn resolve(err: ResolveError, registration_columns: &[String], locality_columns: &[String]) -> Self {
        let message = err.to_string();
        match &err {
            ResolveError::MissingColumn { table, .. } => {
                let (available, flag) = match table {
                    TableRole::Registrations => (registration_columns, "--plate-column / --address-column"),
                    TableRole::Localities => (locality_columns, "--locality-column"),
                };
                Self { code: EXIT_SCHEMA, message, hint: None }.with_hint(format!(
                    "available columns: {}; pick others with {}",
                    available.join(", "),
                    flag
                ))
            }
            ResolveError::ColumnCollision { .. } => Self { code: EXIT_SCHEMA, message, hint: None }
                .with_hint("choose different [suffixes] in the config file"),
            ResolveError::ConfigParse(_) | ResolveError::ConfigValidation(_) => {
                Self { code: EXIT_CONFIG, message, hint: None }
            }
            _ if err.is_schema_error() => Self { code: EXIT_SCHEMA, message, hint: None },
            _ => Self { code: exit_codes::EXIT_ERROR, message, hint: None },
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
