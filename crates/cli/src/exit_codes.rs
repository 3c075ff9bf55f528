//! CLI Exit Code Registry
//!
//! Single source of truth for `regmatch` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (including an empty result)                  |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments)                          |
//! | 3    | IO error (cannot read input / write output)          |
//! | 4    | Format error (input is neither CSV nor a workbook)   |
//! | 5    | Schema error (required column missing, collisions)   |
//! | 6    | Config error (bad options file)                      |
//! | 7    | Export error (encoder rejected the table)            |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unsupported output extension.
pub const EXIT_USAGE: u8 = 2;

/// Input file unreadable or output file unwritable.
pub const EXIT_IO: u8 = 3;

/// Input could not be parsed as CSV or as a workbook.
pub const EXIT_FORMAT: u8 = 4;

/// A required column is missing, or merged column names collide.
pub const EXIT_SCHEMA: u8 = 5;

/// Options file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 6;

/// Encoding the result failed.
pub const EXIT_EXPORT: u8 = 7;
