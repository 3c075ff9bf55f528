//! `regmatch-recon`: registration to locality match-join-deduplicate engine.
//!
//! Pure engine crate: receives two pre-loaded tables, returns one resolved
//! row per plate. No CLI or IO dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod schema;

pub use config::{MatchMode, ResolveOptions, Suffixes};
pub use engine::resolve;
pub use error::ResolveError;
pub use model::{ResolveOutcome, ResolveSummary, ResolveWarning, Table, TableRole, Value};
