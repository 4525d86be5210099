//! Query-set configuration files.
//!
//! A query set names a grammar and a list of patterns, optionally each
//! restricted to a point range. Files are TOML.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{CompiledQuery, QueryDefinition, QuerySet, ValidationError, ValidationIssue};
