//! Fieldmark Core: shared errors, configuration, and utilities.
//!
//! This crate provides the foundational types used across all Fieldmark
//! crates. It has no internal Fieldmark dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy, `Violation`, and the `Result` alias
//! - [`config`]: Search service connection settings
//! - [`util`]: Naming and identifier helpers

pub mod config;
pub mod error;
pub mod util;

// Re-export key types at crate root for convenience
pub use config::{BackendConfig, Config};
pub use error::{Error, Result, Violation};

// Convenience re-exports from util
pub use util::ids::{escape_filter_value, id_filter, requires_url_encoding, schema_name_for_type};
