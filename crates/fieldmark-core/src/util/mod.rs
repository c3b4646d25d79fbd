//! Utility modules.
//!
//! - [`ids`]: Schema naming, filter escaping, and document ID checks

pub mod ids;
