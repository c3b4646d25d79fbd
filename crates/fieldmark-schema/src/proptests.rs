//! Property-based tests for schema compilation.
