//! Shared store repository test infrastructure
//!
//! The same test logic runs against every backend. Each repository has a test
//! module containing:
//!
//! - Shared test functions that take a [`DbPool`](crate::db::DbPool)
//! - A memory-backed module that runs every shared test
//! - A SQLite-backed module using in-memory databases and real migrations

pub mod harness;
