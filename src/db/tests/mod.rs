//! Shared repository test infrastructure
//!
//! The same test logic runs against every store backend:
//!
//! - **Memory and SQLite**: Fast, in-process tests that run with every `cargo test`
//! - **PostgreSQL**: Slower tests using testcontainers, run with `cargo test -- --ignored`
//!
//! # Architecture
//!
//! `housekeeping.rs` holds shared test functions that take a context of
//! `&dyn HousekeepingMetadataRepo`, `&dyn HousekeepingPathRepo` and a
//! [`harness::RecordSeeder`], plus one macro per backend that wires them up.
//!
//! # Running tests
//!
//! ```bash
//! cargo test                       # Run memory and SQLite tests only
//! cargo test -- --ignored          # Run PostgreSQL integration tests (requires Docker)
//! cargo test -- --include-ignored  # Run all tests
//! ```
