//! Backend integration tests
//!
//! `conformance` holds checks every backend must pass; the per-backend modules run
//! them against a concrete backend and add backend-specific tests.

#[cfg(feature = "sqlite")]
mod sqlite;
