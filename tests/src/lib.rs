//! Shared harness for warehouse integration tests.
//!
//! Requires Docker for testcontainers, or `SONGPLAY_TEST_DATABASE_URL`
//! pointing at an existing Postgres server.

pub mod fixtures;
