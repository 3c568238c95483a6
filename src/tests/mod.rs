//! Integration and unit tests for the favorites service.
//!
//! - **support**: mock store and router helpers shared by the suites below
//! - **api_tests**: single-asset endpoints driven through the router
//! - **batch_tests**: multi-asset fan-out
//! - **retry_tests**: the retry executor in isolation
//! - **store_tests**: `SqlStore` against an in-memory SQLite pool
//! - **config_tests**: configuration defaults, layering and validation
//! - **error_tests**: error-to-status mapping
//! - **types_tests**: asset JSON shape, filters and pagination

pub mod support;
