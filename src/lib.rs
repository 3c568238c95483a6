//! # Favorites Backend Library
//!
//! HTTP service that lets users favorite, list, re-describe and remove
//! assets (charts, insights and audience reports) kept in a relational
//! store.
//!
//! ## Core Components
//!
//! - [`config`]: Application configuration management
//! - [`context`]: Per-request deadline and cancellation
//! - [`db`]: Pool setup and schema initialization
//! - [`error`]: Store errors and their HTTP mapping
//! - [`metrics`]: Request and outcome counters
//! - [`retry`]: Bounded retries around store calls
//! - [`routes`]: HTTP API endpoint handlers, including the batch fan-out
//! - [`state`]: Shared application state
//! - [`store`]: The store trait and its SQL implementation
//! - [`types`]: Assets, pagination and request bodies

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
