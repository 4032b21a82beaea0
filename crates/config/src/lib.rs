//! Configuration for the corral test client.
//!
//! This crate provides types and a loader for the connection settings the
//! clustering API client needs: endpoint, credentials, request timeout, and
//! the default budget for status waits.

mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::Config;
