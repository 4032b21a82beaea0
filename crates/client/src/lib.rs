//! REST API test client for a clustering orchestration service.
//!
//! This crate drives a service that manages clusters of nodes through
//! profiles, policies, receivers, and asynchronous actions. It provides thin
//! CRUD wrappers over the service's REST API, a polling waiter that follows
//! an action to a terminal status (or a resource to deletion), a bounded
//! retry for operations racing the per-cluster lock, and scenario helpers
//! composing the three.

pub mod client;
pub mod error;
pub mod harness;
pub mod models;
pub mod retry;
pub mod specs;
pub mod wait;

#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use client::{ClusteringClient, ClusteringClientBuilder};
pub use error::{ClientError, Result};
pub use models::ApiResponse;
pub use retry::{Attempt, RetryPolicy, retry_on_conflict};
pub use wait::StatusSet;
