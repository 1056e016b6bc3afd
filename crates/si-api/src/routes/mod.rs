//! # Route Modules
//!
//! - [`resources`]: the resource protocol under the configured prefix.
//! - [`health`]: liveness and readiness probes.

pub mod health;
pub mod resources;
