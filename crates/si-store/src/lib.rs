//! # si-store: Resource Store Backends
//!
//! Implementations of [`si_core::ResourceStore`]:
//!
//! - [`MemoryStore`]: `DashMap`-backed, process-local. Used for development,
//!   tests, and deployments where durability is not required.
//! - [`PgStore`]: PostgreSQL via SQLx. One row per resource in
//!   `si_resources`; migrations are embedded and applied on connect.
//!
//! The server picks `PgStore` when a database URL is configured and falls
//! back to `MemoryStore` otherwise.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Content ceiling applied by default, matching the largest text value the
/// storage layer was originally sized for (1 MiB).
pub const DEFAULT_CONTENT_LIMIT: usize = 1024 * 1024;
