//! # si-core: Resource Lifecycle Protocol
//!
//! The core of the Storage Interface: a flat namespace of named text
//! resources with optimistic concurrency control via content-derived
//! version tags.
//!
//! ## Components
//!
//! - [`resource`]: `ResourceId`, `Resource`, and `PathPrefix` (identifier
//!   extraction from request paths).
//! - [`etag`]: the SHA-256 tag over `identifier ‖ content`. Tags are never
//!   stored; they are recomputed from the resource on every read.
//! - [`media`]: `Accept` / `Content-Type` rules for a single configured
//!   media type.
//! - [`store`]: the `ResourceStore` seam (get / put / delete by identifier).
//! - [`validate`]: the `BodyValidator` seam consulted before any write.
//! - [`protocol`]: `ResourceProtocol`, the GET / PUT / DELETE state machine.
//! - [`error`]: the error taxonomy shared by every layer above.
//!
//! ## Crate Policy
//!
//! - No HTTP framework dependency. Transport adapters live in `si-api`.
//! - No `.unwrap()` outside tests.
//! - The store is never mutated before a PUT has passed every validation
//!   and precondition stage.

pub mod error;
pub mod etag;
pub mod media;
pub mod protocol;
pub mod resource;
pub mod store;
pub mod validate;

pub use error::{ErrorCategory, ProtocolError, StoreError, ValidatorFault};
pub use etag::ETag;
pub use media::{MediaType, MediaTypeError};
pub use protocol::{RequestHeaders, ResourceProtocol, ResourceView, WriteKind, WriteOutcome};
pub use resource::{PathPrefix, PrefixError, Resource, ResourceId};
pub use store::ResourceStore;
pub use validate::{BodyValidator, BodyVerdict};
