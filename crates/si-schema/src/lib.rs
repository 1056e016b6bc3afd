//! # si-schema: PUT Body Validation
//!
//! [`si_core::BodyValidator`] implementations backed by JSON Schema
//! (Draft 2020-12):
//!
//! - [`JsonSchemaValidator`]: schema compiled once at startup.
//! - [`SchemaFileValidator`]: schema re-read from disk on every request, so
//!   an operator can change it without a restart. A missing or broken file
//!   is a validator fault (internal error), not a client error.
//! - [`AcceptAnyBody`]: no structural check. For deployments without a
//!   schema.

pub mod validate;

pub use validate::{
    AcceptAnyBody, JsonSchemaValidator, SchemaError, SchemaFileValidator, SchemaViolation,
};
