//! # Body Validator Seam
//!
//! PUT bodies are checked by a [`BodyValidator`] before the protocol looks
//! at the store. The validator distinguishes two failure modes:
//!
//! - `Ok(BodyVerdict::Invalid(..))`: the body does not conform. The client
//!   gets a validation error.
//! - `Err(ValidatorFault)`: the validator could not do its job (schema
//!   missing, schema does not compile). The client gets an internal error.

use crate::error::ValidatorFault;

/// Result of checking a body that the validator was able to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyVerdict {
    /// The body conforms.
    Valid,
    /// The body does not conform; the reasons are safe to show to clients.
    Invalid(Vec<String>),
}

impl BodyVerdict {
    /// Whether the body conforms.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Structural check applied to every PUT body.
pub trait BodyValidator: Send + Sync + 'static {
    /// Evaluate a body.
    fn validate(&self, body: &str) -> Result<BodyVerdict, ValidatorFault>;
}

impl<F> BodyValidator for F
where
    F: Fn(&str) -> Result<BodyVerdict, ValidatorFault> + Send + Sync + 'static,
{
    fn validate(&self, body: &str) -> Result<BodyVerdict, ValidatorFault> {
        self(body)
    }
}
