//! # JSON Schema Body Validation
//!
//! Bodies are parsed as JSON and checked against a Draft 2020-12 schema.
//! A body that is not JSON at all is a non-conforming body, exactly like a
//! body that violates the schema: the client gets a validation error.
//!
//! Failures of the schema itself (unreadable file, not JSON, does not
//! compile) are reported as [`ValidatorFault`] and surface as internal
//! errors.

use std::path::{Path, PathBuf};

use serde_json::Value;
use si_core::{BodyValidator, BodyVerdict, ValidatorFault};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A single schema violation found in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON Pointer to the violating value (empty for the document root).
    pub instance_path: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Errors loading or compiling a schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("failed to read schema {path}: {source}")]
    Read {
        /// Schema file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not JSON.
    #[error("failed to parse schema {path}: {reason}")]
    Parse {
        /// Schema file path.
        path: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The schema is JSON but not a valid Draft 2020-12 schema.
    #[error("failed to compile schema {path}: {reason}")]
    Compile {
        /// Schema file path, or `<inline>` for in-memory schemas.
        path: String,
        /// Compiler diagnostic.
        reason: String,
    },
}

impl From<SchemaError> for ValidatorFault {
    fn from(err: SchemaError) -> Self {
        ValidatorFault(err.to_string())
    }
}

const INLINE: &str = "<inline>";

// ---------------------------------------------------------------------------
// Compiled validator
// ---------------------------------------------------------------------------

/// Validator holding a schema compiled once at construction.
pub struct JsonSchemaValidator {
    source: String,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    /// Compile an in-memory schema.
    pub fn from_value(schema: &Value) -> Result<Self, SchemaError> {
        Self::compile(schema, INLINE)
    }

    /// Read and compile a schema file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let schema = load_schema(path)?;
        let validator = Self::compile(&schema, &path.display().to_string())?;
        tracing::debug!(schema = %path.display(), "body schema compiled");
        Ok(validator)
    }

    /// Where the schema came from: a file path or `<inline>`.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check a parsed document, collecting every violation.
    pub fn violations(&self, document: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(document)
            .map(|err| SchemaViolation {
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect()
    }

    fn compile(schema: &Value, source: &str) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(schema)
            .map_err(|e| SchemaError::Compile {
                path: source.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            validator,
        })
    }

    fn verdict(&self, body: &str) -> BodyVerdict {
        let document: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => return BodyVerdict::Invalid(vec![format!("body is not valid JSON: {e}")]),
        };
        let violations = self.violations(&document);
        if violations.is_empty() {
            BodyVerdict::Valid
        } else {
            BodyVerdict::Invalid(violations.iter().map(ToString::to_string).collect())
        }
    }
}

impl BodyValidator for JsonSchemaValidator {
    fn validate(&self, body: &str) -> Result<BodyVerdict, ValidatorFault> {
        Ok(self.verdict(body))
    }
}

// ---------------------------------------------------------------------------
// Reloading validator
// ---------------------------------------------------------------------------

/// Validator that re-reads and recompiles its schema file on every call.
#[derive(Debug, Clone)]
pub struct SchemaFileValidator {
    path: PathBuf,
}

impl SchemaFileValidator {
    /// Validate against the schema at `path`. The file is not read until the
    /// first call to [`BodyValidator::validate`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The schema file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BodyValidator for SchemaFileValidator {
    fn validate(&self, body: &str) -> Result<BodyVerdict, ValidatorFault> {
        let compiled = JsonSchemaValidator::from_file(&self.path).map_err(|e| {
            tracing::error!(error = %e, "body schema unavailable");
            ValidatorFault::from(e)
        })?;
        Ok(compiled.verdict(body))
    }
}

// ---------------------------------------------------------------------------
// No-op validator
// ---------------------------------------------------------------------------

/// Accepts every body.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyBody;

impl BodyValidator for AcceptAnyBody {
    fn validate(&self, _body: &str) -> Result<BodyVerdict, ValidatorFault> {
        Ok(BodyVerdict::Valid)
    }
}

fn load_schema(path: &Path) -> Result<Value, SchemaError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| SchemaError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node_schema() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "children": { "type": "array", "items": { "type": "string" } }
            }
        })
    }

    #[test]
    fn conforming_body_is_valid() {
        let v = JsonSchemaValidator::from_value(&node_schema()).unwrap();
        let verdict = v.validate(r#"{"name":"root","children":["a"]}"#).unwrap();
        assert!(verdict.is_valid());
    }

    #[test]
    fn missing_required_field_is_invalid() {
        let v = JsonSchemaValidator::from_value(&node_schema()).unwrap();
        match v.validate(r#"{"children":[]}"#).unwrap() {
            BodyVerdict::Invalid(reasons) => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("name"), "{reasons:?}");
            }
            BodyVerdict::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn every_violation_is_reported_with_its_path() {
        let v = JsonSchemaValidator::from_value(&node_schema()).unwrap();
        let doc = json!({"name": "", "children": [1, "ok", 2]});
        let violations = v.violations(&doc);
        assert_eq!(violations.len(), 3, "{violations:?}");
        let paths: Vec<&str> = violations.iter().map(|v| v.instance_path.as_str()).collect();
        assert!(paths.contains(&"/name"));
        assert!(paths.contains(&"/children/0"));
        assert!(paths.contains(&"/children/2"));
    }

    #[test]
    fn non_json_body_is_invalid_not_fault() {
        let v = JsonSchemaValidator::from_value(&node_schema()).unwrap();
        match v.validate("<node/>").unwrap() {
            BodyVerdict::Invalid(reasons) => assert!(reasons[0].contains("not valid JSON")),
            BodyVerdict::Valid => panic!("expected invalid"),
        }
        assert!(!v.validate("").unwrap().is_valid());
    }

    #[test]
    fn bad_schema_fails_to_compile() {
        let err = JsonSchemaValidator::from_value(&json!({"type": 12})).unwrap_err();
        assert!(matches!(err, SchemaError::Compile { .. }));
    }

    #[test]
    fn inline_source_and_debug() {
        let v = JsonSchemaValidator::from_value(&node_schema()).unwrap();
        assert_eq!(v.source(), "<inline>");
        assert!(format!("{v:?}").contains("JsonSchemaValidator"));
    }

    #[test]
    fn missing_file_is_fault() {
        let v = SchemaFileValidator::new("/nonexistent/si/schema.json");
        let fault = v.validate("{}").unwrap_err();
        assert!(fault.to_string().contains("failed to read schema"));
    }

    #[test]
    fn accept_any_body() {
        assert!(AcceptAnyBody.validate("").unwrap().is_valid());
        assert!(AcceptAnyBody.validate("not json").unwrap().is_valid());
    }

    #[test]
    fn violation_display() {
        let root = SchemaViolation {
            instance_path: String::new(),
            message: "\"name\" is a required property".into(),
        };
        assert_eq!(root.to_string(), "\"name\" is a required property");
        let nested = SchemaViolation {
            instance_path: "/name".into(),
            message: "too short".into(),
        };
        assert_eq!(nested.to_string(), "/name: too short");
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn any_string_name_is_valid(name in "[a-zA-Z0-9 _-]{1,32}") {
                let v = JsonSchemaValidator::from_value(&node_schema()).unwrap();
                let body = json!({ "name": name }).to_string();
                prop_assert!(v.validate(&body).unwrap().is_valid());
            }

            #[test]
            fn arbitrary_text_never_faults(body in ".*") {
                let v = JsonSchemaValidator::from_value(&node_schema()).unwrap();
                prop_assert!(v.validate(&body).is_ok());
            }
        }
    }
}
