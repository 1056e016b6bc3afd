//! Schema files are re-read on every validation, so edits take effect
//! without a restart and a broken file surfaces as a fault.

use std::io::Write;
use std::sync::{Arc, Mutex};

use si_core::BodyValidator;
use si_schema::{JsonSchemaValidator, SchemaError, SchemaFileValidator};

fn write_schema(file: &mut tempfile::NamedTempFile, schema: &str) {
    let f = file.as_file_mut();
    f.set_len(0).unwrap();
    std::io::Seek::rewind(f).unwrap();
    f.write_all(schema.as_bytes()).unwrap();
    f.sync_all().unwrap();
}

const OBJECT_SCHEMA: &str = r#"{"type": "object"}"#;
const ARRAY_SCHEMA: &str = r#"{"type": "array"}"#;

#[test]
fn edits_take_effect_on_next_request() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write_schema(&mut file, OBJECT_SCHEMA);
    let v = SchemaFileValidator::new(file.path());

    assert!(v.validate("{}").unwrap().is_valid());
    assert!(!v.validate("[]").unwrap().is_valid());

    write_schema(&mut file, ARRAY_SCHEMA);
    assert!(!v.validate("{}").unwrap().is_valid());
    assert!(v.validate("[]").unwrap().is_valid());
}

#[test]
fn corrupt_schema_file_is_fault_until_fixed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write_schema(&mut file, "{ not json");
    let v = SchemaFileValidator::new(file.path());

    let fault = v.validate("{}").unwrap_err();
    assert!(fault.to_string().contains("failed to parse schema"));

    write_schema(&mut file, OBJECT_SCHEMA);
    assert!(v.validate("{}").unwrap().is_valid());
}

#[test]
fn deleted_schema_file_is_fault() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();
    let v = SchemaFileValidator::new(&path);
    drop(file);
    assert!(v.validate("{}").is_err());
    assert_eq!(v.path(), path.as_path());
}

#[test]
fn compiled_validator_loads_from_file_once() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write_schema(&mut file, OBJECT_SCHEMA);
    let v = JsonSchemaValidator::from_file(file.path()).unwrap();
    assert_eq!(v.source(), file.path().display().to_string());

    // Later edits do not affect an already compiled validator.
    write_schema(&mut file, ARRAY_SCHEMA);
    assert!(v.validate("{}").unwrap().is_valid());
}

#[test]
fn compiled_validator_reports_missing_file() {
    let err = JsonSchemaValidator::from_file("/nonexistent/si/schema.json").unwrap_err();
    assert!(matches!(err, SchemaError::Read { .. }));
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn per_request_reload_stays_below_info() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write_schema(&mut file, OBJECT_SCHEMA);
    let v = SchemaFileValidator::new(file.path());

    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        for _ in 0..3 {
            assert!(v.validate("{}").unwrap().is_valid());
        }
    });

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.is_empty(), "unexpected log output: {output}");
}
