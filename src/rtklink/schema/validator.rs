//! Subset JSON validation against registered schema definitions.
//!
//! The validator intentionally implements a subset of JSON Schema: it checks
//! the top-level `required` field list and any properties declared with a
//! `const` value. Structural and type constraints beyond those are
//! documentation for consumers with full JSON Schema tooling.

use log::warn;
use serde_json::Value;

use super::error::{SchemaError, SchemaResult};
use super::registry::SchemaRegistry;
use super::types::ValidationResult;

impl SchemaRegistry {
    /// Validate `json` against the schema registered under `schema_name`.
    ///
    /// Fails with [`SchemaError::NotFound`] when no such schema exists and
    /// [`SchemaError::InvalidJson`] (carrying the parser's offset) when the
    /// document is malformed. Constraint violations are reported through the
    /// returned [`ValidationResult`], not as errors.
    pub fn validate(&self, json: &str, schema_name: &str) -> SchemaResult<ValidationResult> {
        let schema = self
            .find_by_name(schema_name)
            .ok_or_else(|| SchemaError::NotFound {
                name: schema_name.to_string(),
            })?;

        let instance = parse_document(json)?;

        let schema_doc: Value = match serde_json::from_str(&schema.schema_text) {
            Ok(doc) => doc,
            Err(e) => {
                // An unparsable definition cannot constrain anything; the
                // document passes, matching the permissive lookup table.
                warn!("schema '{}' is not valid JSON, skipping checks: {}", schema_name, e);
                return Ok(ValidationResult::valid());
            }
        };

        if let Some(required) = schema_doc.get("required").and_then(Value::as_array) {
            for field in required.iter().filter_map(Value::as_str) {
                if instance.get(field).is_none() {
                    return Ok(ValidationResult::invalid(
                        format!("Missing required field: {}", field),
                        format!("/{}", field),
                    ));
                }
            }
        }

        if let Some(properties) = schema_doc.get("properties").and_then(Value::as_object) {
            for (field, declaration) in properties {
                let Some(expected) = declaration.get("const") else {
                    continue;
                };
                if let Some(actual) = instance.get(field) {
                    if actual != expected {
                        return Ok(ValidationResult::invalid(
                            format!(
                                "Field mismatch: expected {}, got {}",
                                expected, actual
                            ),
                            format!("/{}", field),
                        ));
                    }
                }
            }
        }

        Ok(ValidationResult::valid())
    }

    /// Validate `json` against the schema named by its own `schema` field.
    ///
    /// Fails with [`SchemaError::NotFound`] when the field is absent or not
    /// a string.
    pub fn auto_validate(&self, json: &str) -> SchemaResult<ValidationResult> {
        let schema_name = extract_schema_name(json)?;
        self.validate(json, &schema_name)
    }

    /// Convenience wrapper discarding the detailed result.
    pub fn quick_validate(&self, json: &str, schema_name: &str) -> bool {
        matches!(self.validate(json, schema_name), Ok(result) if result.is_valid)
    }
}

fn parse_document(json: &str) -> SchemaResult<Value> {
    serde_json::from_str(json).map_err(|e| SchemaError::InvalidJson {
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })
}

/// Extract the `schema` field from a message payload.
pub fn extract_schema_name(json: &str) -> SchemaResult<String> {
    let instance = parse_document(json)?;
    instance
        .get("schema")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SchemaError::NotFound {
            name: "schema field".to_string(),
        })
}

/// Whether `name` follows the `type/major.minor` naming rule.
pub fn validate_name_format(name: &str) -> bool {
    crate::rtklink::codec::schema_name_is_valid(name)
}

/// Parse the `major.minor` version out of a schema name.
pub fn parse_version(schema_name: &str) -> SchemaResult<(u32, u32)> {
    let malformed = || {
        SchemaError::InvalidParam(format!(
            "schema name '{}' is not of the form type/major.minor",
            schema_name
        ))
    };

    let (_, version) = schema_name.split_once('/').ok_or_else(malformed)?;
    let (major, minor) = version.split_once('.').ok_or_else(malformed)?;
    Ok((
        major.parse().map_err(|_| malformed())?,
        minor.parse().map_err(|_| malformed())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("state/1.0").unwrap(), (1, 0));
        assert_eq!(parse_version("evt.wifi.roam_miss/2.13").unwrap(), (2, 13));
        assert!(parse_version("state").is_err());
        assert!(parse_version("state/1").is_err());
    }

    #[test]
    fn test_extract_schema_name() {
        assert_eq!(
            extract_schema_name(r#"{"schema":"state/1.0","ts":1}"#).unwrap(),
            "state/1.0"
        );
        assert!(matches!(
            extract_schema_name(r#"{"ts":1}"#),
            Err(SchemaError::NotFound { .. })
        ));
        assert!(matches!(
            extract_schema_name("not json"),
            Err(SchemaError::InvalidJson { .. })
        ));
    }
}
