//! Core schema types.

/// A named, versioned schema definition held by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    /// Registry key, of the form `type/major.minor`.
    pub name: String,
    pub version: String,
    pub description: String,
    /// The schema document itself, as JSON text.
    pub schema_text: String,
}

impl SchemaDefinition {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
        schema_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
            schema_text: schema_text.into(),
        }
    }
}

/// Outcome of validating a document against a schema definition.
///
/// Produced fresh per call and never mutated after return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_message: String,
    /// JSON-pointer-style path of the offending field, e.g. `/schema`.
    pub error_path: String,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    pub fn invalid(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: message.into(),
            error_path: path.into(),
        }
    }
}
