//! Schema registration and subset JSON validation.
//!
//! The registry holds named, versioned schema definitions; the validator
//! checks documents against their `required` and `const` declarations. Full
//! JSON Schema semantics are out of scope.

pub mod builtin;
pub mod error;
pub mod registry;
pub mod types;
pub mod validator;

pub use builtin::{
    SCHEMA_CMD_DIAGNOSIS_GET_V1_0, SCHEMA_EVT_WIFI_ROAM_MISS_V1_0, SCHEMA_LWT_V1_0,
    SCHEMA_STATE_V1_0,
};
pub use error::{SchemaError, SchemaResult};
pub use registry::{SchemaRegistry, DEFAULT_SCHEMA_CAPACITY};
pub use types::{SchemaDefinition, ValidationResult};
pub use validator::{extract_schema_name, parse_version, validate_name_format};
