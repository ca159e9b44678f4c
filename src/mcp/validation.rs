//! Tool argument validation against the declared JSON schema.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ToolError;

/// A tool's input schema together with its compiled validator.
pub struct ArgumentSchema {
    schema: Value,
    validator: Validator,
}

impl ArgumentSchema {
    pub fn compile(schema: Value) -> Result<Self, String> {
        let validator = jsonschema::validator_for(&schema).map_err(|e| e.to_string())?;
        Ok(Self { schema, validator })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check `arguments`, returning one message per violation.
    pub fn check(&self, arguments: &Value) -> Result<(), ToolError> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(arguments)
            .map(|e| describe(&e))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ToolError::Validation(errors))
        }
    }
}

/// `field: message`, where `field` is the dotted path of the offending value.
fn describe(error: &ValidationError<'_>) -> String {
    let mut field = error
        .instance_path
        .to_string()
        .trim_start_matches('/')
        .replace('/', ".");

    if let ValidationErrorKind::Required { property } = &error.kind {
        let property = property
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| property.to_string());
        field = if field.is_empty() {
            property
        } else {
            format!("{}.{}", field, property)
        };
    }

    if field.is_empty() {
        field = "arguments".to_string();
    }

    format!("{}: {}", field, error)
}

/// Deserialize already-validated arguments into the handler's type.
pub fn decode_arguments<P: DeserializeOwned>(arguments: Value) -> Result<P, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::Validation(vec![e.to_string()]))
}
