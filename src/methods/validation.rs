use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{JSONSchema, ValidationError};
use serde_json::Value;

use crate::error::{JimboError, Result, ValidationDetail, ValidationFailure};

/// A compiled validation rule. Compiled once per method at registration.
pub struct Validator {
    schema: JSONSchema,
}

impl Validator {
    pub fn compile(rule: &Value) -> Result<Self> {
        let schema = JSONSchema::compile(rule).map_err(|e| {
            JimboError::invalid_argument(format!("validation rule does not compile: {}", e))
        })?;
        Ok(Self { schema })
    }

    /// Checks `params` against the rule, handing them back on success.
    pub fn validate(&self, params: Value) -> std::result::Result<Value, ValidationFailure> {
        let details = match self.schema.validate(&params) {
            Ok(()) => None,
            Err(errors) => Some(errors.map(|e| detail_for(&e)).collect::<Vec<_>>()),
        };

        match details {
            None => Ok(params),
            Some(details) => Err(ValidationFailure { details }),
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

fn detail_for(error: &ValidationError<'_>) -> ValidationDetail {
    let path = error.instance_path.to_string();
    let message = match &error.kind {
        ValidationErrorKind::Type {
            kind: TypeKind::Single(expected),
        } => format!("\"{}\" must be a {}", field_label(&path), expected),
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            format!("\"{}\" is required", name)
        }
        _ => error.to_string(),
    };

    ValidationDetail { message, path }
}

fn field_label(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => "value",
    }
}
