//! Input and output shapes of the service layer.
//!
//! Input: `{ "query": string }` with at least [`MIN_QUERY_CHARS`] characters
//! once surrounding whitespace is ignored.
//! Output: `{ "response": string }`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ValidationError;

/// Minimum query length, counted in characters after trimming.
pub const MIN_QUERY_CHARS: usize = 2;

/// A validated user query. The text is kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInput {
    query: String,
}

impl ServiceInput {
    pub fn new(query: impl Into<String>) -> Result<Self, ValidationError> {
        let query = query.into();
        if query.trim().chars().count() < MIN_QUERY_CHARS {
            return Err(ValidationError::new(
                "query",
                format!("must be at least {MIN_QUERY_CHARS} characters"),
            ));
        }
        Ok(Self { query })
    }

    /// Validates a candidate JSON object against the input schema.
    pub fn from_value(candidate: &Value) -> Result<Self, ValidationError> {
        Self::new(string_field(candidate, "query")?)
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// The model's answer, validated against the output schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOutput {
    pub response: String,
}

impl ServiceOutput {
    /// Validates a candidate JSON object against the output schema.
    pub fn from_value(candidate: &Value) -> Result<Self, ValidationError> {
        Ok(Self {
            response: string_field(candidate, "response")?.to_string(),
        })
    }

    /// Parses the raw JSON text a provider produced.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            ValidationError::new("response", format!("reply is not valid JSON: {e}"))
        })?;
        Self::from_value(&value)
    }

    /// JSON Schema handed to providers that support structured output.
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "response": {
                    "type": "string",
                    "description": "The AI-powered response to the query."
                }
            },
            "required": ["response"]
        })
    }
}

fn string_field<'a>(candidate: &'a Value, field: &'static str) -> Result<&'a str, ValidationError> {
    let object = candidate
        .as_object()
        .ok_or_else(|| ValidationError::new(field, "expected an object"))?;
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(field, "required")),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationError::new(field, "must be a string")),
    }
}
