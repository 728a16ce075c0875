use serde_json::Value;

const SCHEMA_JSON: &str = include_str!("../../docs/device-type-schema/schema.json");

/// A validation error with a JSON path and message.
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn single(message: String) -> Vec<SchemaError> {
    vec![SchemaError {
        path: String::new(),
        message,
    }]
}

/// Validate a requirement JSON document against the embedded JSON Schema.
///
/// Returns `Ok(())` if valid, or a list of schema validation errors.
pub fn validate_requirement_schema(json_text: &str) -> Result<(), Vec<SchemaError>> {
    let instance: Value =
        serde_json::from_str(json_text).map_err(|e| single(format!("JSON parse error: {e}")))?;

    let schema: Value = serde_json::from_str(SCHEMA_JSON)
        .map_err(|e| single(format!("embedded schema is not valid JSON: {e}")))?;

    let validator = jsonschema::draft202012::new(&schema)
        .map_err(|e| single(format!("embedded schema is not a valid JSON Schema: {e}")))?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(&instance)
        .map(|e| SchemaError {
            path: e.instance_path().to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
