//! Input validation for embedding requests.

use serde_json::Value;

use crate::error::InvalidInput;

/// Check that `value` is a list whose items are all strings.
///
/// Returns the texts in input order. On failure reports the first
/// constraint violated; for mixed lists that is the lowest offending index.
pub fn validate_text_list(value: &Value) -> Result<Vec<String>, InvalidInput> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(InvalidInput::NotASequence {
                found: describe(other),
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(text) => Ok(text.clone()),
            other => Err(InvalidInput::NonStringElement {
                index,
                found: describe(other),
            }),
        })
        .collect()
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
