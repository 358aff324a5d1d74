//! Tolerant decoding of structured model output

use serde_json::Value;

/// Try to decode backend output as `{ "suggestions": [{ "text": ... }] }`.
///
/// Returns the extracted texts (possibly empty) when the shape matches,
/// dropping entries whose `text` is missing, non-string, or empty. Returns
/// `None` when the output is not valid JSON or not the expected shape; the
/// caller then treats the entire raw string as a single candidate.
pub fn parse_structured(raw: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let items = value.get("suggestions")?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// JSON schema handed to the backend as a structured-output constraint,
/// capped at `max_suggestions` entries
pub fn suggestion_constraint(max_suggestions: usize) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "suggestions": {
                "type": "array",
                "maxItems": max_suggestions,
                "items": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" }
                    },
                    "required": ["text"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["suggestions"],
        "additionalProperties": false
    })
}
