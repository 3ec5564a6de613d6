//! Schema coercion for untrusted model output.
//!
//! Every output type declares a JSON *shape*: the full structure with a
//! default at every leaf and a one-element prototype inside every list. The
//! same shape is embedded in the prompt and drives repair here:
//!
//! - string leaf: strings kept, numbers/bools stringified, anything else → default
//! - number leaf: numbers kept, numeric strings parsed, anything else → `null`
//! - bool leaf: bools kept, `"true"`/`"false"`/`"yes"`/`"no"` parsed, else default
//! - `null` leaf: value passed through untouched (free-form optional data)
//! - list: elements repaired against the prototype, nulls dropped; a lone scalar
//!   where a scalar list is expected becomes a one-element list
//! - object: every shape key present afterwards, unknown keys dropped
//!
//! Only output that cannot be read as a JSON object at all is a `SchemaViolation`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaViolation {
    #[error("model returned empty output")]
    Empty,

    #[error("no JSON object found in model output")]
    NoJson,

    #[error("malformed JSON in model output: {0}")]
    Malformed(String),

    #[error("expected a JSON object for {schema}, got {found}")]
    NotAnObject { schema: &'static str, found: &'static str },

    #[error("repaired output does not fit {schema}: {reason}")]
    Incompatible { schema: &'static str, reason: String },
}

/// A type the model is asked to produce.
pub trait ModelSchema: DeserializeOwned {
    const NAME: &'static str;

    /// The expected JSON structure with defaults and list prototypes.
    fn shape() -> Value;

    /// Pretty-printed shape for embedding into prompts.
    fn shape_for_prompt() -> String {
        serde_json::to_string_pretty(&Self::shape()).unwrap_or_default()
    }
}

/// Result of a successful coercion.
#[derive(Debug, Clone)]
pub struct Coerced<T> {
    pub value: T,
    /// Dotted paths of fields that were missing or unusable and got defaults.
    pub defaulted: Vec<String>,
}

/// Parses and repairs `raw` into `T`, defaulting missing fields.
pub fn coerce<T: ModelSchema>(raw: &str) -> Result<Coerced<T>, SchemaViolation> {
    let parsed = parse_json_object(raw)?;
    if !parsed.is_object() {
        return Err(SchemaViolation::NotAnObject {
            schema: T::NAME,
            found: kind_of(&parsed),
        });
    }

    let mut defaulted = Vec::new();
    let repaired = repair(Some(&parsed), &T::shape(), "", &mut defaulted);
    let value = serde_json::from_value(repaired).map_err(|e| SchemaViolation::Incompatible {
        schema: T::NAME,
        reason: e.to_string(),
    })?;

    Ok(Coerced { value, defaulted })
}

/// Locates and parses the JSON document inside model text.
fn parse_json_object(raw: &str) -> Result<Value, SchemaViolation> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(SchemaViolation::Empty);
    }

    let candidate = strip_json_fences(text);
    match serde_json::from_str::<Value>(candidate) {
        Ok(v) => Ok(v),
        Err(first_err) => {
            // Fall back to the outermost {...} span when prose surrounds the object.
            let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}')) else {
                return Err(if candidate.contains('{') {
                    SchemaViolation::Malformed(first_err.to_string())
                } else {
                    SchemaViolation::NoJson
                });
            };
            if end <= start {
                return Err(SchemaViolation::NoJson);
            }
            serde_json::from_str::<Value>(&candidate[start..=end])
                .map_err(|e| SchemaViolation::Malformed(e.to_string()))
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output, including
/// a fenced block that follows leading prose.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(close) => after[..close].trim(),
        None => after.trim(),
    }
}

fn repair(value: Option<&Value>, shape: &Value, path: &str, defaulted: &mut Vec<String>) -> Value {
    match shape {
        Value::String(default) => match value {
            Some(Value::String(s)) => Value::String(s.clone()),
            Some(Value::Number(n)) => Value::String(n.to_string()),
            Some(Value::Bool(b)) => Value::String(b.to_string()),
            other => {
                note_default(other, path, defaulted);
                Value::String(default.clone())
            }
        },
        Value::Number(_) => match value {
            Some(Value::Number(n)) => Value::Number(n.clone()),
            Some(Value::String(s)) => match parse_number(s) {
                Some(n) => n,
                None => {
                    defaulted.push(path.to_string());
                    Value::Null
                }
            },
            other => {
                note_default(other, path, defaulted);
                Value::Null
            }
        },
        Value::Bool(default) => match value {
            Some(Value::Bool(b)) => Value::Bool(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Value::Bool(true),
                "false" | "no" => Value::Bool(false),
                _ => {
                    defaulted.push(path.to_string());
                    Value::Bool(*default)
                }
            },
            other => {
                note_default(other, path, defaulted);
                Value::Bool(*default)
            }
        },
        Value::Null => value.cloned().unwrap_or(Value::Null),
        Value::Array(prototype) => {
            let Some(proto) = prototype.first() else {
                return match value {
                    Some(Value::Array(items)) => Value::Array(items.clone()),
                    other => {
                        note_default(other, path, defaulted);
                        Value::Array(Vec::new())
                    }
                };
            };
            match value {
                Some(Value::Array(items)) => Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .filter(|(_, item)| fits_prototype(item, proto))
                        .map(|(i, item)| repair(Some(item), proto, &format!("{path}[{i}]"), defaulted))
                        .collect(),
                ),
                Some(scalar) if is_scalar(scalar) && is_scalar(proto) => {
                    Value::Array(vec![repair(Some(scalar), proto, path, defaulted)])
                }
                other => {
                    note_default(other, path, defaulted);
                    Value::Array(Vec::new())
                }
            }
        }
        Value::Object(fields) => {
            let source = match value {
                Some(Value::Object(map)) => Some(map),
                other => {
                    if !path.is_empty() {
                        note_default(other, path, defaulted);
                    }
                    None
                }
            };
            let mut out = Map::with_capacity(fields.len());
            for (key, sub_shape) in fields {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                let child = source.and_then(|m| m.get(key));
                // Nested defaults under a missing parent are reported once, at the parent.
                let child_value = match source {
                    Some(_) => repair(child, sub_shape, &child_path, defaulted),
                    None => repair(child, sub_shape, &child_path, &mut Vec::new()),
                };
                out.insert(key.clone(), child_value);
            }
            Value::Object(out)
        }
    }
}

fn note_default(value: Option<&Value>, path: &str, defaulted: &mut Vec<String>) {
    // An explicit null is the model saying "not present": that is a value, not a repair.
    if !matches!(value, Some(Value::Null)) {
        defaulted.push(path.to_string());
    }
}

fn fits_prototype(item: &Value, proto: &Value) -> bool {
    match (item, proto) {
        (Value::Null, _) => false,
        (Value::Object(_), Value::Object(_)) => true,
        (_, Value::Object(_)) => false,
        (Value::Array(_) | Value::Object(_), p) if is_scalar(p) => false,
        _ => true,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn parse_number(raw: &str) -> Option<Value> {
    let cleaned = raw.trim().trim_end_matches('%').trim();
    let cleaned = cleaned.split('/').next().unwrap_or(cleaned).trim();
    let n: f64 = cleaned.parse().ok()?;
    serde_json::Number::from_f64(n).map(Value::Number)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
