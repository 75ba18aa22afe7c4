use std::collections::HashMap;

use serde_json::Value;

/// Why a body could not be flattened.
#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("top-level JSON value is not an object or array")]
    NotAContainer,
}

/// Flatten a JSON document into `(leaf key, value)` pairs.
///
/// Objects are walked depth-first and only leaf keys are kept, so
/// `{"a": {"b": 1}}` yields `b=1`. Array elements are leaves of the key that
/// holds the array. When a leaf key shows up again, the repeat is renamed
/// `key.2_`, `key.3_` and so on. Strings are emitted without quotes, numbers
/// in their JSON spelling, and `true`/`false`/`null` as `True`/`False`/`None`
/// so derived keys match those written by pywb.
pub fn json_flatten(text: &str) -> Result<Vec<(String, String)>, FlattenError> {
    let value: Value = serde_json::from_str(text)?;
    let mut flat = Flattener::default();
    match &value {
        Value::Object(_) | Value::Array(_) => flat.walk(None, &value),
        _ => return Err(FlattenError::NotAContainer),
    }
    Ok(flat.pairs)
}

#[derive(Default)]
struct Flattener {
    pairs: Vec<(String, String)>,
    seen: HashMap<String, usize>,
}

impl Flattener {
    fn walk(&mut self, key: Option<&str>, value: &Value) {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    self.walk(Some(k), v);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(key, item);
                }
            }
            scalar => {
                if let Some(key) = key {
                    let text = match scalar {
                        Value::String(s) => s.clone(),
                        Value::Bool(true) => "True".to_string(),
                        Value::Bool(false) => "False".to_string(),
                        Value::Null => "None".to_string(),
                        other => other.to_string(),
                    };
                    self.emit(key, text);
                }
            }
        }
    }

    fn emit(&mut self, key: &str, value: String) {
        let count = self.seen.entry(key.to_string()).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            key.to_string()
        } else {
            format!("{}.{}_", key, count)
        };
        self.pairs.push((name, value));
    }
}
