//! Runtime value types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// Runtime value type
///
/// Every resume value, effect payload and task result flowing through the
/// interpreter is a `Val`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    #[default]
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Val>),
    Obj(HashMap<String, Val>),
}

impl Val {
    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            Val::Null => false,
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Val::Null)
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Val::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Val]> {
        match self {
            Val::List(items) => Some(items),
            _ => None,
        }
    }

    /// Member access on objects; `None` for missing keys and non-objects
    pub fn get(&self, key: &str) -> Option<&Val> {
        match self {
            Val::Obj(map) => map.get(key),
            _ => None,
        }
    }

    /// Build an object from `(key, value)` pairs
    pub fn object<K, I>(entries: I) -> Val
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Val)>,
    {
        Val::Obj(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/* ===================== Conversions ===================== */

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<f64> for Val {
    fn from(n: f64) -> Self {
        Val::Num(n)
    }
}

impl From<i32> for Val {
    fn from(n: i32) -> Self {
        Val::Num(n as f64)
    }
}

impl From<i64> for Val {
    fn from(n: i64) -> Self {
        Val::Num(n as f64)
    }
}

impl From<usize> for Val {
    fn from(n: usize) -> Self {
        Val::Num(n as f64)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::Str(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::Str(s)
    }
}

impl From<Vec<Val>> for Val {
    fn from(items: Vec<Val>) -> Self {
        Val::List(items)
    }
}

impl From<HashMap<String, Val>> for Val {
    fn from(map: HashMap<String, Val>) -> Self {
        Val::Obj(map)
    }
}

impl<T: Into<Val>> From<Option<T>> for Val {
    fn from(value: Option<T>) -> Self {
        value.map_or(Val::Null, Into::into)
    }
}

impl From<JsonValue> for Val {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Val::Null,
            JsonValue::Bool(b) => Val::Bool(b),
            JsonValue::Number(n) => Val::Num(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Val::Str(s),
            JsonValue::Array(items) => Val::List(items.into_iter().map(Val::from).collect()),
            JsonValue::Object(map) => {
                Val::Obj(map.into_iter().map(|(k, v)| (k, Val::from(v))).collect())
            }
        }
    }
}

impl From<&Val> for JsonValue {
    fn from(val: &Val) -> Self {
        match val {
            Val::Null => JsonValue::Null,
            Val::Bool(b) => JsonValue::Bool(*b),
            Val::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    JsonValue::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number)
                }
            }
            Val::Str(s) => JsonValue::String(s.clone()),
            Val::List(items) => JsonValue::Array(items.iter().map(JsonValue::from).collect()),
            Val::Obj(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Strings print bare so error messages read naturally
            Val::Str(s) => f.write_str(s),
            other => write!(f, "{}", JsonValue::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion_keeps_integers() {
        let val = Val::object([("count", Val::from(3)), ("ratio", Val::from(0.5))]);
        assert_eq!(JsonValue::from(&val), json!({"count": 3, "ratio": 0.5}));
    }

    #[test]
    fn test_from_json_nested() {
        let val = Val::from(json!({"items": [1, "two", null]}));
        let items = val.get("items").and_then(Val::as_list).unwrap();
        assert_eq!(items, &[Val::Num(1.0), Val::from("two"), Val::Null]);
    }

    #[test]
    fn test_display_strings_bare() {
        assert_eq!(Val::from("msg").to_string(), "msg");
        assert_eq!(Val::List(vec![Val::from(1), Val::Null]).to_string(), "[1,null]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Val::Null.is_truthy());
        assert!(!Val::Bool(false).is_truthy());
        assert!(Val::Num(0.0).is_truthy());
    }
}
