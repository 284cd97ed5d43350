//! Literal versus runtime-resolved values.
//!
//! Task fields may either carry a concrete value known when the task is
//! compiled, or a path that the orchestrator resolves against the state input
//! when the task runs. The compiler never looks inside a runtime path; it only
//! renders it under the `.$`-suffixed parameter key so the orchestrator knows
//! to substitute it.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ValueError;

/// Matches state-input paths (`$.a`, `$[0]`, `$`), context-object paths (`$$.Execution.Name`)
/// and intrinsic function calls (`States.Format(...)`).
static JSON_PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\$\$?(\.|\[|$)|States\.[A-Za-z]+\()").expect("json path regex should compile"));

/// Suffix appended to a parameter key when its value is resolved at execution time.
pub const RUNTIME_KEY_SUFFIX: &str = ".$";

/// Returns true when `text` is a runtime path rather than a literal value.
pub fn is_json_path(text: &str) -> bool {
    JSON_PATH_REGEX.is_match(text)
}

/// Opaque path resolved by the orchestrator at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPath(String);

impl JsonPath {
    /// Parse a runtime path, rejecting strings that do not start with `$` or `States.`.
    pub fn new(path: impl Into<String>) -> Result<Self, ValueError> {
        let path = path.into();
        if is_json_path(&path) {
            Ok(Self(path))
        } else {
            Err(ValueError::InvalidJsonPath { path })
        }
    }

    /// True for `$`-rooted paths; false for intrinsic function calls.
    pub fn is_reference(&self) -> bool {
        self.0.starts_with('$')
    }

    /// Path of the current execution's name in the context object.
    pub fn execution_name() -> Self {
        Self("$$.Execution.Name".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JsonPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        JsonPath::new(raw).map_err(D::Error::custom)
    }
}

/// A task field that is either known at compile time or resolved at execution time.
///
/// Validation applies bounds to `Literal` values only; a `RuntimeRef` is
/// accepted as-is and enforced by the orchestrator when the task runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolvable<T> {
    /// Concrete value known when the task is compiled.
    Literal(T),
    /// Path resolved against the state input when the task runs.
    RuntimeRef(JsonPath),
}

impl<T> Resolvable<T> {
    pub fn literal(value: T) -> Self {
        Self::Literal(value)
    }

    /// Build a runtime reference, validating the path syntax.
    pub fn runtime(path: impl Into<String>) -> Result<Self, ValueError> {
        JsonPath::new(path).map(Self::RuntimeRef)
    }

    pub fn as_literal(&self) -> Option<&T> {
        match self {
            Self::Literal(value) => Some(value),
            Self::RuntimeRef(_) => None,
        }
    }

    pub fn is_runtime_ref(&self) -> bool {
        matches!(self, Self::RuntimeRef(_))
    }

    /// Parameter key for this value: `key` for literals, `key.$` for runtime references.
    pub fn parameter_key(&self, key: &str) -> String {
        match self {
            Self::Literal(_) => key.to_string(),
            Self::RuntimeRef(_) => format!("{key}{RUNTIME_KEY_SUFFIX}"),
        }
    }
}

impl<T> Resolvable<T>
where
    T: Clone + Into<Value>,
{
    /// Render as a `(key, value)` parameter pair using the runtime key convention.
    pub fn to_parameter(&self, key: &str) -> (String, Value) {
        let value = match self {
            Self::Literal(literal) => literal.clone().into(),
            Self::RuntimeRef(path) => Value::String(path.as_str().to_string()),
        };
        (self.parameter_key(key), value)
    }
}

impl Resolvable<String> {
    /// Classify free text: runtime paths become `RuntimeRef`, anything else a literal.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if is_json_path(&text) {
            Self::RuntimeRef(JsonPath(text))
        } else {
            Self::Literal(text)
        }
    }
}

impl From<&str> for Resolvable<String> {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Resolvable<String> {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl From<JsonPath> for Resolvable<String> {
    fn from(path: JsonPath) -> Self {
        Self::RuntimeRef(path)
    }
}

impl<T: Serialize> Serialize for Resolvable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => value.serialize(serializer),
            Self::RuntimeRef(path) => path.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Resolvable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        if let Value::String(text) = &raw
            && is_json_path(text)
        {
            return Ok(Self::RuntimeRef(JsonPath(text.clone())));
        }
        T::deserialize(raw).map(Self::Literal).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_runtime_paths() {
        assert!(is_json_path("$"));
        assert!(is_json_path("$.ClusterId"));
        assert!(is_json_path("$[0].id"));
        assert!(is_json_path("$$.Execution.Name"));
        assert!(is_json_path("States.Format('{}', $.name)"));

        assert!(!is_json_path("abc123"));
        assert!(!is_json_path("$ClusterId"));
        assert!(!is_json_path("price: $5"));
        assert!(!is_json_path(""));
    }

    #[test]
    fn json_path_rejects_literal_text() {
        let error = JsonPath::new("cluster").unwrap_err();
        assert!(matches!(error, ValueError::InvalidJsonPath { .. }));
    }

    #[test]
    fn intrinsic_calls_are_not_reference_paths() {
        assert!(JsonPath::new("$$.Execution.Name").unwrap().is_reference());
        assert!(!JsonPath::new("States.Format('{}', $.id)").unwrap().is_reference());
    }

    #[test]
    fn literal_uses_plain_parameter_key() {
        let value: Resolvable<String> = Resolvable::from("abc123");
        assert_eq!(value.to_parameter("Id"), ("Id".to_string(), Value::String("abc123".into())));
    }

    #[test]
    fn runtime_ref_uses_suffixed_parameter_key() {
        let value: Resolvable<String> = Resolvable::from("$.ClusterId");
        assert!(value.is_runtime_ref());
        assert_eq!(value.as_literal(), None);
        assert_eq!(value.to_parameter("Id"), ("Id.$".to_string(), Value::String("$.ClusterId".into())));
    }

    #[test]
    fn deserializes_strings_and_arrays() {
        let text: Resolvable<String> = serde_yaml::from_str("\"$.job.name\"").unwrap();
        assert!(text.is_runtime_ref());

        let args: Resolvable<Vec<Value>> = serde_yaml::from_str("[\"2\", \"--verbose\"]").unwrap();
        assert_eq!(args.as_literal().map(Vec::len), Some(2));

        let args_ref: Resolvable<Vec<Value>> = serde_yaml::from_str("$.args").unwrap();
        assert!(args_ref.is_runtime_ref());
    }

    #[test]
    fn serializes_back_to_plain_values() {
        let value: Resolvable<String> = Resolvable::from("$.ClusterId");
        assert_eq!(serde_json::to_value(&value).unwrap(), Value::String("$.ClusterId".into()));
        let value = Resolvable::literal(vec![Value::from("a")]);
        assert_eq!(serde_json::to_value(&value).unwrap(), serde_json::json!(["a"]));
    }
}
