//! # Payload Accessor
//!
//! Lenient typed view over the JSON objects the connector sends. Missing or
//! mistyped values read as empty rather than failing, so required-field
//! checks happen in the codec.

use serde_json::Value;
use shared_types::JsonObject;

/// Borrowed view over an (optional) JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<'a>(Option<&'a JsonObject>);

impl<'a> Payload<'a> {
    /// View over `data`.
    pub fn new(data: &'a JsonObject) -> Self {
        Self(Some(data))
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|m| m.get(key))
    }

    /// String value of `key`.
    ///
    /// Booleans and numbers are stringified; anything else reads as `""`.
    pub fn get_string(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Non-empty string value of `key`.
    pub fn get_opt_string(&self, key: &str) -> Option<String> {
        Some(self.get_string(key)).filter(|s| !s.is_empty())
    }

    /// Boolean value of `key`. Accepts `true`/`false` and their string forms.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Nested object at `key`, empty when absent or not an object.
    pub fn get_object(&self, key: &str) -> Payload<'a> {
        Payload(self.get(key).and_then(Value::as_object))
    }

    /// Owned copy of the viewed object.
    pub fn to_object(&self) -> JsonObject {
        self.0.cloned().unwrap_or_default()
    }

    /// True when there is no object or it has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.map_or(true, |m| m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> JsonObject {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_string_coerces_scalars() {
        let data = obj(json!({"s": "x", "b": true, "n": 42, "f": 1.5, "null": null, "arr": [1]}));
        let p = Payload::new(&data);
        assert_eq!(p.get_string("s"), "x");
        assert_eq!(p.get_string("b"), "true");
        assert_eq!(p.get_string("n"), "42");
        assert_eq!(p.get_string("f"), "1.5");
        assert_eq!(p.get_string("null"), "");
        assert_eq!(p.get_string("arr"), "");
        assert_eq!(p.get_string("missing"), "");
        assert_eq!(p.get_opt_string("missing"), None);
    }

    #[test]
    fn test_get_bool_accepts_strings() {
        let data = obj(json!({"a": true, "b": "true", "c": "false", "d": 1, "e": "TRUE"}));
        let p = Payload::new(&data);
        assert!(p.get_bool("a"));
        assert!(p.get_bool("b"));
        assert!(!p.get_bool("c"));
        assert!(!p.get_bool("d"));
        assert!(p.get_bool("e"));
        assert!(!p.get_bool("missing"));
    }

    #[test]
    fn test_get_object_defaults_empty() {
        let data = obj(json!({"blockchain": {"id": "000001", "info": {"transactionHash": "0xab"}}, "x": 5}));
        let p = Payload::new(&data);
        let chain = p.get_object("blockchain");
        assert_eq!(chain.get_string("id"), "000001");
        assert_eq!(chain.get_object("info").get_string("transactionHash"), "0xab");

        let missing = p.get_object("nope");
        assert!(missing.is_empty());
        assert_eq!(missing.get_object("deeper").get_string("id"), "");
        assert!(p.get_object("x").to_object().is_empty());
    }
}
