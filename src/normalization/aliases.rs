use serde_json::{Map, Value};

/// Ordered candidate names for one logical field. Lookup tries each name
/// in turn and the first usable value wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub names: &'static [&'static str],
}

impl FieldAliases {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// First candidate that renders to a scalar string.
    pub fn scalar(&self, obj: &Map<String, Value>) -> Option<String> {
        self.names
            .iter()
            .filter_map(|name| obj.get(*name))
            .find_map(scalar_text)
    }

    /// First candidate holding a JSON array. Non-list values count as absent.
    pub fn list<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a Vec<Value>> {
        self.names
            .iter()
            .filter_map(|name| obj.get(*name))
            .find_map(Value::as_array)
    }
}

/// Strings as-is, numbers and booleans as their JSON text. Null, empty
/// strings, arrays and objects give `None`.
pub fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
