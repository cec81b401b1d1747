//! Argument sets bound to a function.
//!
//! Values are plain `serde_json::Value`s so the same argument set can be
//! checked against a [`Signature`](super::signature::Signature), invoked in
//! process, or shipped to a worker process without conversion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Positional and keyword arguments, as supplied by the caller.
///
/// Keyword order is insertion order; it determines which problem the
/// validator reports first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default, rename = "args")]
    pub positional: Vec<Value>,
    #[serde(default, rename = "kwargs")]
    pub keyword: Map<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional values only.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keyword: Map::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument. A repeated name replaces the earlier value,
    /// keyword names are unique by construction.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_in_order() {
        let args = Arguments::new().arg(1).arg("x").kwarg("b", 2.0).kwarg("a", true);
        assert_eq!(args.positional, vec![json!(1), json!("x")]);
        assert_eq!(args.keyword.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn deserializes_with_missing_sections() {
        let args: Arguments = serde_json::from_value(json!({"args": [3]})).unwrap();
        assert_eq!(args, Arguments::positional([3]));

        let args: Arguments = serde_json::from_value(json!({"kwargs": {"a": 1.0}})).unwrap();
        assert_eq!(args, Arguments::new().kwarg("a", 1.0));
    }
}
