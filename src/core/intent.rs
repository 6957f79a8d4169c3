use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Environment variable prefix for intent parameters injected into scripts.
pub const ENV_PREFIX: &str = "LCA_";

/// Normalized output of the NLU collaborator: a mandatory action plus an
/// open string-keyed parameter bag. Immutable once produced.
///
/// The bag is a `BTreeMap` so every serialization of the same intent is
/// byte-identical, which matters for the semantic search text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub action: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, String>,
}

impl Intent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Degenerate intent substituted when the NLU collaborator fails.
    pub fn unknown(query: &str) -> Self {
        Self::new("unknown").with_param("query", query)
    }

    /// Build an intent from a JSON object produced by the NLU model.
    /// `action` defaults to `"unknown"` when absent; remaining scalar values
    /// are stringified, nested values are dropped.
    pub fn from_json(value: &Value) -> Self {
        let mut intent = Self::new("unknown");
        let Some(map) = value.as_object() else {
            return intent;
        };
        for (key, val) in map {
            let Some(text) = stringify_scalar(val) else {
                continue;
            };
            if key == "action" {
                intent.action = text;
            } else {
                intent.params.insert(key.clone(), text);
            }
        }
        intent
    }

    /// Canonical serialization used as the semantic search query.
    pub fn search_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.action.clone())
    }

    /// `LCA_<KEY>` environment overlays for script execution, including the
    /// action itself.
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![(
            format!("{}ACTION", ENV_PREFIX),
            self.action.clone(),
        )];
        for (key, value) in &self.params {
            pairs.push((format!("{}{}", ENV_PREFIX, key.to_uppercase()), value.clone()));
        }
        pairs
    }
}

fn stringify_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
