//! Minimal JSON shape checks for `Json` fields.
//!
//! A schema lists the known top-level keys of an object, the kind of value
//! each must hold, and whether it is required. Unknown keys are reported
//! but tolerated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl JsonKind {
    fn matches(self, v: &Value) -> bool {
        match self {
            JsonKind::String => v.is_string(),
            JsonKind::Number => v.is_number(),
            JsonKind::Boolean => v.is_boolean(),
            JsonKind::Array => v.is_array(),
            JsonKind::Object => v.is_object(),
            JsonKind::Any => true,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            JsonKind::String => "string",
            JsonKind::Number => "number",
            JsonKind::Boolean => "boolean",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
            JsonKind::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub kind: JsonKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySpec>,
}

/// Outcome of a successful schema check.
#[derive(Debug, Default, PartialEq)]
pub struct SchemaReport {
    /// Keys present in the document but not declared in the schema.
    pub unknown_keys: Vec<String>,
}

impl JsonSchema {
    pub fn property(mut self, name: &str, kind: JsonKind, required: bool) -> Self {
        self.properties
            .insert(name.to_string(), PropertySpec { kind, required });
        self
    }

    /// Check `doc` against the schema. `Err` carries a description of the
    /// first violation.
    pub fn validate(&self, doc: &Value) -> Result<SchemaReport, String> {
        let obj = doc
            .as_object()
            .ok_or_else(|| "expected a JSON object".to_string())?;

        for (name, prop) in &self.properties {
            match obj.get(name) {
                None if prop.required => return Err(format!("missing required key '{}'", name)),
                None => {}
                Some(v) if !prop.kind.matches(v) => {
                    return Err(format!(
                        "key '{}' must be {}",
                        name,
                        prop.kind.as_str()
                    ))
                }
                Some(_) => {}
            }
        }

        let unknown_keys = obj
            .keys()
            .filter(|k| !self.properties.contains_key(*k))
            .cloned()
            .collect();
        Ok(SchemaReport { unknown_keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> JsonSchema {
        JsonSchema::default()
            .property("funder", JsonKind::String, true)
            .property("grant", JsonKind::Number, false)
    }

    #[test]
    fn accepts_matching_document() {
        let r = schema().validate(&json!({"funder": "ERC", "grant": 42})).unwrap();
        assert!(r.unknown_keys.is_empty());
    }

    #[test]
    fn reports_unknown_keys() {
        let r = schema()
            .validate(&json!({"funder": "ERC", "colour": "red"}))
            .unwrap();
        assert_eq!(r.unknown_keys, vec!["colour".to_string()]);
    }

    #[test]
    fn rejects_missing_required_and_wrong_kind() {
        assert!(schema().validate(&json!({"grant": 1})).unwrap_err().contains("funder"));
        let err = schema()
            .validate(&json!({"funder": "ERC", "grant": "lots"}))
            .unwrap_err();
        assert!(err.contains("grant"));
        assert!(schema().validate(&json!([1, 2])).is_err());
    }
}
