//! Expanded cell values keyed by field name.

use serde::Serialize;
use std::collections::BTreeMap;

/// A row after the read step: field name -> value. Empty cells are absent.
pub type RowData = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Json(v) => v.is_null(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Number of entries: 1 for text, list length for lists, 0 for JSON.
    pub fn count(&self) -> usize {
        match self {
            FieldValue::Text(s) if s.trim().is_empty() => 0,
            FieldValue::Text(_) => 1,
            FieldValue::List(items) => items.len(),
            FieldValue::Json(_) => 0,
        }
    }

    /// Text or list entries as a flat list of strings.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(s) => vec![s.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
            FieldValue::Json(_) => Vec::new(),
        }
    }
}
