//! Sheet header -> field name mapping.

use std::collections::BTreeMap;

use super::FieldDescriptor;

/// Case- and whitespace-insensitive lookup from a sheet header to a field name.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    by_header: BTreeMap<String, String>,
}

fn normalize(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl FieldMapping {
    /// Build from explicit `header -> field` pairs, then let every field also
    /// match a header spelled like its own name.
    pub fn new(fields: &[FieldDescriptor], headers: &BTreeMap<String, String>) -> Self {
        let mut by_header = BTreeMap::new();
        for f in fields {
            by_header.insert(normalize(&f.name), f.name.clone());
            by_header.insert(normalize(&f.name.replace('_', " ")), f.name.clone());
        }
        for (header, field) in headers {
            by_header.insert(normalize(header), field.clone());
        }
        Self { by_header }
    }

    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.by_header.get(&normalize(header)).map(String::as_str)
    }
}
