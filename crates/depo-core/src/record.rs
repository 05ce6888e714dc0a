//! Record metadata as sent to the repository.

use serde_json::{Map, Value};

use crate::fields::{FieldDescriptor, FieldType, FieldValue, RowData};

/// Build the record JSON for one row: every catalog field that has a value,
/// in catalog order. File fields are uploaded separately and left out.
pub fn build_record(fields: &[FieldDescriptor], data: &RowData) -> Value {
    let mut out = Map::new();
    for field in fields.iter().filter(|f| f.field_type != FieldType::Files) {
        let Some(value) = data.get(&field.name).filter(|v| !v.is_empty()) else {
            continue;
        };
        let json = match value {
            FieldValue::Text(s) if field.is_array => Value::from(vec![s.clone()]),
            FieldValue::Text(s) => Value::from(s.clone()),
            FieldValue::List(items) => Value::from(items.clone()),
            FieldValue::Json(v) => v.clone(),
        };
        out.insert(field.name.clone(), json);
    }
    Value::Object(out)
}
