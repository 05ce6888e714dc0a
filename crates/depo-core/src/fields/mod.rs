//! Field descriptors: the named, typed columns a record is made of.
//!
//! Descriptors come from configuration and are read-only to every check.
//! The built-in catalog matches what the repository accepts for an item;
//! `config.toml` may replace it.

mod mapping;
mod schema;
mod value;

use serde::{Deserialize, Serialize};

pub use mapping::FieldMapping;
pub use schema::{JsonKind, JsonSchema, PropertySpec, SchemaReport};
pub use value::{FieldValue, RowData};

/// Field holding the record title; used by the uniqueness check.
pub const TITLE_FIELD: &str = "title";
pub const KEYWORDS_FIELD: &str = "keywords";
pub const CATEGORIES_FIELD: &str = "categories";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    /// Value must come from `options`.
    Select,
    Date,
    /// File names relative to the granted root directory.
    Files,
    /// JSON document, optionally checked against `schema`.
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonSchema>,
}

impl FieldDescriptor {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            is_mandatory: false,
            options: None,
            is_array: false,
            schema: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.is_mandatory = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_schema(mut self, schema: JsonSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Files fields are always lists, whatever `is_array` says.
    pub fn is_list(&self) -> bool {
        self.is_array || self.field_type == FieldType::Files
    }
}

/// Built-in field catalog. Select options are empty here and filled from the
/// repository enumerations (or config) before a batch runs.
pub fn default_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new(TITLE_FIELD, FieldType::Text).mandatory(),
        FieldDescriptor::new("description", FieldType::Text).mandatory(),
        FieldDescriptor::new(KEYWORDS_FIELD, FieldType::Text).array(),
        FieldDescriptor::new(CATEGORIES_FIELD, FieldType::Select).array(),
        FieldDescriptor::new("license", FieldType::Select),
        FieldDescriptor::new("item_type", FieldType::Select).mandatory(),
        FieldDescriptor::new("group", FieldType::Select),
        FieldDescriptor::new("published_date", FieldType::Date),
        FieldDescriptor::new("files", FieldType::Files),
        FieldDescriptor::new("custom_fields", FieldType::Json),
    ]
}

/// Look up a descriptor by name.
pub fn find<'a>(fields: &'a [FieldDescriptor], name: &str) -> Option<&'a FieldDescriptor> {
    fields.iter().find(|f| f.name == name)
}
