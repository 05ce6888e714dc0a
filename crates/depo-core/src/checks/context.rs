//! Inputs shared by every check of a batch, and the per-row scratch record.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{CountBounds, DepoConfig, LengthConstraint};
use crate::fields::{self, FieldDescriptor, FieldMapping};
use crate::files::{HostCapabilities, RootDir};

/// Read-only context for one batch. Shared by all rows.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub fields: Vec<FieldDescriptor>,
    /// Header row of the sheet, positional.
    pub headers: Vec<String>,
    pub mapping: FieldMapping,
    pub list_delimiter: String,
    pub host: HostCapabilities,
    pub root: Option<Arc<RootDir>>,
    pub keywords: Option<CountBounds>,
    pub categories: Option<CountBounds>,
    pub constraints: BTreeMap<String, LengthConstraint>,
    pub fuzzy_threshold: f64,
}

impl CheckContext {
    pub fn from_config(cfg: &DepoConfig, headers: Vec<String>, root: Option<RootDir>) -> Self {
        Self {
            mapping: FieldMapping::new(&cfg.fields, &cfg.headers),
            fields: cfg.fields.clone(),
            headers,
            list_delimiter: cfg.list_delimiter.clone(),
            host: HostCapabilities::detect(),
            root: root.map(Arc::new),
            keywords: cfg.keywords,
            categories: cfg.categories,
            constraints: cfg.constraints.clone(),
            fuzzy_threshold: cfg.fuzzy_threshold,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        fields::find(&self.fields, name)
    }

    /// Fill select options for `field` (e.g. from repository enumerations).
    pub fn set_options(&mut self, field: &str, options: Vec<String>) {
        if let Some(f) = self.fields.iter_mut().find(|f| f.name == field) {
            f.options = Some(options);
        }
    }
}

/// A file reference that resolved under the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub name: String,
    pub size: u64,
}

/// Mutable scratch owned by one row task.
///
/// Written only by the files check: `quota_used` (sum of referenced file
/// sizes) and `files`. Read by the quota aggregate and the uploader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowScratch {
    pub quota_used: u64,
    pub files: Vec<ResolvedFile>,
}
