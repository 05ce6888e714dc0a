//! Remote repository API: account quota, vocabularies, record creation and
//! the chunked file-upload protocol.
//!
//! [`RepositoryApi`] is the seam the uploader talks to; [`HttpRepository`]
//! implements it over libcurl.

mod http;
mod parts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::checks::CheckContext;

pub use http::HttpRepository;
pub use parts::Part;
#[cfg(test)]
pub(crate) use parts::plan_parts;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("transport error: {0}")]
    Transport(#[from] curl::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP {code}: {body}")]
    Status { code: u32, body: String },
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Account storage figures, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub quota: u64,
    pub used_quota: u64,
}

impl Account {
    pub fn remaining(&self) -> u64 {
        self.quota.saturating_sub(self.used_quota)
    }
}

/// Controlled vocabularies published by the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerations {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    #[serde(default)]
    pub item_types: Vec<String>,
}

impl Enumerations {
    /// Use the non-empty vocabularies as option sets for their fields.
    pub fn apply_to(&self, ctx: &mut CheckContext) {
        let pairs = [
            ("group", &self.groups),
            ("categories", &self.categories),
            ("license", &self.licenses),
            ("item_type", &self.item_types),
        ];
        for (field, options) in pairs {
            if !options.is_empty() {
                ctx.set_options(field, options.clone());
            }
        }
    }
}

/// File announcement sent before its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFile {
    pub name: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the content.
    pub hash: String,
}

/// Server-side state of an initiated upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadManifest {
    pub status: String,
    pub parts: Vec<Part>,
}

#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn account(&self) -> Result<Account, RepositoryError>;

    async fn enumerations(&self) -> Result<Enumerations, RepositoryError>;

    /// Create a record from its metadata JSON; returns the record id.
    async fn create_record(&self, record: &serde_json::Value) -> Result<u64, RepositoryError>;

    /// Announce a file; returns the upload location.
    async fn initiate_upload(&self, record_id: u64, file: &NewFile)
        -> Result<String, RepositoryError>;

    async fn fetch_manifest(&self, location: &str) -> Result<UploadManifest, RepositoryError>;

    async fn put_part(&self, location: &str, part: &Part, bytes: Vec<u8>)
        -> Result<(), RepositoryError>;

    async fn complete_upload(&self, location: &str) -> Result<(), RepositoryError>;
}
