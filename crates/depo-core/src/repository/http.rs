//! libcurl-backed repository client.
//!
//! Each request builds a fresh easy handle and runs it on the blocking pool.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{
    Account, Enumerations, NewFile, Part, RepositoryApi, RepositoryError, UploadManifest,
};
use crate::config::DepoConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

struct Request {
    method: Method,
    url: Url,
    token: Option<String>,
    content_type: &'static str,
    body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpRepository {
    base: Url,
    token: Option<String>,
}

impl HttpRepository {
    /// `base_url` is the API root; a trailing slash is added if missing so
    /// relative endpoints resolve beneath it.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, RepositoryError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            base: Url::parse(&base)?,
            token,
        })
    }

    pub fn from_config(cfg: &DepoConfig) -> Result<Self, RepositoryError> {
        Self::new(&cfg.api_base_url, cfg.api_token())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Upload locations may be absolute or relative to the API root.
    fn location(&self, location: &str) -> Result<Url, RepositoryError> {
        match Url::parse(location) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.base.join(location)?),
            Err(e) => Err(e.into()),
        }
    }

    fn location_child(&self, location: &str, child: &str) -> Result<Url, RepositoryError> {
        let mut url = self.location(location)?;
        let path = format!("{}/{}", url.path().trim_end_matches('/'), child);
        url.set_path(&path);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, RepositoryError> {
        let req = Request {
            method,
            url,
            token: self.token.clone(),
            content_type,
            body,
        };
        tokio::task::spawn_blocking(move || perform(req)).await?
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RepositoryError> {
        let body = self.send(Method::Get, url, "application/json", Vec::new()).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        payload: &impl serde::Serialize,
    ) -> Result<T, RepositoryError> {
        let body = serde_json::to_vec(payload)?;
        let resp = self.send(Method::Post, url, "application/json", body).await?;
        Ok(serde_json::from_slice(&resp)?)
    }
}

/// Runs in the current thread; called from `spawn_blocking`.
fn perform(req: Request) -> Result<Vec<u8>, RepositoryError> {
    let mut response = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(req.url.as_str())?;
    easy.follow_location(true)?;
    easy.max_redirections(5)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    match req.method {
        Method::Get => easy.get(true)?,
        Method::Post => {
            easy.post(true)?;
            easy.post_fields_copy(&req.body)?;
        }
        Method::Put => {
            easy.custom_request("PUT")?;
            easy.post_fields_copy(&req.body)?;
        }
    }

    let mut list = curl::easy::List::new();
    // No "100-continue" round trip before part bodies.
    list.append("Expect:")?;
    list.append(&format!("Content-Type: {}", req.content_type))?;
    list.append("Accept: application/json")?;
    if let Some(token) = &req.token {
        list.append(&format!("Authorization: Bearer {}", token))?;
    }
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            response.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    tracing::debug!(
        method = req.method.as_str(),
        url = %req.url,
        code,
        sent = req.body.len(),
        received = response.len(),
        "repository request"
    );
    if !(200..300).contains(&code) {
        let mut body = String::from_utf8_lossy(&response).into_owned();
        if body.len() > 200 {
            let cut = (0..=200).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
            body.truncate(cut);
        }
        return Err(RepositoryError::Status { code, body });
    }
    Ok(response)
}

#[derive(Deserialize)]
struct RecordCreated {
    id: u64,
}

#[derive(Deserialize)]
struct UploadInitiated {
    location: String,
}

#[async_trait]
impl RepositoryApi for HttpRepository {
    async fn account(&self) -> Result<Account, RepositoryError> {
        self.get_json(self.base.join("account")?).await
    }

    async fn enumerations(&self) -> Result<Enumerations, RepositoryError> {
        self.get_json(self.base.join("enumerations")?).await
    }

    async fn create_record(&self, record: &serde_json::Value) -> Result<u64, RepositoryError> {
        let created: RecordCreated = self.post_json(self.base.join("records")?, record).await?;
        Ok(created.id)
    }

    async fn initiate_upload(
        &self,
        record_id: u64,
        file: &NewFile,
    ) -> Result<String, RepositoryError> {
        let url = self.base.join(&format!("records/{}/files", record_id))?;
        let initiated: UploadInitiated = self.post_json(url, file).await?;
        Ok(initiated.location)
    }

    async fn fetch_manifest(&self, location: &str) -> Result<UploadManifest, RepositoryError> {
        self.get_json(self.location(location)?).await
    }

    async fn put_part(
        &self,
        location: &str,
        part: &Part,
        bytes: Vec<u8>,
    ) -> Result<(), RepositoryError> {
        let url = self.location_child(location, &part.part_no.to_string())?;
        self.send(Method::Put, url, "application/octet-stream", bytes)
            .await?;
        Ok(())
    }

    async fn complete_upload(&self, location: &str) -> Result<(), RepositoryError> {
        let url = self.location_child(location, "complete")?;
        self.send(Method::Post, url, "application/json", Vec::new())
            .await?;
        Ok(())
    }
}
