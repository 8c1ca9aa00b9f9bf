//! Hosted content lake backend.
//!
//! Talks to the HTTP API with a blocking client:
//!
//! - `GET  /v<api>/data/query/<dataset>?query=..` for reads
//! - `POST /v<api>/data/mutate/<dataset>` for creates and patches
//! - `POST /v<api>/assets/{images,files}/<dataset>` for uploads
//!
//! Every request carries the bearer token read from the environment.

use super::{AssetKind, AssetStore, DocumentStore, StoreError, UploadedAsset};
use crate::config::StoreConfig;
use crate::mutation::{Mutation, MutationResponse, Patch};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const TYPE_QUERY: &str = "*[_type == $type]";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpStore {
    client: Client,
    token: String,
    base_url: String,
    api_version: String,
    dataset: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Value,
}

#[derive(Deserialize)]
struct AssetResponse {
    document: AssetDocument,
}

#[derive(Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
}

impl HttpStore {
    pub fn new(config: &StoreConfig, token: String) -> Result<Self, StoreError> {
        let base_url = match (&config.api_host, &config.project_id) {
            (Some(host), _) => host.trim_end_matches('/').to_string(),
            (None, Some(project)) => format!("https://{project}.api.sanity.io"),
            (None, None) => {
                return Err(StoreError::InvalidDocument(
                    "store.project_id or store.api_host is required".into(),
                ));
            }
        };
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            token,
            base_url,
            api_version: config.api_version.trim_start_matches('v').to_string(),
            dataset: config.dataset.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v{}/{}/{}",
            self.base_url, self.api_version, path, self.dataset
        )
    }

    pub fn query_url(&self) -> String {
        self.endpoint("data/query")
    }

    pub fn mutate_url(&self) -> String {
        self.endpoint("data/mutate")
    }

    pub fn asset_url(&self, kind: AssetKind) -> String {
        self.endpoint(&format!("assets/{}", kind.endpoint()))
    }

    fn mutate(&self, mutations: &[Mutation]) -> Result<MutationResponse, StoreError> {
        let response = self
            .client
            .post(self.mutate_url())
            .query(&[("returnIds", "true")])
            .bearer_auth(&self.token)
            .json(&mutation_body(mutations))
            .send()?;
        Ok(check(response)?.json()?)
    }
}

/// Request body for a mutation transaction.
pub fn mutation_body(mutations: &[Mutation]) -> Value {
    json!({ "mutations": mutations })
}

/// Turn a non-success status into [`StoreError::Rejected`] with the body text.
fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message: rejection_message(&message),
    })
}

/// Pull the human-readable part out of an error body.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/description")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn content_type(filename: &str) -> &'static str {
    match super::asset_extension(filename).as_str() {
        "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

impl AssetStore for HttpStore {
    fn upload(
        &mut self,
        kind: AssetKind,
        bytes: &[u8],
        filename: &str,
    ) -> Result<UploadedAsset, StoreError> {
        let response = self
            .client
            .post(self.asset_url(kind))
            .query(&[("filename", filename)])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type(filename))
            .body(bytes.to_vec())
            .send()?;
        let asset: AssetResponse = check(response)?.json()?;
        Ok(UploadedAsset {
            id: asset.document.id,
            kind,
        })
    }
}

impl DocumentStore for HttpStore {
    fn create(&mut self, mut document: Value) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut document)?;
        let response = self.mutate(&[Mutation::Create(document)])?;
        tracing::debug!(transaction = %response.transaction_id, id = %id, "created");
        Ok(response
            .results
            .into_iter()
            .next()
            .map(|r| r.id)
            .unwrap_or(id))
    }

    fn commit(&mut self, patch: &Patch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Err(crate::mutation::PatchError::Empty {
                id: patch.id.clone(),
            }
            .into());
        }
        let response = self.mutate(&[Mutation::Patch(patch.clone())])?;
        if response.results.is_empty() {
            return Err(StoreError::NotFound(patch.id.clone()));
        }
        Ok(())
    }

    fn documents(&self, doc_type: &str) -> Result<Vec<Value>, StoreError> {
        let type_param = serde_json::to_string(doc_type)?;
        let response = self
            .client
            .get(self.query_url())
            .query(&[("query", TYPE_QUERY), ("$type", type_param.as_str())])
            .bearer_auth(&self.token)
            .send()?;
        let body: QueryResponse = check(response)?.json()?;
        match body.result {
            Value::Array(docs) => Ok(docs),
            Value::Null => Ok(Vec::new()),
            other => Err(StoreError::InvalidDocument(format!(
                "expected an array of documents, got {other}"
            ))),
        }
    }
}
