//! Content store backends.
//!
//! A store holds two things: binary assets (image and file uploads) and JSON
//! documents. The [`AssetStore`] and [`DocumentStore`] traits split those
//! concerns so the rest of the crate is backend-agnostic:
//!
//! | Backend | Module | Used by |
//! |---------|--------|---------|
//! | Local dataset directory | [`dataset`] | default, tests, offline work |
//! | Hosted content lake over HTTPS | [`http`] | `backend = "http"` |
//! | In-memory | [`memory`] | `--dry-run`, unit tests |
//!
//! Stores are constructed from config by [`open`] and passed explicitly to
//! whatever needs them; there is no process-wide client.
//!
//! ## Asset ids
//!
//! Asset ids are content-addressed so re-uploading the same bytes yields the
//! same id:
//!
//! ```text
//! image-<sha256 prefix>-<width>x<height>-<ext>
//! file-<sha256 prefix>-<ext>
//! ```

pub mod dataset;
pub mod http;
pub mod memory;

use crate::config::{Backend, StoreConfig};
use crate::mutation::{Patch, PatchError};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

pub use dataset::DatasetStore;
pub use http::HttpStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Document {0} not found")]
    NotFound(String),
    #[error("Document {0} already exists")]
    AlreadyExists(String),
    #[error("Patch failed: {0}")]
    Patch(#[from] PatchError),
    #[error("Missing API credential: set the {0} environment variable")]
    MissingCredential(String),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    #[error("Could not read image {filename}: {source}")]
    Image {
        filename: String,
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    File,
}

impl AssetKind {
    /// Document type of the asset record the store keeps for an upload.
    pub fn document_type(&self) -> &'static str {
        match self {
            AssetKind::Image => "sanity.imageAsset",
            AssetKind::File => "sanity.fileAsset",
        }
    }

    /// Path segment of the upload endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::File => "files",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Image => f.write_str("image"),
            AssetKind::File => f.write_str("file"),
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub id: String,
    pub kind: AssetKind,
}

/// Binary asset uploads.
pub trait AssetStore {
    /// Upload raw bytes, returning the asset id to reference from documents.
    fn upload(
        &mut self,
        kind: AssetKind,
        bytes: &[u8],
        filename: &str,
    ) -> Result<UploadedAsset, StoreError>;
}

/// Document reads and writes.
pub trait DocumentStore {
    /// Create a document. A missing `_id` is generated. Returns the stored id.
    fn create(&mut self, document: Value) -> Result<String, StoreError>;

    /// Apply a patch to an existing document.
    fn commit(&mut self, patch: &Patch) -> Result<(), StoreError>;

    /// All documents of one `_type`.
    fn documents(&self, doc_type: &str) -> Result<Vec<Value>, StoreError>;

    /// Look up a document by id.
    fn get(&self, id: &str, doc_type: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .documents(doc_type)?
            .into_iter()
            .find(|d| d.get("_id").and_then(Value::as_str) == Some(id)))
    }
}

/// A store offering both assets and documents.
pub trait ContentStore: AssetStore + DocumentStore {}

impl<T: AssetStore + DocumentStore> ContentStore for T {}

/// Read the API token from the environment variable named in config.
pub fn credential(config: &StoreConfig) -> Result<String, StoreError> {
    std::env::var(&config.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| StoreError::MissingCredential(config.token_env.clone()))
}

/// Construct the configured store.
///
/// The http backend fails here, before any work starts, when its credential
/// is missing.
pub fn open(config: &StoreConfig) -> Result<Box<dyn ContentStore>, StoreError> {
    match config.backend {
        Backend::Dataset => Ok(Box::new(DatasetStore::open(&config.dataset_dir)?)),
        Backend::Http => {
            let token = credential(config)?;
            Ok(Box::new(HttpStore::new(config, token)?))
        }
    }
}

/// Generate a document id.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Ensure a document has an `_id`, generating one when absent or empty.
pub(crate) fn ensure_id(document: &mut Value) -> Result<String, StoreError> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".into()))?;
    if object.get("_type").and_then(Value::as_str).is_none() {
        return Err(StoreError::InvalidDocument("document has no _type".into()));
    }
    match object.get("_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => {
            let id = new_document_id();
            object.insert("_id".into(), Value::String(id.clone()));
            Ok(id)
        }
    }
}

/// Length of the hash segment in asset ids.
const HASH_PREFIX_LEN: usize = 40;

/// SHA-256 of `bytes` as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Lower-cased extension of `filename`, with `jpeg` folded into `jpg`.
pub fn asset_extension(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_ascii_lowercase();
    if ext == "jpeg" { "jpg".to_string() } else { ext }
}

/// Pixel dimensions of an encoded image.
pub fn image_dimensions(bytes: &[u8], filename: &str) -> Result<(u32, u32), StoreError> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.into_dimensions().map_err(|source| StoreError::Image {
        filename: filename.to_string(),
        source,
    })
}

/// Content-addressed id for an upload.
pub fn asset_id(kind: AssetKind, bytes: &[u8], filename: &str) -> Result<String, StoreError> {
    let hash = content_hash(bytes);
    let prefix = &hash[..HASH_PREFIX_LEN];
    let ext = asset_extension(filename);
    match kind {
        AssetKind::Image => {
            let (width, height) = image_dimensions(bytes, filename)?;
            Ok(format!("image-{prefix}-{width}x{height}-{ext}"))
        }
        AssetKind::File => Ok(format!("file-{prefix}-{ext}")),
    }
}
