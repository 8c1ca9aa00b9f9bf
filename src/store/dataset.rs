//! Local dataset directory backend.
//!
//! ```text
//! dataset/
//! ├── documents.ndjson     # one JSON document per line, sorted by _id
//! └── assets/
//!     ├── <hash>-4x3.png   # image uploads
//!     └── <hash>.mp4       # file uploads
//! ```
//!
//! The NDJSON layout matches a content lake export, so a dataset directory
//! can be imported into a hosted project as-is. Every write rewrites the
//! documents file through a temp file and rename; a crash mid-write leaves
//! the previous version intact.

use super::{AssetKind, AssetStore, DocumentStore, StoreError, UploadedAsset};
use crate::mutation::Patch;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DOCUMENTS_FILENAME: &str = "documents.ndjson";
const ASSETS_DIR: &str = "assets";

pub struct DatasetStore {
    root: PathBuf,
    /// Documents keyed by `_id`.
    documents: BTreeMap<String, Value>,
}

impl DatasetStore {
    /// Open a dataset directory, creating it when missing.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root.join(ASSETS_DIR))?;
        let path = root.join(DOCUMENTS_FILENAME);
        let mut documents = BTreeMap::new();
        if path.exists() {
            for (line_no, line) in fs::read_to_string(&path)?.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let doc: Value = serde_json::from_str(line).map_err(|e| {
                    StoreError::InvalidDocument(format!(
                        "{}:{}: {e}",
                        path.display(),
                        line_no + 1
                    ))
                })?;
                let id = doc
                    .get("_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        StoreError::InvalidDocument(format!(
                            "{}:{}: document has no _id",
                            path.display(),
                            line_no + 1
                        ))
                    })?
                    .to_string();
                documents.insert(id, doc);
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            documents,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of stored documents, asset records included.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Path of the stored binary for an asset id, if the asset exists.
    pub fn asset_path(&self, asset_id: &str) -> Option<PathBuf> {
        self.documents
            .get(asset_id)
            .and_then(|d| d.get("path"))
            .and_then(Value::as_str)
            .map(|p| self.root.join(p))
    }

    fn persist(&self) -> Result<(), StoreError> {
        let mut out = String::new();
        for doc in self.documents.values() {
            out.push_str(&serde_json::to_string(doc)?);
            out.push('\n');
        }
        let path = self.root.join(DOCUMENTS_FILENAME);
        let tmp = self.root.join(format!("{DOCUMENTS_FILENAME}.tmp"));
        fs::write(&tmp, out)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Store a document and persist the dataset. A failed write restores
    /// the previous in-memory state.
    fn write(&mut self, id: &str, document: Value) -> Result<(), StoreError> {
        let previous = self.documents.insert(id.to_string(), document);
        if let Err(e) = self.persist() {
            match previous {
                Some(previous) => self.documents.insert(id.to_string(), previous),
                None => self.documents.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_revision() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Stamp the system fields a content lake maintains on every write.
fn stamp(document: &mut Value, created: bool) {
    if let Some(object) = document.as_object_mut() {
        let timestamp = now();
        if created {
            object.insert("_createdAt".into(), Value::String(timestamp.clone()));
        }
        object.insert("_updatedAt".into(), Value::String(timestamp));
        object.insert("_rev".into(), Value::String(new_revision()));
    }
}

impl AssetStore for DatasetStore {
    fn upload(
        &mut self,
        kind: AssetKind,
        bytes: &[u8],
        filename: &str,
    ) -> Result<UploadedAsset, StoreError> {
        let id = super::asset_id(kind, bytes, filename)?;
        if self.documents.contains_key(&id) {
            tracing::debug!(asset = %id, "asset already stored");
            return Ok(UploadedAsset { id, kind });
        }

        let extension = super::asset_extension(filename);
        let hash = super::content_hash(bytes);
        let mut record = json!({
            "_id": id,
            "_type": kind.document_type(),
            "originalFilename": filename,
            "extension": extension,
            "size": bytes.len(),
            "sha256hash": hash,
        });
        let stored_name = match kind {
            AssetKind::Image => {
                let (width, height) = super::image_dimensions(bytes, filename)?;
                record["metadata"] = json!({
                    "dimensions": {
                        "width": width,
                        "height": height,
                        "aspectRatio": f64::from(width) / f64::from(height.max(1)),
                    }
                });
                format!("{hash}-{width}x{height}.{extension}")
            }
            AssetKind::File => format!("{hash}.{extension}"),
        };
        let relative = format!("{ASSETS_DIR}/{stored_name}");
        record["path"] = Value::String(relative.clone());

        let target = self.root.join(&relative);
        let tmp = target.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &target)?;

        stamp(&mut record, true);
        self.write(&id, record)?;
        Ok(UploadedAsset { id, kind })
    }
}

impl DocumentStore for DatasetStore {
    fn create(&mut self, mut document: Value) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut document)?;
        if self.documents.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        stamp(&mut document, true);
        self.write(&id, document)?;
        Ok(id)
    }

    fn commit(&mut self, patch: &Patch) -> Result<(), StoreError> {
        let mut updated = self
            .documents
            .get(&patch.id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(patch.id.clone()))?;
        patch.apply(&mut updated)?;
        stamp(&mut updated, false);
        self.write(&patch.id, updated)
    }

    fn documents(&self, doc_type: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .documents
            .values()
            .filter(|d| d.get("_type").and_then(Value::as_str) == Some(doc_type))
            .cloned()
            .collect())
    }

    fn get(&self, id: &str, doc_type: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .documents
            .get(id)
            .filter(|d| d.get("_type").and_then(Value::as_str) == Some(doc_type))
            .cloned())
    }
}
