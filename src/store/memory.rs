//! In-memory store.
//!
//! Backs `--dry-run` (seeded with a snapshot of the real store so duplicate
//! checks still see existing documents) and unit tests. Uploads are recorded
//! but their bytes are dropped.

use super::{AssetKind, AssetStore, DocumentStore, StoreError, UploadedAsset};
use crate::mutation::Patch;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Vec<Value>,
    uploads: Vec<(UploadedAsset, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with existing documents.
    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            documents,
            uploads: Vec::new(),
        }
    }

    /// Uploaded assets with their original filenames, in upload order.
    pub fn uploads(&self) -> &[(UploadedAsset, String)] {
        &self.uploads
    }

    pub fn all_documents(&self) -> &[Value] {
        &self.documents
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|d| d.get("_id").and_then(Value::as_str) == Some(id))
    }
}

impl AssetStore for MemoryStore {
    fn upload(
        &mut self,
        kind: AssetKind,
        bytes: &[u8],
        filename: &str,
    ) -> Result<UploadedAsset, StoreError> {
        let uploaded = UploadedAsset {
            id: super::asset_id(kind, bytes, filename)?,
            kind,
        };
        self.uploads.push((uploaded.clone(), filename.to_string()));
        Ok(uploaded)
    }
}

impl DocumentStore for MemoryStore {
    fn create(&mut self, mut document: Value) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut document)?;
        if self.position(&id).is_some() {
            return Err(StoreError::AlreadyExists(id));
        }
        self.documents.push(document);
        Ok(id)
    }

    fn commit(&mut self, patch: &Patch) -> Result<(), StoreError> {
        let index = self
            .position(&patch.id)
            .ok_or_else(|| StoreError::NotFound(patch.id.clone()))?;
        let mut updated = self.documents[index].clone();
        patch.apply(&mut updated)?;
        self.documents[index] = updated;
        Ok(())
    }

    fn documents(&self, doc_type: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .documents
            .iter()
            .filter(|d| d.get("_type").and_then(Value::as_str) == Some(doc_type))
            .cloned()
            .collect())
    }
}
