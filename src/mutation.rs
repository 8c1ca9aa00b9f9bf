//! Mutation types following the content lake's mutation protocol.
//!
//! A transaction is a list of mutations, serialized externally tagged:
//! `{"create": {...document}}` or `{"patch": {"id": .., "set": {..}, "unset": [..]}}`.
//! [`Patch`] doubles as the builder used by migrations and page import, and
//! [`Patch::apply`] is how the local dataset store executes it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    Create(Value),
    Patch(Patch),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("Patch for {id} is empty")]
    Empty { id: String },
    #[error("Field {path} is managed by the store and cannot be patched")]
    SystemField { path: String },
    #[error("Cannot set {path}: {parent} is not an object")]
    NotAnObject { path: String, parent: String },
}

/// Set and unset operations against one document.
///
/// `set` is applied before `unset`. Paths are dotted field paths
/// (`mainImage.alt`); intermediate objects are created on set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unset: Option<Vec<String>>,
}

impl Patch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            set: None,
            unset: None,
        }
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set
            .get_or_insert_with(Map::new)
            .insert(path.into(), value.into());
        self
    }

    pub fn unset(mut self, path: impl Into<String>) -> Self {
        self.unset.get_or_insert_with(Vec::new).push(path.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.as_ref().is_none_or(Map::is_empty)
            && self.unset.as_ref().is_none_or(Vec::is_empty)
    }

    /// Apply this patch to a stored document in place.
    pub fn apply(&self, document: &mut Value) -> Result<(), PatchError> {
        if self.is_empty() {
            return Err(PatchError::Empty {
                id: self.id.clone(),
            });
        }
        let paths = self
            .set
            .iter()
            .flat_map(|m| m.keys())
            .chain(self.unset.iter().flatten());
        for path in paths {
            if is_system_path(path) {
                return Err(PatchError::SystemField { path: path.clone() });
            }
        }

        for (path, value) in self.set.iter().flatten() {
            set_path(document, path, value.clone())?;
        }
        for path in self.unset.iter().flatten() {
            unset_path(document, path);
        }
        Ok(())
    }
}

fn is_system_path(path: &str) -> bool {
    let head = path.split('.').next().unwrap_or(path);
    matches!(
        head,
        "_id" | "_type" | "_rev" | "_createdAt" | "_updatedAt"
    )
}

fn set_path(document: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop().unwrap_or(path);
    let mut current = document;
    let mut walked = String::new();

    for segment in segments {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);
        let object = current.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
            path: path.to_string(),
            parent: walked.clone(),
        })?;
        current = object
            .entry(segment)
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let object = current.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
        path: path.to_string(),
        parent: if walked.is_empty() {
            "document".to_string()
        } else {
            walked
        },
    })?;
    object.insert(last.to_string(), value);
    Ok(())
}

/// Unsetting a path that does not exist is a no-op.
fn unset_path(document: &mut Value, path: &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut current = document;
    for segment in segments {
        match current.get_mut(segment) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(object) = current.as_object_mut() {
        object.remove(last);
    }
}

/// Result of a mutation transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub transaction_id: String,
    #[serde(default)]
    pub results: Vec<MutationResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResult {
    pub id: String,
    #[serde(default)]
    pub operation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mutations_serialize_externally_tagged() {
        let create = Mutation::Create(json!({"_type": "artwork", "title": "Visit"}));
        assert_eq!(
            serde_json::to_value(&create).unwrap(),
            json!({"create": {"_type": "artwork", "title": "Visit"}})
        );

        let patch = Mutation::Patch(Patch::new("a1").set("category", "painting").unset("meduium"));
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"patch": {"id": "a1", "set": {"category": "painting"}, "unset": ["meduium"]}})
        );
    }

    #[test]
    fn set_only_patch_omits_unset() {
        let value = serde_json::to_value(Patch::new("a1").set("featured", true)).unwrap();
        assert!(value.get("unset").is_none());
    }

    #[test]
    fn apply_sets_then_unsets() {
        let mut doc = json!({"_id": "a1", "_type": "artwork", "meduium": "Oil"});
        Patch::new("a1")
            .set("medium", "Oil")
            .unset("meduium")
            .apply(&mut doc)
            .unwrap();
        assert_eq!(doc, json!({"_id": "a1", "_type": "artwork", "medium": "Oil"}));
    }

    #[test]
    fn apply_creates_nested_objects() {
        let mut doc = json!({"_id": "a1"});
        Patch::new("a1")
            .set("mainImage.alt", "Visit")
            .apply(&mut doc)
            .unwrap();
        assert_eq!(doc["mainImage"]["alt"], "Visit");
    }

    #[test]
    fn apply_rejects_system_fields() {
        let mut doc = json!({"_id": "a1", "_type": "artwork"});
        let err = Patch::new("a1").set("_type", "press").apply(&mut doc).unwrap_err();
        assert_eq!(
            err,
            PatchError::SystemField {
                path: "_type".into()
            }
        );
        assert_eq!(doc["_type"], "artwork");
    }

    #[test]
    fn apply_rejects_setting_through_scalar() {
        let mut doc = json!({"_id": "a1", "title": "Visit"});
        let err = Patch::new("a1").set("title.en", "x").apply(&mut doc).unwrap_err();
        assert!(matches!(err, PatchError::NotAnObject { .. }));
    }

    #[test]
    fn empty_patch_is_an_error() {
        let mut doc = json!({"_id": "a1"});
        assert!(Patch::new("a1").is_empty());
        assert!(Patch::new("a1").apply(&mut doc).is_err());
    }

    #[test]
    fn unset_missing_path_is_noop() {
        let mut doc = json!({"_id": "a1", "title": "Visit"});
        Patch::new("a1")
            .unset("description.long")
            .apply(&mut doc)
            .unwrap();
        assert_eq!(doc, json!({"_id": "a1", "title": "Visit"}));
    }

    #[test]
    fn decodes_mutation_response() {
        let response: MutationResponse = serde_json::from_value(json!({
            "transactionId": "tx1",
            "results": [{"id": "a1", "operation": "create"}]
        }))
        .unwrap();
        assert_eq!(response.transaction_id, "tx1");
        assert_eq!(response.results[0].operation, "create");
    }
}
