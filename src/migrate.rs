//! Maintenance migrations over stored artworks.
//!
//! Each migration is split into a pure planning step, which reads document
//! values and returns the patches it would commit, and [`apply`], which commits
//! them one document at a time and records a per-document outcome. A failed
//! patch does not stop the run.
//!
//! | Migration | Touches |
//! |---|---|
//! | [`Migration::BackfillCategory`] | artworks whose `category` is missing or not in the enum |
//! | [`Migration::FixAssetKeys`] | artworks with asset items lacking a `_key`, or sharing one |
//! | [`Migration::RenameField`] | artworks still carrying a stale field (`meduium`) |
//!
//! Planning only looks at documents, so running a migration twice plans
//! nothing the second time.

use crate::mutation::Patch;
use crate::schema::{self, Category, DocType};
use crate::store::{DocumentStore, StoreError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Migration {
    BackfillCategory(Category),
    FixAssetKeys,
    RenameField { from: String, to: String },
}

impl Migration {
    pub fn name(&self) -> &'static str {
        match self {
            Migration::BackfillCategory(_) => "backfill-category",
            Migration::FixAssetKeys => "fix-asset-keys",
            Migration::RenameField { .. } => "rename-field",
        }
    }

    /// Plan this migration against artwork documents.
    pub fn plan(&self, documents: &[Value]) -> Vec<PlannedPatch> {
        match self {
            Migration::BackfillCategory(category) => plan_category_backfill(documents, *category),
            Migration::FixAssetKeys => plan_asset_key_fix(documents),
            Migration::RenameField { from, to } => plan_field_rename(documents, from, to),
        }
    }
}

/// One document's change, ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPatch {
    pub document_id: String,
    pub title: String,
    pub patch: Patch,
    /// Human-readable summary of the change.
    pub description: String,
}

fn id_and_title(doc: &Value) -> Option<(String, String)> {
    let id = doc.get("_id").and_then(Value::as_str)?;
    let title = doc
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("(untitled)");
    Some((id.to_string(), title.to_string()))
}

/// Set `category` where it is missing or not a known category.
pub fn plan_category_backfill(documents: &[Value], category: Category) -> Vec<PlannedPatch> {
    documents
        .iter()
        .filter_map(|doc| {
            let (document_id, title) = id_and_title(doc)?;
            let current = doc.get("category").and_then(Value::as_str);
            if current.is_some_and(|c| c.parse::<Category>().is_ok()) {
                return None;
            }
            let description = match current {
                Some(bad) => format!("category {bad:?} → {category}"),
                None => format!("category → {category}"),
            };
            Some(PlannedPatch {
                patch: Patch::new(&document_id).set("category", category.as_str()),
                document_id,
                title,
                description,
            })
        })
        .collect()
}

/// Give asset items without a key, or with an already used key, a fresh one.
///
/// The whole `assets` array is set so item order and content are preserved.
pub fn plan_asset_key_fix(documents: &[Value]) -> Vec<PlannedPatch> {
    documents
        .iter()
        .filter_map(|doc| {
            let (document_id, title) = id_and_title(doc)?;
            let assets = doc.get("assets")?.as_array()?;

            let mut seen = HashSet::new();
            let mut fixed = 0;
            let mut repaired = Vec::with_capacity(assets.len());
            for item in assets {
                let mut item = item.clone();
                let key = item
                    .get("_key")
                    .and_then(Value::as_str)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string);
                let needs_key = match key {
                    Some(k) => !seen.insert(k),
                    None => true,
                };
                if needs_key && let Some(object) = item.as_object_mut() {
                    let mut fresh = schema::new_key();
                    while !seen.insert(fresh.clone()) {
                        fresh = schema::new_key();
                    }
                    object.insert("_key".into(), Value::String(fresh));
                    fixed += 1;
                }
                repaired.push(item);
            }

            (fixed > 0).then(|| PlannedPatch {
                patch: Patch::new(&document_id).set("assets", Value::Array(repaired)),
                document_id,
                title,
                description: format!("{fixed} asset key(s) assigned"),
            })
        })
        .collect()
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Move `from` into `to` where `to` is empty, then drop `from`.
///
/// When both hold a value, `to` is kept and `from` is only removed.
pub fn plan_field_rename(documents: &[Value], from: &str, to: &str) -> Vec<PlannedPatch> {
    documents
        .iter()
        .filter_map(|doc| {
            let (document_id, title) = id_and_title(doc)?;
            let stale = doc.get(from)?;
            let mut patch = Patch::new(&document_id);
            let description = if is_blank(doc.get(to)) && !is_blank(Some(stale)) {
                patch = patch.set(to, stale.clone());
                format!("moved {from} → {to}")
            } else {
                format!("removed {from} (kept {to})")
            };
            Some(PlannedPatch {
                patch: patch.unset(from),
                document_id,
                title,
                description,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PatchStatus {
    Applied,
    /// Dry run: planned but not committed.
    Planned,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOutcome {
    pub document_id: String,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub status: PatchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub migration: &'static str,
    /// Artworks examined.
    pub scanned: usize,
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationReport {
    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Applied))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Failed { .. }))
    }

    fn count(&self, f: impl Fn(&PatchStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.status)).count()
    }
}

/// Plan `migration` against the store's artworks and commit the patches
/// unless `dry_run` is set.
pub fn run<S: DocumentStore + ?Sized>(
    store: &mut S,
    migration: &Migration,
    dry_run: bool,
) -> Result<MigrationReport, StoreError> {
    let documents = store.documents(DocType::Artwork.as_str())?;
    let plans = migration.plan(&documents);
    tracing::info!(
        migration = migration.name(),
        scanned = documents.len(),
        planned = plans.len(),
        dry_run,
        "migration planned"
    );
    Ok(MigrationReport {
        migration: migration.name(),
        scanned: documents.len(),
        outcomes: apply(store, plans, dry_run),
    })
}

/// Commit planned patches in order, capturing each document's outcome.
pub fn apply<S: DocumentStore + ?Sized>(
    store: &mut S,
    plans: Vec<PlannedPatch>,
    dry_run: bool,
) -> Vec<MigrationOutcome> {
    plans
        .into_iter()
        .map(|plan| {
            let status = if dry_run {
                PatchStatus::Planned
            } else {
                match store.commit(&plan.patch) {
                    Ok(()) => {
                        tracing::info!(id = %plan.document_id, "{}", plan.description);
                        PatchStatus::Applied
                    }
                    Err(e) => {
                        tracing::warn!(id = %plan.document_id, "patch failed: {e}");
                        PatchStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            };
            MigrationOutcome {
                document_id: plan.document_id,
                title: plan.title,
                description: plan.description,
                status,
            }
        })
        .collect()
}
