//! Batch artwork import.
//!
//! Turns a list of scanned source files into artwork documents, one item at a
//! time:
//!
//! ```text
//! parse filename ─► resolve metadata ─► duplicate checks ─► validate
//!     ─► upload asset ─► create document
//! ```
//!
//! Every item ends in exactly one [`ItemOutcome`]. A failure is recorded and
//! the batch moves on; nothing short of a broken store connection aborts a
//! run. Validation happens before the upload, so a document that would be
//! rejected never leaves an asset behind. The one case that does is a failed
//! create after a successful upload: there is no rollback, and the orphaned
//! asset id is logged.
//!
//! Items are processed sequentially with a fixed pause between them
//! (`import.delay_ms`) to stay under hosted API rate limits.

use crate::metadata::{self, Overrides, ResolvedMetadata};
use crate::naming::{self, ParseError};
use crate::scan::{MediaKind, SourceFile};
use crate::schema::{
    self, Artwork, AssetItem, AssetMedia, Category, Document, FileRef, ImageRef, Reference, Slug,
    ValidationError, Validator,
};
use crate::store::{ContentStore, StoreError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Asset id used while validating, before the real upload id is known.
const PENDING_ASSET_ID: &str = "pending-upload";

#[derive(Error, Debug)]
pub enum ImportFailure {
    #[error("parse: {0}")]
    Parse(#[from] ParseError),
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("transfer: {0}")]
    Transfer(#[from] StoreError),
    #[error("could not read {path}: {source}")]
    Source {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ImportFailure {
    /// Short label for reports.
    pub fn stage(&self) -> &'static str {
        match self {
            ImportFailure::Parse(_) => "parse",
            ImportFailure::Validation(_) => "validation",
            ImportFailure::Transfer(_) => "transfer",
            ImportFailure::Source { .. } => "source",
        }
    }
}

#[derive(Debug)]
pub enum ItemOutcome {
    Imported {
        filename: String,
        title: String,
        document_id: String,
        asset_id: String,
    },
    Skipped {
        filename: String,
        title: String,
        reason: String,
    },
    Failed {
        filename: String,
        failure: ImportFailure,
    },
}

impl ItemOutcome {
    pub fn filename(&self) -> &str {
        match self {
            ItemOutcome::Imported { filename, .. }
            | ItemOutcome::Skipped { filename, .. }
            | ItemOutcome::Failed { filename, .. } => filename,
        }
    }
}

/// Result of a batch run, one outcome per input item in input order.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Imported { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Failed { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ImportFailure)> {
        self.outcomes.iter().filter_map(|o| match o {
            ItemOutcome::Failed { filename, failure } => Some((filename.as_str(), failure)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Category for non-video artworks without an override.
    pub default_category: Category,
    /// Pause between items.
    pub delay: Duration,
    /// Skip items whose title is already stored.
    pub skip_existing: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_category: Category::Painting,
            delay: Duration::from_millis(1000),
            skip_existing: true,
        }
    }
}

/// Sequential importer bound to one store.
pub struct Importer<'a> {
    store: &'a mut dyn ContentStore,
    validator: Validator,
    options: ImportOptions,
    overrides: Overrides,
    /// Titles already stored or imported in this run.
    titles: HashSet<String>,
    /// Slug → id of the artwork using it.
    slugs: HashMap<String, String>,
}

impl<'a> Importer<'a> {
    /// Create an importer, reading existing artwork titles and slugs from the
    /// store for the duplicate checks.
    pub fn new(
        store: &'a mut dyn ContentStore,
        validator: Validator,
        options: ImportOptions,
        overrides: Overrides,
    ) -> Result<Self, StoreError> {
        let mut titles = HashSet::new();
        let mut slugs = HashMap::new();
        for doc in store.documents(schema::DocType::Artwork.as_str())? {
            if let Some(title) = doc.get("title").and_then(Value::as_str) {
                titles.insert(title.to_string());
            }
            let slug = doc.pointer("/slug/current").and_then(Value::as_str);
            let id = doc.get("_id").and_then(Value::as_str);
            if let (Some(slug), Some(id)) = (slug, id) {
                slugs.insert(slug.to_string(), id.to_string());
            }
        }
        tracing::debug!(
            existing = titles.len(),
            overrides = overrides.len(),
            "importer ready"
        );
        Ok(Self {
            store,
            validator,
            options,
            overrides,
            titles,
            slugs,
        })
    }

    /// Import every source in order.
    pub fn run(&mut self, sources: &[SourceFile]) -> ImportReport {
        let mut report = ImportReport::default();
        for (index, source) in sources.iter().enumerate() {
            if index > 0 && !self.options.delay.is_zero() {
                std::thread::sleep(self.options.delay);
            }
            tracing::info!(
                "[{}/{}] {}",
                index + 1,
                sources.len(),
                source.filename
            );
            report.outcomes.push(self.import_one(source));
        }
        report
    }

    /// Import a single source file.
    pub fn import_one(&mut self, source: &SourceFile) -> ItemOutcome {
        let filename = source.filename.clone();
        match self.try_import(source) {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::warn!(file = %filename, stage = failure.stage(), "{failure}");
                ItemOutcome::Failed { filename, failure }
            }
        }
    }

    fn resolve(&self, source: &SourceFile) -> Result<ResolvedMetadata, ImportFailure> {
        let over = self.overrides.get(&source.filename);
        let sidecar = metadata::read_sidecar(&source.path);
        match naming::parse_filename(&source.filename) {
            Ok(parsed) => Ok(metadata::resolve_artwork(
                &parsed,
                over,
                sidecar.as_deref(),
            )),
            Err(e) => over
                .and_then(|o| {
                    metadata::resolve_from_override(&source.filename, o, sidecar.as_deref())
                })
                .ok_or(ImportFailure::Parse(e)),
        }
    }

    fn try_import(&mut self, source: &SourceFile) -> Result<ItemOutcome, ImportFailure> {
        let meta = self.resolve(source)?;

        if self.options.skip_existing && self.titles.contains(&meta.title) {
            tracing::info!(file = %source.filename, title = %meta.title, "already exists, skipping");
            return Ok(ItemOutcome::Skipped {
                filename: source.filename.clone(),
                title: meta.title,
                reason: "title already exists".into(),
            });
        }

        if let Some(existing_id) = self.slugs.get(&meta.slug) {
            return Err(ValidationError::DuplicateSlug {
                slug: meta.slug.clone(),
                existing_id: existing_id.clone(),
            }
            .into());
        }

        let category = meta.category.unwrap_or(match source.kind {
            MediaKind::Video => Category::Video,
            _ => self.options.default_category,
        });
        let mut artwork = build_artwork(&meta, source.kind, category, PENDING_ASSET_ID);
        self.validator
            .validate_document(&Document::Artwork(artwork.clone()))?;

        let bytes = std::fs::read(&source.path).map_err(|e| ImportFailure::Source {
            path: source.path.clone(),
            source: e,
        })?;
        let uploaded = self
            .store
            .upload(source.kind.asset_kind(), &bytes, &source.filename)?;
        tracing::debug!(asset = %uploaded.id, "uploaded");

        set_asset_id(&mut artwork, &uploaded.id);
        let document = serde_json::to_value(Document::Artwork(artwork))
            .map_err(ValidationError::Encode)?;
        let document_id = match self.store.create(document) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    file = %source.filename,
                    asset = %uploaded.id,
                    "document create failed; uploaded asset left orphaned"
                );
                return Err(e.into());
            }
        };

        tracing::info!(file = %source.filename, id = %document_id, title = %meta.title, "imported");
        self.titles.insert(meta.title.clone());
        self.slugs.insert(meta.slug.clone(), document_id.clone());
        Ok(ItemOutcome::Imported {
            filename: source.filename.clone(),
            title: meta.title,
            document_id,
            asset_id: uploaded.id,
        })
    }
}

/// Build an artwork document around one uploaded asset.
///
/// Images become an `artworkImage` item plus `mainImage`. Video and audio
/// become a file item whose description reads "<medium> from <year>".
pub fn build_artwork(
    meta: &ResolvedMetadata,
    kind: MediaKind,
    category: Category,
    asset_id: &str,
) -> Artwork {
    let title = Some(meta.title.clone());
    let file_description = Some(format!("{} from {}", meta.medium, meta.year));
    let media = match kind {
        MediaKind::Image => AssetMedia::Image {
            asset: Reference::new(asset_id),
            alt: title.clone(),
            caption: None,
            hotspot: None,
        },
        MediaKind::Video => AssetMedia::Video {
            file: FileRef {
                asset: Reference::new(asset_id),
            },
            title: title.clone(),
            description: file_description,
        },
        MediaKind::Audio => AssetMedia::Audio {
            file: FileRef {
                asset: Reference::new(asset_id),
            },
            title: title.clone(),
            description: file_description,
        },
    };
    let main_image = match kind {
        MediaKind::Image => Some(ImageRef::new(asset_id, title)),
        MediaKind::Video | MediaKind::Audio => None,
    };

    Artwork {
        id: String::new(),
        title: meta.title.clone(),
        slug: Slug {
            current: meta.slug.clone(),
        },
        year: meta.year,
        medium: meta.medium.clone(),
        category,
        dimensions: meta.dimensions.clone(),
        description: meta.description.clone(),
        featured: meta.featured,
        tags: meta.tags.clone(),
        assets: vec![AssetItem {
            key: schema::new_key(),
            media,
        }],
        main_image,
    }
}

fn set_asset_id(artwork: &mut Artwork, asset_id: &str) {
    for item in &mut artwork.assets {
        item.media.set_asset_id(asset_id);
    }
    if let Some(main) = &mut artwork.main_image {
        main.asset.asset_id = asset_id.to_string();
    }
}
