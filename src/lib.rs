//! # Folio
//!
//! Content schema, queries and import tooling for an artist's portfolio site
//! backed by a hosted content lake.
//!
//! The site is three kinds of documents: artworks (the catalogue), press
//! coverage and a single About page. Years of source images were exported
//! with the catalogue facts encoded in their filenames; folio recovers those
//! facts, uploads the media, and writes schema-valid artwork documents.
//!
//! # Architecture: Import Pipeline
//!
//! ```text
//! artworks/  ──scan──►  SourceFile list
//!            ──naming──►  ParsedFilename        (filename → title, year, medium, dimensions)
//!            ──metadata──►  ResolvedMetadata    (+ overrides.toml, sidecar .txt, slug)
//!            ──schema──►  validated Artwork     (all rule violations collected)
//!            ──store──►  uploaded asset + created document
//! ```
//!
//! Each item ends in exactly one outcome (imported, skipped, failed). A bad
//! file never stops the batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Two-dialect artwork filename parser |
//! | [`metadata`] | Slugs, editorial overrides, sidecar descriptions |
//! | [`scan`] | Walks the source directory for media files |
//! | [`schema`] | Document types, field rules, rich text, validation |
//! | [`mutation`] | Create/patch mutations and patch application |
//! | [`store`] | Asset and document store traits; local dataset, HTTP and in-memory backends |
//! | [`import`] | Sequential batch importer with per-item outcomes |
//! | [`query`] | Read-side projections (lists, detail, press, about) |
//! | [`migrate`] | Maintenance migrations (category backfill, asset keys, field rename) |
//! | [`pages`] | Markdown About and Press pages to rich text documents |
//! | [`config`] | `folio.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stores Are Passed, Never Global
//!
//! Every operation takes the store it works against. The CLI builds one from
//! `[store]` config; tests hand in a [`store::MemoryStore`]. The same importer
//! runs against the hosted API, a local dataset directory, or memory.
//!
//! ## Validate Before Upload
//!
//! An artwork is built and validated with a placeholder asset reference
//! before its bytes are uploaded. A document that would be rejected never
//! leaves an orphaned asset behind.
//!
//! ## Content-Addressed Assets
//!
//! Asset ids embed a hash of the file bytes (and pixel dimensions for
//! images), the same shape the hosted content lake uses. Re-uploading a file
//! yields the same id.

pub mod config;
pub mod import;
pub mod metadata;
pub mod migrate;
pub mod mutation;
pub mod naming;
pub mod output;
pub mod pages;
pub mod query;
pub mod scan;
pub mod schema;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
