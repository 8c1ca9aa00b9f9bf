//! Artwork metadata resolution.
//!
//! Each artwork's catalogue fields come from up to three sources:
//!
//! - **Filename**: title, year, medium and dimensions decoded by
//!   [`crate::naming::parse_filename`]. Always present for an importable file.
//!
//! - **Sidecar**: a `.txt` file with the same stem as the media file.
//!   `01_Visit_2015_oiloncanvas_60hx72.txt` next to the `.jpg` becomes the
//!   artwork description. Plain text, no special format.
//!
//! - **Overrides**: an `overrides.toml` in the source directory, keyed by
//!   filename. Filenames cannot carry apostrophes, parentheses or the exact
//!   separator the catalogue uses, so editors correct those here:
//!
//!   ```toml
//!   ["06_WeCantKnow_2015_Acrylicandoiloncanvas_60x80in.jpg"]
//!   title = "We Can't Know"
//!   featured = true
//!   ```
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first non-empty value wins:
//!
//! - **Title, medium, dimensions, year**: override → filename
//! - **Description**: override → sidecar → None
//! - **Category**: override → importer default
//!
//! Overrides are deliberate edits and always win. The slug is derived from the
//! resolved title, never from the filename.

use crate::naming::ParsedFilename;
use crate::schema::Category;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid overrides file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
///
/// ```text
/// title:       resolve(&[override_title, parsed_title])
/// description: resolve(&[override_desc,  sidecar_text])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Read the sidecar `.txt` file for a media file.
///
/// Given `source/01_Visit_2015_oiloncanvas_60hx72.jpg`, looks for
/// `source/01_Visit_2015_oiloncanvas_60hx72.txt` and returns its trimmed
/// contents. Returns `None` if the file doesn't exist or is empty.
pub fn read_sidecar(media_path: &Path) -> Option<String> {
    let sidecar = media_path.with_extension("txt");
    std::fs::read_to_string(sidecar)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Derive a URL slug from a title.
///
/// - Lower-cases the input
/// - Drops every character outside `a-z`, `0-9`, space and `-`
/// - Turns space runs into a single dash (tabs and other whitespace are dropped)
/// - Collapses consecutive dashes and strips leading/trailing dashes
///
/// The result is stable under a second application. Titles made only of
/// dropped characters produce an empty slug, which validation rejects.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == ' ')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect();

    let mut collapsed = String::with_capacity(kept.len());
    let mut prev_dash = false;
    for c in kept.chars() {
        if c == '-' {
            if !prev_dash {
                collapsed.push('-');
            }
            prev_dash = true;
        } else {
            collapsed.push(c);
            prev_dash = false;
        }
    }

    collapsed.trim_matches('-').to_string()
}

/// Editorial corrections for one source file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Override {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub featured: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// All overrides of a source directory, keyed by filename.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    entries: BTreeMap<String, Override>,
}

impl Overrides {
    /// Parse overrides from TOML text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let entries: BTreeMap<String, Override> = toml::from_str(text)?;
        Ok(Self { entries })
    }

    /// Load overrides from a file. A missing file means no overrides.
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| MetadataError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, filename: &str) -> Option<&Override> {
        self.entries.get(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filenames with an override entry.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Final catalogue fields for one artwork, ready to build a document from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetadata {
    pub filename: String,
    pub title: String,
    pub slug: String,
    pub year: i32,
    pub medium: String,
    pub dimensions: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub featured: bool,
    pub tags: Vec<String>,
}

/// Merge parsed filename fields with an optional override and sidecar text.
pub fn resolve_artwork(
    parsed: &ParsedFilename,
    over: Option<&Override>,
    sidecar: Option<&str>,
) -> ResolvedMetadata {
    let over = over.cloned().unwrap_or_default();
    let title = resolve(&[over.title.as_deref(), Some(&parsed.title)]).unwrap_or_default();

    ResolvedMetadata {
        filename: parsed.filename.clone(),
        slug: slugify(&title),
        title,
        year: over.year.unwrap_or(parsed.year),
        medium: resolve(&[over.medium.as_deref(), Some(&parsed.medium)]).unwrap_or_default(),
        dimensions: resolve(&[over.dimensions.as_deref(), Some(&parsed.dimensions)]),
        category: over.category,
        description: resolve(&[over.description.as_deref(), sidecar]),
        featured: over.featured.unwrap_or(false),
        tags: over.tags.unwrap_or_default(),
    }
}

/// Build metadata from an override alone, for files whose names do not parse
/// (`hand-flurry-16x9.mov`). Needs at least title, year and medium.
pub fn resolve_from_override(
    filename: &str,
    over: &Override,
    sidecar: Option<&str>,
) -> Option<ResolvedMetadata> {
    let title = resolve(&[over.title.as_deref()])?;
    let medium = resolve(&[over.medium.as_deref()])?;
    let year = over.year?;
    Some(ResolvedMetadata {
        filename: filename.to_string(),
        slug: slugify(&title),
        title,
        year,
        medium,
        dimensions: resolve(&[over.dimensions.as_deref()]),
        category: over.category,
        description: resolve(&[over.description.as_deref(), sidecar]),
        featured: over.featured.unwrap_or(false),
        tags: over.tags.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::parse_filename;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // resolve() tests
    // =========================================================================

    #[test]
    fn resolve_picks_first_non_none() {
        assert_eq!(
            resolve(&[Some("Override"), Some("Parsed")]),
            Some("Override".to_string())
        );
    }

    #[test]
    fn resolve_skips_none_and_blank() {
        assert_eq!(resolve(&[None, Some("Fallback")]), Some("Fallback".into()));
        assert_eq!(
            resolve(&[Some("  \n\t  "), Some("Fallback")]),
            Some("Fallback".into())
        );
    }

    #[test]
    fn resolve_returns_none_when_all_empty() {
        assert_eq!(resolve(&[None, Some("")]), None);
        assert_eq!(resolve(&[]), None);
    }

    #[test]
    fn resolve_trims_whitespace() {
        assert_eq!(resolve(&[Some("  Visit  ")]), Some("Visit".to_string()));
    }

    // =========================================================================
    // read_sidecar() tests
    // =========================================================================

    #[test]
    fn read_sidecar_finds_matching_txt() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("04_Visit_2015_oiloncanvas_60hx72.jpg");
        fs::write(&img, b"fake image").unwrap();
        fs::write(
            dir.path().join("04_Visit_2015_oiloncanvas_60hx72.txt"),
            "\n  Painted after a studio visit.  \n",
        )
        .unwrap();

        assert_eq!(
            read_sidecar(&img),
            Some("Painted after a studio visit.".to_string())
        );
    }

    #[test]
    fn read_sidecar_none_when_missing_or_blank() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("photo.jpg");
        assert_eq!(read_sidecar(&img), None);

        fs::write(dir.path().join("photo.txt"), "   \n ").unwrap();
        assert_eq!(read_sidecar(&img), None);
    }

    // =========================================================================
    // slugify() tests
    // =========================================================================

    #[test]
    fn slugify_drops_punctuation() {
        assert_eq!(slugify("We Can't Know"), "we-cant-know");
        assert_eq!(slugify("French Wines (Red)"), "french-wines-red");
        assert_eq!(slugify("Each Baby's First Words"), "each-babys-first-words");
    }

    #[test]
    fn slugify_collapses_whitespace_and_dashes() {
        assert_eq!(slugify("  Trash   Has -- Its Own Day "), "trash-has-its-own-day");
        assert_eq!(slugify("a - b"), "a-b");
        assert_eq!(slugify("--visit--"), "visit");
    }

    #[test]
    fn slugify_drops_non_space_whitespace() {
        assert_eq!(slugify("a\tb"), "ab");
        assert_eq!(slugify("Old\nSpaghetti"), "oldspaghetti");
        assert_eq!(slugify("French\u{a0}Wines"), "frenchwines");
        assert_eq!(slugify("Gift of\tFear"), "gift-offear");
    }

    #[test]
    fn slugify_keeps_digits() {
        assert_eq!(slugify("Untitled 3"), "untitled-3");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Müller"), "caf-mller");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in [
            "We Can't Know",
            "French Wines (Red)",
            "Old Spaghetti Collision Gravity",
            " -- ",
            "Data So Vast",
        ] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "not stable for {title:?}");
        }
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    #[test]
    fn overrides_parse_by_filename() {
        let overrides = Overrides::parse(
            r#"
            ["06_WeCantKnow_2015_Acrylicandoiloncanvas_60x80in.jpg"]
            title = "We Can't Know"
            category = "mixed-media"
            featured = true
            tags = ["2015", "large"]
            "#,
        )
        .unwrap();
        assert_eq!(overrides.len(), 1);
        let entry = overrides
            .get("06_WeCantKnow_2015_Acrylicandoiloncanvas_60x80in.jpg")
            .unwrap();
        assert_eq!(entry.title.as_deref(), Some("We Can't Know"));
        assert_eq!(entry.category, Some(Category::MixedMedia));
        assert_eq!(entry.featured, Some(true));
    }

    #[test]
    fn overrides_reject_unknown_fields() {
        let result = Overrides::parse(
            r#"
            ["a.jpg"]
            titel = "typo"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn overrides_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let overrides = Overrides::load(&dir.path().join("overrides.toml")).unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn overrides_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.toml");
        fs::write(&path, "[broken").unwrap();
        let err = Overrides::load(&path).unwrap_err();
        assert!(err.to_string().contains("overrides.toml"));
    }

    // =========================================================================
    // resolve_artwork()
    // =========================================================================

    #[test]
    fn resolve_artwork_uses_parsed_fields_without_override() {
        let parsed = parse_filename("04_Visit_2015_oiloncanvas_60hx72.jpg").unwrap();
        let meta = resolve_artwork(&parsed, None, Some("Sidecar text"));
        assert_eq!(meta.title, "Visit");
        assert_eq!(meta.slug, "visit");
        assert_eq!(meta.year, 2015);
        assert_eq!(meta.medium, "Oil on canvas");
        assert_eq!(meta.dimensions.as_deref(), Some("60h × 72 inches"));
        assert_eq!(meta.description.as_deref(), Some("Sidecar text"));
        assert_eq!(meta.category, None);
        assert!(!meta.featured);
    }

    #[test]
    fn override_wins_and_drives_slug() {
        let parsed = parse_filename("06_WeCantKnow_2015_Acrylicandoiloncanvas_60x80in.jpg").unwrap();
        let over = Override {
            title: Some("We Can't Know".into()),
            description: Some("From the override".into()),
            ..Override::default()
        };
        let meta = resolve_artwork(&parsed, Some(&over), Some("Sidecar text"));
        assert_eq!(meta.title, "We Can't Know");
        assert_eq!(meta.slug, "we-cant-know");
        assert_eq!(meta.description.as_deref(), Some("From the override"));
        assert_eq!(meta.medium, "Acrylic and oil on canvas");
    }

    #[test]
    fn override_alone_needs_title_year_and_medium() {
        let mut over = Override {
            title: Some("Hand Flurry".into()),
            year: Some(2008),
            medium: Some("Single channel video no sound 01:01".into()),
            category: Some(Category::Video),
            ..Override::default()
        };
        let meta = resolve_from_override("hand-flurry-16x9.mov", &over, None).unwrap();
        assert_eq!(meta.slug, "hand-flurry");
        assert_eq!(meta.year, 2008);
        assert_eq!(meta.category, Some(Category::Video));

        over.year = None;
        assert!(resolve_from_override("hand-flurry-16x9.mov", &over, None).is_none());
    }
}
