//! Shared test utilities for the folio test suite.
//!
//! Builders for catalogue documents and throwaway source files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let source = write_png(tmp.path(), "04_Visit_2015_oiloncanvas_60hx72.png", 4, 3);
//!
//! let visit = artwork("Visit", 2015);
//! assert_eq!(visit.slug.current, "visit");
//! ```

use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

use crate::metadata::slugify;
use crate::scan::{MediaKind, SourceFile};
use crate::schema::{
    Artwork, AssetItem, AssetMedia, Category, Document, ImageRef, Reference, Slug, Validator,
};
use crate::store::content_hash;

// =========================================================================
// Documents
// =========================================================================

/// A valid painting with one image asset and a matching `mainImage`.
///
/// Id and asset id are derived from the title so repeated calls agree.
pub fn artwork(title: &str, year: i32) -> Artwork {
    let slug = slugify(title);
    let asset_id = format!("image-{}-10x10-jpg", &content_hash(title.as_bytes())[..40]);
    Artwork {
        id: format!("artwork-{slug}"),
        title: title.to_string(),
        slug: Slug { current: slug },
        year,
        medium: "Oil on canvas".to_string(),
        category: Category::Painting,
        dimensions: Some("60h × 72 inches".to_string()),
        description: None,
        featured: false,
        tags: vec![],
        assets: vec![AssetItem {
            key: crate::schema::new_key(),
            media: AssetMedia::Image {
                asset: Reference::new(asset_id.clone()),
                alt: Some(title.to_string()),
                caption: None,
                hotspot: None,
            },
        }],
        main_image: Some(ImageRef::new(asset_id, Some(title.to_string()))),
    }
}

/// [`artwork`] as stored JSON.
pub fn artwork_value(title: &str, year: i32) -> Value {
    serde_json::to_value(Document::Artwork(artwork(title, year))).unwrap()
}

/// Validator with a fixed year ceiling.
pub fn validator() -> Validator {
    Validator::new(1900, 2026, 96)
}

// =========================================================================
// Source files
// =========================================================================

/// Encode a solid `width`×`height` PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([180, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Write `bytes` under `dir` and describe it as a scanned source.
///
/// Panics if the name is not a recognised media extension.
pub fn source_file(dir: &Path, name: &str, bytes: &[u8]) -> SourceFile {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    let kind = MediaKind::from_path(&path)
        .unwrap_or_else(|| panic!("{name} is not a media file"));
    SourceFile {
        path,
        filename: name.to_string(),
        kind,
    }
}

/// Write a real PNG source file.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> SourceFile {
    source_file(dir, name, &png_bytes(width, height))
}
