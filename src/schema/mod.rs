//! Document types stored in the content lake.
//!
//! Three document kinds make up the site: [`Artwork`] (the catalogue),
//! [`Press`] (coverage of the artist) and [`About`] (a singleton page). Their
//! serialized form follows the content lake's conventions so that documents
//! written by this crate, by older import runs and by editors in the studio UI
//! all read back through the same types:
//!
//! - system fields are underscore-prefixed (`_id`, `_type`, `_key`, `_ref`);
//! - references, slugs, images and files are small objects tagged by `_type`;
//! - field names are camelCase (`mainImage`, `publishedDate`).
//!
//! Write-side rules live in [`definition`] and are enforced by
//! [`validate::Validator`]. Rich text is modelled in [`portable_text`].

pub mod definition;
pub mod portable_text;
pub mod validate;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use portable_text::{BlockStyle, ContentNode};
pub use validate::{ValidationError, Validator, Violation};

/// Generate a fresh `_key` for an array item.
///
/// Keys only need to be unique within their array; twelve hex characters of a
/// random UUID keep documents readable.
pub fn new_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// The document kinds this schema knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    Artwork,
    Press,
    About,
}

impl DocType {
    pub const ALL: [DocType; 3] = [DocType::Artwork, DocType::Press, DocType::About];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Artwork => "artwork",
            DocType::Press => "press",
            DocType::About => "about",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown document type {s:?} (expected artwork, press or about)"))
    }
}

/// Artwork category. New artworks default to painting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Painting,
    Drawing,
    Sculpture,
    Photography,
    Video,
    Digital,
    MixedMedia,
    Installation,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Painting,
        Category::Drawing,
        Category::Sculpture,
        Category::Photography,
        Category::Video,
        Category::Digital,
        Category::MixedMedia,
        Category::Installation,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Painting => "painting",
            Category::Drawing => "drawing",
            Category::Sculpture => "sculpture",
            Category::Photography => "photography",
            Category::Video => "video",
            Category::Digital => "digital",
            Category::MixedMedia => "mixed-media",
            Category::Installation => "installation",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category {s:?}"))
    }
}

/// Press coverage category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressCategory {
    Review,
    Interview,
    Feature,
    News,
    Profile,
    Exhibition,
}

/// Reference to an uploaded binary asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "reference")]
pub struct Reference {
    #[serde(rename = "_ref")]
    pub asset_id: String,
}

impl Reference {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "slug")]
pub struct Slug {
    pub current: String,
}

/// Focal area of an image, as fractions of its width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// An image field (`mainImage`, `featuredImage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "image")]
pub struct ImageRef {
    pub asset: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot: Option<Hotspot>,
}

impl ImageRef {
    pub fn new(asset_id: impl Into<String>, alt: Option<String>) -> Self {
        Self {
            asset: Reference::new(asset_id),
            alt,
            caption: None,
            hotspot: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "file")]
pub struct FileRef {
    pub asset: Reference,
}

/// One entry of an artwork's `assets` array.
///
/// `_key` identifies the entry within the array so that edits (reorder,
/// append, remove) do not disturb unrelated entries. Documents written before
/// keys were enforced decode with an empty key, which validation rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetItem {
    #[serde(rename = "_key", default)]
    pub key: String,
    #[serde(flatten)]
    pub media: AssetMedia,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum AssetMedia {
    /// Older import runs wrote these entries as plain `image`.
    #[serde(rename = "artworkImage", alias = "image")]
    Image {
        asset: Reference,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hotspot: Option<Hotspot>,
    },
    #[serde(rename = "videoAsset")]
    Video {
        file: FileRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "audioAsset")]
    Audio {
        file: FileRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl AssetMedia {
    /// The uploaded asset this entry points at.
    pub fn asset_id(&self) -> &str {
        match self {
            AssetMedia::Image { asset, .. } => &asset.asset_id,
            AssetMedia::Video { file, .. } | AssetMedia::Audio { file, .. } => &file.asset.asset_id,
        }
    }

    /// Point this entry at a different uploaded asset.
    pub fn set_asset_id(&mut self, id: &str) {
        match self {
            AssetMedia::Image { asset, .. } => asset.asset_id = id.to_string(),
            AssetMedia::Video { file, .. } | AssetMedia::Audio { file, .. } => {
                file.asset.asset_id = id.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    pub year: i32,
    pub medium: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub assets: Vec<AssetItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Press {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub publication: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub published_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<ImageRef>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PressCategory>,
}

/// The About page. Only one is meaningful per deployment; it is stored under
/// [`ABOUT_ID`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub content: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<ImageRef>,
    #[serde(default)]
    pub featured: bool,
}

/// Document id of the About singleton.
pub const ABOUT_ID: &str = "about";

/// Any document the schema accepts, tagged by `_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "camelCase")]
pub enum Document {
    Artwork(Artwork),
    Press(Press),
    About(About),
}

impl Document {
    pub fn doc_type(&self) -> DocType {
        match self {
            Document::Artwork(_) => DocType::Artwork,
            Document::Press(_) => DocType::Press,
            Document::About(_) => DocType::About,
        }
    }

    /// Stored id, empty for documents not yet created.
    pub fn id(&self) -> &str {
        match self {
            Document::Artwork(a) => &a.id,
            Document::Press(p) => &p.id,
            Document::About(a) => &a.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Document::Artwork(a) => &a.title,
            Document::Press(p) => &p.title,
            Document::About(a) => &a.title,
        }
    }
}
