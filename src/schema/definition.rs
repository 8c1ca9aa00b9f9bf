//! Field rules for each document type.
//!
//! These tables are the write-side contract: every document handed to a store
//! is checked against the rules for its `_type` first. They mirror the studio
//! schema the editors work with, so a document accepted here is also editable
//! there.

/// Accepted artwork categories, in studio display order.
pub const ARTWORK_CATEGORIES: &[&str] = &[
    "painting",
    "drawing",
    "sculpture",
    "photography",
    "video",
    "digital",
    "mixed-media",
    "installation",
    "other",
];

pub const PRESS_CATEGORIES: &[&str] = &[
    "review",
    "interview",
    "feature",
    "news",
    "profile",
    "exhibition",
];

pub const BLOCK_STYLES: &[&str] = &["normal", "h1", "h2", "h3", "blockquote"];

/// Item types allowed in an artwork's `assets` array. `image` is the legacy
/// spelling of `artworkImage`.
pub const ARTWORK_ASSET_TYPES: &[&str] = &["artworkImage", "image", "videoAsset", "audioAsset"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Single-line string.
    String,
    /// Multi-line string.
    Text,
    Boolean,
    /// Integer between the validator's minimum year and the current year.
    Year,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Absolute `http(s)` URL.
    Url,
    /// `{_type: "slug", current}` with a URL-safe `current`.
    Slug,
    /// String restricted to a fixed list.
    Enum(&'static [&'static str]),
    /// Array of plain strings.
    StringArray,
    /// Image object with an asset reference.
    Image,
    /// Array of `_key`ed objects whose `_type` is in `of`.
    KeyedArray {
        of: &'static [&'static str],
        min: usize,
    },
    /// Array of rich text blocks and images.
    RichText,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: false,
    }
}

#[derive(Debug)]
pub struct TypeDefinition {
    pub name: &'static str,
    pub fields: &'static [FieldRule],
}

pub static ARTWORK: TypeDefinition = TypeDefinition {
    name: "artwork",
    fields: &[
        required("title", FieldKind::String),
        required("slug", FieldKind::Slug),
        required("year", FieldKind::Year),
        required("medium", FieldKind::String),
        required("category", FieldKind::Enum(ARTWORK_CATEGORIES)),
        optional("description", FieldKind::Text),
        optional("mainImage", FieldKind::Image),
        required(
            "assets",
            FieldKind::KeyedArray {
                of: ARTWORK_ASSET_TYPES,
                min: 1,
            },
        ),
        optional("dimensions", FieldKind::String),
        optional("featured", FieldKind::Boolean),
        optional("tags", FieldKind::StringArray),
    ],
};

pub static PRESS: TypeDefinition = TypeDefinition {
    name: "press",
    fields: &[
        required("title", FieldKind::String),
        required("publication", FieldKind::String),
        optional("author", FieldKind::String),
        required("publishedDate", FieldKind::Date),
        optional("excerpt", FieldKind::Text),
        optional("content", FieldKind::RichText),
        optional("externalUrl", FieldKind::Url),
        optional("featuredImage", FieldKind::Image),
        optional("featured", FieldKind::Boolean),
        optional("category", FieldKind::Enum(PRESS_CATEGORIES)),
    ],
};

pub static ABOUT: TypeDefinition = TypeDefinition {
    name: "about",
    fields: &[
        required("title", FieldKind::String),
        required("content", FieldKind::RichText),
        optional("featuredImage", FieldKind::Image),
        optional("featured", FieldKind::Boolean),
    ],
};

/// Look up the rules for a `_type`.
pub fn definition_for(type_name: &str) -> Option<&'static TypeDefinition> {
    [&ARTWORK, &PRESS, &ABOUT]
        .into_iter()
        .find(|d| d.name == type_name)
}
