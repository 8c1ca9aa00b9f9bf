//! Rich text content (Press and About bodies).
//!
//! Content is an ordered array of nodes. A node is either a text block
//! (paragraph, heading or quote made of styled spans) or an inline image.
//! Link annotations live in the block's `markDefs` and are referenced from a
//! span's `marks` by key; decorators (`strong`, `em`, `underline`) appear in
//! `marks` by name.

use super::{Hotspot, Reference};
use serde::{Deserialize, Serialize};

/// Decorators a span may carry.
pub const DECORATORS: &[&str] = &["strong", "em", "underline"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ContentNode {
    #[serde(rename = "block")]
    Block(Block),
    #[serde(rename = "image")]
    Image(ContentImage),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStyle {
    #[default]
    Normal,
    H1,
    H2,
    H3,
    Blockquote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(default)]
    pub style: BlockStyle,
    pub children: Vec<Span>,
    #[serde(default)]
    pub mark_defs: Vec<LinkDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "span")]
pub struct Span {
    #[serde(rename = "_key")]
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

/// A link annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "link")]
pub struct LinkDef {
    #[serde(rename = "_key")]
    pub key: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentImage {
    #[serde(rename = "_key")]
    pub key: String,
    pub asset: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot: Option<Hotspot>,
}

impl Block {
    /// The block's text with all marks dropped.
    pub fn plain_text(&self) -> String {
        self.children.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Flatten content to plain text, one line per block. Images are skipped.
pub fn plain_text(content: &[ContentNode]) -> String {
    content
        .iter()
        .filter_map(|node| match node {
            ContentNode::Block(block) => Some(block.plain_text()),
            ContentNode::Image(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
