//! Markdown pages: the About singleton and Press coverage.
//!
//! ## Directory Structure
//!
//! ```text
//! pages/                          # import.pages_dir
//! ├── about.md                    # About page; first `# ` heading is the title
//! └── press/
//!     ├── 2016-gazette-review.md  # One press item per file
//!     └── 2018-studio-visit.md
//! ```
//!
//! Press files open with TOML front matter between `+++` fences:
//!
//! ```text
//! +++
//! publication = "The Gazette"
//! published_date = 2016-03-09
//! author = "R. Critic"
//! external_url = "https://example.org/review"
//! category = "review"
//! +++
//! # Paint as Weather
//!
//! Body in Markdown.
//! ```
//!
//! Bodies are converted to rich text blocks: paragraphs, `#`..`###` headings,
//! block quotes, list items (as plain blocks), emphasis, strong and links.
//! Images and raw HTML are dropped.

use crate::mutation::Patch;
use crate::schema::portable_text::{Block, LinkDef, Span};
use crate::schema::{
    self, About, BlockStyle, ContentNode, DocType, Document, Press, PressCategory,
    ValidationError, Validator, ABOUT_ID,
};
use crate::store::{ContentStore, StoreError};
use chrono::NaiveDate;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FENCE: &str = "+++";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: missing +++ front matter")]
    MissingFrontMatter { path: PathBuf },
    #[error("{path}: invalid front matter: {source}")]
    FrontMatter {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{path}: published_date must be a calendar date")]
    InvalidDate { path: PathBuf },
}

// ============================================================================
// Markdown → rich text
// ============================================================================

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<ContentNode>,
    current: Option<Block>,
    marks: Vec<String>,
    quote_depth: usize,
    image_depth: usize,
}

impl BlockBuilder {
    fn open(&mut self, style: BlockStyle) {
        self.close();
        let style = if self.quote_depth > 0 && style == BlockStyle::Normal {
            BlockStyle::Blockquote
        } else {
            style
        };
        self.current = Some(Block {
            key: schema::new_key(),
            style,
            children: Vec::new(),
            mark_defs: Vec::new(),
        });
    }

    fn close(&mut self) {
        if let Some(block) = self.current.take()
            && !block.plain_text().trim().is_empty()
        {
            self.blocks.push(ContentNode::Block(block));
        }
    }

    fn text(&mut self, text: &str) {
        if self.image_depth > 0 {
            return;
        }
        if self.current.is_none() {
            self.open(BlockStyle::Normal);
        }
        let Some(block) = self.current.as_mut() else {
            return;
        };
        match block.children.last_mut() {
            Some(last) if last.marks == self.marks => last.text.push_str(text),
            _ => block.children.push(Span {
                key: schema::new_key(),
                text: text.to_string(),
                marks: self.marks.clone(),
            }),
        }
    }

    fn link(&mut self, href: &str) {
        if self.current.is_none() {
            self.open(BlockStyle::Normal);
        }
        let key = schema::new_key();
        if let Some(block) = self.current.as_mut() {
            block.mark_defs.push(LinkDef {
                key: key.clone(),
                href: href.to_string(),
            });
        }
        self.marks.push(key);
    }
}

fn heading_style(level: HeadingLevel) -> BlockStyle {
    match level {
        HeadingLevel::H1 => BlockStyle::H1,
        HeadingLevel::H2 => BlockStyle::H2,
        _ => BlockStyle::H3,
    }
}

/// Convert Markdown into rich text content nodes.
pub fn markdown_to_blocks(markdown: &str) -> Vec<ContentNode> {
    let mut builder = BlockBuilder::default();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Paragraph) | Event::Start(Tag::Item) => {
                builder.open(BlockStyle::Normal)
            }
            Event::Start(Tag::Heading { level, .. }) => builder.open(heading_style(level)),
            Event::Start(Tag::BlockQuote(_)) => {
                builder.close();
                builder.quote_depth += 1;
            }
            Event::Start(Tag::Emphasis) => builder.marks.push("em".into()),
            Event::Start(Tag::Strong) => builder.marks.push("strong".into()),
            Event::Start(Tag::Link { dest_url, .. }) => builder.link(&dest_url),
            Event::Start(Tag::Image { .. }) => builder.image_depth += 1,
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => builder.close(),
            Event::End(TagEnd::BlockQuote(_)) => {
                builder.close();
                builder.quote_depth = builder.quote_depth.saturating_sub(1);
            }
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Link) => {
                builder.marks.pop();
            }
            Event::End(TagEnd::Image) => {
                builder.image_depth = builder.image_depth.saturating_sub(1)
            }
            Event::Text(text) | Event::Code(text) => builder.text(&text),
            Event::SoftBreak => builder.text(" "),
            Event::HardBreak => builder.text("\n"),
            _ => {}
        }
    }
    builder.close();
    builder.blocks
}

/// Split a leading `# Title` line off a Markdown body.
fn split_title(markdown: &str) -> (Option<String>, &str) {
    let trimmed = markdown.trim_start();
    match trimmed.strip_prefix("# ") {
        Some(rest) => {
            let (line, body) = rest.split_once('\n').unwrap_or((rest, ""));
            (Some(line.trim().to_string()), body)
        }
        None => (None, markdown),
    }
}

fn read(path: &Path) -> Result<String, PageError> {
    fs::read_to_string(path).map_err(|source| PageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// About
// ============================================================================

/// Read `about.md`. The title comes from its first line when that is a
/// `# ` heading, otherwise "About".
pub fn read_about(path: &Path) -> Result<About, PageError> {
    let text = read(path)?;
    let (title, body) = split_title(&text);
    Ok(About {
        id: ABOUT_ID.to_string(),
        title: title.unwrap_or_else(|| "About".to_string()),
        content: markdown_to_blocks(body),
        featured_image: None,
        featured: false,
    })
}

// ============================================================================
// Press
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PressFrontMatter {
    title: Option<String>,
    publication: String,
    author: Option<String>,
    published_date: toml::value::Datetime,
    excerpt: Option<String>,
    external_url: Option<String>,
    category: Option<PressCategory>,
    #[serde(default)]
    featured: bool,
}

fn split_front_matter<'a>(path: &Path, text: &'a str) -> Result<(&'a str, &'a str), PageError> {
    let missing = || PageError::MissingFrontMatter {
        path: path.to_path_buf(),
    };
    let rest = text.trim_start().strip_prefix(FENCE).ok_or_else(missing)?;
    let (front, body) = rest.split_once(&format!("\n{FENCE}")).ok_or_else(missing)?;
    let body = body.split_once('\n').map_or("", |(_, b)| b);
    Ok((front, body))
}

fn calendar_date(path: &Path, value: &toml::value::Datetime) -> Result<NaiveDate, PageError> {
    value
        .date
        .filter(|_| value.time.is_none())
        .and_then(|d| NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day)))
        .ok_or_else(|| PageError::InvalidDate {
            path: path.to_path_buf(),
        })
}

/// Read one press Markdown file.
///
/// Without a front matter `title`, the body's leading `# ` heading is used,
/// then the file stem.
pub fn read_press(path: &Path) -> Result<Press, PageError> {
    let text = read(path)?;
    let (front, body) = split_front_matter(path, &text)?;
    let meta: PressFrontMatter = toml::from_str(front).map_err(|source| PageError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    let (heading, body) = split_title(body);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Press {
        id: String::new(),
        title: meta.title.or(heading).unwrap_or(stem),
        publication: meta.publication,
        author: meta.author,
        published_date: calendar_date(path, &meta.published_date)?,
        excerpt: meta.excerpt,
        content: markdown_to_blocks(body),
        external_url: meta.external_url,
        featured_image: None,
        featured: meta.featured,
        category: meta.category,
    })
}

// ============================================================================
// Scan & publish
// ============================================================================

/// Pages found under the pages directory.
#[derive(Debug, Default)]
pub struct PageSet {
    pub about: Option<About>,
    pub press: Vec<(PathBuf, Press)>,
    /// Files that could not be read; the rest are still published.
    pub errors: Vec<PageError>,
}

/// Read `about.md` and `press/*.md` under `root`. A missing directory or file
/// is simply absent from the result.
pub fn scan_pages(root: &Path) -> Result<PageSet, PageError> {
    let mut set = PageSet::default();

    let about = root.join("about.md");
    if about.is_file() {
        match read_about(&about) {
            Ok(page) => set.about = Some(page),
            Err(e) => set.errors.push(e),
        }
    }

    let press_dir = root.join("press");
    if press_dir.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(&press_dir)
            .map_err(|source| PageError::Io {
                path: press_dir.clone(),
                source,
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .map(|e| e.eq_ignore_ascii_case("md"))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();

        for path in files {
            match read_press(&path) {
                Ok(press) => set.press.push((path, press)),
                Err(e) => set.errors.push(e),
            }
        }
    }
    Ok(set)
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PageAction {
    Created { id: String },
    Updated { id: String },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageOutcome {
    #[serde(rename = "type")]
    pub doc_type: &'static str,
    pub title: String,
    #[serde(flatten)]
    pub action: PageAction,
}

#[derive(Debug, Default, Serialize)]
pub struct PagesReport {
    pub outcomes: Vec<PageOutcome>,
}

impl PagesReport {
    fn push(&mut self, doc_type: DocType, title: &str, result: Result<PageAction, PublishError>) {
        let action = result.unwrap_or_else(|e| {
            tracing::warn!(title, "page not published: {e}");
            PageAction::Failed {
                error: e.to_string(),
            }
        });
        self.outcomes.push(PageOutcome {
            doc_type: doc_type.as_str(),
            title: title.to_string(),
            action,
        });
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.action, PageAction::Failed { .. }))
            .count()
    }
}

/// Create or update the About singleton.
fn publish_about(
    store: &mut dyn ContentStore,
    validator: &Validator,
    about: &About,
) -> Result<PageAction, PublishError> {
    let value = validator.validate_document(&Document::About(about.clone()))?;
    if store.get(ABOUT_ID, DocType::About.as_str())?.is_some() {
        let patch = Patch::new(ABOUT_ID)
            .set("title", value["title"].clone())
            .set("content", value["content"].clone());
        store.commit(&patch)?;
        return Ok(PageAction::Updated {
            id: ABOUT_ID.to_string(),
        });
    }
    let id = store.create(value)?;
    Ok(PageAction::Created { id })
}

fn press_identity(title: &str, publication: &str) -> (String, String) {
    (title.to_string(), publication.to_string())
}

/// Publish scanned pages. Press items already stored under the same title and
/// publication are skipped.
pub fn publish_pages(
    store: &mut dyn ContentStore,
    validator: &Validator,
    pages: &PageSet,
) -> Result<PagesReport, StoreError> {
    let mut report = PagesReport::default();

    if let Some(about) = &pages.about {
        report.push(DocType::About, &about.title, publish_about(store, validator, about));
    }

    let mut existing: HashSet<(String, String)> = store
        .documents(DocType::Press.as_str())?
        .iter()
        .filter_map(|d| {
            Some(press_identity(
                d.get("title").and_then(Value::as_str)?,
                d.get("publication").and_then(Value::as_str)?,
            ))
        })
        .collect();

    for (path, press) in &pages.press {
        let identity = press_identity(&press.title, &press.publication);
        if existing.contains(&identity) {
            tracing::info!(file = %path.display(), "press item already exists, skipping");
            report.push(
                DocType::Press,
                &press.title,
                Ok(PageAction::Skipped {
                    reason: "title and publication already exist".into(),
                }),
            );
            continue;
        }
        let result = validator
            .validate_document(&Document::Press(press.clone()))
            .map_err(PublishError::from)
            .and_then(|value| Ok(store.create(value)?))
            .map(|id| PageAction::Created { id });
        if matches!(result, Ok(PageAction::Created { .. })) {
            existing.insert(identity);
        }
        report.push(DocType::Press, &press.title, result);
    }

    Ok(report)
}
