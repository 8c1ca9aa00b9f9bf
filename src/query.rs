//! Read-side projections.
//!
//! The site reads a fixed set of views over the stored documents. Each view is
//! a pure function over a [`Snapshot`] returning field-limited projection
//! structs, serialized with the content lake's field names so they can be
//! handed to a frontend unchanged.
//!
//! | View | Order |
//! |------|-------|
//! | [`all_artworks`] | year desc, title asc |
//! | [`artworks_ordered`] | caller's [`ArtworkOrder`] |
//! | [`featured_artworks`] | year desc, title asc |
//! | [`artworks_by_category`] | year desc, title asc |
//! | [`all_press`] | publishedDate desc, title asc |
//! | [`artwork_by_slug`], [`about`] | single document |

use crate::schema::{
    About, AssetItem, AssetMedia, Artwork, Category, ContentNode, Document, ImageRef, Press,
    PressCategory, ABOUT_ID,
};
use crate::store::{DocumentStore, StoreError};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

/// Typed view of every stored document the schema understands.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub artworks: Vec<Artwork>,
    pub press: Vec<Press>,
    pub about: Vec<About>,
}

impl Snapshot {
    /// Decode raw documents. Documents that do not decode are skipped with a
    /// warning; `folio check` reports them in detail.
    pub fn from_documents(values: impl IntoIterator<Item = Value>) -> Self {
        let mut snapshot = Snapshot::default();
        for value in values {
            let id = value
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match serde_json::from_value::<Document>(value) {
                Ok(Document::Artwork(a)) => snapshot.artworks.push(a),
                Ok(Document::Press(p)) => snapshot.press.push(p),
                Ok(Document::About(a)) => snapshot.about.push(a),
                Err(e) => tracing::warn!(id = %id, error = %e, "skipping undecodable document"),
            }
        }
        snapshot
    }

    /// Read all artwork, press and about documents from a store.
    pub fn load<S: DocumentStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let mut values = Vec::new();
        for doc_type in crate::schema::DocType::ALL {
            values.extend(store.documents(doc_type.as_str())?);
        }
        Ok(Self::from_documents(values))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArtworkOrder {
    /// Newest first. Same-year works by title.
    #[default]
    YearDesc,
    /// Oldest first. Same-year works by title.
    YearAsc,
    TitleAsc,
}

impl FromStr for ArtworkOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year-desc" => Ok(ArtworkOrder::YearDesc),
            "year-asc" => Ok(ArtworkOrder::YearAsc),
            "title-asc" | "title" => Ok(ArtworkOrder::TitleAsc),
            other => Err(format!(
                "unknown order {other:?} (expected year-desc, year-asc or title-asc)"
            )),
        }
    }
}

impl ArtworkOrder {
    fn compare(&self, a: &Artwork, b: &Artwork) -> Ordering {
        let by_title = || a.title.cmp(&b.title);
        match self {
            ArtworkOrder::YearDesc => b.year.cmp(&a.year).then_with(by_title),
            ArtworkOrder::YearAsc => a.year.cmp(&b.year).then_with(by_title),
            ArtworkOrder::TitleAsc => by_title().then_with(|| b.year.cmp(&a.year)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub asset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl From<&ImageRef> for ImageSummary {
    fn from(image: &ImageRef) -> Self {
        Self {
            asset_id: image.asset.asset_id.clone(),
            alt: image.alt.clone(),
        }
    }
}

/// Artwork as shown in grids and lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkListItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub year: i32,
    pub medium: String,
    pub category: Category,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_image: Option<ImageSummary>,
}

/// Artwork detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub year: i32,
    pub medium: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub featured: bool,
    pub tags: Vec<String>,
    pub assets: Vec<AssetItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_image: Option<ImageSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PressListItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub publication: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub published_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<PressCategory>,
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutPage {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: Vec<ContentNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<ImageSummary>,
}

/// The artwork's cover: `mainImage`, else its first image asset.
fn cover_image(artwork: &Artwork) -> Option<ImageSummary> {
    if let Some(main) = &artwork.main_image {
        return Some(main.into());
    }
    artwork.assets.iter().find_map(|item| match &item.media {
        AssetMedia::Image { asset, alt, .. } => Some(ImageSummary {
            asset_id: asset.asset_id.clone(),
            alt: alt.clone(),
        }),
        _ => None,
    })
}

impl From<&Artwork> for ArtworkListItem {
    fn from(a: &Artwork) -> Self {
        Self {
            id: a.id.clone(),
            title: a.title.clone(),
            slug: a.slug.current.clone(),
            year: a.year,
            medium: a.medium.clone(),
            category: a.category,
            featured: a.featured,
            main_image: cover_image(a),
        }
    }
}

impl From<&Artwork> for ArtworkDetail {
    fn from(a: &Artwork) -> Self {
        Self {
            id: a.id.clone(),
            title: a.title.clone(),
            slug: a.slug.current.clone(),
            year: a.year,
            medium: a.medium.clone(),
            category: a.category,
            dimensions: a.dimensions.clone(),
            description: a.description.clone(),
            featured: a.featured,
            tags: a.tags.clone(),
            assets: a.assets.clone(),
            main_image: cover_image(a),
        }
    }
}

impl From<&Press> for PressListItem {
    fn from(p: &Press) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            publication: p.publication.clone(),
            author: p.author.clone(),
            published_date: p.published_date,
            excerpt: p.excerpt.clone(),
            external_url: p.external_url.clone(),
            category: p.category,
            featured: p.featured,
        }
    }
}

fn ordered<'a>(
    artworks: impl Iterator<Item = &'a Artwork>,
    order: ArtworkOrder,
) -> Vec<ArtworkListItem> {
    let mut selected: Vec<&Artwork> = artworks.collect();
    selected.sort_by(|a, b| order.compare(a, b));
    selected.into_iter().map(ArtworkListItem::from).collect()
}

/// Every artwork, newest first.
pub fn all_artworks(snapshot: &Snapshot) -> Vec<ArtworkListItem> {
    artworks_ordered(snapshot, ArtworkOrder::YearDesc)
}

pub fn artworks_ordered(snapshot: &Snapshot, order: ArtworkOrder) -> Vec<ArtworkListItem> {
    ordered(snapshot.artworks.iter(), order)
}

pub fn artwork_by_slug(snapshot: &Snapshot, slug: &str) -> Option<ArtworkDetail> {
    snapshot
        .artworks
        .iter()
        .find(|a| a.slug.current == slug)
        .map(ArtworkDetail::from)
}

pub fn featured_artworks(snapshot: &Snapshot) -> Vec<ArtworkListItem> {
    ordered(
        snapshot.artworks.iter().filter(|a| a.featured),
        ArtworkOrder::YearDesc,
    )
}

pub fn artworks_by_category(snapshot: &Snapshot, category: Category) -> Vec<ArtworkListItem> {
    ordered(
        snapshot.artworks.iter().filter(|a| a.category == category),
        ArtworkOrder::YearDesc,
    )
}

/// Press coverage, most recent first.
pub fn all_press(snapshot: &Snapshot) -> Vec<PressListItem> {
    let mut press: Vec<&Press> = snapshot.press.iter().collect();
    press.sort_by(|a, b| {
        b.published_date
            .cmp(&a.published_date)
            .then_with(|| a.title.cmp(&b.title))
    });
    press.into_iter().map(PressListItem::from).collect()
}

/// The About page. The singleton id wins over any stray About documents.
pub fn about(snapshot: &Snapshot) -> Option<AboutPage> {
    snapshot
        .about
        .iter()
        .find(|a| a.id == ABOUT_ID)
        .or_else(|| snapshot.about.first())
        .map(|a| AboutPage {
            id: a.id.clone(),
            title: a.title.clone(),
            content: a.content.clone(),
            featured_image: a.featured_image.as_ref().map(ImageSummary::from),
        })
}

/// Titles of every stored artwork, sorted.
pub fn artwork_titles(snapshot: &Snapshot) -> Vec<String> {
    let mut titles: Vec<String> = snapshot.artworks.iter().map(|a| a.title.clone()).collect();
    titles.sort();
    titles
}

/// Whether an artwork with exactly this title is stored.
pub fn exists_by_title(snapshot: &Snapshot, title: &str) -> bool {
    snapshot.artworks.iter().any(|a| a.title == title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{artwork, artwork_value};
    use serde_json::json;

    fn snapshot(works: &[(&str, i32)]) -> Snapshot {
        Snapshot {
            artworks: works.iter().map(|(t, y)| artwork(t, *y)).collect(),
            ..Snapshot::default()
        }
    }

    fn titles(items: &[ArtworkListItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn all_artworks_year_desc_then_title() {
        let snap = snapshot(&[
            ("We Can't Know", 2015),
            ("Capabilities", 2015),
            ("Visit", 2014),
        ]);
        assert_eq!(
            titles(&all_artworks(&snap)),
            vec!["Capabilities", "We Can't Know", "Visit"]
        );
    }

    #[test]
    fn year_asc_and_title_orders() {
        let snap = snapshot(&[("Visit", 2015), ("Data So Vast", 2014), ("Arc", 2015)]);
        assert_eq!(
            titles(&artworks_ordered(&snap, ArtworkOrder::YearAsc)),
            vec!["Data So Vast", "Arc", "Visit"]
        );
        assert_eq!(
            titles(&artworks_ordered(&snap, ArtworkOrder::TitleAsc)),
            vec!["Arc", "Data So Vast", "Visit"]
        );
    }

    #[test]
    fn order_parses_from_cli_names() {
        assert_eq!("year-asc".parse::<ArtworkOrder>(), Ok(ArtworkOrder::YearAsc));
        assert_eq!("title".parse::<ArtworkOrder>(), Ok(ArtworkOrder::TitleAsc));
        assert!("newest".parse::<ArtworkOrder>().is_err());
    }

    #[test]
    fn by_slug_returns_detail() {
        let snap = snapshot(&[("Visit", 2015), ("Capabilities", 2015)]);
        let detail = artwork_by_slug(&snap, "capabilities").unwrap();
        assert_eq!(detail.title, "Capabilities");
        assert_eq!(detail.assets.len(), 1);
        assert!(artwork_by_slug(&snap, "missing").is_none());
    }

    #[test]
    fn featured_and_category_filters() {
        let mut snap = snapshot(&[("Visit", 2015), ("Loop", 2016), ("Arc", 2014)]);
        snap.artworks[0].featured = true;
        snap.artworks[1].category = Category::Video;
        assert_eq!(titles(&featured_artworks(&snap)), vec!["Visit"]);
        assert_eq!(
            titles(&artworks_by_category(&snap, Category::Video)),
            vec!["Loop"]
        );
        assert_eq!(
            titles(&artworks_by_category(&snap, Category::Painting)),
            vec!["Visit", "Arc"]
        );
    }

    #[test]
    fn list_item_falls_back_to_first_image_asset() {
        let mut snap = snapshot(&[("Visit", 2015)]);
        snap.artworks[0].main_image = None;
        let item = &all_artworks(&snap)[0];
        let cover = item.main_image.as_ref().unwrap();
        assert_eq!(cover.asset_id, snap.artworks[0].assets[0].media.asset_id());
    }

    #[test]
    fn list_item_serializes_with_content_lake_names() {
        let snap = snapshot(&[("Visit", 2015)]);
        let value = serde_json::to_value(&all_artworks(&snap)[0]).unwrap();
        assert_eq!(value["slug"], "visit");
        assert!(value.get("_id").is_some());
        assert!(value["mainImage"]["assetId"].is_string());
    }

    #[test]
    fn press_newest_first() {
        let snap = Snapshot::from_documents(vec![
            json!({"_id": "p1", "_type": "press", "title": "B", "publication": "X", "publishedDate": "2016-01-01"}),
            json!({"_id": "p2", "_type": "press", "title": "C", "publication": "X", "publishedDate": "2018-05-01"}),
            json!({"_id": "p3", "_type": "press", "title": "A", "publication": "X", "publishedDate": "2016-01-01"}),
        ]);
        let titles: Vec<_> = all_press(&snap).into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }

    #[test]
    fn about_prefers_singleton_id() {
        let snap = Snapshot::from_documents(vec![
            json!({"_id": "stray", "_type": "about", "title": "Old", "content": []}),
            json!({"_id": "about", "_type": "about", "title": "About", "content": []}),
        ]);
        assert_eq!(about(&snap).unwrap().title, "About");
        assert!(about(&Snapshot::default()).is_none());
    }

    #[test]
    fn from_documents_skips_undecodable() {
        let mut broken = artwork_value("Broken", 2015);
        broken["year"] = json!("twenty fifteen");
        let snap = Snapshot::from_documents(vec![
            artwork_value("Visit", 2015),
            broken,
            json!({"_type": "sanity.imageAsset", "_id": "image-1"}),
        ]);
        assert_eq!(snap.artworks.len(), 1);
    }

    #[test]
    fn titles_and_existence() {
        let snap = snapshot(&[("Visit", 2015), ("Capabilities", 2015)]);
        assert_eq!(artwork_titles(&snap), vec!["Capabilities", "Visit"]);
        assert!(exists_by_title(&snap, "Visit"));
        assert!(!exists_by_title(&snap, "visit"));
    }
}
