//! Write-side validation.
//!
//! [`Validator::validate`] checks a raw JSON document against the field rules
//! for its `_type` and, when every rule passes, decodes it into a typed
//! [`Document`]. All violations are collected in one pass so an import report
//! or `folio check` shows everything wrong with a document at once.

use super::definition::{self, BLOCK_STYLES, FieldKind, FieldRule, TypeDefinition};
use super::portable_text::DECORATORS;
use super::{ABOUT_ID, Document};
use crate::config::SchemaConfig;
use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// One failed rule, located by a field path such as `assets[1]._key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Document must be a JSON object")]
    NotAnObject,
    #[error("Document _type is required")]
    MissingType,
    #[error("Unknown document type {0:?}")]
    UnknownType(String),
    #[error("Invalid {doc_type} document: {}", join_violations(.violations))]
    Invalid {
        doc_type: String,
        violations: Vec<Violation>,
    },
    #[error("Slug {slug:?} is already used by document {existing_id}")]
    DuplicateSlug { slug: String, existing_id: String },
    #[error("Could not decode {doc_type} document: {source}")]
    Decode {
        doc_type: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ValidationError {
    /// Rule violations carried by this error, empty for structural errors.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationError::Invalid { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Checks documents against the schema rules.
#[derive(Debug, Clone)]
pub struct Validator {
    pub min_year: i32,
    pub max_year: i32,
    pub slug_max_length: usize,
}

impl Validator {
    pub fn new(min_year: i32, max_year: i32, slug_max_length: usize) -> Self {
        Self {
            min_year,
            max_year,
            slug_max_length,
        }
    }

    /// Validator whose year ceiling is the current local year.
    pub fn from_config(config: &SchemaConfig) -> Self {
        let current_year = chrono::Local::now().year();
        Self::new(config.min_year, current_year, config.slug_max_length)
    }

    /// Check a raw document and decode it when every rule passes.
    pub fn validate(&self, value: &Value) -> Result<Document, ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
        let doc_type = object
            .get("_type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingType)?;
        let definition = definition::definition_for(doc_type)
            .ok_or_else(|| ValidationError::UnknownType(doc_type.to_string()))?;

        let violations = self.check_object(definition, object);
        if !violations.is_empty() {
            return Err(ValidationError::Invalid {
                doc_type: doc_type.to_string(),
                violations,
            });
        }

        serde_json::from_value(value.clone()).map_err(|source| ValidationError::Decode {
            doc_type: doc_type.to_string(),
            source,
        })
    }

    /// Validate a typed document, returning the JSON that should be stored.
    pub fn validate_document(&self, document: &Document) -> Result<Value, ValidationError> {
        let value = serde_json::to_value(document)?;
        self.validate(&value)?;
        Ok(value)
    }

    /// Run every field rule of `definition` against `object`.
    pub fn check_object(
        &self,
        definition: &TypeDefinition,
        object: &Map<String, Value>,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in definition.fields {
            self.check_field(rule, object.get(rule.name), &mut violations);
        }
        violations
    }

    fn check_field(&self, rule: &FieldRule, value: Option<&Value>, out: &mut Vec<Violation>) {
        let path = rule.name;
        let value = match value {
            None | Some(Value::Null) => {
                if rule.required {
                    out.push(Violation::new(path, "is required"));
                }
                return;
            }
            Some(v) => v,
        };

        match rule.kind {
            FieldKind::String | FieldKind::Text => match value.as_str() {
                Some(s) if rule.required && s.trim().is_empty() => {
                    out.push(Violation::new(path, "must not be empty"))
                }
                Some(_) => {}
                None => out.push(Violation::new(path, "must be a string")),
            },
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    out.push(Violation::new(path, "must be true or false"));
                }
            }
            FieldKind::Year => self.check_year(path, value, out),
            FieldKind::Date => match value.as_str() {
                Some(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {}
                _ => out.push(Violation::new(path, "must be a date (YYYY-MM-DD)")),
            },
            FieldKind::Url => match value.as_str() {
                Some(s) if s.starts_with("http://") || s.starts_with("https://") => {}
                _ => out.push(Violation::new(path, "must be an http(s) URL")),
            },
            FieldKind::Slug => self.check_slug(path, value, out),
            FieldKind::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                _ => out.push(Violation::new(
                    path,
                    format!("must be one of: {}", allowed.join(", ")),
                )),
            },
            FieldKind::StringArray => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if !item.is_string() {
                            out.push(Violation::new(format!("{path}[{i}]"), "must be a string"));
                        }
                    }
                }
                None => out.push(Violation::new(path, "must be an array of strings")),
            },
            FieldKind::Image => check_image(path, value, out),
            FieldKind::KeyedArray { of, min } => check_keyed_array(path, value, of, min, out),
            FieldKind::RichText => check_rich_text(path, value, out),
        }
    }

    fn check_year(&self, path: &str, value: &Value, out: &mut Vec<Violation>) {
        // Float years (2015.0 included) cannot decode into the typed model.
        match value.as_i64() {
            Some(y) if y >= i64::from(self.min_year) && y <= i64::from(self.max_year) => {}
            Some(y) => out.push(Violation::new(
                path,
                format!(
                    "{y} is outside {}..={}",
                    self.min_year, self.max_year
                ),
            )),
            None => out.push(Violation::new(path, "must be a whole number")),
        }
    }

    fn check_slug(&self, path: &str, value: &Value, out: &mut Vec<Violation>) {
        let current = value.get("current").and_then(Value::as_str);
        match current {
            None => out.push(Violation::new(format!("{path}.current"), "is required")),
            Some("") => out.push(Violation::new(format!("{path}.current"), "must not be empty")),
            Some(s) => {
                if s.len() > self.slug_max_length {
                    out.push(Violation::new(
                        format!("{path}.current"),
                        format!("must be at most {} characters", self.slug_max_length),
                    ));
                }
                if !s
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                {
                    out.push(Violation::new(
                        format!("{path}.current"),
                        "may only contain a-z, 0-9 and '-'",
                    ));
                }
            }
        }
    }

    /// Validate every stored document and look for store-wide problems.
    pub fn check_documents(&self, documents: &[Value]) -> CheckReport {
        let mut report = CheckReport {
            checked: documents.len(),
            ..CheckReport::default()
        };
        let mut slugs: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for value in documents {
            let id = value
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match self.validate(value) {
                Ok(Document::Artwork(artwork)) => {
                    slugs.entry(artwork.slug.current).or_default().push(id);
                }
                Ok(Document::About(_)) => report.about_ids.push(id),
                Ok(Document::Press(_)) => {}
                Err(error) => report.invalid.push(InvalidDocument { id, error }),
            }
        }

        report.duplicate_slugs = slugs
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .collect();
        report
    }
}

/// Outcome of [`Validator::check_documents`].
#[derive(Debug, Default)]
pub struct CheckReport {
    pub checked: usize,
    pub invalid: Vec<InvalidDocument>,
    /// Slug → ids of every artwork using it, only for slugs used more than once.
    pub duplicate_slugs: Vec<(String, Vec<String>)>,
    pub about_ids: Vec<String>,
}

#[derive(Debug)]
pub struct InvalidDocument {
    pub id: String,
    pub error: ValidationError,
}

impl CheckReport {
    /// More than one About document, or one not stored under the singleton id.
    pub fn about_is_ambiguous(&self) -> bool {
        self.about_ids.len() > 1 || self.about_ids.iter().any(|id| id != ABOUT_ID)
    }

    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.duplicate_slugs.is_empty() && !self.about_is_ambiguous()
    }
}

fn reference_id(value: &Value) -> Option<&str> {
    value
        .get("_ref")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn check_image(path: &str, value: &Value, out: &mut Vec<Violation>) {
    if !value.is_object() {
        out.push(Violation::new(path, "must be an image object"));
        return;
    }
    if value.get("asset").and_then(reference_id).is_none() {
        out.push(Violation::new(format!("{path}.asset"), "must reference an uploaded asset"));
    }
    if let Some(hotspot) = value.get("hotspot").filter(|h| !h.is_null()) {
        for axis in ["x", "y", "width", "height"] {
            match hotspot.get(axis).and_then(Value::as_f64) {
                Some(v) if (0.0..=1.0).contains(&v) => {}
                _ => out.push(Violation::new(
                    format!("{path}.hotspot.{axis}"),
                    "must be a number between 0 and 1",
                )),
            }
        }
    }
}

fn check_file(path: &str, value: Option<&Value>, out: &mut Vec<Violation>) {
    let asset = value.and_then(|f| f.get("asset")).and_then(reference_id);
    if asset.is_none() {
        out.push(Violation::new(
            format!("{path}.asset"),
            "must reference an uploaded file",
        ));
    }
}

/// Keys must be present and unique within their array.
fn check_item_key(
    path: &str,
    index: usize,
    item: &Value,
    seen: &mut HashSet<String>,
    out: &mut Vec<Violation>,
) {
    match item.get("_key").and_then(Value::as_str) {
        Some(key) if !key.is_empty() => {
            if !seen.insert(key.to_string()) {
                out.push(Violation::new(
                    format!("{path}[{index}]._key"),
                    format!("duplicate key {key:?}"),
                ));
            }
        }
        _ => out.push(Violation::new(format!("{path}[{index}]._key"), "is required")),
    }
}

fn check_keyed_array(
    path: &str,
    value: &Value,
    of: &[&str],
    min: usize,
    out: &mut Vec<Violation>,
) {
    let Some(items) = value.as_array() else {
        out.push(Violation::new(path, "must be an array"));
        return;
    };
    if items.len() < min {
        out.push(Violation::new(
            path,
            format!("must contain at least {min} item(s)"),
        ));
    }

    let mut seen = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        check_item_key(path, i, item, &mut seen, out);
        let item_path = format!("{path}[{i}]");
        match item.get("_type").and_then(Value::as_str) {
            Some(t) if of.contains(&t) => match t {
                "artworkImage" | "image" => check_image(&item_path, item, out),
                "videoAsset" | "audioAsset" => {
                    check_file(&format!("{item_path}.file"), item.get("file"), out)
                }
                _ => {}
            },
            _ => out.push(Violation::new(
                format!("{item_path}._type"),
                format!("must be one of: {}", of.join(", ")),
            )),
        }
    }
}

fn check_rich_text(path: &str, value: &Value, out: &mut Vec<Violation>) {
    let Some(nodes) = value.as_array() else {
        out.push(Violation::new(path, "must be an array of blocks"));
        return;
    };

    let mut seen = HashSet::new();
    for (i, node) in nodes.iter().enumerate() {
        check_item_key(path, i, node, &mut seen, out);
        let node_path = format!("{path}[{i}]");
        match node.get("_type").and_then(Value::as_str) {
            Some("block") => check_block(&node_path, node, out),
            Some("image") => check_image(&node_path, node, out),
            _ => out.push(Violation::new(
                format!("{node_path}._type"),
                "must be block or image",
            )),
        }
    }
}

fn check_block(path: &str, block: &Value, out: &mut Vec<Violation>) {
    if let Some(style) = block.get("style") {
        match style.as_str() {
            Some(s) if BLOCK_STYLES.contains(&s) => {}
            _ => out.push(Violation::new(
                format!("{path}.style"),
                format!("must be one of: {}", BLOCK_STYLES.join(", ")),
            )),
        }
    }

    let link_keys: HashSet<&str> = block
        .get("markDefs")
        .and_then(Value::as_array)
        .map(|defs| {
            defs.iter()
                .filter_map(|d| d.get("_key").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let Some(children) = block.get("children").and_then(Value::as_array) else {
        out.push(Violation::new(format!("{path}.children"), "must be an array of spans"));
        return;
    };
    for (j, span) in children.iter().enumerate() {
        if span.get("text").and_then(Value::as_str).is_none() {
            out.push(Violation::new(
                format!("{path}.children[{j}].text"),
                "must be a string",
            ));
        }
        let marks = span.get("marks").and_then(Value::as_array);
        for mark in marks.into_iter().flatten() {
            let known = mark
                .as_str()
                .is_some_and(|m| DECORATORS.contains(&m) || link_keys.contains(m));
            if !known {
                out.push(Violation::new(
                    format!("{path}.children[{j}].marks"),
                    format!("unknown mark {mark}"),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{artwork_value, validator};
    use serde_json::json;

    fn violation_paths(err: &ValidationError) -> Vec<&str> {
        err.violations().iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn valid_artwork_decodes() {
        let doc = validator().validate(&artwork_value("Visit", 2015)).unwrap();
        match doc {
            Document::Artwork(a) => {
                assert_eq!(a.title, "Visit");
                assert_eq!(a.slug.current, "visit");
            }
            other => panic!("expected artwork, got {other:?}"),
        }
    }

    #[test]
    fn empty_assets_rejected() {
        let mut value = artwork_value("Visit", 2015);
        value["assets"] = json!([]);
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["assets"]);
    }

    #[test]
    fn missing_required_fields_all_reported() {
        let value = json!({"_type": "artwork", "assets": []});
        let err = validator().validate(&value).unwrap_err();
        let paths = violation_paths(&err);
        for field in ["title", "slug", "year", "medium", "category", "assets"] {
            assert!(paths.contains(&field), "{field} missing from {paths:?}");
        }
    }

    #[test]
    fn year_bounds() {
        let v = validator();
        assert!(v.validate(&artwork_value("Early", 1900)).is_ok());
        assert!(v.validate(&artwork_value("Too early", 1899)).is_err());
        assert!(v.validate(&artwork_value("Future", v.max_year + 1)).is_err());
    }

    #[test]
    fn fractional_year_rejected() {
        let mut value = artwork_value("Visit", 2015);
        value["year"] = json!(2015.5);
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["year"]);
    }

    #[test]
    fn float_year_is_a_year_violation() {
        let mut value = artwork_value("Visit", 2015);
        value["year"] = json!(2015.0);
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["year"]);
    }

    #[test]
    fn unknown_category_rejected() {
        let mut value = artwork_value("Visit", 2015);
        value["category"] = json!("fresco");
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["category"]);
    }

    #[test]
    fn duplicate_and_missing_asset_keys_rejected() {
        let mut value = artwork_value("Visit", 2015);
        let item = value["assets"][0].clone();
        let mut keyless = item.clone();
        keyless.as_object_mut().unwrap().remove("_key");
        value["assets"] = json!([item.clone(), item, keyless]);
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(
            violation_paths(&err),
            vec!["assets[1]._key", "assets[2]._key"]
        );
    }

    #[test]
    fn asset_without_reference_rejected() {
        let mut value = artwork_value("Visit", 2015);
        value["assets"][0]["asset"] = json!({"_type": "reference"});
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["assets[0].asset"]);
    }

    #[test]
    fn slug_must_be_url_safe_and_bounded() {
        let mut value = artwork_value("Visit", 2015);
        value["slug"]["current"] = json!("Visit Me");
        assert!(validator().validate(&value).is_err());

        value["slug"]["current"] = json!("a".repeat(97));
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["slug.current"]);
    }

    #[test]
    fn hotspot_out_of_range_rejected() {
        let mut value = artwork_value("Visit", 2015);
        value["mainImage"]["hotspot"] = json!({"x": 0.5, "y": 1.5, "width": 0.2, "height": 0.2});
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["mainImage.hotspot.y"]);
    }

    #[test]
    fn press_requires_date_and_publication() {
        let value = json!({
            "_type": "press",
            "title": "A review",
            "publishedDate": "2016-02-30",
            "externalUrl": "example.org"
        });
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(
            violation_paths(&err),
            vec!["publication", "publishedDate", "externalUrl"]
        );
    }

    #[test]
    fn about_rich_text_marks_must_resolve() {
        let value = json!({
            "_type": "about",
            "title": "About",
            "content": [{
                "_type": "block",
                "_key": "b1",
                "style": "normal",
                "children": [{"_type": "span", "_key": "s1", "text": "Hi", "marks": ["strong", "missing"]}],
                "markDefs": []
            }]
        });
        let err = validator().validate(&value).unwrap_err();
        assert_eq!(violation_paths(&err), vec!["content[0].children[0].marks"]);
    }

    #[test]
    fn structural_errors() {
        let v = validator();
        assert!(matches!(
            v.validate(&json!([])),
            Err(ValidationError::NotAnObject)
        ));
        assert!(matches!(
            v.validate(&json!({"title": "x"})),
            Err(ValidationError::MissingType)
        ));
        assert!(matches!(
            v.validate(&json!({"_type": "exhibition"})),
            Err(ValidationError::UnknownType(_))
        ));
    }

    #[test]
    fn check_documents_reports_duplicates_and_invalid() {
        let mut first = artwork_value("Visit", 2015);
        first["_id"] = json!("a1");
        let mut second = artwork_value("Visit", 2014);
        second["_id"] = json!("a2");
        let mut broken = artwork_value("Broken", 2015);
        broken["_id"] = json!("a3");
        broken["assets"] = json!([]);
        let about = json!({"_id": "about", "_type": "about", "title": "About", "content": []});

        let report = validator().check_documents(&[first, second, broken, about]);
        assert_eq!(report.checked, 4);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].id, "a3");
        assert_eq!(
            report.duplicate_slugs,
            vec![("visit".to_string(), vec!["a1".to_string(), "a2".to_string()])]
        );
        assert!(!report.about_is_ambiguous());
        assert!(!report.is_clean());
    }
}
