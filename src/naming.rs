//! Filename metadata parsing for artwork source images.
//!
//! Source images were exported over the years under two naming conventions.
//! Both are underscore-delimited and carry the same four facts about a work:
//! title, year, medium and physical dimensions.
//!
//! ## Dialect A (indexed)
//!
//! ```text
//! 04_Visit_2015_oiloncanvas_60hx72.jpg
//! NN_Title_Year_Medium_Dimensions.ext
//! ```
//!
//! Slots are fixed. The leading index is discarded. Media are written as one
//! run-together word (`Acrylicandoiloncanvas`), so they are segmented against a
//! small medium lexicon and rendered in catalogue form:
//!
//! - `04_Visit_2015_oiloncanvas_60hx72.jpg` → "Visit", 2015, "Oil on canvas", "60h × 72 inches"
//! - `03_OldSpaghettiCollisionGravity_2015_acryliconcanvas_60hx48in.jpg`
//!   → "Old Spaghetti Collision Gravity", 2015, "Acrylic on canvas", "60h × 48 inches"
//!
//! Two historical irregularities are tolerated: a dimensions slot written
//! before the medium slot (recognised by its leading digit), and medium and
//! dimensions fused into one final slot (split at the first digit).
//!
//! ## Dialect B (year first)
//!
//! ```text
//! 2014_GiftOfFear_AcrylicOnCanvas_48x72in.jpg
//! Year_Title..._Medium..._Dimensions.ext
//! ```
//!
//! Title and medium may span several tokens. The medium starts at the first
//! token (after the year, before the last token) containing one of
//! [`MEDIUM_KEYWORDS`] as a case-insensitive substring. The first hit wins and
//! there is no backtracking, so a title token such as `Toil` starts the medium
//! early. Imported catalogue entries depend on that behaviour; keep it.
//!
//! - `2014_GiftOfFear_AcrylicOnCanvas_48x72in.jpg`
//!   → "Gift Of Fear", 2014, "Acrylic On Canvas", "48 x 72 inches"

use serde::Serialize;
use thiserror::Error;

/// Keywords that mark the first medium token in a Dialect B filename.
pub const MEDIUM_KEYWORDS: &[&str] = &["acrylic", "oil", "canvas", "mixed"];

/// Words recognised when segmenting a run-together Dialect A medium.
///
/// Matching is case-insensitive and greedy (longest word first). The stored
/// spelling is the rendered form, so acronyms keep their capitals.
const MEDIUM_LEXICON: &[&str] = &[
    "acrylic", "aluminum", "and", "board", "canvas", "charcoal", "collage", "digital", "enamel",
    "film", "gesso", "gouache", "graphite", "ink", "linen", "media", "mixed", "oil", "on", "panel",
    "paper", "pastel", "pencil", "print", "PVC", "spray", "paint", "watercolor", "with", "wood",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected at least 4 underscore-separated segments, found {found}: {filename}")]
    TooFewSegments { filename: String, found: usize },
    #[error("No medium keyword found in: {filename}")]
    NoMediumKeyword { filename: String },
    #[error("Invalid year {segment:?} in: {filename}")]
    InvalidYear { filename: String, segment: String },
    #[error("Unrecognized filename layout: {filename}")]
    UnknownLayout { filename: String },
}

/// Which naming convention a filename was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// `NN_Title_Year_Medium_Dimensions`
    Indexed,
    /// `Year_Title_Medium_Dimensions`
    YearFirst,
}

/// Metadata recovered from a source filename.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFilename {
    pub filename: String,
    pub dialect: Dialect,
    pub title: String,
    pub year: i32,
    pub medium: String,
    /// Empty when the filename carries no dimensions.
    pub dimensions: String,
}

/// Parse a source filename in either dialect.
pub fn parse_filename(filename: &str) -> Result<ParsedFilename, ParseError> {
    let stem = strip_extension(filename);
    let segments: Vec<&str> = stem.split('_').collect();
    if segments.len() < 4 {
        return Err(ParseError::TooFewSegments {
            filename: filename.to_string(),
            found: segments.len(),
        });
    }

    let lead = segments[0];
    if lead.is_empty() || !lead.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::UnknownLayout {
            filename: filename.to_string(),
        });
    }
    match lead.len() {
        1..=3 => parse_indexed(filename, &segments),
        4 => parse_year_first(filename, &segments),
        _ => Err(ParseError::UnknownLayout {
            filename: filename.to_string(),
        }),
    }
}

/// Drop a trailing `.ext` when the part after the last dot looks like one.
fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => filename,
    }
}

fn parse_year(filename: &str, segment: &str) -> Result<i32, ParseError> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::InvalidYear {
            filename: filename.to_string(),
            segment: segment.to_string(),
        });
    }
    segment.parse().map_err(|_| ParseError::InvalidYear {
        filename: filename.to_string(),
        segment: segment.to_string(),
    })
}

// ============================================================================
// Dialect A
// ============================================================================

fn parse_indexed(filename: &str, segments: &[&str]) -> Result<ParsedFilename, ParseError> {
    let title = normalize_title(segments[1]);
    let year = parse_year(filename, segments[2])?;

    let rest = &segments[3..];
    let (medium_raw, dimensions_raw) = match rest {
        [fused] => split_fused(fused),
        [first, tail @ ..]
            if looks_like_dimensions(first) && !tail.iter().any(|s| looks_like_dimensions(s)) =>
        {
            (tail.concat(), first.to_string())
        }
        [head @ .., last] => (head.concat(), last.to_string()),
        [] => unreachable!("at least 4 segments checked by caller"),
    };

    Ok(ParsedFilename {
        filename: filename.to_string(),
        dialect: Dialect::Indexed,
        title,
        year,
        medium: catalogue_medium(&medium_raw),
        dimensions: catalogue_dimensions(&dimensions_raw),
    })
}

fn looks_like_dimensions(segment: &str) -> bool {
    segment.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Split `AcrylicandPVCfilmoncanvas48×72in` at the first digit.
fn split_fused(segment: &str) -> (String, String) {
    match segment.find(|c: char| c.is_ascii_digit()) {
        Some(pos) => (segment[..pos].to_string(), segment[pos..].to_string()),
        None => (segment.to_string(), String::new()),
    }
}

/// Segment a run-together medium against the lexicon and sentence-case it.
///
/// - `oiloncanvas` → "Oil on canvas"
/// - `Acrylicandoiloncanvas` → "Acrylic and oil on canvas"
/// - `AcrylicandPVCfilmoncanvas` → "Acrylic and PVC film on canvas"
///
/// Characters that start no lexicon word are kept together as an unknown word,
/// lower-cased.
pub fn catalogue_medium(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut unknown = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() || chars[i] == '-' {
            flush_word(&mut unknown, &mut words);
            i += 1;
            continue;
        }
        match longest_lexicon_match(&chars[i..]) {
            Some(word) => {
                flush_word(&mut unknown, &mut words);
                words.push(word.to_string());
                i += word.chars().count();
            }
            None => {
                unknown.extend(chars[i].to_lowercase());
                i += 1;
            }
        }
    }
    flush_word(&mut unknown, &mut words);

    let joined = words.join(" ");
    capitalize_first(&joined)
}

fn flush_word(pending: &mut String, words: &mut Vec<String>) {
    if !pending.is_empty() {
        words.push(std::mem::take(pending));
    }
}

fn longest_lexicon_match(chars: &[char]) -> Option<&'static str> {
    MEDIUM_LEXICON
        .iter()
        .filter(|word| {
            let len = word.chars().count();
            len <= chars.len()
                && word
                    .chars()
                    .zip(chars)
                    .all(|(w, c)| w.eq_ignore_ascii_case(c))
        })
        .max_by_key(|word| word.len())
        .copied()
}

/// Render Dialect A dimensions in catalogue form.
///
/// - `60hx72` → "60h × 72 inches"
/// - `48×66in` → "48 × 66 inches"
/// - `60wx84hinches` → "60w × 84h inches"
pub fn catalogue_dimensions(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let bare = trimmed
        .strip_suffix("inches")
        .or_else(|| trimmed.strip_suffix("in"))
        .unwrap_or(trimmed)
        .trim();

    let body = match bare.find(['x', '×']) {
        Some(pos) => {
            let sep_len = bare[pos..].chars().next().map_or(1, char::len_utf8);
            format!(
                "{} × {}",
                bare[..pos].trim(),
                bare[pos + sep_len..].trim()
            )
        }
        None => bare.to_string(),
    };
    format!("{body} inches")
}

// ============================================================================
// Dialect B
// ============================================================================

fn parse_year_first(filename: &str, segments: &[&str]) -> Result<ParsedFilename, ParseError> {
    let year = parse_year(filename, segments[0])?;
    let last = segments.len() - 1;

    let medium_start = (1..last)
        .find(|&i| contains_medium_keyword(segments[i]))
        .ok_or_else(|| ParseError::NoMediumKeyword {
            filename: filename.to_string(),
        })?;

    let title = normalize_title(&segments[1..medium_start].join(" "));
    let medium = normalize_medium(&segments[medium_start..last].concat());
    let dimensions = normalize_dimensions(segments[last]);

    Ok(ParsedFilename {
        filename: filename.to_string(),
        dialect: Dialect::YearFirst,
        title,
        year,
        medium,
        dimensions,
    })
}

/// Case-insensitive substring test against [`MEDIUM_KEYWORDS`].
pub fn contains_medium_keyword(token: &str) -> bool {
    let lower = token.to_lowercase();
    MEDIUM_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Title cleanup shared by both dialects: split camelCase, collapse whitespace.
pub fn normalize_title(raw: &str) -> String {
    collapse_whitespace(&split_camel_case(raw))
}

/// Dialect B medium cleanup.
///
/// `AcrylicAndOilOnCanvas` → "Acrylic And Oil On Canvas". The `And`/`On`
/// replacements are literal and case-sensitive, so they also fire inside
/// words (`OnlyInk` → "On Ly Ink").
pub fn normalize_medium(raw: &str) -> String {
    let spaced = raw.replace("And", " and ").replace("On", " on ");
    collapse_whitespace(&split_camel_case(&spaced))
        .to_lowercase()
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dialect B dimensions cleanup.
///
/// A trailing `in` becomes " inches" and the first `x` gets spaces around it.
/// Height/width markers stay glued to their numbers: `48hx72w` → "48h x 72w".
pub fn normalize_dimensions(raw: &str) -> String {
    let with_unit = match raw.strip_suffix("in") {
        Some(rest) => format!("{rest} inches"),
        None => raw.to_string(),
    };
    with_unit.replacen('x', " x ", 1)
}

/// Insert a space wherever a lowercase letter is followed by an uppercase one.
pub fn split_camel_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut prev: Option<char> = None;
    for c in raw.chars() {
        if let Some(p) = prev
            && p.is_ascii_lowercase()
            && c.is_ascii_uppercase()
        {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Dialect A
    // =========================================================================

    #[test]
    fn indexed_visit_matches_catalogue() {
        let p = parse_filename("04_Visit_2015_oiloncanvas_60hx72.jpg").unwrap();
        assert_eq!(p.dialect, Dialect::Indexed);
        assert_eq!(p.title, "Visit");
        assert_eq!(p.year, 2015);
        assert_eq!(p.medium, "Oil on canvas");
        assert_eq!(p.dimensions, "60h × 72 inches");
    }

    #[test]
    fn indexed_camel_case_title() {
        let p = parse_filename("03_OldSpaghettiCollisionGravity_2015_acryliconcanvas_60hx48in.jpg")
            .unwrap();
        assert_eq!(p.title, "Old Spaghetti Collision Gravity");
        assert_eq!(p.medium, "Acrylic on canvas");
        assert_eq!(p.dimensions, "60h × 48 inches");
    }

    #[test]
    fn indexed_unicode_separator() {
        let p = parse_filename("02_EachBabysFirstWords_2015_Acrylicandoiloncanvas_48×66in.jpg")
            .unwrap();
        assert_eq!(p.title, "Each Babys First Words");
        assert_eq!(p.medium, "Acrylic and oil on canvas");
        assert_eq!(p.dimensions, "48 × 66 inches");
    }

    #[test]
    fn indexed_dimensions_before_medium_are_swapped_back() {
        let p = parse_filename("05_frenchwines(red)_2015_60wx84hinches_acrylicandoiloncanvas.jpg")
            .unwrap();
        assert_eq!(p.title, "frenchwines(red)");
        assert_eq!(p.medium, "Acrylic and oil on canvas");
        assert_eq!(p.dimensions, "60w × 84h inches");
    }

    #[test]
    fn indexed_fused_medium_and_dimensions() {
        let p = parse_filename("07_TrashHasItsOwnDay_2015_AcrylicandPVCfilmoncanvas48×72in.jpg")
            .unwrap();
        assert_eq!(p.title, "Trash Has Its Own Day");
        assert_eq!(p.medium, "Acrylic and PVC film on canvas");
        assert_eq!(p.dimensions, "48 × 72 inches");
    }

    #[test]
    fn indexed_bad_year_is_error() {
        let err = parse_filename("01_Title_20x5_oiloncanvas_60x84in.jpg").unwrap_err();
        assert!(matches!(err, ParseError::InvalidYear { .. }));
    }

    // =========================================================================
    // Dialect B
    // =========================================================================

    #[test]
    fn year_first_multi_word_medium() {
        let p = parse_filename("2014_DataSoVast_AcrylicAndOilOnCanvas_72x48in.jpg").unwrap();
        assert_eq!(p.dialect, Dialect::YearFirst);
        assert_eq!(p.title, "Data So Vast");
        assert_eq!(p.year, 2014);
        assert_eq!(p.medium, "Acrylic And Oil On Canvas");
        assert_eq!(p.dimensions, "72 x 48 inches");
    }

    #[test]
    fn year_first_split_tokens_are_joined() {
        let p = parse_filename("2014_Gift_Of_Fear_Acrylic_On_Canvas_48x72in.jpg").unwrap();
        assert_eq!(p.title, "Gift Of Fear");
        assert_eq!(p.medium, "Acrylic On Canvas");
        assert_eq!(p.dimensions, "48 x 72 inches");
    }

    #[test]
    fn year_first_lowercase_keyword_matches() {
        let p = parse_filename("2015_Morning_oilOnCanvas_48hx72w.jpg").unwrap();
        assert_eq!(p.title, "Morning");
        assert_eq!(p.medium, "Oil On Canvas");
        assert_eq!(p.dimensions, "48h x 72w");
    }

    #[test]
    fn year_first_keyword_substring_inside_token() {
        let p = parse_filename("2014_Howl_MixedMediaOnPaper_30x40in.jpg").unwrap();
        assert_eq!(p.title, "Howl");
        assert_eq!(p.medium, "Mixed Media On Paper");
    }

    #[test]
    fn year_first_first_match_wins_even_inside_title() {
        // "Toil" contains "oil", so the medium starts at the title token.
        let p = parse_filename("2014_Toil_OilOnCanvas_48x72in.jpg").unwrap();
        assert_eq!(p.title, "");
        assert_eq!(p.medium, "Toil Oil On Canvas");
    }

    #[test]
    fn year_first_last_token_is_never_medium() {
        // The only keyword-bearing token is the final one, which is always dimensions.
        let err = parse_filename("2014_turtlesinbathtub_48hx72w_oilOnCanvas.jpg").unwrap_err();
        assert!(matches!(err, ParseError::NoMediumKeyword { .. }));
    }

    #[test]
    fn year_first_without_keyword_fails() {
        let err = parse_filename("2015_Untitled_Gouache_12x9in.jpg").unwrap_err();
        assert_eq!(
            err,
            ParseError::NoMediumKeyword {
                filename: "2015_Untitled_Gouache_12x9in.jpg".to_string()
            }
        );
    }

    // =========================================================================
    // Shared failures and helpers
    // =========================================================================

    #[test]
    fn too_few_segments() {
        let err = parse_filename("2015_Visit_60x72in.jpg").unwrap_err();
        assert!(matches!(err, ParseError::TooFewSegments { found: 3, .. }));
    }

    #[test]
    fn non_numeric_lead_is_unknown_layout() {
        let err = parse_filename("x01_Visit_2015_oil_60x72.jpg").unwrap_err();
        assert!(matches!(err, ParseError::UnknownLayout { .. }));
    }

    #[test]
    fn extension_is_optional() {
        let p = parse_filename("04_Visit_2015_oiloncanvas_60hx72").unwrap();
        assert_eq!(p.dimensions, "60h × 72 inches");
    }

    #[test]
    fn camel_case_split_only_at_lower_upper_boundaries() {
        assert_eq!(split_camel_case("WeCantKnow"), "We Cant Know");
        assert_eq!(split_camel_case("PVCfilm"), "PVCfilm");
        assert_eq!(split_camel_case("aBcD"), "a Bc D");
    }

    #[test]
    fn medium_literal_replacements_fire_inside_words() {
        assert_eq!(normalize_medium("OnlyInk"), "On Ly Ink");
        assert_eq!(normalize_medium("AcrylicOnCanvas"), "Acrylic On Canvas");
    }

    #[test]
    fn dimensions_without_unit_keep_raw_suffix() {
        assert_eq!(normalize_dimensions("60x72"), "60 x 72");
        assert_eq!(normalize_dimensions("60x72in"), "60 x 72 inches");
    }

    #[test]
    fn catalogue_medium_keeps_unknown_runs() {
        assert_eq!(catalogue_medium("oilonbirch"), "Oil on birch");
    }

    #[test]
    fn catalogue_dimensions_empty_stays_empty() {
        assert_eq!(catalogue_dimensions(""), "");
    }
}
