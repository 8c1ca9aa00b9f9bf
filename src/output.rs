//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every item is its catalogue identity (positional index and title);
//! source filenames and document ids are secondary context on indented lines.
//! Reports read as a content inventory while still letting users trace an
//! entry back to its file or document.
//!
//! # Output Format
//!
//! ## Parse
//!
//! ```text
//! 001 Visit (2015)
//!     Source: 04_Visit_2015_oiloncanvas_60hx72.jpg
//!     Medium: Oil on canvas
//!     Dimensions: 60h × 72 inches
//! 002 (03_Broken.jpg)
//!     Error: Expected at least 4 underscore-separated segments, found 2: 03_Broken.jpg
//!
//! Parsed 1 of 2 filenames
//! ```
//!
//! ## Import
//!
//! ```text
//! 001 Visit
//!     Source: 04_Visit_2015_oiloncanvas_60hx72.jpg
//!     Imported: 3f1c… (image-9a0e…-4x3-jpg)
//! 002 (03_Broken.jpg)
//!     Failed (parse): Expected at least 4 underscore-separated segments, found 2: 03_Broken.jpg
//!
//! Imported 1, skipped 0, failed 1
//! ```
//!
//! ## Check
//!
//! ```text
//! a3 invalid (artwork)
//!     assets: must contain at least 1 item
//! Duplicate slug visit
//!     a1, a2
//!
//! Checked 4 documents: 1 invalid, 1 duplicate slug
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::import::{ImportReport, ItemOutcome};
use crate::migrate::{MigrationReport, PatchStatus};
use crate::naming::{ParseError, ParsedFilename};
use crate::pages::{PageAction, PagesReport};
use crate::query::ArtworkListItem;
use crate::schema::validate::CheckReport;
use serde::Serialize;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line for an item: titled items show their title, untitled ones the
/// filename in parens.
///
/// ```text
/// 001 Visit
/// 002 (03_Broken.jpg)    // no title; filename IS the identity
/// ```
fn item_line(index: usize, title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} ({})", format_index(index), filename),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Parse
// ============================================================================

pub fn format_parse_results(results: &[(String, Result<ParsedFilename, ParseError>)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (filename, result)) in results.iter().enumerate() {
        match result {
            Ok(parsed) => {
                lines.push(format!(
                    "{} ({})",
                    item_line(i + 1, Some(&parsed.title), filename),
                    parsed.year
                ));
                lines.push(format!("{}Source: {}", indent(1), filename));
                lines.push(format!("{}Medium: {}", indent(1), parsed.medium));
                if !parsed.dimensions.is_empty() {
                    lines.push(format!("{}Dimensions: {}", indent(1), parsed.dimensions));
                }
            }
            Err(e) => {
                lines.push(item_line(i + 1, None, filename));
                lines.push(format!("{}Error: {}", indent(1), e));
            }
        }
    }
    let parsed = results.iter().filter(|(_, r)| r.is_ok()).count();
    if !results.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("Parsed {} of {} filenames", parsed, results.len()));
    lines
}

pub fn print_parse_results(results: &[(String, Result<ParsedFilename, ParseError>)]) {
    for line in format_parse_results(results) {
        println!("{line}");
    }
}

// ============================================================================
// Import
// ============================================================================

pub fn format_import_report(report: &ImportReport, dry_run: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in report.outcomes.iter().enumerate() {
        match outcome {
            ItemOutcome::Imported {
                filename,
                title,
                document_id,
                asset_id,
            } => {
                lines.push(item_line(i + 1, Some(title), filename));
                lines.push(format!("{}Source: {}", indent(1), filename));
                let verb = if dry_run { "Would import" } else { "Imported" };
                lines.push(format!("{}{}: {} ({})", indent(1), verb, document_id, asset_id));
            }
            ItemOutcome::Skipped {
                filename,
                title,
                reason,
            } => {
                lines.push(item_line(i + 1, Some(title), filename));
                lines.push(format!("{}Source: {}", indent(1), filename));
                lines.push(format!("{}Skipped: {}", indent(1), reason));
            }
            ItemOutcome::Failed { filename, failure } => {
                lines.push(item_line(i + 1, None, filename));
                lines.push(format!("{}Failed ({}): {}", indent(1), failure.stage(), failure));
                for violation in failure_violations(failure) {
                    lines.push(format!("{}{}", indent(2), violation));
                }
            }
        }
    }
    if !report.outcomes.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{}{}, skipped {}, failed {}",
        if dry_run { "Dry run: would import " } else { "Imported " },
        report.imported(),
        report.skipped(),
        report.failed()
    ));
    lines
}

fn failure_violations(failure: &crate::import::ImportFailure) -> Vec<String> {
    match failure {
        crate::import::ImportFailure::Validation(e) => {
            e.violations().iter().map(ToString::to_string).collect()
        }
        _ => Vec::new(),
    }
}

pub fn print_import_report(report: &ImportReport, dry_run: bool) {
    for line in format_import_report(report, dry_run) {
        println!("{line}");
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    for invalid in &report.invalid {
        let id = if invalid.id.is_empty() {
            "(no id)"
        } else {
            invalid.id.as_str()
        };
        lines.push(format!("{id} invalid"));
        let violations = invalid.error.violations();
        if violations.is_empty() {
            lines.push(format!("{}{}", indent(1), invalid.error));
        }
        for violation in violations {
            lines.push(format!("{}{}", indent(1), violation));
        }
    }
    for (slug, ids) in &report.duplicate_slugs {
        lines.push(format!("Duplicate slug {slug}"));
        lines.push(format!("{}{}", indent(1), ids.join(", ")));
    }
    if report.about_is_ambiguous() {
        lines.push("About singleton".to_string());
        lines.push(format!("{}stored as: {}", indent(1), report.about_ids.join(", ")));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Checked {}: {} invalid, {}",
        plural(report.checked, "document"),
        report.invalid.len(),
        plural(report.duplicate_slugs.len(), "duplicate slug")
    ));
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{line}");
    }
}

// ============================================================================
// Migrate
// ============================================================================

pub fn format_migration_report(report: &MigrationReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in report.outcomes.iter().enumerate() {
        lines.push(item_line(i + 1, Some(&outcome.title), &outcome.document_id));
        lines.push(format!("{}Id: {}", indent(1), outcome.document_id));
        let status = match &outcome.status {
            PatchStatus::Applied => "applied".to_string(),
            PatchStatus::Planned => "planned".to_string(),
            PatchStatus::Failed { error } => format!("failed: {error}"),
        };
        lines.push(format!("{}{}: {}", indent(1), outcome.description, status));
    }
    if !report.outcomes.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{}: scanned {}, changed {}, failed {}",
        report.migration,
        report.scanned,
        report.applied(),
        report.failed()
    ));
    lines
}

pub fn print_migration_report(report: &MigrationReport) {
    for line in format_migration_report(report) {
        println!("{line}");
    }
}

// ============================================================================
// Pages
// ============================================================================

pub fn format_pages_report(report: &PagesReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in report.outcomes.iter().enumerate() {
        lines.push(format!(
            "{} [{}]",
            item_line(i + 1, Some(&outcome.title), outcome.doc_type),
            outcome.doc_type
        ));
        let detail = match &outcome.action {
            PageAction::Created { id } => format!("Created: {id}"),
            PageAction::Updated { id } => format!("Updated: {id}"),
            PageAction::Skipped { reason } => format!("Skipped: {reason}"),
            PageAction::Failed { error } => format!("Failed: {error}"),
        };
        lines.push(format!("{}{}", indent(1), detail));
    }
    lines
}

pub fn print_pages_report(report: &PagesReport) {
    for line in format_pages_report(report) {
        println!("{line}");
    }
}

// ============================================================================
// Query
// ============================================================================

/// One line per artwork: index, title, year and medium.
pub fn format_artwork_table(items: &[ArtworkListItem]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{} {} ({}) {}{}",
                format_index(i + 1),
                item.title,
                item.year,
                truncate(&item.medium, 40),
                if item.featured { " *" } else { "" }
            )
        })
        .collect()
}

/// Pretty JSON for query results.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
