//! Source directory scanning.
//!
//! Walks the import source directory and lists the media files to import,
//! classified by kind. Metadata is not read here; the importer parses each
//! filename and resolves overrides per item so a single bad file never stops
//! the scan.
//!
//! ## Directory Structure
//!
//! ```text
//! artworks/                                          # import.source_dir
//! ├── overrides.toml                                 # Editorial corrections (optional)
//! ├── 01_Capabilities_2015_Acrylicandoiloncanvas_60x84in.jpg
//! ├── 01_Capabilities_2015_Acrylicandoiloncanvas_60x84in.txt   # Sidecar description
//! ├── 2014_DataSoVast_AcrylicAndOilOnCanvas_72x48in.jpg
//! ├── video/
//! │   └── 2016_Loop_MixedMediaVideo_1080p.mp4        # Subdirectories are walked too
//! └── .DS_Store                                      # Hidden files are skipped
//! ```
//!
//! Files are returned sorted by path so import order is stable across runs.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::store::AssetKind;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tif", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "flac", "ogg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Classify a file by extension. `None` for anything that is not media.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    /// Upload endpoint for this kind of media.
    pub fn asset_kind(&self) -> AssetKind {
        match self {
            MediaKind::Image => AssetKind::Image,
            MediaKind::Video | MediaKind::Audio => AssetKind::File,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

/// A media file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Bare filename, the key for parsing and overrides.
    pub filename: String,
    pub kind: MediaKind,
}

/// List the media files under `root`.
///
/// Hidden files and directories are skipped, as are files whose name starts
/// with one of `exclude_prefixes`. Non-media files (sidecars, the overrides
/// file, notes) are ignored.
pub fn scan_sources(root: &Path, exclude_prefixes: &[String]) -> Result<Vec<SourceFile>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingSource(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    let mut sources = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().to_string();
        if exclude_prefixes.iter().any(|p| filename.starts_with(p.as_str())) {
            tracing::debug!(file = %filename, "excluded by prefix");
            continue;
        }
        let Some(kind) = MediaKind::from_path(entry.path()) else {
            continue;
        };
        sources.push(SourceFile {
            path: entry.path().to_path_buf(),
            filename,
            kind,
        });
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}
