//! End-to-end import against a local dataset directory.
//!
//! Writes the 2015 catalogue's source files (as small real images), imports
//! them with the editorial overrides, reopens the dataset from disk and reads
//! the catalogue back through the query layer.
//!
//! Run with: cargo test --test import_pipeline

use folio::import::{ImportFailure, ImportOptions, ImportReport, Importer};
use folio::metadata::Overrides;
use folio::query::{self, Snapshot};
use folio::scan::scan_sources;
use folio::schema::{DocType, Validator};
use folio::store::{DatasetStore, DocumentStore};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Catalogue rows as published: (filename, title, year, medium, dimensions).
const CATALOGUE: &[(&str, &str, i32, &str, &str)] = &[
    (
        "01_Capabilities_2015_Acrylicandoiloncanvas_60x84in.jpg",
        "Capabilities",
        2015,
        "Acrylic and oil on canvas",
        "60 x 84 inches",
    ),
    (
        "02_EachBabysFirstWords_2015_Acrylicandoiloncanvas_48×66in.jpg",
        "Each Baby's First Words",
        2015,
        "Acrylic and oil on canvas",
        "48 × 66 inches",
    ),
    (
        "03_OldSpaghettiCollisionGravity_2015_acryliconcanvas_60hx48in.jpg",
        "Old Spaghetti Collision Gravity",
        2015,
        "Acrylic on canvas",
        "60h × 48 inches",
    ),
    (
        "04_Visit_2015_oiloncanvas_60hx72.jpg",
        "Visit",
        2015,
        "Oil on canvas",
        "60h × 72 inches",
    ),
    (
        "05_frenchwines(red)_2015_60wx84hinches_acrylicandoiloncanvas.jpg",
        "French Wines (Red)",
        2015,
        "Acrylic and oil on canvas",
        "60w × 84h inches",
    ),
    (
        "06_WeCantKnow_2015_Acrylicandoiloncanvas_60x80in.jpg",
        "We Can't Know",
        2015,
        "Acrylic and oil on canvas",
        "60 × 80 inches",
    ),
    (
        "07_TrashHasItsOwnDay_2015_AcrylicandPVCfilmoncanvas48×72in.jpg",
        "Trash Has Its Own Day",
        2015,
        "Acrylic and PVC film on canvas",
        "48 × 72 inches",
    ),
];

/// Corrections for details the filenames cannot carry.
const OVERRIDES: &str = r#"
["01_Capabilities_2015_Acrylicandoiloncanvas_60x84in.jpg"]
dimensions = "60 x 84 inches"

["02_EachBabysFirstWords_2015_Acrylicandoiloncanvas_48×66in.jpg"]
title = "Each Baby's First Words"

["05_frenchwines(red)_2015_60wx84hinches_acrylicandoiloncanvas.jpg"]
title = "French Wines (Red)"

["06_WeCantKnow_2015_Acrylicandoiloncanvas_60x80in.jpg"]
title = "We Can't Know"
featured = true
"#;

fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 60, 90]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    std::fs::write(dir.join(name), bytes.into_inner()).unwrap();
}

fn setup_source() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (i, (filename, ..)) in CATALOGUE.iter().enumerate() {
        write_image(tmp.path(), filename, 4 + i as u32, 5);
    }
    write_image(tmp.path(), "2014_DataSoVast_AcrylicAndOilOnCanvas_72x48in.jpg", 6, 4);
    write_image(tmp.path(), "2015_Untitled_Gouache_12x9in.jpg", 3, 3);
    std::fs::write(tmp.path().join("overrides.toml"), OVERRIDES).unwrap();
    std::fs::write(
        tmp.path().join("04_Visit_2015_oiloncanvas_60hx72.txt"),
        "Painted over one winter.\n",
    )
    .unwrap();
    tmp
}

fn import(source: &Path, dataset: &Path) -> ImportReport {
    let sources = scan_sources(source, &[]).unwrap();
    let overrides = Overrides::load(&source.join("overrides.toml")).unwrap();
    let mut store = DatasetStore::open(dataset).unwrap();
    let options = ImportOptions {
        delay: Duration::ZERO,
        ..ImportOptions::default()
    };
    Importer::new(&mut store, Validator::new(1900, 2026, 96), options, overrides)
        .unwrap()
        .run(&sources)
}

#[test]
fn catalogue_imports_and_reads_back() {
    let source = setup_source();
    let dataset = TempDir::new().unwrap();

    let report = import(source.path(), dataset.path());
    assert_eq!(report.outcomes.len(), 9);
    assert_eq!(report.imported(), 8);
    assert_eq!(report.failed(), 1);
    let (failed, failure) = report.failures().next().unwrap();
    assert_eq!(failed, "2015_Untitled_Gouache_12x9in.jpg");
    assert!(matches!(failure, ImportFailure::Parse(_)));

    // Everything below reads from disk.
    let store = DatasetStore::open(dataset.path()).unwrap();
    let snapshot = Snapshot::load(&store).unwrap();
    assert_eq!(snapshot.artworks.len(), 8);

    for (filename, title, year, medium, dimensions) in CATALOGUE {
        let artwork = snapshot
            .artworks
            .iter()
            .find(|a| a.title == *title)
            .unwrap_or_else(|| panic!("{title} ({filename}) not imported"));
        assert_eq!(artwork.year, *year, "{filename}");
        assert_eq!(artwork.medium, *medium, "{filename}");
        assert_eq!(artwork.dimensions.as_deref(), Some(*dimensions), "{filename}");
    }

    let visit = query::artwork_by_slug(&snapshot, "visit").unwrap();
    assert_eq!(visit.description.as_deref(), Some("Painted over one winter."));
    assert!(visit.main_image.unwrap().asset_id.starts_with("image-"));

    let french = query::artwork_by_slug(&snapshot, "french-wines-red").unwrap();
    assert_eq!(french.title, "French Wines (Red)");

    let featured: Vec<_> = query::featured_artworks(&snapshot)
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(featured, vec!["We Can't Know"]);

    let titles: Vec<_> = query::all_artworks(&snapshot)
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(titles.first().map(String::as_str), Some("Capabilities"));
    assert_eq!(titles.last().map(String::as_str), Some("Data So Vast"));

    let mut documents = Vec::new();
    for doc_type in DocType::ALL {
        documents.extend(store.documents(doc_type.as_str()).unwrap());
    }
    let check = Validator::new(1900, 2026, 96).check_documents(&documents);
    assert!(check.is_clean(), "{check:?}");
    assert!(dataset.path().join("assets").read_dir().unwrap().count() >= 8);
}

#[test]
fn second_run_skips_everything_already_imported() {
    let source = setup_source();
    let dataset = TempDir::new().unwrap();

    import(source.path(), dataset.path());
    let again = import(source.path(), dataset.path());

    assert_eq!(again.imported(), 0);
    assert_eq!(again.skipped(), 8);
    assert_eq!(again.failed(), 1);

    let store = DatasetStore::open(dataset.path()).unwrap();
    assert_eq!(store.documents("artwork").unwrap().len(), 8);
}
