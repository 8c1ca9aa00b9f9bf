use clap::{Parser, Subcommand, ValueEnum};
use folio::import::{ImportOptions, Importer};
use folio::metadata::Overrides;
use folio::migrate::{self, Migration};
use folio::query::{self, ArtworkOrder, Snapshot};
use folio::schema::{Category, DocType, Validator};
use folio::store::{self, ContentStore, DocumentStore, MemoryStore, StoreError};
use folio::{config, naming, output, pages, scan};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Content schema, queries and import tooling for an artist portfolio")]
#[command(long_about = "\
Content schema, queries and import tooling for an artist portfolio

Artwork source files carry their catalogue facts in the filename:

  artworks/
  ├── overrides.toml                                      # Editorial corrections (optional)
  ├── 04_Visit_2015_oiloncanvas_60hx72.jpg                # NN_Title_Year_Medium_Dimensions
  ├── 04_Visit_2015_oiloncanvas_60hx72.txt                # Sidecar description
  └── 2014_GiftOfFear_AcrylicOnCanvas_48x72in.jpg         # Year_Title_Medium_Dimensions

Pages are Markdown:

  pages/
  ├── about.md                                            # About singleton
  └── press/*.md                                          # +++ TOML front matter +++

The http store backend reads its API token from the environment variable named
by [store] token_env (default SANITY_AUTH_TOKEN).

Run 'folio gen-config' to generate a documented folio.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "folio.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse artwork filenames and show the extracted metadata
    Parse {
        /// Filenames to parse. Defaults to every media file in the source directory
        files: Vec<String>,
        /// Source directory (overrides [import] source_dir)
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Import artwork media files as artwork documents
    Import {
        /// Source directory (overrides [import] source_dir)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Run against an in-memory copy of the store; nothing is written
        #[arg(long)]
        dry_run: bool,
    },
    /// Publish about.md and press/*.md
    ImportPages {
        /// Pages directory (overrides [import] pages_dir)
        #[arg(long)]
        pages: Option<PathBuf>,
        /// Run against an in-memory copy of the store; nothing is written
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a read-side query and print JSON
    Query {
        #[arg(value_enum)]
        name: QueryName,
        /// Artwork slug, for `artwork`
        #[arg(long)]
        slug: Option<String>,
        /// Artwork category, for `category`
        #[arg(long)]
        category: Option<Category>,
        /// Artwork title, for `exists`
        #[arg(long)]
        title: Option<String>,
        /// Ordering for `artworks`: year-desc, year-asc or title-asc
        #[arg(long, default_value = "year-desc")]
        order: ArtworkOrder,
        /// Print a compact table instead of JSON, for artwork lists
        #[arg(long)]
        table: bool,
    },
    /// Validate every stored document
    Check,
    /// Run a maintenance migration over stored artworks
    Migrate {
        #[command(subcommand)]
        migration: MigrateCommand,
        /// Show the planned patches without committing them
        #[arg(long, global = true)]
        dry_run: bool,
    },
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// Set a category on artworks missing one or holding an unknown value
    BackfillCategory {
        /// Category to set (defaults to [import] default_category)
        #[arg(long)]
        category: Option<Category>,
    },
    /// Assign keys to asset items that have none or share one
    FixAssetKeys,
    /// Move a stale field into its replacement and remove it
    RenameField {
        #[arg(long, default_value = "meduium")]
        from: String,
        #[arg(long, default_value = "medium")]
        to: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryName {
    /// All artworks
    Artworks,
    /// One artwork by --slug
    Artwork,
    /// Featured artworks
    Featured,
    /// Artworks in --category
    Category,
    /// All press, newest first
    Press,
    /// The About page
    About,
    /// Stored artwork titles
    Titles,
    /// Whether an artwork titled --title exists
    Exists,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    init_tracing(&config.log.level);

    match cli.command {
        Command::Parse { files, source } => {
            let names = if files.is_empty() {
                let source = source.unwrap_or_else(|| config.import.source_dir.clone());
                scan::scan_sources(&source, &config.import.exclude_prefixes)?
                    .into_iter()
                    .map(|s| s.filename)
                    .collect()
            } else {
                files
            };
            let results: Vec<_> = names
                .into_iter()
                .map(|name| {
                    let parsed = naming::parse_filename(&name);
                    (name, parsed)
                })
                .collect();
            output::print_parse_results(&results);
        }
        Command::Import { source, dry_run } => {
            let mut import_config = config.import.clone();
            if let Some(source) = source {
                import_config.source_dir = source;
            }
            let sources =
                scan::scan_sources(&import_config.source_dir, &import_config.exclude_prefixes)?;
            let overrides = Overrides::load(&import_config.overrides_path())?;
            let validator = Validator::from_config(&config.schema);
            let options = ImportOptions {
                default_category: import_config.default_category,
                delay: if dry_run {
                    Duration::ZERO
                } else {
                    import_config.delay()
                },
                skip_existing: import_config.skip_existing,
            };
            tracing::info!(
                files = sources.len(),
                source = %import_config.source_dir.display(),
                "starting import"
            );

            let mut store = store::open(&config.store)?;
            let report = if dry_run {
                let mut preview = preview_store(store.as_ref())?;
                Importer::new(&mut preview, validator, options, overrides)?.run(&sources)
            } else {
                Importer::new(store.as_mut(), validator, options, overrides)?.run(&sources)
            };
            output::print_import_report(&report, dry_run);
        }
        Command::ImportPages { pages: dir, dry_run } => {
            let dir = dir.unwrap_or_else(|| config.import.pages_dir.clone());
            let found = pages::scan_pages(&dir)?;
            for error in &found.errors {
                tracing::warn!("{error}");
            }
            let validator = Validator::from_config(&config.schema);
            let mut store = store::open(&config.store)?;
            let report = if dry_run {
                let mut preview = preview_store(store.as_ref())?;
                pages::publish_pages(&mut preview, &validator, &found)?
            } else {
                pages::publish_pages(store.as_mut(), &validator, &found)?
            };
            output::print_pages_report(&report);
        }
        Command::Query {
            name,
            slug,
            category,
            title,
            order,
            table,
        } => {
            let store = store::open(&config.store)?;
            let snapshot = Snapshot::load(store.as_ref())?;
            let artworks = |items: Vec<query::ArtworkListItem>| -> Result<(), serde_json::Error> {
                if table {
                    for line in output::format_artwork_table(&items) {
                        println!("{line}");
                    }
                } else {
                    println!("{}", output::format_json(&items)?);
                }
                Ok(())
            };
            match name {
                QueryName::Artworks => artworks(query::artworks_ordered(&snapshot, order))?,
                QueryName::Featured => artworks(query::featured_artworks(&snapshot))?,
                QueryName::Category => {
                    let category = category.ok_or("--category is required")?;
                    artworks(query::artworks_by_category(&snapshot, category))?
                }
                QueryName::Artwork => {
                    let slug = slug.ok_or("--slug is required")?;
                    println!(
                        "{}",
                        output::format_json(&query::artwork_by_slug(&snapshot, &slug))?
                    );
                }
                QueryName::Press => {
                    println!("{}", output::format_json(&query::all_press(&snapshot))?)
                }
                QueryName::About => {
                    println!("{}", output::format_json(&query::about(&snapshot))?)
                }
                QueryName::Titles => {
                    println!("{}", output::format_json(&query::artwork_titles(&snapshot))?)
                }
                QueryName::Exists => {
                    let title = title.ok_or("--title is required")?;
                    println!("{}", query::exists_by_title(&snapshot, &title));
                }
            }
        }
        Command::Check => {
            let store = store::open(&config.store)?;
            let mut documents = Vec::new();
            for doc_type in DocType::ALL {
                documents.extend(store.documents(doc_type.as_str())?);
            }
            let report = Validator::from_config(&config.schema).check_documents(&documents);
            output::print_check_report(&report);
            if !report.is_clean() {
                return Err("store has invalid documents".into());
            }
        }
        Command::Migrate { migration, dry_run } => {
            let migration = match migration {
                MigrateCommand::BackfillCategory { category } => Migration::BackfillCategory(
                    category.unwrap_or(config.import.default_category),
                ),
                MigrateCommand::FixAssetKeys => Migration::FixAssetKeys,
                MigrateCommand::RenameField { from, to } => Migration::RenameField { from, to },
            };
            let mut store = store::open(&config.store)?;
            let report = migrate::run(store.as_mut(), &migration, dry_run)?;
            output::print_migration_report(&report);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Initialize logging on stderr. `RUST_LOG` wins over `[log] level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// In-memory copy of every stored document, for dry runs.
fn preview_store(store: &dyn ContentStore) -> Result<MemoryStore, StoreError> {
    let mut documents = Vec::new();
    for doc_type in DocType::ALL {
        documents.extend(store.documents(doc_type.as_str())?);
    }
    Ok(MemoryStore::with_documents(documents))
}
