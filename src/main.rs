use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marquee::config::{AppConfig, SourceKind};
use marquee::dashboard::catalog::{self, TableSource};
use marquee::dashboard::filter::{self, DurationRange};
use marquee::dashboard::{charts, plot, render};
use marquee::ingest::{IngestOptions, IngestPaths};
use marquee::table::MovieTable;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "marquee", version, about = "Yearly IMDb movie extract and dashboard")]
struct Cli {
    /// Directory that data paths are resolved against (default: current directory)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Target release year (defaults to config target_year)
    #[arg(long, global = true)]
    year: Option<i32>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one year of movies from the IMDb dumps and join their ratings
    Ingest,

    /// Load the extract into the SQLite database
    Publish,

    /// Filter the extract and show metrics and charts
    Dashboard {
        /// Genres to include (repeatable; default: all)
        #[arg(short, long = "genre")]
        genres: Vec<String>,

        /// Minimum rating, 0.0 to 10.0
        #[arg(long, value_parser = filter::parse_rating)]
        min_rating: Option<f64>,

        /// Minimum number of votes
        #[arg(long)]
        min_votes: Option<u64>,

        /// Duration range in minutes, MIN-MAX within 0-300
        #[arg(long)]
        duration: Option<DurationRange>,

        /// Table to read
        #[arg(long, value_enum)]
        source: Option<SourceKind>,

        /// Directory for the SVG charts (defaults to config output.charts)
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Print the computed view as JSON instead (no charts are drawn)
        #[arg(long)]
        json: bool,
    },

    /// List the genres present in the extract
    Genres {
        /// Table to read
        #[arg(long, value_enum)]
        source: Option<SourceKind>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    // Resolve base directory and year: CLI > config > default
    let base_dir = cli
        .base_dir
        .or(config.base_dir.clone())
        .unwrap_or_else(marquee::config::default_base_dir);
    let year = cli.year.unwrap_or(config.target_year);
    let paths = config.paths(&base_dir, year);
    log::info!("Base directory: {}", base_dir.display());

    match cli.command {
        Commands::Ingest => {
            if let Some(dir) = paths.basics.parent() {
                println!("Using data directory: {}", dir.display());
            }

            let summary = marquee::ingest::run(
                &IngestPaths {
                    basics: paths.basics.clone(),
                    ratings: paths.ratings.clone(),
                    output: paths.csv.clone(),
                },
                &IngestOptions {
                    year: year.to_string(),
                    year_match: config.year_match,
                    runtime_column: config.sources.runtime_column.clone(),
                },
            )
            .context("Ingest failed")?;

            println!("Saved {} movies from {}", summary.movies, year);
            println!("File created: {}", summary.output.display());
        }

        Commands::Publish => {
            let catalog = catalog::Catalog::new(TableSource::Csv(paths.csv.clone()));
            let table = catalog.table().context("Failed to read extract")?;

            let db = marquee::db::Database::open(&paths.database)
                .context("Failed to open database")?;
            let count = db
                .replace_movies(table.movies(), table.source())
                .context("Publish failed")?;
            println!("Published {} movies to {}", count, paths.database.display());
        }

        Commands::Dashboard {
            genres,
            min_rating,
            min_votes,
            duration,
            source,
            chart_dir,
            json,
        } => {
            let source = table_source(source.unwrap_or(config.dashboard.source), &paths);
            let Some(table) = load_table(source)? else {
                return Ok(());
            };

            let mut criteria = config.dashboard.criteria(table.movies());
            criteria.genres = filter::select_genres(table.movies(), genres)?;
            if let Some(r) = min_rating {
                criteria.min_rating = r;
            }
            if let Some(v) = min_votes {
                criteria.min_votes = v;
            }
            if let Some(d) = duration {
                criteria.duration = d;
            }

            let view = marquee::dashboard::compute_view(&table, &criteria);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                let dir = chart_dir.unwrap_or(paths.charts);
                let files = plot::write_charts(&view, &dir).context("Failed to draw charts")?;
                let year = year.to_string();
                render::render(&view, Some(year.as_str()), Some(&files), &mut std::io::stdout().lock())?;
            }
        }

        Commands::Genres { source } => {
            let source = table_source(source.unwrap_or(config.dashboard.source), &paths);
            let Some(table) = load_table(source)? else {
                return Ok(());
            };

            let counts = charts::count_genres(table.movies().iter());
            println!("{:<20} {:>8}", "Genre", "Movies");
            println!("{}", "-".repeat(29));
            for g in &counts {
                println!("{:<20} {:>8}", g.genre, g.count);
            }
        }
    }

    Ok(())
}

fn table_source(kind: SourceKind, paths: &marquee::config::ResolvedPaths) -> TableSource {
    match kind {
        SourceKind::Csv => TableSource::Csv(paths.csv.clone()),
        SourceKind::Db => TableSource::Sqlite(paths.database.clone()),
    }
}

/// Load the process-wide table; `None` means there is nothing to render.
fn load_table(source: TableSource) -> Result<Option<Arc<MovieTable>>> {
    marquee::dashboard::load(catalog::init(source), &mut std::io::stdout().lock())
        .context("Failed to load movie table")
}
