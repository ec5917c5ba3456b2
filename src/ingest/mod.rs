pub mod source;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use thiserror::Error;

use crate::db::models::MovieRecord;
use crate::table::{self, TableError};
use source::{RatingColumns, RawRatingRecord, RawTitleRecord, TitleColumns};

/// Title type kept by the year filter.
pub const MOVIE_TITLE_TYPE: &str = "movie";

/// Update the spinner every this many rows.
const PROGRESS_STEP: u64 = 50_000;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Missing file: {}", .path.display())]
    MissingInput { path: PathBuf },
    #[error("{} has no `{column}` column", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("{}:{line}: invalid {column} value {value:?}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// How `startYear` is compared against the target year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearMatch {
    /// Exact string equality with the raw field.
    #[default]
    Text,
    /// Both sides parsed as integers; unparsable fields never match.
    Numeric,
}

impl YearMatch {
    pub fn matches(self, field: &str, target: &str) -> bool {
        match self {
            Self::Text => field == target,
            Self::Numeric => match (field.trim().parse::<i32>(), target.trim().parse::<i32>()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// Source and destination files for one ingest run.
#[derive(Debug, Clone)]
pub struct IngestPaths {
    pub basics: PathBuf,
    pub ratings: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub year: String,
    pub year_match: YearMatch,
    /// Column of `title.basics` that becomes `duration_minutes`.
    pub runtime_column: String,
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    /// Metadata rows read.
    pub scanned: u64,
    /// Rows written to the extract.
    pub movies: usize,
    /// Written rows that found a ratings match.
    pub rated: usize,
    pub output: PathBuf,
}

/// Filter the title dump to one year of movies, left-join the ratings, and
/// write the five-column extract.
///
/// Both inputs are checked before anything is read, and the output is only
/// replaced once every row has been produced.
pub fn run(paths: &IngestPaths, options: &IngestOptions) -> Result<IngestSummary, IngestError> {
    require_exists(&paths.basics)?;
    require_exists(&paths.ratings)?;

    let ratings = load_ratings(&paths.ratings)?;
    log::info!("Loaded {} ratings from {}", ratings.len(), paths.ratings.display());

    let (movies, scanned) = select_movies(&paths.basics, options, &ratings)?;
    let rated = movies.iter().filter(|m| m.rating.is_some()).count();
    log::info!(
        "{} of {} titles are {} movies ({} rated)",
        movies.len(),
        scanned,
        options.year,
        rated
    );

    table::write_csv(&paths.output, &movies)?;

    Ok(IngestSummary {
        scanned,
        movies: movies.len(),
        rated,
        output: paths.output.clone(),
    })
}

fn require_exists(path: &Path) -> Result<(), IngestError> {
    if path.exists() {
        Ok(())
    } else {
        Err(IngestError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}

/// Index the whole ratings dump by `tconst`.
fn load_ratings(path: &Path) -> Result<HashMap<String, RawRatingRecord>, IngestError> {
    let mut reader = source::open_tsv(path)?;
    let csv_err = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let columns = RatingColumns::resolve(&reader.headers().map_err(csv_err)?.clone(), path)?;

    let pb = spinner("Reading ratings");
    let mut ratings = HashMap::new();
    let mut record = StringRecord::new();
    let mut line = 1u64;
    while reader.read_record(&mut record).map_err(csv_err)? {
        line += 1;
        let (tconst, rating) = columns.read(&record, path, line)?;
        ratings.insert(tconst.to_string(), rating);
        tick(&pb, line);
    }
    pb.finish_and_clear();

    Ok(ratings)
}

/// Stream `title.basics`, keeping the target year's movies joined with
/// their ratings. Returns the movies and the number of rows scanned.
fn select_movies(
    path: &Path,
    options: &IngestOptions,
    ratings: &HashMap<String, RawRatingRecord>,
) -> Result<(Vec<MovieRecord>, u64), IngestError> {
    let mut reader = source::open_tsv(path)?;
    let csv_err = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let columns = TitleColumns::resolve(
        &reader.headers().map_err(csv_err)?.clone(),
        path,
        &options.runtime_column,
    )?;

    let pb = spinner("Filtering titles");
    let mut movies = Vec::new();
    let mut record = StringRecord::new();
    let mut scanned = 0u64;
    while reader.read_record(&mut record).map_err(csv_err)? {
        scanned += 1;
        tick(&pb, scanned);

        let title = columns.read(&record);
        if !is_selected(&title, options) {
            continue;
        }
        let movie = to_movie(&title, ratings.get(title.tconst), path, scanned + 1, &options.runtime_column)?;
        movies.push(movie);
    }
    pb.finish_and_clear();

    Ok((movies, scanned))
}

fn is_selected(title: &RawTitleRecord<'_>, options: &IngestOptions) -> bool {
    title.title_type == MOVIE_TITLE_TYPE && options.year_match.matches(title.start_year, &options.year)
}

/// Project a title and its (optional) rating onto the extract's columns.
fn to_movie(
    title: &RawTitleRecord<'_>,
    rating: Option<&RawRatingRecord>,
    path: &Path,
    line: u64,
    runtime_column: &str,
) -> Result<MovieRecord, IngestError> {
    let duration_minutes = title
        .runtime
        .map(|raw| {
            raw.parse::<u32>().map_err(|_| IngestError::Parse {
                path: path.to_path_buf(),
                line,
                column: runtime_column.to_string(),
                value: raw.to_string(),
            })
        })
        .transpose()?;

    Ok(MovieRecord {
        movie_name: title.primary_title.to_string(),
        genre: title.genres.map(str::to_string),
        rating: rating.map(|r| r.average_rating),
        votes: rating.map(|r| r.num_votes),
        duration_minutes,
    })
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}: {pos} rows ({per_sec})") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb
}

fn tick(pb: &ProgressBar, rows: u64) {
    if rows % PROGRESS_STEP == 0 {
        pb.set_position(rows);
    }
}
