//! The flat movie table shared by the ingest step and the dashboard.
//!
//! On disk this is a comma-separated file with exactly the header
//! [`OUTPUT_COLUMNS`], no index column, and empty fields for missing values.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::db::models::MovieRecord;

/// Header of the extract, in column order.
pub const OUTPUT_COLUMNS: [&str; 5] = ["movie_name", "genre", "rating", "votes", "duration_minutes"];

#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

/// An immutable, fully loaded movie table.
#[derive(Debug, Clone, Default)]
pub struct MovieTable {
    source: PathBuf,
    movies: Vec<MovieRecord>,
}

impl MovieTable {
    pub fn new(source: impl Into<PathBuf>, movies: Vec<MovieRecord>) -> Self {
        Self {
            source: source.into(),
            movies,
        }
    }

    /// Where the table was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// Read a whole extract CSV.
pub fn read_csv(path: &Path) -> Result<MovieTable, TableError> {
    let csv_err = |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let movies = reader
        .deserialize::<MovieRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;

    log::debug!("Read {} movies from {}", movies.len(), path.display());
    Ok(MovieTable::new(path, movies))
}

/// Write `movies` to `path`, replacing any existing file.
///
/// Rows go to a sibling `.partial` file that is renamed over `path` once
/// complete, so readers never observe a half-written extract. The header
/// row is written even when `movies` is empty.
pub fn write_csv(path: &Path, movies: &[MovieRecord]) -> Result<(), TableError> {
    let io_err = |source| TableError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let partial = partial_path(path);
    if let Err(e) = write_rows(&partial, movies) {
        fs::remove_file(&partial).ok();
        return Err(e);
    }
    fs::rename(&partial, path).map_err(io_err)?;

    log::debug!("Wrote {} movies to {}", movies.len(), path.display());
    Ok(())
}

fn write_rows(path: &Path, movies: &[MovieRecord]) -> Result<(), TableError> {
    let csv_err = |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };

    // Header is written by hand: serde only emits one alongside the first row.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    writer.write_record(OUTPUT_COLUMNS).map_err(csv_err)?;
    for movie in movies {
        writer.serialize(movie).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MovieRecord> {
        vec![
            MovieRecord {
                movie_name: "Civil War".into(),
                genre: Some("Action,Drama,Thriller".into()),
                rating: Some(7.0),
                votes: Some(230_000),
                duration_minutes: Some(109),
            },
            MovieRecord {
                movie_name: "Nobody Rated This".into(),
                genre: None,
                rating: None,
                votes: None,
                duration_minutes: None,
            },
        ]
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("imdb_2024_raw.csv");

        write_csv(&path, &sample()).unwrap();
        let table = read_csv(&path).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.movies(), sample().as_slice());
        assert_eq!(table.source(), path.as_path());
    }

    #[test]
    fn test_header_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        write_csv(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("movie_name,genre,rating,votes,duration_minutes"));
        assert_eq!(lines.next(), Some("Civil War,\"Action,Drama,Thriller\",7.0,230000,109"));
        assert_eq!(lines.next(), Some("Nobody Rated This,,,,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&path, &[]).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap().trim_end(),
            "movie_name,genre,rating,votes,duration_minutes"
        );
        assert!(read_csv(&path).unwrap().is_empty());
    }

    #[test]
    fn test_overwrite_leaves_no_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        fs::write(&path, "stale").unwrap();

        write_csv(&path, &sample()).unwrap();
        assert_eq!(read_csv(&path).unwrap().len(), 2);
        assert!(!partial_path(&path).exists());
    }
}
