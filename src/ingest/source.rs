//! Readers for the IMDb tab-separated dumps (`title.basics`, `title.ratings`).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use flate2::read::MultiGzDecoder;

use super::IngestError;

/// Null marker used throughout the IMDb dumps.
const IMDB_NULL: &str = "\\N";

pub const COL_TCONST: &str = "tconst";
pub const COL_TITLE_TYPE: &str = "titleType";
pub const COL_PRIMARY_TITLE: &str = "primaryTitle";
pub const COL_START_YEAR: &str = "startYear";
pub const COL_GENRES: &str = "genres";
pub const COL_AVERAGE_RATING: &str = "averageRating";
pub const COL_NUM_VOTES: &str = "numVotes";

pub type TsvReader = csv::Reader<Box<dyn Read>>;

/// Open a TSV dump, decompressing `.gz` files on the fly.
/// The dumps are unquoted: a `"` inside a title is literal.
pub fn open_tsv(path: &Path) -> Result<TsvReader, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_gzip = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    let input: Box<dyn Read> = if is_gzip {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .from_reader(input))
}

/// `None` for the IMDb null marker or an empty field.
pub fn nullable(field: &str) -> Option<&str> {
    match field {
        "" | IMDB_NULL => None,
        other => Some(other),
    }
}

fn column_index(headers: &StringRecord, path: &Path, name: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

/// One row of `title.basics`, borrowed from the current record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTitleRecord<'a> {
    pub tconst: &'a str,
    pub title_type: &'a str,
    pub primary_title: &'a str,
    pub start_year: &'a str,
    pub genres: Option<&'a str>,
    pub runtime: Option<&'a str>,
}

/// Column positions of the fields we need from `title.basics`.
#[derive(Debug, Clone)]
pub struct TitleColumns {
    tconst: usize,
    title_type: usize,
    primary_title: usize,
    start_year: usize,
    genres: usize,
    runtime: usize,
}

impl TitleColumns {
    /// Locate every required column, including the configured runtime
    /// column, failing on the first one the header lacks.
    pub fn resolve(headers: &StringRecord, path: &Path, runtime_column: &str) -> Result<Self, IngestError> {
        Ok(Self {
            tconst: column_index(headers, path, COL_TCONST)?,
            title_type: column_index(headers, path, COL_TITLE_TYPE)?,
            primary_title: column_index(headers, path, COL_PRIMARY_TITLE)?,
            start_year: column_index(headers, path, COL_START_YEAR)?,
            genres: column_index(headers, path, COL_GENRES)?,
            runtime: column_index(headers, path, runtime_column)?,
        })
    }

    pub fn read<'a>(&self, record: &'a StringRecord) -> RawTitleRecord<'a> {
        let field = |i: usize| record.get(i).unwrap_or("");
        RawTitleRecord {
            tconst: field(self.tconst),
            title_type: field(self.title_type),
            primary_title: field(self.primary_title),
            start_year: field(self.start_year),
            genres: nullable(field(self.genres)),
            runtime: nullable(field(self.runtime)),
        }
    }
}

/// One row of `title.ratings`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRatingRecord {
    pub average_rating: f64,
    pub num_votes: u64,
}

#[derive(Debug, Clone)]
pub struct RatingColumns {
    tconst: usize,
    average_rating: usize,
    num_votes: usize,
}

impl RatingColumns {
    pub fn resolve(headers: &StringRecord, path: &Path) -> Result<Self, IngestError> {
        Ok(Self {
            tconst: column_index(headers, path, COL_TCONST)?,
            average_rating: column_index(headers, path, COL_AVERAGE_RATING)?,
            num_votes: column_index(headers, path, COL_NUM_VOTES)?,
        })
    }

    /// Parse one ratings row. `line` is only used for error messages.
    pub fn read<'a>(
        &self,
        record: &'a StringRecord,
        path: &Path,
        line: u64,
    ) -> Result<(&'a str, RawRatingRecord), IngestError> {
        let field = |i: usize| record.get(i).unwrap_or("");
        let parse_err = |column: &str, value: &str| IngestError::Parse {
            path: path.to_path_buf(),
            line,
            column: column.to_string(),
            value: value.to_string(),
        };

        let rating_raw = field(self.average_rating);
        let votes_raw = field(self.num_votes);
        let average_rating = rating_raw
            .parse::<f64>()
            .map_err(|_| parse_err(COL_AVERAGE_RATING, rating_raw))?;
        let num_votes = votes_raw
            .parse::<u64>()
            .map_err(|_| parse_err(COL_NUM_VOTES, votes_raw))?;

        Ok((
            field(self.tconst),
            RawRatingRecord {
                average_rating,
                num_votes,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn headers(cols: &[&str]) -> StringRecord {
        StringRecord::from(cols.to_vec())
    }

    #[test]
    fn test_nullable() {
        assert_eq!(nullable("\\N"), None);
        assert_eq!(nullable(""), None);
        assert_eq!(nullable("Drama"), Some("Drama"));
    }

    #[test]
    fn test_missing_runtime_column() {
        let h = headers(&["tconst", "titleType", "primaryTitle", "startYear", "genres"]);
        let err = TitleColumns::resolve(&h, Path::new("basics.tsv"), "runtimeMinutes").unwrap_err();
        match err {
            IngestError::MissingColumn { column, .. } => assert_eq!(column, "runtimeMinutes"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_title_columns_any_order() {
        let h = headers(&[
            "runtimeMinutes", "genres", "tconst", "isAdult", "startYear", "primaryTitle", "titleType",
        ]);
        let cols = TitleColumns::resolve(&h, Path::new("basics.tsv"), "runtimeMinutes").unwrap();
        let rec = StringRecord::from(vec!["\\N", "Drama", "tt1", "0", "2024", "Anora", "movie"]);
        let raw = cols.read(&rec);
        assert_eq!(raw.tconst, "tt1");
        assert_eq!(raw.primary_title, "Anora");
        assert_eq!(raw.genres, Some("Drama"));
        assert_eq!(raw.runtime, None);
    }

    #[test]
    fn test_rating_parse_error_names_column() {
        let h = headers(&["tconst", "averageRating", "numVotes"]);
        let cols = RatingColumns::resolve(&h, Path::new("ratings.tsv")).unwrap();
        let rec = StringRecord::from(vec!["tt1", "7.1", "many"]);
        match cols.read(&rec, Path::new("ratings.tsv"), 2).unwrap_err() {
            IngestError::Parse { column, line, .. } => {
                assert_eq!(column, "numVotes");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_open_gzip_and_unquoted_titles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("title.ratings.tsv.gz");
        let mut enc = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(b"tconst\tprimaryTitle\ntt1\t\"Weird\" Title\n").unwrap();
        enc.finish().unwrap();

        let mut reader = open_tsv(&path).unwrap();
        let rows: Vec<StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "\"Weird\" Title");
    }
}
