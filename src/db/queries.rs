use super::models::{MovieRecord, PublishRecord};
use super::{Database, DbError, Result};
use rusqlite::{OptionalExtension, params};
use std::path::Path;

impl Database {
    /// Replace the whole `movies` table with `movies` and log the publish.
    /// Returns the number of rows written.
    pub fn replace_movies(&self, movies: &[MovieRecord], source: &Path) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM movies", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO movies (movie_name, genre, rating, votes, duration_minutes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for m in movies {
                let votes = m
                    .votes
                    .map(|v| {
                        i64::try_from(v).map_err(|_| DbError::OutOfRange {
                            column: "votes",
                            value: v,
                        })
                    })
                    .transpose()?;
                stmt.execute(params![
                    m.movie_name,
                    m.genre,
                    m.rating,
                    votes,
                    m.duration_minutes.map(i64::from),
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO publish_log (published_at, source_path, row_count) VALUES (?1, ?2, ?3)",
            params![
                chrono::Utc::now().to_rfc3339(),
                source.to_string_lossy().into_owned(),
                movies.len() as i64,
            ],
        )?;
        tx.commit()?;

        log::info!("Published {} movies from {}", movies.len(), source.display());
        Ok(movies.len())
    }

    /// All movies in insertion order (the order of the ingest CSV).
    /// A negative or oversized stored count is an error, not a gap.
    pub fn load_movies(&self) -> Result<Vec<MovieRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT movie_name, genre, rating, votes, duration_minutes
             FROM movies
             ORDER BY id",
        )?;

        let movies = stmt
            .query_map([], |row| {
                let votes = row
                    .get::<_, Option<i64>>(3)?
                    .map(|v| u64::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(3, v)))
                    .transpose()?;
                Ok(MovieRecord {
                    movie_name: row.get(0)?,
                    genre: row.get(1)?,
                    rating: row.get(2)?,
                    votes,
                    duration_minutes: row.get::<_, Option<u32>>(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(movies)
    }

    /// Most recent publish, if any.
    pub fn latest_publish(&self) -> Result<Option<PublishRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT published_at, source_path, row_count
                 FROM publish_log
                 ORDER BY id DESC
                 LIMIT 1",
                [],
                |row| {
                    Ok(PublishRecord {
                        published_at: row.get(0)?,
                        source_path: row.get(1)?,
                        row_count: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
