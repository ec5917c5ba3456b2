pub mod models;
pub mod queries;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Unsupported schema v{found} (expected v{expected})")]
    Schema { found: i32, expected: i32 },
    #[error("{column} value {value} does not fit the database column")]
    OutOfRange { column: &'static str, value: u64 },
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open a published database without touching it: no pragmas, no
    /// migrations. The schema must already be the current version.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let found = schema_version(&conn)?;
        if found != SCHEMA_VERSION {
            return Err(DbError::Schema {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.migrate()?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let version = schema_version(&self.conn).unwrap_or(0);

        if version > SCHEMA_VERSION {
            return Err(DbError::Migration(format!(
                "database schema v{version} is newer than supported v{SCHEMA_VERSION}"
            )));
        }
        if version < 1 {
            self.migrate_v1()?;
        }

        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// V1: movies extract + publish history
    fn migrate_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS movies (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_name          TEXT NOT NULL,
                genre               TEXT,
                rating              REAL,
                votes               INTEGER,
                duration_minutes    INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_movies_rating ON movies(rating);

            CREATE TABLE IF NOT EXISTS publish_log (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                published_at    TEXT NOT NULL,
                source_path     TEXT NOT NULL,
                row_count       INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
