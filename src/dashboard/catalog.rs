//! Process-wide, load-once snapshot of the movie table.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::DashboardError;
use crate::db::Database;
use crate::table::{self, MovieTable};

/// Where the dashboard reads its table from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// The ingest CSV.
    Csv(PathBuf),
    /// The `movies` table of a published SQLite database.
    Sqlite(PathBuf),
}

impl TableSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Csv(path) | Self::Sqlite(path) => path,
        }
    }

    fn load(&self) -> Result<MovieTable, DashboardError> {
        match self {
            Self::Csv(path) => Ok(table::read_csv(path)?),
            Self::Sqlite(path) => {
                let db = Database::open_read_only(path)?;
                if let Some(publish) = db.latest_publish()? {
                    log::info!(
                        "Database published {} from {} ({} rows)",
                        publish.published_at,
                        publish.source_path,
                        publish.row_count
                    );
                }
                Ok(MovieTable::new(path, db.load_movies()?))
            }
        }
    }
}

/// Lazily loaded, immutable movie table.
///
/// The first [`Catalog::table`] call reads the source; every later call
/// returns the same snapshot until [`Catalog::reload`].
#[derive(Debug)]
pub struct Catalog {
    source: TableSource,
    snapshot: OnceLock<Arc<MovieTable>>,
}

impl Catalog {
    pub fn new(source: TableSource) -> Self {
        Self {
            source,
            snapshot: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &TableSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.get().is_some()
    }

    pub fn table(&self) -> Result<Arc<MovieTable>, DashboardError> {
        if let Some(table) = self.snapshot.get() {
            return Ok(Arc::clone(table));
        }

        let path = self.source.path();
        if !path.exists() {
            return Err(DashboardError::MissingOutput {
                path: path.to_path_buf(),
            });
        }

        let loaded = Arc::new(self.source.load()?);
        log::info!("Loaded {} movies from {}", loaded.len(), path.display());
        Ok(Arc::clone(self.snapshot.get_or_init(|| loaded)))
    }

    /// Drop the snapshot so the next [`Catalog::table`] reads the source again.
    pub fn reload(&mut self) {
        self.snapshot.take();
    }
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Install the process-wide catalog. The first call wins; later calls
/// return the existing catalog.
pub fn init(source: TableSource) -> &'static Catalog {
    let catalog = CATALOG.get_or_init(|| Catalog::new(source.clone()));
    if catalog.source() != &source {
        log::warn!(
            "Catalog already initialized from {}, ignoring {}",
            catalog.source().path().display(),
            source.path().display()
        );
    }
    catalog
}

/// The process-wide catalog, if [`init`] has run.
pub fn global() -> Option<&'static Catalog> {
    CATALOG.get()
}
