pub mod catalog;
pub mod charts;
pub mod filter;
pub mod metrics;
pub mod plot;
pub mod render;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::db::models::MovieRecord;
use crate::table::{MovieTable, TableError};
use catalog::Catalog;
use charts::{GenreCount, HistogramBin, ScatterPlot};
use filter::FilterCriteria;
use metrics::Metrics;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Data file not found: {}", .path.display())]
    MissingOutput { path: PathBuf },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Database error: {0}")]
    Db(#[from] crate::db::DbError),
    #[error("Unknown genre {genre:?}, expected one of: {}", .valid.join(", "))]
    UnknownGenre { genre: String, valid: Vec<String> },
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Fetch the table behind `catalog` for display.
///
/// A missing file is reported on `out` and an empty table is skipped
/// silently; both give `Ok(None)` and nothing further should be rendered.
pub fn load(catalog: &Catalog, out: &mut impl Write) -> Result<Option<Arc<MovieTable>>, DashboardError> {
    match catalog.table() {
        Ok(table) if table.is_empty() => {
            log::debug!("Table {} is empty, nothing to show", table.source().display());
            Ok(None)
        }
        Ok(table) => Ok(Some(table)),
        Err(e @ DashboardError::MissingOutput { .. }) => {
            writeln!(out, "Error: {e}")?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Everything the dashboard shows for one set of controls.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub criteria: FilterCriteria,
    pub metrics: Metrics,
    pub top_movies: Vec<&'a MovieRecord>,
    pub genre_distribution: Vec<GenreCount>,
    pub rating_histogram: Vec<HistogramBin>,
    pub rating_vs_votes: ScatterPlot,
}

/// Apply `criteria` to `table` and derive every metric and chart from the
/// surviving rows. Pure: the table is never modified.
pub fn compute_view<'a>(table: &'a MovieTable, criteria: &FilterCriteria) -> DashboardView<'a> {
    let view = filter::apply(table.movies(), criteria);
    log::debug!("{} of {} movies pass the filters", view.len(), table.len());

    DashboardView {
        criteria: criteria.clone(),
        metrics: metrics::compute(&view),
        top_movies: charts::top_rated(&view, charts::TOP_MOVIES),
        genre_distribution: charts::genre_distribution(&view, charts::TOP_GENRES),
        rating_histogram: charts::rating_histogram(&view, charts::HISTOGRAM_BINS),
        rating_vs_votes: charts::rating_vs_votes(&view),
    }
}
