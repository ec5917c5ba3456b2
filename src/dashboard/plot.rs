//! SVG rendering of the dashboard's three charts.

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;

use super::DashboardView;
use super::charts::{GenreCount, HistogramBin, ScatterPlot};
use super::filter::MAX_RATING;

const CHART_SIZE: (u32, u32) = (960, 600);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 28);
const MARKER_SIZE: u32 = 4;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create chart directory {}: {source}", .path.display())]
    Dir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to draw {}: {message}", .path.display())]
    Draw { path: PathBuf, message: String },
}

/// Files written by [`write_charts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFiles {
    pub genre_distribution: PathBuf,
    pub rating_histogram: PathBuf,
    pub rating_vs_votes: PathBuf,
}

impl ChartFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            genre_distribution: dir.join("genre_distribution.svg"),
            rating_histogram: dir.join("rating_histogram.svg"),
            rating_vs_votes: dir.join("rating_vs_votes.svg"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [
            self.genre_distribution.as_path(),
            self.rating_histogram.as_path(),
            self.rating_vs_votes.as_path(),
        ]
        .into_iter()
    }
}

/// Draw the genre bar chart, the rating histogram and the rating-vs-votes
/// scatter of `view` into `dir`, replacing earlier charts.
pub fn write_charts(view: &DashboardView<'_>, dir: &Path) -> Result<ChartFiles, ChartError> {
    std::fs::create_dir_all(dir).map_err(|source| ChartError::Dir {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = ChartFiles::in_dir(dir);
    draw(&files.genre_distribution, |root| genre_chart(&view.genre_distribution, root))?;
    draw(&files.rating_histogram, |root| histogram_chart(&view.rating_histogram, root))?;
    draw(&files.rating_vs_votes, |root| scatter_chart(&view.rating_vs_votes, root))?;

    log::info!("Charts saved to {}", dir.display());
    Ok(files)
}

fn draw(path: &Path, chart: impl FnOnce(&Area<'_>) -> DrawResult) -> Result<(), ChartError> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    let result = (|| -> DrawResult {
        root.fill(&WHITE)?;
        chart(&root)?;
        root.present()?;
        Ok(())
    })();

    result.map_err(|e| ChartError::Draw {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn genre_chart(genres: &[GenreCount], root: &Area<'_>) -> DrawResult {
    let slots = genres.len().max(1) as u32;
    let top = genres.iter().map(|g| g.count).max().unwrap_or(0) as u32 + 1;

    let mut chart = ChartBuilder::on(root)
        .caption("Genre Distribution", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0..slots).into_segmented(), 0u32..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots as usize)
        .x_label_formatter(&|v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => genres
                .get(*i as usize)
                .map(|g| g.genre.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc("Genre")
        .y_desc("Movies")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .margin(8)
            .data(genres.iter().enumerate().map(|(i, g)| (i as u32, g.count as u32))),
    )?;
    Ok(())
}

fn histogram_chart(bins: &[HistogramBin], root: &Area<'_>) -> DrawResult {
    let (lo, hi) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => (0.0, MAX_RATING),
    };
    let top = bins.iter().map(|b| b.count).max().unwrap_or(0) as u32 + 1;

    let mut chart = ChartBuilder::on(root)
        .caption("Rating Distribution", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0u32..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Rating")
        .y_desc("Movies")
        .draw()?;

    chart.draw_series(
        bins.iter()
            .map(|b| Rectangle::new([(b.start, 0), (b.end, b.count as u32)], BLUE.filled())),
    )?;
    Ok(())
}

fn scatter_chart(plot: &ScatterPlot, root: &Area<'_>) -> DrawResult {
    let max_votes = plot.points.iter().map(|p| p.votes).max().unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption("Rating vs Votes", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(max_votes * 1.05).max(1.0), 0f64..MAX_RATING)?;

    chart
        .configure_mesh()
        .x_desc("Votes")
        .y_desc("Rating")
        .x_label_formatter(&|v: &f64| format!("{v:.0}"))
        .draw()?;

    let style = BLUE.mix(plot.opacity).filled();
    chart.draw_series(
        plot.points
            .iter()
            .map(|p| Circle::new((p.votes as f64, p.rating), MARKER_SIZE, style)),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::compute_view;
    use crate::dashboard::filter::FilterCriteria;
    use crate::db::models::MovieRecord;
    use crate::table::MovieTable;
    use std::fs;

    fn movie(name: &str, genre: &str, rating: f64, votes: u64) -> MovieRecord {
        MovieRecord {
            movie_name: name.to_string(),
            genre: Some(genre.to_string()),
            rating: Some(rating),
            votes: Some(votes),
            duration_minutes: Some(110),
        }
    }

    fn table() -> MovieTable {
        MovieTable::new(
            "movies.csv",
            vec![
                movie("Dune: Part Two", "Action,Adventure,Drama", 8.5, 600_000),
                movie("Inside Out 2", "Animation,Comedy", 7.6, 250_000),
                movie("Civil War", "Action,Drama", 7.0, 200_000),
            ],
        )
    }

    #[test]
    fn test_write_charts_creates_svgs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("charts").join("2024");
        let table = table();
        let view = compute_view(&table, &FilterCriteria::all_genres(table.movies()));

        let files = write_charts(&view, &out).unwrap();
        assert_eq!(files, ChartFiles::in_dir(&out));
        for path in files.iter() {
            let svg = fs::read_to_string(path).unwrap();
            assert!(svg.contains("<svg"), "{}", path.display());
        }

        let genres = fs::read_to_string(&files.genre_distribution).unwrap();
        assert!(genres.contains("Genre Distribution"));
        assert!(genres.contains("Drama"));
    }

    #[test]
    fn test_scatter_markers_are_half_transparent() {
        let dir = tempfile::tempdir().unwrap();
        let table = table();
        let view = compute_view(&table, &FilterCriteria::all_genres(table.movies()));

        let files = write_charts(&view, dir.path()).unwrap();
        let svg = fs::read_to_string(&files.rating_vs_votes).unwrap();
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("opacity=\"0.5\""));
    }

    #[test]
    fn test_empty_view_still_draws() {
        let dir = tempfile::tempdir().unwrap();
        let table = MovieTable::new("movies.csv", vec![movie("Low", "Drama", 2.0, 10)]);
        let view = compute_view(&table, &FilterCriteria::all_genres(table.movies()));
        assert_eq!(view.metrics.total, 0);

        let files = write_charts(&view, dir.path()).unwrap();
        assert!(files.iter().all(Path::exists));
        let svg = fs::read_to_string(&files.rating_vs_votes).unwrap();
        assert_eq!(svg.matches("<circle").count(), 0);
    }
}
