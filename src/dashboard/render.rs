//! Plain-text rendering of a [`DashboardView`].

use std::io::{self, Write};

use super::DashboardView;
use super::metrics::Metrics;
use super::plot::ChartFiles;
use crate::db::models::MovieRecord;

pub const TITLE: &str = "IMDb Movies Analysis Dashboard";

/// Write the filters, metrics and top-10 table, then point at the chart
/// files when they were drawn.
pub fn render(
    view: &DashboardView<'_>,
    year: Option<&str>,
    charts: Option<&ChartFiles>,
    out: &mut impl Write,
) -> io::Result<()> {
    match year {
        Some(y) => writeln!(out, "{TITLE} ({y})")?,
        None => writeln!(out, "{TITLE}")?,
    }
    writeln!(out, "{}", "=".repeat(60))?;
    print_filters(view, out)?;
    writeln!(out)?;

    print_metrics(&view.metrics, out)?;
    writeln!(out)?;

    writeln!(out, "Top 10 Movies")?;
    writeln!(out, "-------------")?;
    print_movie_table(&view.top_movies, out)?;
    writeln!(out)?;

    match charts {
        Some(files) => print_charts(files, out),
        None => Ok(()),
    }
}

fn print_filters(view: &DashboardView<'_>, out: &mut impl Write) -> io::Result<()> {
    let c = &view.criteria;
    let genres: Vec<&str> = c.genres.iter().map(String::as_str).collect();
    writeln!(
        out,
        "Filters: rating >= {:.1}, votes >= {}, duration {} min, {} genre(s)",
        c.min_rating,
        c.min_votes,
        c.duration,
        genres.len()
    )?;
    writeln!(out, "Genres:  {}", truncate(&genres.join(", "), 100))
}

fn print_metrics(m: &Metrics, out: &mut impl Write) -> io::Result<()> {
    let rating = m.mean_rating.map_or_else(|| "-".to_string(), |r| format!("{r:.2}"));
    let duration = m
        .mean_duration
        .map_or_else(|| "-".to_string(), |d| format!("{d:.1} min"));
    writeln!(out, "{:<20} {:<20} {:<20}", "Total Movies", "Average Rating", "Avg Duration")?;
    writeln!(out, "{:<20} {:<20} {:<20}", m.total, rating, duration)
}

fn print_movie_table(movies: &[&MovieRecord], out: &mut impl Write) -> io::Result<()> {
    if movies.is_empty() {
        return writeln!(out, "No movies match the current filters.");
    }

    writeln!(
        out,
        "{:<32} {:<28} {:>6} {:>9} {:>5}",
        "Movie", "Genre", "Rating", "Votes", "Min"
    )?;
    writeln!(out, "{}", "-".repeat(84))?;

    for m in movies {
        writeln!(
            out,
            "{:<32} {:<28} {:>6} {:>9} {:>5}",
            truncate(&m.movie_name, 32),
            truncate(m.genre.as_deref().unwrap_or("-"), 28),
            m.rating.map_or_else(|| "-".to_string(), |r| format!("{r:.1}")),
            m.votes.map_or_else(|| "-".to_string(), |v| v.to_string()),
            m.duration_minutes
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
        )?;
    }
    Ok(())
}

fn print_charts(files: &ChartFiles, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Charts")?;
    writeln!(out, "------")?;
    writeln!(out, "Genre Distribution:  {}", files.genre_distribution.display())?;
    writeln!(out, "Rating Distribution: {}", files.rating_histogram.display())?;
    writeln!(out, "Rating vs Votes:     {}", files.rating_vs_votes.display())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}
