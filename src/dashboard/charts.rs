//! Data behind the dashboard's table and charts.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::filter::{FilteredView, split_genres};
use crate::db::models::MovieRecord;

pub const TOP_MOVIES: usize = 10;
pub const TOP_GENRES: usize = 10;
pub const HISTOGRAM_BINS: usize = 20;
/// Marker opacity of the rating-vs-votes scatter.
pub const SCATTER_OPACITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

/// One histogram bin covering `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub votes: u64,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPlot {
    pub opacity: f64,
    pub points: Vec<ScatterPoint>,
}

/// Highest-rated movies first. The sort is stable, so ties keep table
/// order; unrated movies sort last.
pub fn top_rated<'a>(view: &FilteredView<'a>, limit: usize) -> Vec<&'a MovieRecord> {
    let mut rows: Vec<&MovieRecord> = view.iter().collect();
    rows.sort_by(|a, b| match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows.truncate(limit);
    rows
}

/// Occurrences of each genre token across `movies`, most frequent first
/// and alphabetical among equals.
pub fn count_genres<'a>(movies: impl Iterator<Item = &'a MovieRecord>) -> Vec<GenreCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for raw in movies.filter_map(|m| m.genre.as_deref()) {
        for genre in split_genres(raw) {
            *counts.entry(genre).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<GenreCount> = counts
        .into_iter()
        .map(|(genre, count)| GenreCount {
            genre: genre.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));
    counts
}

pub fn genre_distribution(view: &FilteredView<'_>, limit: usize) -> Vec<GenreCount> {
    let mut counts = count_genres(view.iter());
    counts.truncate(limit);
    counts
}

/// Equal-width histogram of the present ratings over their observed range.
pub fn rating_histogram(view: &FilteredView<'_>, bins: usize) -> Vec<HistogramBin> {
    let ratings: Vec<f64> = view.iter().filter_map(|m| m.rating).collect();
    histogram(&ratings, bins)
}

fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edge = |i: usize| if i == bins { hi } else { lo + width * i as f64 };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let mut idx = (((v - lo) / width) as usize).min(bins - 1);
        // The division can land a value sitting on an edge in the wrong bin
        if v < edge(idx) {
            idx -= 1;
        } else if idx + 1 < bins && v >= edge(idx + 1) {
            idx += 1;
        }
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: edge(i),
            end: edge(i + 1),
            count,
        })
        .collect()
}

/// One point per movie with both votes and a rating.
pub fn rating_vs_votes(view: &FilteredView<'_>) -> ScatterPlot {
    ScatterPlot {
        opacity: SCATTER_OPACITY,
        points: view
            .iter()
            .filter_map(|m| Some(ScatterPoint {
                votes: m.votes?,
                rating: m.rating?,
            }))
            .collect(),
    }
}
