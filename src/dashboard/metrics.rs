use serde::Serialize;

use super::filter::FilteredView;

/// The three headline numbers above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total: usize,
    /// Mean rating, rounded to 2 decimals. `None` when nothing is rated.
    pub mean_rating: Option<f64>,
    /// Mean runtime in minutes, rounded to 1 decimal.
    pub mean_duration: Option<f64>,
}

pub fn compute(view: &FilteredView<'_>) -> Metrics {
    Metrics {
        total: view.len(),
        mean_rating: mean(view.iter().filter_map(|m| m.rating)).map(|v| round_to(v, 2)),
        mean_duration: mean(view.iter().filter_map(|m| m.duration_minutes.map(f64::from)))
            .map(|v| round_to(v, 1)),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::filter::{self, DurationRange, FilterCriteria};
    use crate::db::models::MovieRecord;

    fn movie(rating: f64, duration: u32) -> MovieRecord {
        MovieRecord {
            movie_name: "m".into(),
            genre: Some("Drama".into()),
            rating: Some(rating),
            votes: Some(10_000),
            duration_minutes: Some(duration),
        }
    }

    fn open_criteria() -> FilterCriteria {
        FilterCriteria {
            genres: ["Drama".to_string()].into_iter().collect(),
            min_rating: 0.0,
            min_votes: 0,
            duration: DurationRange { min: 0, max: 300 },
        }
    }

    #[test]
    fn test_rounding() {
        let movies = vec![movie(7.0, 100), movie(8.0, 101), movie(8.0, 101)];
        let m = compute(&filter::apply(&movies, &open_criteria()));
        assert_eq!(m.total, 3);
        assert_eq!(m.mean_rating, Some(7.67));
        assert_eq!(m.mean_duration, Some(100.7));
    }

    #[test]
    fn test_empty_view_has_no_means() {
        let movies: Vec<MovieRecord> = Vec::new();
        let m = compute(&filter::apply(&movies, &open_criteria()));
        assert_eq!(
            m,
            Metrics {
                total: 0,
                mean_rating: None,
                mean_duration: None,
            }
        );
    }
}
