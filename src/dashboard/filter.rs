use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::DashboardError;
use crate::db::models::MovieRecord;

pub const DEFAULT_MIN_RATING: f64 = 5.0;
pub const DEFAULT_MIN_VOTES: u64 = 1000;
pub const DEFAULT_DURATION: DurationRange = DurationRange { min: 60, max: 180 };

/// Upper limit of the rating control.
pub const MAX_RATING: f64 = 10.0;
/// Upper limit of the duration control, in minutes.
pub const MAX_DURATION: u32 = 300;

/// Inclusive duration bounds in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationRange {
    pub min: u32,
    pub max: u32,
}

impl DurationRange {
    pub fn contains(&self, minutes: u32) -> bool {
        self.min <= minutes && minutes <= self.max
    }
}

impl fmt::Display for DurationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl FromStr for DurationRange {
    type Err = String;

    /// Parses "MIN-MAX", both within `0..=MAX_DURATION`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lo, hi) = s
            .split_once('-')
            .ok_or_else(|| format!("expected MIN-MAX, got {s:?}"))?;
        let min: u32 = lo.trim().parse().map_err(|_| format!("invalid minimum {lo:?}"))?;
        let max: u32 = hi.trim().parse().map_err(|_| format!("invalid maximum {hi:?}"))?;
        if max > MAX_DURATION {
            return Err(format!("maximum must be at most {MAX_DURATION}"));
        }
        if min > max {
            return Err(format!("minimum {min} is above maximum {max}"));
        }
        Ok(Self { min, max })
    }
}

/// Parse a minimum-rating control value (0.0 to 10.0).
pub fn parse_rating(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("invalid rating {s:?}"))?;
    if (0.0..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        Err(format!("rating must be between 0.0 and {MAX_RATING}"))
    }
}

/// The user's current filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCriteria {
    pub genres: BTreeSet<String>,
    pub min_rating: f64,
    pub min_votes: u64,
    pub duration: DurationRange,
}

impl FilterCriteria {
    /// Default controls with every genre of `movies` selected.
    pub fn all_genres(movies: &[MovieRecord]) -> Self {
        Self {
            genres: genre_vocabulary(movies).into_iter().collect(),
            min_rating: DEFAULT_MIN_RATING,
            min_votes: DEFAULT_MIN_VOTES,
            duration: DEFAULT_DURATION,
        }
    }

    /// Whether `movie` passes every control.
    ///
    /// Genre matching is substring containment against the raw, unsplit
    /// genre field: selecting "War" also matches "Warfare". A movie without
    /// a genre never matches, and neither does one missing any of the
    /// numeric fields.
    pub fn matches(&self, movie: &MovieRecord) -> bool {
        let numeric = match (movie.rating, movie.votes, movie.duration_minutes) {
            (Some(rating), Some(votes), Some(duration)) => {
                rating >= self.min_rating && votes >= self.min_votes && self.duration.contains(duration)
            }
            _ => false,
        };
        if !numeric {
            return false;
        }

        match movie.genre.as_deref() {
            Some(raw) => self.genres.iter().any(|g| raw.contains(g.as_str())),
            None => false,
        }
    }
}

/// Movies that passed a [`FilterCriteria`], in table order.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    rows: Vec<&'a MovieRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a MovieRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a MovieRecord> + '_ {
        self.rows.iter().copied()
    }
}

pub fn apply<'a>(movies: &'a [MovieRecord], criteria: &FilterCriteria) -> FilteredView<'a> {
    FilteredView {
        rows: movies.iter().filter(|m| criteria.matches(m)).collect(),
    }
}

/// Trimmed, non-empty tokens of a comma-separated genre field.
pub fn split_genres(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|g| !g.is_empty())
}

/// Every genre appearing in `movies`, sorted and deduplicated.
pub fn genre_vocabulary(movies: &[MovieRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = movies
        .iter()
        .filter_map(|m| m.genre.as_deref())
        .flat_map(split_genres)
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// The genre selection for `requested`, checked against the vocabulary of
/// `movies`. An empty request selects every genre.
pub fn select_genres(
    movies: &[MovieRecord],
    requested: impl IntoIterator<Item = String>,
) -> Result<BTreeSet<String>, DashboardError> {
    let vocabulary = genre_vocabulary(movies);
    let mut selected = BTreeSet::new();
    for genre in requested {
        if vocabulary.binary_search(&genre).is_err() {
            return Err(DashboardError::UnknownGenre {
                genre,
                valid: vocabulary,
            });
        }
        selected.insert(genre);
    }

    if selected.is_empty() {
        Ok(vocabulary.into_iter().collect())
    } else {
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(name: &str, genre: Option<&str>, rating: f64, votes: u64, duration: u32) -> MovieRecord {
        MovieRecord {
            movie_name: name.to_string(),
            genre: genre.map(str::to_string),
            rating: Some(rating),
            votes: Some(votes),
            duration_minutes: Some(duration),
        }
    }

    fn criteria(genres: &[&str], min_rating: f64, min_votes: u64, min: u32, max: u32) -> FilterCriteria {
        FilterCriteria {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            min_rating,
            min_votes,
            duration: DurationRange { min, max },
        }
    }

    fn scenario() -> Vec<MovieRecord> {
        vec![
            movie("A", Some("Drama"), 8.0, 5000, 120),
            movie("B", Some("Comedy"), 4.0, 500, 90),
            movie("C", Some("Drama,Action"), 7.5, 20000, 150),
        ]
    }

    fn names(view: &FilteredView<'_>) -> Vec<String> {
        view.iter().map(|m| m.movie_name.clone()).collect()
    }

    #[test]
    fn test_three_row_scenario() {
        let movies = scenario();
        let view = apply(&movies, &criteria(&["Drama"], 5.0, 1000, 60, 180));
        assert_eq!(names(&view), vec!["A", "C"]);
    }

    #[test]
    fn test_substring_genre_match() {
        let movies = vec![movie("X", Some("Action,Adventure"), 7.0, 2000, 100)];
        let view = apply(&movies, &criteria(&["Action"], 5.0, 1000, 60, 180));
        assert_eq!(view.len(), 1);

        // Substring, not token: "War" matches a "Warfare" field.
        let movies = vec![movie("Y", Some("Warfare"), 7.0, 2000, 100)];
        let view = apply(&movies, &criteria(&["War"], 5.0, 1000, 60, 180));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_missing_genre_never_matches() {
        let movies = vec![movie("X", None, 9.0, 100_000, 100)];
        let view = apply(&movies, &criteria(&["Drama", "Action"], 0.0, 0, 0, 300));
        assert!(view.is_empty());
    }

    #[test]
    fn test_missing_numbers_never_match() {
        let mut unrated = movie("X", Some("Drama"), 9.0, 100_000, 100);
        unrated.rating = None;
        let mut no_runtime = movie("Y", Some("Drama"), 9.0, 100_000, 100);
        no_runtime.duration_minutes = None;

        let movies = vec![unrated, no_runtime];
        let view = apply(&movies, &criteria(&["Drama"], 0.0, 0, 0, 300));
        assert!(view.is_empty());
    }

    #[test]
    fn test_duration_bounds_inclusive() {
        let movies = vec![
            movie("lo", Some("Drama"), 6.0, 2000, 60),
            movie("hi", Some("Drama"), 6.0, 2000, 180),
            movie("out", Some("Drama"), 6.0, 2000, 181),
        ];
        let view = apply(&movies, &criteria(&["Drama"], 6.0, 2000, 60, 180));
        assert_eq!(names(&view), vec!["lo", "hi"]);
    }

    #[test]
    fn test_widening_never_shrinks() {
        let movies = vec![
            movie("a", Some("Drama"), 8.0, 5000, 120),
            movie("b", Some("Comedy"), 4.0, 500, 90),
            movie("c", Some("Drama,Action"), 7.5, 20000, 150),
            movie("d", Some("Horror"), 5.5, 1200, 61),
            movie("e", Some("Documentary"), 9.1, 300, 200),
            movie("f", Some("Action,Sci-Fi"), 6.2, 80000, 45),
        ];
        let base = criteria(&["Drama"], 6.0, 1000, 60, 180);
        let base_len = apply(&movies, &base).len();

        let mut wider = Vec::new();
        let mut c = base.clone();
        c.min_rating = 3.0;
        wider.push(c);
        let mut c = base.clone();
        c.min_votes = 0;
        wider.push(c);
        let mut c = base.clone();
        c.duration = DurationRange { min: 0, max: 300 };
        wider.push(c);
        let mut c = base.clone();
        c.genres.insert("Comedy".into());
        c.genres.insert("Sci-Fi".into());
        wider.push(c);

        for c in &wider {
            assert!(apply(&movies, c).len() >= base_len, "{c:?}");
        }
    }

    #[test]
    fn test_genre_vocabulary() {
        let movies = vec![
            movie("a", Some("Drama, Action"), 1.0, 1, 1),
            movie("b", Some("Action,Comedy"), 1.0, 1, 1),
            movie("c", None, 1.0, 1, 1),
            movie("d", Some("Drama,"), 1.0, 1, 1),
        ];
        assert_eq!(genre_vocabulary(&movies), vec!["Action", "Comedy", "Drama"]);
    }

    #[test]
    fn test_select_genres_from_vocabulary() {
        let movies = scenario();
        let selected = select_genres(&movies, vec!["Drama".to_string()]).unwrap();
        assert_eq!(selected.into_iter().collect::<Vec<_>>(), vec!["Drama"]);

        let all = select_genres(&movies, Vec::new()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_select_genres_rejects_unknown() {
        let movies = vec![
            movie("a", Some("Drama"), 7.0, 2000, 100),
            movie("b", Some("Comedy"), 7.0, 2000, 100),
            movie("c", Some("Horror"), 7.0, 2000, 100),
        ];

        // Any of these would otherwise match by substring or silently match nothing
        for bad in ["a", "", "Sport", "drama"] {
            match select_genres(&movies, vec![bad.to_string()]) {
                Err(DashboardError::UnknownGenre { genre, valid }) => {
                    assert_eq!(genre, bad);
                    assert_eq!(valid, vec!["Comedy", "Drama", "Horror"]);
                }
                other => panic!("{bad:?} accepted: {other:?}"),
            }
        }
    }

    #[test]
    fn test_all_genres_defaults() {
        let c = FilterCriteria::all_genres(&scenario());
        assert_eq!(c.genres.len(), 3);
        assert_eq!(c.min_rating, DEFAULT_MIN_RATING);
        assert_eq!(c.min_votes, DEFAULT_MIN_VOTES);
        assert_eq!(c.duration, DEFAULT_DURATION);
    }

    #[test]
    fn test_duration_range_parse() {
        assert_eq!("60-180".parse::<DurationRange>().unwrap(), DEFAULT_DURATION);
        assert_eq!("0 - 300".parse::<DurationRange>().unwrap(), DurationRange { min: 0, max: 300 });
        assert!("180-60".parse::<DurationRange>().is_err());
        assert!("0-301".parse::<DurationRange>().is_err());
        assert!("90".parse::<DurationRange>().is_err());
    }

    #[test]
    fn test_parse_rating_bounds() {
        assert_eq!(parse_rating("7.5").unwrap(), 7.5);
        assert!(parse_rating("10.1").is_err());
        assert!(parse_rating("-1").is_err());
        assert!(parse_rating("high").is_err());
    }
}
