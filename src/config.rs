use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::dashboard::filter::{self, DurationRange, FilterCriteria};
use crate::ingest::YearMatch;

/// Placeholder replaced by the target year in configured paths.
const YEAR_PLACEHOLDER: &str = "{year}";

/// Application configuration loaded from TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory that relative paths are resolved against (default: cwd).
    pub base_dir: Option<PathBuf>,
    /// Release year kept by `ingest`.
    pub target_year: i32,
    /// How `startYear` is compared with `target_year`.
    pub year_match: YearMatch,
    pub sources: SourcesConfig,
    pub output: OutputConfig,
    pub dashboard: DashboardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            target_year: 2024,
            year_match: YearMatch::default(),
            sources: SourcesConfig::default(),
            output: OutputConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

/// The IMDb dumps read by `ingest`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub basics: PathBuf,
    pub ratings: PathBuf,
    /// Column of the basics dump holding the runtime. It must be present:
    /// `ingest` refuses to run without it.
    pub runtime_column: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            basics: PathBuf::from("data/raw/title.basics.tsv.gz"),
            ratings: PathBuf::from("data/raw/title.ratings.tsv.gz"),
            runtime_column: "runtimeMinutes".to_string(),
        }
    }
}

/// Where the extract, the published database and the dashboard charts live.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv: PathBuf,
    pub database: PathBuf,
    /// Directory the dashboard writes its SVG charts into.
    pub charts: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("data/raw/imdb_{year}_raw.csv"),
            database: PathBuf::from("database/imdb_{year}.db"),
            charts: PathBuf::from("charts/imdb_{year}"),
        }
    }
}

/// Which table the dashboard reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The ingest CSV
    #[default]
    Csv,
    /// The SQLite database written by `publish`
    Db,
}

/// Initial values of the dashboard controls.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub min_rating: f64,
    pub min_votes: u64,
    pub min_duration: u32,
    pub max_duration: u32,
    pub source: SourceKind,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            min_rating: filter::DEFAULT_MIN_RATING,
            min_votes: filter::DEFAULT_MIN_VOTES,
            min_duration: filter::DEFAULT_DURATION.min,
            max_duration: filter::DEFAULT_DURATION.max,
            source: SourceKind::Csv,
        }
    }
}

impl DashboardConfig {
    /// Control defaults, falling back to the built-in value for any
    /// configured value outside the control's range.
    pub fn defaults(&self) -> (f64, u64, DurationRange) {
        let min_rating = if (0.0..=filter::MAX_RATING).contains(&self.min_rating) {
            self.min_rating
        } else {
            log::warn!(
                "dashboard.min_rating {} outside 0-{}, using {}",
                self.min_rating,
                filter::MAX_RATING,
                filter::DEFAULT_MIN_RATING
            );
            filter::DEFAULT_MIN_RATING
        };

        let duration = if self.min_duration <= self.max_duration && self.max_duration <= filter::MAX_DURATION {
            DurationRange {
                min: self.min_duration,
                max: self.max_duration,
            }
        } else {
            log::warn!(
                "dashboard duration {}-{} is not a valid range within 0-{}, using {}",
                self.min_duration,
                self.max_duration,
                filter::MAX_DURATION,
                filter::DEFAULT_DURATION
            );
            filter::DEFAULT_DURATION
        };

        (min_rating, self.min_votes, duration)
    }

    /// Criteria with every genre of `movies` selected and the configured defaults.
    pub fn criteria(&self, movies: &[crate::db::models::MovieRecord]) -> FilterCriteria {
        let (min_rating, min_votes, duration) = self.defaults();
        FilterCriteria {
            min_rating,
            min_votes,
            duration,
            ..FilterCriteria::all_genres(movies)
        }
    }
}

/// Concrete file locations for one target year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub basics: PathBuf,
    pub ratings: PathBuf,
    pub csv: PathBuf,
    pub database: PathBuf,
    pub charts: PathBuf,
}

impl AppConfig {
    /// Load config from `~/.config/marquee/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                return Self::default();
            }
        };

        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolve every configured path for `year` under `base_dir`.
    pub fn paths(&self, base_dir: &Path, year: i32) -> ResolvedPaths {
        ResolvedPaths {
            basics: resolve(base_dir, &self.sources.basics, year),
            ratings: resolve(base_dir, &self.sources.ratings, year),
            csv: resolve(base_dir, &self.output.csv, year),
            database: resolve(base_dir, &self.output.database, year),
            charts: resolve(base_dir, &self.output.charts, year),
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Substitute `{year}` and anchor relative paths at `base_dir`.
fn resolve(base_dir: &Path, path: &Path, year: i32) -> PathBuf {
    let expanded = PathBuf::from(
        path.to_string_lossy()
            .replace(YEAR_PLACEHOLDER, &year.to_string()),
    );
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

/// Fallback base directory: the current working directory.
pub fn default_base_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
