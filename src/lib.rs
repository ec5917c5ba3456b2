pub mod config;
pub mod dashboard;
pub mod db;
pub mod ingest;
pub mod table;

/// Application name for XDG paths
pub const APP_NAME: &str = "marquee";
