use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// One movie of the yearly extract. This is the row shape of the ingest CSV
/// and of the `movies` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_name: String,
    /// Raw comma-separated genre list, e.g. "Action,Adventure".
    pub genre: Option<String>,
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration_minutes: Option<u32>,
}

/// A row of the `publish_log` table.
#[derive(Debug, Clone)]
pub struct PublishRecord {
    pub published_at: String,
    pub source_path: String,
    pub row_count: i64,
}

/// Accepts "1234" as well as the float-typed "1234.0" that spreadsheet
/// tools write for integer columns containing blanks.
fn lenient_count<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value = match raw.parse::<u64>() {
        Ok(v) => v,
        Err(_) => {
            let f: f64 = raw
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid count: {raw:?}")))?;
            if f < 0.0 || f.fract() != 0.0 || !f.is_finite() {
                return Err(D::Error::custom(format!("invalid count: {raw:?}")));
            }
            f as u64
        }
    };

    T::try_from(value)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("count out of range: {raw}")))
}
