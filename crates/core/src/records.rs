//! Raw records of the song and event-log datasets.
//!
//! These mirror the JSON documents COPY lands in the staging tables. Values
//! are kept as loose as the source: every field is optional.

use serde::{Deserialize, Deserializer, Serialize};

/// One line of an event log file.
///
/// `userId` is a string in the logs and empty for logged-out sessions;
/// `sessionId` is numeric but staged as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingEvent {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub item_in_session: Option<i32>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub length: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub registration: Option<i64>,
    #[serde(default, deserialize_with = "opt_text")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub ts: Option<i64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "opt_i32")]
    pub user_id: Option<i32>,
}

impl StagingEvent {
    /// A `NextSong` play of `song` by `artist`.
    pub fn next_song(user_id: i32, song: &str, artist: &str, ts: i64) -> Self {
        Self {
            artist: Some(artist.to_string()),
            song: Some(song.to_string()),
            page: Some("NextSong".to_string()),
            user_id: Some(user_id),
            ts: Some(ts),
            ..Default::default()
        }
    }
}

/// One song metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagingSong {
    #[serde(default)]
    pub num_songs: Option<i32>,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f32>,
    #[serde(default)]
    pub artist_longitude: Option<f32>,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub song_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default, deserialize_with = "opt_i32")]
    pub year: Option<i32>,
}

/// Accepts a JSON number or numeric string; empty strings become `None`.
fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(|f| Some(f as i64))
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected number, got {}",
            other
        ))),
    }
}

fn opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_i64(deserializer)?
        .map(|v| i32::try_from(v).map_err(serde::de::Error::custom))
        .transpose()
}

/// Accepts a JSON string or number and keeps it as text.
fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
