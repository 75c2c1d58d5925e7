//! Staging record builders.

use etl_core::{StagingEvent, StagingSong};

/// 2018-11-02 01:25:34.796 UTC, a Friday in ISO week 44.
pub const PLAY_TS: i64 = 1541121934796;

/// A fully populated `NextSong` event for `user_id`.
pub fn next_song(user_id: i32, song: &str, artist: &str, ts: i64) -> StagingEvent {
    StagingEvent {
        auth: Some("Logged In".to_string()),
        first_name: Some(format!("First{}", user_id)),
        last_name: Some(format!("Last{}", user_id)),
        gender: Some("F".to_string()),
        item_in_session: Some(0),
        length: Some("215.50975".to_string()),
        level: Some("free".to_string()),
        location: Some("Lansing-East Lansing, MI".to_string()),
        method: Some("PUT".to_string()),
        registration: Some(1540856599796),
        session_id: Some("182".to_string()),
        status: Some(200),
        user_agent: Some("Mozilla/5.0 (Windows NT 6.1; WOW64)".to_string()),
        ..StagingEvent::next_song(user_id, song, artist, ts)
    }
}

/// The same play with a different subscription level.
pub fn next_song_at_level(user_id: i32, song: &str, artist: &str, ts: i64, level: &str) -> StagingEvent {
    StagingEvent {
        level: Some(level.to_string()),
        ..next_song(user_id, song, artist, ts)
    }
}

/// A page view without a logged-in user.
pub fn logged_out(page: &str, ts: i64) -> StagingEvent {
    StagingEvent {
        auth: Some("Logged Out".to_string()),
        level: Some("free".to_string()),
        location: None,
        method: Some("GET".to_string()),
        page: Some(page.to_string()),
        session_id: Some("183".to_string()),
        status: Some(200),
        ts: Some(ts),
        user_agent: None,
        user_id: None,
        ..Default::default()
    }
}

/// A `NextSong` play whose user id is missing.
pub fn anonymous_play(song: &str, artist: &str, ts: i64) -> StagingEvent {
    StagingEvent {
        user_id: None,
        first_name: None,
        last_name: None,
        gender: None,
        ..next_song(0, song, artist, ts)
    }
}

/// One song metadata document.
pub fn song(song_id: &str, title: &str, artist_id: &str, artist_name: &str) -> StagingSong {
    StagingSong {
        num_songs: Some(1),
        artist_id: Some(artist_id.to_string()),
        artist_latitude: None,
        artist_longitude: None,
        artist_location: Some(String::new()),
        artist_name: Some(artist_name.to_string()),
        song_id: Some(song_id.to_string()),
        title: Some(title.to_string()),
        duration: Some(215.5),
        year: Some(2004),
    }
}

/// Directory of on-disk sample datasets.
pub fn data_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}
