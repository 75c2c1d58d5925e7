//! Loads staging tables from local JSON files.
//!
//! Used where the warehouse cannot COPY from S3 (the Postgres dialect). Files
//! hold one JSON document per line, as in the song and log datasets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::client::{describe, WarehouseClient};
use etl_core::error::DbErrorCode;
use etl_core::{Error, Result, StagingEvent, StagingSong};

/// Rows per multi-row INSERT.
const INSERT_CHUNK: usize = 500;

/// Reads JSON-lines records from a file, or from every `*.json` file below a
/// directory in path order.
pub fn read_json_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut files = Vec::new();
    if path.is_dir() {
        collect_json_files(path, &mut files)?;
        files.sort();
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        return Err(Error::load(format!("{}: no such file or directory", path.display())));
    }

    let mut records = Vec::new();
    for file in &files {
        let content = fs::read_to_string(file)?;
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| {
                Error::load(format!("{}:{}: {}", file.display(), idx + 1, e))
            })?;
            records.push(record);
        }
    }

    debug!(files = files.len(), records = records.len(), path = %path.display(), "Read JSON records");
    Ok(records)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

async fn read_blocking<T>(path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_json_records(&path))
        .await
        .map_err(|e| Error::internal(format!("Reader task failed: {}", e)))?
}

/// Reads event log records.
pub async fn load_events(path: &Path) -> Result<Vec<StagingEvent>> {
    read_blocking(path).await
}

/// Reads song metadata records.
pub async fn load_songs(path: &Path) -> Result<Vec<StagingSong>> {
    read_blocking(path).await
}

/// Inserts event records into `staging_events`.
pub async fn insert_staging_events(client: &WarehouseClient, events: &[StagingEvent]) -> Result<u64> {
    let mut inserted = 0;
    let mut conn = client.connection().await;

    for chunk in events.chunks(INSERT_CHUNK) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO staging_events(artist, auth, first_name, gender, item_in_session, \
             last_name, length, level, location, method, page, registration, session_id, \
             song, status, ts, user_agent, user_id) ",
        );
        builder.push_values(chunk, |mut row, e| {
            row.push_bind(&e.artist)
                .push_bind(&e.auth)
                .push_bind(&e.first_name)
                .push_bind(&e.gender)
                .push_bind(e.item_in_session)
                .push_bind(&e.last_name)
                .push_bind(&e.length)
                .push_bind(&e.level)
                .push_bind(&e.location)
                .push_bind(&e.method)
                .push_bind(&e.page)
                .push_bind(e.registration)
                .push_bind(&e.session_id)
                .push_bind(&e.song)
                .push_bind(e.status)
                .push_bind(e.ts)
                .push_bind(&e.user_agent)
                .push_bind(e.user_id);
        });

        let result = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| Error::database(DbErrorCode::StatementFailed, describe(&e)))?;
        inserted += result.rows_affected();
    }

    info!(rows = inserted, "Loaded staging_events");
    Ok(inserted)
}

/// Inserts song records into `staging_songs`.
pub async fn insert_staging_songs(client: &WarehouseClient, songs: &[StagingSong]) -> Result<u64> {
    let mut inserted = 0;
    let mut conn = client.connection().await;

    for chunk in songs.chunks(INSERT_CHUNK) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO staging_songs(num_songs, artist_id, artist_latitude, artist_longitude, \
             artist_location, artist_name, song_id, title, duration, year) ",
        );
        builder.push_values(chunk, |mut row, s| {
            row.push_bind(s.num_songs)
                .push_bind(&s.artist_id)
                .push_bind(s.artist_latitude)
                .push_bind(s.artist_longitude)
                .push_bind(&s.artist_location)
                .push_bind(&s.artist_name)
                .push_bind(&s.song_id)
                .push_bind(&s.title)
                .push_bind(s.duration)
                .push_bind(s.year);
        });

        let result = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| Error::database(DbErrorCode::StatementFailed, describe(&e)))?;
        inserted += result.rows_affected();
    }

    info!(rows = inserted, "Loaded staging_songs");
    Ok(inserted)
}
