//! Query functions for reading loaded tables back (used by `counts` and tests).

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::client::{describe, WarehouseClient};
use etl_core::error::DbErrorCode;
use etl_core::{Error, Result, Table};

fn query_error(e: sqlx::Error) -> Error {
    Error::database(DbErrorCode::QueryFailed, describe(&e))
}

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: Table,
    pub rows: i64,
}

/// One `songplays` row.
#[derive(Debug, Clone, FromRow)]
pub struct SongplayRow {
    pub songplay_id: i32,
    pub start_time: NaiveDateTime,
    pub user_id: i32,
    pub level: String,
    pub song_id: String,
    pub artist_id: String,
    pub session_id: String,
    pub location: String,
    pub user_agent: String,
}

/// One `time` row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TimeRow {
    pub start_time: NaiveDateTime,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

/// One `users` row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRow {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: String,
}

/// Count rows of one table.
pub async fn count_rows(client: &WarehouseClient, table: Table) -> Result<i64> {
    let mut conn = client.connection().await;
    // table names come from the fixed catalogue
    let sql = format!("SELECT COUNT(*) FROM {}", table.name());
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(&mut *conn)
        .await
        .map_err(query_error)
}

/// Row counts of every table, in creation order.
pub async fn row_counts(client: &WarehouseClient) -> Result<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(Table::CREATE_ORDER.len());
    for table in Table::CREATE_ORDER {
        counts.push(TableCount {
            table,
            rows: count_rows(client, table).await?,
        });
    }
    Ok(counts)
}

/// Fetch all songplays (for verification).
pub async fn songplays(client: &WarehouseClient) -> Result<Vec<SongplayRow>> {
    let mut conn = client.connection().await;
    sqlx::query_as::<_, SongplayRow>(
        "SELECT songplay_id, start_time, user_id, level, song_id, artist_id, session_id, location, user_agent \
         FROM songplays ORDER BY start_time, songplay_id",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(query_error)
}

/// Fetch all time rows (for verification).
pub async fn time_rows(client: &WarehouseClient) -> Result<Vec<TimeRow>> {
    let mut conn = client.connection().await;
    sqlx::query_as::<_, TimeRow>(
        "SELECT start_time, hour, day, week, month, year, weekday FROM time ORDER BY start_time",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(query_error)
}

/// Fetch all users (for verification).
pub async fn users(client: &WarehouseClient) -> Result<Vec<UserRow>> {
    let mut conn = client.connection().await;
    sqlx::query_as::<_, UserRow>(
        "SELECT user_id, first_name, last_name, gender, level FROM users ORDER BY user_id",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(query_error)
}
