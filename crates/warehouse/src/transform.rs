//! INSERT ... SELECT statements that build the star schema from staging.
//!
//! All statements are pure server-side SQL. Plays are matched to songs on
//! exact, case-sensitive equality of title and artist name; unmatched plays
//! are dropped by the inner join. Each title and artist pair resolves to the
//! lowest matching `song_id`, so a play yields at most one songplay.
//!
//! Event timestamps are epoch milliseconds truncated to whole seconds, so
//! `time` holds one row per distinct second of activity.

use etl_core::{Table, UserLevelPolicy};

/// Epoch milliseconds to TIMESTAMP.
fn epoch_ms_to_timestamp(column: &str) -> String {
    format!("TIMESTAMP 'epoch' + {}/1000 * INTERVAL '1 second'", column)
}

fn users_insert(policy: UserLevelPolicy) -> String {
    let select = match policy {
        UserLevelPolicy::Distinct => r#"SELECT DISTINCT
    user_id,
    first_name,
    last_name,
    gender,
    level
FROM staging_events
WHERE user_id IS NOT NULL"#
            .to_string(),
        UserLevelPolicy::Latest => r#"SELECT
    user_id,
    first_name,
    last_name,
    gender,
    level
FROM (
    SELECT
        user_id,
        first_name,
        last_name,
        gender,
        level,
        ROW_NUMBER() OVER (
            PARTITION BY user_id
            ORDER BY ts DESC NULLS LAST, level DESC
        ) AS recency
    FROM staging_events
    WHERE user_id IS NOT NULL
) AS ranked
WHERE recency = 1"#
            .to_string(),
    };

    format!(
        "INSERT INTO users(\n    user_id,\n    first_name,\n    last_name,\n    gender,\n    level\n)\n{};",
        select
    )
}

const SONGS_INSERT: &str = r#"INSERT INTO songs(
    song_id,
    title,
    artist_id,
    year,
    duration
)
SELECT DISTINCT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM staging_songs
WHERE song_id IS NOT NULL;"#;

const ARTISTS_INSERT: &str = r#"INSERT INTO artists(
    artist_id,
    name,
    location,
    latitude,
    longitude
)
SELECT DISTINCT
    artist_id,
    artist_name,
    artist_location,
    artist_latitude,
    artist_longitude
FROM staging_songs
WHERE artist_id IS NOT NULL;"#;

fn time_insert() -> String {
    format!(
        r#"INSERT INTO time(
    start_time,
    hour,
    day,
    week,
    month,
    year,
    weekday
)
SELECT
    b.start_time,
    EXTRACT(HOUR FROM b.start_time),
    EXTRACT(DAY FROM b.start_time),
    EXTRACT(WEEK FROM b.start_time),
    EXTRACT(MONTH FROM b.start_time),
    EXTRACT(YEAR FROM b.start_time),
    EXTRACT(DOW FROM b.start_time)
FROM (
    SELECT DISTINCT {start_time} AS start_time
    FROM staging_events
    WHERE ts IS NOT NULL
) AS b;"#,
        start_time = epoch_ms_to_timestamp("ts")
    )
}

fn songplays_insert() -> String {
    format!(
        r#"INSERT INTO songplays(
    start_time,
    user_id,
    level,
    song_id,
    artist_id,
    session_id,
    location,
    user_agent
)
SELECT
    {start_time} AS start_time,
    se.user_id,
    se.level,
    ss.song_id,
    ss.artist_id,
    se.session_id,
    se.location,
    se.user_agent
FROM staging_events se
JOIN (
    SELECT
        title,
        artist_name,
        song_id,
        artist_id,
        ROW_NUMBER() OVER (
            PARTITION BY title, artist_name
            ORDER BY song_id, artist_id
        ) AS match_rank
    FROM staging_songs
    WHERE song_id IS NOT NULL
        AND artist_id IS NOT NULL
) AS ss
    ON se.song = ss.title
    AND se.artist = ss.artist_name
    AND ss.match_rank = 1
WHERE se.page = 'NextSong'
    AND se.user_id IS NOT NULL
    AND se.ts IS NOT NULL;"#,
        start_time = epoch_ms_to_timestamp("se.ts")
    )
}

/// The statement populating one dimension or fact table.
///
/// Returns `None` for staging tables, which are filled by COPY.
pub fn insert_statement(table: Table, policy: UserLevelPolicy) -> Option<String> {
    match table {
        Table::Users => Some(users_insert(policy)),
        Table::Songs => Some(SONGS_INSERT.to_string()),
        Table::Artists => Some(ARTISTS_INSERT.to_string()),
        Table::Time => Some(time_insert()),
        Table::Songplays => Some(songplays_insert()),
        Table::StagingEvents | Table::StagingSongs => None,
    }
}

/// All transformations in load order.
pub fn insert_statements(policy: UserLevelPolicy) -> Vec<(Table, String)> {
    Table::LOAD_ORDER
        .iter()
        .filter_map(|t| insert_statement(*t, policy).map(|sql| (*t, sql)))
        .collect()
}
