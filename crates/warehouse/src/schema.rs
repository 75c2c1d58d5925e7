//! Warehouse table schemas.
//!
//! Schema layout:
//! - staging tables hold raw, unvalidated rows behind a surrogate key
//! - dimension and fact tables are NOT NULL on every business column
//! - `songs` and `songplays` declare foreign keys into the dimensions

use etl_core::{Dialect, Table};

/// `DROP TABLE IF EXISTS` for one table.
pub fn drop_statement(table: Table) -> String {
    format!("DROP TABLE IF EXISTS {};", table.name())
}

/// `CREATE TABLE IF NOT EXISTS` for one table.
pub fn create_statement(table: Table, dialect: Dialect) -> String {
    let body = match table {
        Table::StagingEvents => format!(
            r#"
    {id},
    artist VARCHAR,
    auth VARCHAR,
    first_name VARCHAR,
    gender CHAR(1),
    item_in_session INT,
    last_name VARCHAR,
    length VARCHAR,
    level VARCHAR,
    location VARCHAR,
    method VARCHAR,
    page VARCHAR,
    registration BIGINT,
    session_id VARCHAR,
    song VARCHAR,
    status INT,
    ts BIGINT,
    user_agent VARCHAR,
    user_id INT,
    PRIMARY KEY(stg_event_id)
"#,
            id = dialect.identity_column("stg_event_id")
        ),
        Table::StagingSongs => format!(
            r#"
    {id},
    num_songs INT,
    artist_id VARCHAR,
    artist_latitude FLOAT4,
    artist_longitude FLOAT4,
    artist_location VARCHAR,
    artist_name VARCHAR,
    song_id VARCHAR,
    title VARCHAR,
    duration FLOAT4,
    year INT,
    PRIMARY KEY(stg_song_id)
"#,
            id = dialect.identity_column("stg_song_id")
        ),
        Table::Users => r#"
    user_id INT NOT NULL,
    first_name VARCHAR NOT NULL,
    last_name VARCHAR NOT NULL,
    gender CHAR(1) NOT NULL,
    level VARCHAR NOT NULL,
    PRIMARY KEY(user_id)
"#
        .to_string(),
        Table::Artists => r#"
    artist_id VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    location VARCHAR,
    latitude FLOAT4,
    longitude FLOAT4,
    PRIMARY KEY(artist_id)
"#
        .to_string(),
        Table::Songs => r#"
    song_id VARCHAR NOT NULL,
    title VARCHAR NOT NULL,
    artist_id VARCHAR NOT NULL,
    year INT NOT NULL,
    duration FLOAT4 NOT NULL,
    PRIMARY KEY(song_id),
    FOREIGN KEY(artist_id) REFERENCES artists(artist_id)
"#
        .to_string(),
        Table::Time => r#"
    start_time TIMESTAMP NOT NULL,
    hour INT NOT NULL,
    day INT NOT NULL,
    week INT NOT NULL,
    month INT NOT NULL,
    year INT NOT NULL,
    weekday INT NOT NULL,
    PRIMARY KEY(start_time)
"#
        .to_string(),
        Table::Songplays => format!(
            r#"
    {id},
    start_time TIMESTAMP NOT NULL,
    user_id INT NOT NULL,
    level VARCHAR NOT NULL,
    song_id VARCHAR NOT NULL,
    artist_id VARCHAR NOT NULL,
    session_id VARCHAR NOT NULL,
    location VARCHAR NOT NULL,
    user_agent VARCHAR NOT NULL,
    PRIMARY KEY(songplay_id),
    FOREIGN KEY(start_time) REFERENCES time(start_time),
    FOREIGN KEY(user_id) REFERENCES users(user_id),
    FOREIGN KEY(song_id) REFERENCES songs(song_id),
    FOREIGN KEY(artist_id) REFERENCES artists(artist_id)
"#,
            id = dialect.identity_column("songplay_id")
        ),
    };

    format!("CREATE TABLE IF NOT EXISTS {}({});", table.name(), body)
}

/// Drop statements in dependency-safe order.
pub fn drop_statements() -> Vec<(Table, String)> {
    Table::DROP_ORDER
        .iter()
        .map(|t| (*t, drop_statement(*t)))
        .collect()
}

/// Create statements in dependency-safe order.
pub fn create_statements(dialect: Dialect) -> Vec<(Table, String)> {
    Table::CREATE_ORDER
        .iter()
        .map(|t| (*t, create_statement(*t, dialect)))
        .collect()
}
