//! End-to-end transformation of staged events and songs.
//!
//! Requires Docker to be running for testcontainers.

use chrono::NaiveDate;
use etl_core::Table;
use integration_tests::fixtures::{anonymous_play, logged_out, next_song, song, PLAY_TS};
use integration_tests::setup::TestContext;
use warehouse::query::{count_rows, songplays, time_rows, users};

/// One matching play produces one fully resolved songplay.
#[tokio::test]
async fn test_matching_play_produces_songplay() {
    let ctx = TestContext::new().await;
    ctx.load(
        &[next_song(10, "Test Song", "Test Artist", PLAY_TS)],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;

    let plays = songplays(&ctx.client).await.unwrap();
    assert_eq!(plays.len(), 1);

    let play = &plays[0];
    assert_eq!(play.song_id, "S1");
    assert_eq!(play.artist_id, "A1");
    assert_eq!(play.user_id, 10);
    assert_eq!(play.level, "free");
    assert_eq!(play.session_id, "182");
    assert_eq!(
        play.start_time,
        NaiveDate::from_ymd_opt(2018, 11, 2)
            .unwrap()
            .and_hms_opt(1, 25, 34)
            .unwrap()
    );
}

/// The play timestamp is decomposed into calendar parts.
#[tokio::test]
async fn test_time_decomposition() {
    let ctx = TestContext::new().await;
    ctx.load(
        &[next_song(10, "Test Song", "Test Artist", PLAY_TS)],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;

    let rows = time_rows(&ctx.client).await.unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.hour, 1);
    assert_eq!(row.day, 2);
    assert_eq!(row.week, 44);
    assert_eq!(row.month, 11);
    assert_eq!(row.year, 2018);
    // Friday, with Sunday = 0
    assert_eq!(row.weekday, 5);
}

/// Events without a user id reach neither users nor songplays.
#[tokio::test]
async fn test_null_user_is_excluded() {
    let ctx = TestContext::new().await;
    ctx.load(
        &[
            anonymous_play("Test Song", "Test Artist", PLAY_TS),
            logged_out("Home", PLAY_TS + 5_000),
        ],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;

    assert_eq!(count_rows(&ctx.client, Table::Users).await.unwrap(), 0);
    assert_eq!(count_rows(&ctx.client, Table::Songplays).await.unwrap(), 0);
    // every event with a timestamp still lands in time
    assert_eq!(count_rows(&ctx.client, Table::Time).await.unwrap(), 2);
}

/// Title and artist must match exactly, including case.
#[tokio::test]
async fn test_match_is_case_sensitive() {
    let ctx = TestContext::new().await;
    ctx.load(
        &[
            next_song(10, "test song", "Test Artist", PLAY_TS),
            next_song(11, "Test Song", "TEST ARTIST", PLAY_TS + 1_000),
            next_song(12, "Unknown Song", "Test Artist", PLAY_TS + 2_000),
        ],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;

    assert_eq!(count_rows(&ctx.client, Table::Songplays).await.unwrap(), 0);
    // unmatched plays still contribute users
    assert_eq!(count_rows(&ctx.client, Table::Users).await.unwrap(), 3);
}

/// Only NextSong events with a user become songplays.
#[tokio::test]
async fn test_songplays_bounded_by_next_song_events() {
    let ctx = TestContext::new().await;
    let mut home = next_song(10, "Test Song", "Test Artist", PLAY_TS + 3_000);
    home.page = Some("Home".to_string());

    ctx.load(
        &[
            next_song(10, "Test Song", "Test Artist", PLAY_TS),
            next_song(11, "Other Song", "Other Artist", PLAY_TS + 1_000),
            anonymous_play("Test Song", "Test Artist", PLAY_TS + 2_000),
            home,
        ],
        &[
            song("S1", "Test Song", "A1", "Test Artist"),
            song("S2", "Other Song", "A2", "Other Artist"),
        ],
    )
    .await;

    let plays = songplays(&ctx.client).await.unwrap();
    assert_eq!(plays.len(), 2);
    let songs: Vec<_> = plays.iter().map(|p| p.song_id.as_str()).collect();
    assert_eq!(songs, vec!["S1", "S2"]);
}

/// Duplicate song documents still give one songplay per play.
#[tokio::test]
async fn test_duplicate_song_documents_match_once() {
    let ctx = TestContext::new().await;
    ctx.load(
        &[next_song(10, "Test Song", "Test Artist", PLAY_TS)],
        &[
            song("S1", "Test Song", "A1", "Test Artist"),
            song("S1", "Test Song", "A1", "Test Artist"),
            song("S9", "Test Song", "A1", "Test Artist"),
        ],
    )
    .await;

    let plays = songplays(&ctx.client).await.unwrap();
    assert_eq!(plays.len(), 1);
    // lowest song_id wins among equal titles by the same artist
    assert_eq!(plays[0].song_id, "S1");
    assert_eq!(plays[0].artist_id, "A1");
    assert_eq!(count_rows(&ctx.client, Table::Songs).await.unwrap(), 2);
}

/// A play without a timestamp cannot become a songplay.
#[tokio::test]
async fn test_play_without_timestamp_is_excluded() {
    let ctx = TestContext::new().await;
    let mut untimed = next_song(10, "Test Song", "Test Artist", PLAY_TS);
    untimed.ts = None;

    ctx.load(
        &[untimed, next_song(11, "Test Song", "Test Artist", PLAY_TS)],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;

    let plays = songplays(&ctx.client).await.unwrap();
    assert_eq!(plays.len(), 1);
    assert_eq!(plays[0].user_id, 11);
}

/// Repeated staging rows collapse into unique dimension keys.
#[tokio::test]
async fn test_dimension_keys_are_unique() {
    let ctx = TestContext::new().await;
    ctx.load(
        &[
            next_song(10, "Test Song", "Test Artist", PLAY_TS),
            next_song(10, "Test Song", "Test Artist", PLAY_TS),
            next_song(10, "Test Song", "Test Artist", PLAY_TS + 100),
            next_song(20, "Test Song", "Test Artist", PLAY_TS + 60_000),
        ],
        &[
            song("S1", "Test Song", "A1", "Test Artist"),
            song("S1", "Test Song", "A1", "Test Artist"),
            song("S2", "B Side", "A1", "Test Artist"),
        ],
    )
    .await;

    assert_eq!(count_rows(&ctx.client, Table::Users).await.unwrap(), 2);
    assert_eq!(count_rows(&ctx.client, Table::Songs).await.unwrap(), 2);
    assert_eq!(count_rows(&ctx.client, Table::Artists).await.unwrap(), 1);
    // PLAY_TS and PLAY_TS + 100 fall in the same second
    assert_eq!(count_rows(&ctx.client, Table::Time).await.unwrap(), 2);
    // one songplay per play, however often the song was staged
    assert_eq!(count_rows(&ctx.client, Table::Songplays).await.unwrap(), 4);

    let users = users(&ctx.client).await.unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.user_id).collect();
    assert_eq!(ids, vec![10, 20]);
}
