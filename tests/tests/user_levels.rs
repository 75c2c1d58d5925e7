//! Users whose subscription level changes within the staged data.
//!
//! Requires Docker to be running for testcontainers.

use etl_core::{ExecutionMode, Phase, Table, UserLevelPolicy};
use integration_tests::fixtures::{next_song_at_level, song, PLAY_TS};
use integration_tests::setup::TestContext;
use warehouse::query::{count_rows, users};

fn upgrade_events() -> Vec<etl_core::StagingEvent> {
    vec![
        next_song_at_level(10, "Test Song", "Test Artist", PLAY_TS, "free"),
        next_song_at_level(10, "Test Song", "Test Artist", PLAY_TS + 60_000, "paid"),
    ]
}

/// The latest level wins.
#[tokio::test]
async fn test_latest_policy_keeps_most_recent_level() {
    let ctx = TestContext::new().await;
    ctx.create_tables().await;
    ctx.stage(&upgrade_events(), &[song("S1", "Test Song", "A1", "Test Artist")])
        .await;

    ctx.run(&Phase::ETL, UserLevelPolicy::Latest, ExecutionMode::Autocommit)
        .await
        .unwrap();

    let users = users(&ctx.client).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].level, "paid");

    // songplays keep the level of each play
    assert_eq!(count_rows(&ctx.client, Table::Songplays).await.unwrap(), 2);
}

/// An event without a timestamp never outranks a timed one.
#[tokio::test]
async fn test_latest_policy_ranks_untimed_events_last() {
    let ctx = TestContext::new().await;
    let mut untimed = next_song_at_level(10, "Test Song", "Test Artist", PLAY_TS, "paid");
    untimed.ts = None;
    untimed.page = Some("Home".to_string());

    ctx.create_tables().await;
    ctx.stage(
        &[
            untimed,
            next_song_at_level(10, "Test Song", "Test Artist", PLAY_TS + 60_000, "free"),
        ],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;

    ctx.run(&Phase::ETL, UserLevelPolicy::Latest, ExecutionMode::Autocommit)
        .await
        .unwrap();

    let users = users(&ctx.client).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].level, "free");
}

/// Events sharing the latest timestamp resolve to the same level on every run.
#[tokio::test]
async fn test_latest_policy_breaks_timestamp_ties_by_level() {
    let ctx = TestContext::new().await;
    ctx.create_tables().await;
    ctx.stage(
        &[
            next_song_at_level(10, "Test Song", "Test Artist", PLAY_TS, "free"),
            next_song_at_level(10, "Test Song", "Test Artist", PLAY_TS, "paid"),
            next_song_at_level(10, "Test Song", "Test Artist", PLAY_TS, "free"),
        ],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;

    ctx.run(&Phase::ETL, UserLevelPolicy::Latest, ExecutionMode::Autocommit)
        .await
        .unwrap();

    let users = users(&ctx.client).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].level, "paid");
}

/// Plain DISTINCT yields one row per level and trips the users key.
#[tokio::test]
async fn test_distinct_policy_violates_users_key() {
    let ctx = TestContext::new().await;
    ctx.create_tables().await;
    ctx.stage(&upgrade_events(), &[song("S1", "Test Song", "A1", "Test Artist")])
        .await;

    let err = ctx
        .run(&Phase::ETL, UserLevelPolicy::Distinct, ExecutionMode::Autocommit)
        .await
        .unwrap_err();

    match err {
        etl_core::Error::Statement { phase, label, message, .. } => {
            assert_eq!(phase, Phase::Insert);
            assert_eq!(label, "insert users");
            assert!(message.contains("23505"), "unexpected message: {}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // the run halted at the first insert
    assert_eq!(count_rows(&ctx.client, Table::Artists).await.unwrap(), 0);
}

/// In transaction mode a failed run leaves no partial load behind.
#[tokio::test]
async fn test_transaction_mode_rolls_back_partial_load() {
    let ctx = TestContext::new().await;
    ctx.create_tables().await;
    ctx.stage(&upgrade_events(), &[song("S1", "Test Song", "A1", "Test Artist")])
        .await;

    // occupy the play's second so the time insert fails after users, artists and songs
    ctx.client
        .execute(
            "INSERT INTO time(start_time, hour, day, week, month, year, weekday) \
             VALUES ('2018-11-02 01:25:34', 1, 2, 44, 11, 2018, 5)",
        )
        .await
        .unwrap();

    let err = ctx
        .run(&Phase::ETL, UserLevelPolicy::Latest, ExecutionMode::Transaction)
        .await
        .unwrap_err();
    match &err {
        etl_core::Error::Statement { label, .. } => assert_eq!(label, "insert time"),
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(count_rows(&ctx.client, Table::Users).await.unwrap(), 0);
    assert_eq!(count_rows(&ctx.client, Table::Songs).await.unwrap(), 0);
    assert_eq!(count_rows(&ctx.client, Table::Artists).await.unwrap(), 0);
    assert_eq!(count_rows(&ctx.client, Table::Time).await.unwrap(), 1);
}

/// The same failure in autocommit mode keeps what was already inserted.
#[tokio::test]
async fn test_autocommit_mode_keeps_partial_load() {
    let ctx = TestContext::new().await;
    ctx.create_tables().await;
    ctx.stage(&upgrade_events(), &[song("S1", "Test Song", "A1", "Test Artist")])
        .await;
    ctx.client
        .execute(
            "INSERT INTO time(start_time, hour, day, week, month, year, weekday) \
             VALUES ('2018-11-02 01:25:34', 1, 2, 44, 11, 2018, 5)",
        )
        .await
        .unwrap();

    ctx.run(&Phase::ETL, UserLevelPolicy::Latest, ExecutionMode::Autocommit)
        .await
        .unwrap_err();

    assert_eq!(count_rows(&ctx.client, Table::Users).await.unwrap(), 1);
    assert_eq!(count_rows(&ctx.client, Table::Songs).await.unwrap(), 1);
    assert_eq!(count_rows(&ctx.client, Table::Songplays).await.unwrap(), 0);
}
