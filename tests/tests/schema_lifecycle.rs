//! Drop/create lifecycle of the warehouse tables.
//!
//! Requires Docker to be running for testcontainers.

use etl_core::{ExecutionMode, Phase, Table, UserLevelPolicy};
use integration_tests::fixtures::{next_song, song, PLAY_TS};
use integration_tests::setup::TestContext;
use warehouse::query::{count_rows, row_counts};
use warehouse::check_connection;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await;
    assert!(check_connection(&ctx.client).await);
}

/// Running create-tables twice succeeds and leaves seven empty tables.
#[tokio::test]
async fn test_create_tables_is_idempotent() {
    let ctx = TestContext::new().await;

    ctx.create_tables().await;
    let report = ctx
        .run(&Phase::CREATE_TABLES, UserLevelPolicy::Latest, ExecutionMode::Autocommit)
        .await
        .expect("Second create-tables run failed");
    assert_eq!(report.statements(), 14);

    let counts = row_counts(&ctx.client).await.unwrap();
    assert_eq!(counts.len(), 7);
    assert!(counts.iter().all(|c| c.rows == 0));
}

/// Create-tables on a populated schema drops the data.
#[tokio::test]
async fn test_create_tables_resets_loaded_data() {
    let ctx = TestContext::new().await;
    ctx.load(
        &[next_song(10, "Test Song", "Test Artist", PLAY_TS)],
        &[song("S1", "Test Song", "A1", "Test Artist")],
    )
    .await;
    assert_eq!(count_rows(&ctx.client, Table::Songplays).await.unwrap(), 1);

    ctx.create_tables().await;

    for table in Table::CREATE_ORDER {
        assert_eq!(count_rows(&ctx.client, table).await.unwrap(), 0, "{} not empty", table);
    }
}

/// Without staged data the ETL phases succeed and load nothing.
#[tokio::test]
async fn test_etl_on_empty_staging() {
    let ctx = TestContext::new().await;
    ctx.create_tables().await;

    let report = ctx
        .run(&Phase::ETL, UserLevelPolicy::Latest, ExecutionMode::Autocommit)
        .await
        .unwrap();

    // copy phase is empty under the Postgres dialect
    assert_eq!(report.phases[0].statements, 0);
    assert_eq!(report.phases[1].statements, 5);
    assert_eq!(report.phases[1].rows_affected, 0);
}

/// Inserting before the tables exist fails on the first statement.
#[tokio::test]
async fn test_missing_tables_fail_with_statement_error() {
    let ctx = TestContext::new().await;

    let err = ctx
        .run(&[Phase::Insert], UserLevelPolicy::Latest, ExecutionMode::Autocommit)
        .await
        .unwrap_err();

    match err {
        etl_core::Error::Statement { label, sql, message, .. } => {
            assert_eq!(label, "insert users");
            assert!(sql.starts_with("INSERT INTO users("));
            assert!(message.contains("42P01"), "unexpected message: {}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
