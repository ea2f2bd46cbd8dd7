//! Integration tests for `PgChangeFeed`.

use std::time::Duration;

use feedwatch_core::collection::Collection;
use feedwatch_core::event::{ChangeEvent, OperationType, ResumeToken};
use feedwatch_core::feed::{ChangeFeed, ChangeStream, FeedError, ResumeFrom};
use feedwatch_store::pg_change_feed::{FeedSettings, PgChangeFeed};
use serde_json::{Value, json};
use sqlx::PgPool;

const LIMIT: Duration = Duration::from_secs(5);

fn feed(pool: PgPool) -> PgChangeFeed {
    PgChangeFeed::with_settings(
        pool,
        FeedSettings {
            batch_size: 2,
            poll_interval: Duration::from_millis(50),
        },
    )
}

async fn put(pool: &PgPool, table: &str, id: &str, document: Value) {
    sqlx::query(&format!(
        "INSERT INTO {table} (id, document) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document"
    ))
    .bind(id)
    .bind(document)
    .execute(pool)
    .await
    .unwrap();
}

async fn next(stream: &mut Box<dyn ChangeStream>) -> ChangeEvent {
    tokio::time::timeout(LIMIT, stream.next_event())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
}

// --- subscription from now ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_is_delivered_with_full_document(pool: PgPool) {
    // Arrange
    put(&pool, "balance_transactions", "old", json!({ "type": "deposit" })).await;
    let feed = feed(pool.clone());
    let mut stream = feed
        .subscribe(Collection::BalanceTransactions, ResumeFrom::Now)
        .await
        .unwrap();

    // Act
    put(
        &pool,
        "balance_transactions",
        "bt-1",
        json!({ "type": "deposit", "amount": 5000, "status": "pending" }),
    )
    .await;
    let event = next(&mut stream).await;

    // Assert
    assert_eq!(event.operation, OperationType::Insert);
    assert_eq!(event.document_id, "bt-1");
    assert_eq!(event.full_document.text("amount").as_deref(), Some("5000"));
    assert_eq!(event.full_document.id().as_deref(), Some("bt-1"));
    assert!(event.updated_fields.is_empty());
    assert!(!event.resume_token.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_reports_changed_and_removed_fields(pool: PgPool) {
    // Arrange
    put(
        &pool,
        "users",
        "u-1",
        json!({ "verificationCode": "1234", "isFirstLoginDone": false, "firstName": "Sara" }),
    )
    .await;
    let feed = feed(pool.clone());
    let mut stream = feed.subscribe(Collection::Users, ResumeFrom::Now).await.unwrap();

    // Act
    put(
        &pool,
        "users",
        "u-1",
        json!({ "isFirstLoginDone": true, "firstName": "Sara" }),
    )
    .await;
    let event = next(&mut stream).await;

    // Assert
    assert_eq!(event.operation, OperationType::Update);
    assert!(event.updated_fields.is_true("isFirstLoginDone"));
    assert!(!event.updated_fields.contains("firstName"));
    assert_eq!(event.removed_fields, vec!["verificationCode".to_owned()]);
    assert_eq!(event.full_document.text("firstName").as_deref(), Some("Sara"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_no_op_update_is_not_recorded(pool: PgPool) {
    put(&pool, "transactions", "t-1", json!({ "status": "pending" })).await;
    put(&pool, "transactions", "t-1", json!({ "status": "pending" })).await;

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM change_events WHERE collection = 'transactions'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_change_committed_late_is_not_skipped(pool: PgPool) {
    // Arrange
    let feed = feed(pool.clone());
    let mut stream = feed.subscribe(Collection::Users, ResumeFrom::Now).await.unwrap();
    let mut slow = pool.begin().await.unwrap();
    sqlx::query("INSERT INTO users (id, document) VALUES ($1, $2)")
        .bind("u-slow")
        .bind(json!({ "firstName": "Sara" }))
        .execute(&mut *slow)
        .await
        .unwrap();
    put(&pool, "users", "u-fast", json!({ "firstName": "Ali" })).await;

    // Act
    let while_open = tokio::time::timeout(Duration::from_millis(300), stream.next_event()).await;
    slow.commit().await.unwrap();
    let first = next(&mut stream).await;
    let second = next(&mut stream).await;

    // Assert
    assert!(while_open.is_err());
    assert_eq!(first.document_id, "u-slow");
    assert_eq!(second.document_id, "u-fast");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_change_committed_late_is_delivered_after_resume(pool: PgPool) {
    // Arrange
    let feed = feed(pool.clone());
    let mut stream = feed.subscribe(Collection::Users, ResumeFrom::Now).await.unwrap();
    put(&pool, "users", "u-0", json!({ "firstName": "Reza" })).await;
    let checkpoint = next(&mut stream).await.resume_token;
    drop(stream);

    let mut slow = pool.begin().await.unwrap();
    sqlx::query("INSERT INTO users (id, document) VALUES ($1, $2)")
        .bind("u-slow")
        .bind(json!({ "firstName": "Sara" }))
        .execute(&mut *slow)
        .await
        .unwrap();
    put(&pool, "users", "u-fast", json!({ "firstName": "Ali" })).await;

    // Act
    let mut resumed = feed
        .subscribe(Collection::Users, ResumeFrom::Token(checkpoint))
        .await
        .unwrap();
    slow.commit().await.unwrap();
    let ids = vec![next(&mut resumed).await.document_id, next(&mut resumed).await.document_id];

    // Assert
    assert_eq!(ids, vec!["u-slow".to_owned(), "u-fast".to_owned()]);
}

// --- resume ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_resume_continues_after_token_and_ignores_other_collections(pool: PgPool) {
    // Arrange
    let feed = feed(pool.clone());
    let mut first = feed
        .subscribe(Collection::Transactions, ResumeFrom::Now)
        .await
        .unwrap();
    put(&pool, "transactions", "t-1", json!({ "type": "buy" })).await;
    put(&pool, "users", "u-1", json!({ "firstName": "Ali" })).await;
    put(&pool, "transactions", "t-2", json!({ "type": "sell" })).await;
    put(&pool, "transactions", "t-3", json!({ "type": "buy" })).await;
    let checkpoint = next(&mut first).await.resume_token;
    drop(first);

    // Act
    let mut resumed = feed
        .subscribe(Collection::Transactions, ResumeFrom::Token(checkpoint))
        .await
        .unwrap();
    let second = next(&mut resumed).await;
    let third = next(&mut resumed).await;

    // Assert
    assert_eq!(second.document_id, "t-2");
    assert_eq!(third.document_id, "t-3");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_pruned_token_is_rejected_as_invalid_resume_point(pool: PgPool) {
    // Arrange
    let feed = feed(pool.clone());
    let mut stream = feed.subscribe(Collection::Users, ResumeFrom::Now).await.unwrap();
    put(&pool, "users", "u-1", json!({ "firstName": "Ali" })).await;
    put(&pool, "users", "u-2", json!({ "firstName": "Reza" })).await;
    let stale = next(&mut stream).await.resume_token;
    drop(stream);

    sqlx::query("SELECT prune_change_events(INTERVAL '-1 hour')")
        .execute(&pool)
        .await
        .unwrap();

    // Act
    let result = feed
        .subscribe(Collection::Users, ResumeFrom::Token(stale))
        .await;

    // Assert
    assert!(matches!(result, Err(FeedError::ResumePointInvalid(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_garbage_token_is_rejected_as_invalid_resume_point(pool: PgPool) {
    let feed = feed(pool);

    let result = feed
        .subscribe(
            Collection::BalanceTransactions,
            ResumeFrom::Token(ResumeToken::new("not-a-sequence")),
        )
        .await;

    assert!(matches!(result, Err(FeedError::ResumePointInvalid(_))));
}
