//! Feedwatch Store — `PostgreSQL` and file-system adapters.
//!
//! The watched collections live in `PostgreSQL` as one JSONB document per
//! row. Row triggers append every insert and update to `change_events`,
//! which [`pg_change_feed::PgChangeFeed`] tails. Checkpoints can live in the
//! same database or in JSON files.

pub mod file_checkpoint_store;
pub mod pg_account_repository;
pub mod pg_change_feed;
pub mod pg_checkpoint_store;
pub mod pg_instrument_repository;
pub mod schema;

use feedwatch_core::document::Document;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies any pending schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the database has applied
/// migrations unknown to this build.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Row ids are the primary key; documents are not required to repeat them.
pub(crate) fn with_row_id(mut document: Document, id: &str) -> Document {
    if document.id().is_none() {
        document.insert("_id", id);
    }
    document
}
