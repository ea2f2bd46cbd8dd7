//! `PostgreSQL` implementation of the `ChangeFeed` trait.
//!
//! A subscription listens on [`CHANGE_CHANNEL`] and reads the collection's
//! rows of `change_events` past its cursor in batches. A notification wakes
//! the reader early; otherwise it polls every `poll_interval`, so a missed
//! notification only delays delivery.
//!
//! Positions are `(tx_id, seq)` pairs and only settled rows are read: rows
//! written by transactions older than every transaction still running.
//! Sequence numbers alone are not safe, since a change with a lower `seq`
//! can commit after one with a higher `seq` has been read.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use feedwatch_core::collection::Collection;
use feedwatch_core::document::Document;
use feedwatch_core::event::{ChangeEvent, ResumeToken};
use feedwatch_core::feed::{ChangeFeed, ChangeStream, FeedError, ResumeFrom};
use serde_json::Value;
use sqlx::postgres::{PgListener, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

use crate::schema::{CHANGE_CHANNEL, SELECT_FEED_BOUNDS, select_changes};
use crate::with_row_id;

/// Read tuning for [`PgChangeFeed`].
#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
    /// Maximum rows read per query.
    pub batch_size: u32,
    /// Longest wait between reads when no notification arrives.
    pub poll_interval: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Position of a change in the log, ordered by writing transaction first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeedPosition {
    /// Transaction that wrote the change.
    pub tx_id: i64,
    /// Log sequence number.
    pub seq: i64,
}

impl FeedPosition {
    /// Creates a position.
    #[must_use]
    pub fn new(tx_id: i64, seq: i64) -> Self {
        Self { tx_id, seq }
    }

    /// Encodes the position as a resume token.
    #[must_use]
    pub fn to_token(self) -> ResumeToken {
        ResumeToken::new(self.to_string())
    }
}

impl fmt::Display for FeedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.seq)
    }
}

/// PostgreSQL-backed change feed.
#[derive(Debug, Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
    settings: FeedSettings,
}

impl PgChangeFeed {
    /// Creates a feed with default settings.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_settings(pool, FeedSettings::default())
    }

    /// Creates a feed with explicit settings.
    #[must_use]
    pub fn with_settings(pool: PgPool, settings: FeedSettings) -> Self {
        Self { pool, settings }
    }

    /// Returns `(horizon, head)`: the lowest resumable position and the
    /// newest settled one.
    async fn bounds(&self) -> Result<(FeedPosition, FeedPosition), FeedError> {
        let row = sqlx::query(SELECT_FEED_BOUNDS)
            .fetch_one(&self.pool)
            .await
            .map_err(connection_error)?;
        let horizon = FeedPosition::new(
            row.try_get("horizon_tx_id").map_err(decode_error)?,
            row.try_get("horizon_seq").map_err(decode_error)?,
        );
        let head_tx_id: Option<i64> = row.try_get("head_tx_id").map_err(decode_error)?;
        let head_seq: Option<i64> = row.try_get("head_seq").map_err(decode_error)?;
        let head = match (head_tx_id, head_seq) {
            (Some(tx_id), Some(seq)) => FeedPosition::new(tx_id, seq).max(horizon),
            _ => horizon,
        };
        Ok((horizon, head))
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(
        &self,
        collection: Collection,
        from: ResumeFrom,
    ) -> Result<Box<dyn ChangeStream>, FeedError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(connection_error)?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(connection_error)?;

        let (horizon, head) = self.bounds().await?;
        let cursor = match from {
            ResumeFrom::Now => head,
            ResumeFrom::Token(token) => resume_position(&token, horizon, head)?,
        };
        debug!(
            stream = collection.stream_name(),
            %cursor, %horizon, %head, "change feed subscription opened"
        );

        Ok(Box::new(PgChangeStream {
            pool: self.pool.clone(),
            listener,
            collection,
            query: select_changes(collection),
            cursor,
            pending: VecDeque::new(),
            settings: self.settings,
        }))
    }
}

/// Validates a stored token against the retained part of the log.
///
/// # Errors
///
/// Returns `FeedError::ResumePointInvalid` if the token is not a
/// `tx_id:seq` position, precedes the pruning horizon or lies beyond the
/// newest settled position.
pub fn resume_position(
    token: &ResumeToken,
    horizon: FeedPosition,
    head: FeedPosition,
) -> Result<FeedPosition, FeedError> {
    let position = parse_position(token.as_str()).ok_or_else(|| {
        FeedError::ResumePointInvalid(format!("unrecognised resume token {token}"))
    })?;
    if position < horizon {
        return Err(FeedError::ResumePointInvalid(format!(
            "token {position} precedes retained history (horizon {horizon})"
        )));
    }
    if position > head {
        return Err(FeedError::ResumePointInvalid(format!(
            "token {position} is ahead of the feed head {head}"
        )));
    }
    Ok(position)
}

fn parse_position(raw: &str) -> Option<FeedPosition> {
    let (tx_id, seq) = raw.trim().split_once(':')?;
    Some(FeedPosition::new(tx_id.parse().ok()?, seq.parse().ok()?))
}

struct PgChangeStream {
    pool: PgPool,
    listener: PgListener,
    collection: Collection,
    query: String,
    cursor: FeedPosition,
    pending: VecDeque<ChangeEvent>,
    settings: FeedSettings,
}

impl PgChangeStream {
    async fn fetch_batch(&mut self) -> Result<(), FeedError> {
        let rows = sqlx::query(&self.query)
            .bind(self.collection.table_name())
            .bind(self.cursor.tx_id)
            .bind(self.cursor.seq)
            .bind(i64::from(self.settings.batch_size))
            .fetch_all(&self.pool)
            .await
            .map_err(connection_error)?;

        for row in &rows {
            let position = FeedPosition::new(
                row.try_get("tx_id").map_err(decode_error)?,
                row.try_get("seq").map_err(decode_error)?,
            );
            if let Some(event) = decode_event(row, position)? {
                self.pending.push_back(event);
            }
            self.cursor = position;
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeStream for PgChangeStream {
    async fn next_event(&mut self) -> Result<Option<ChangeEvent>, FeedError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            self.fetch_batch().await?;
            if !self.pending.is_empty() {
                continue;
            }

            match tokio::time::timeout(self.settings.poll_interval, self.listener.recv()).await {
                Ok(Ok(_)) | Err(_) => {}
                Ok(Err(e)) => return Err(connection_error(e)),
            }
        }
    }
}

fn decode_event(row: &PgRow, position: FeedPosition) -> Result<Option<ChangeEvent>, FeedError> {
    let operation: String = row.try_get("operation").map_err(decode_error)?;
    let document_id: String = row.try_get("document_id").map_err(decode_error)?;
    let fields: Value = row.try_get("fields").map_err(decode_error)?;
    let removed_fields: Vec<String> = row.try_get("removed_fields").map_err(decode_error)?;
    let current: Option<Value> = row.try_get("current_document").map_err(decode_error)?;
    let token = position.to_token();

    let event = match operation.as_str() {
        "insert" => {
            let document = with_row_id(Document::from_value(fields), &document_id);
            ChangeEvent::insert(document_id, document, token)
        }
        "update" => {
            let document = with_row_id(
                current.map(Document::from_value).unwrap_or_default(),
                &document_id,
            );
            ChangeEvent::update(
                document_id,
                document,
                Document::from_value(fields),
                removed_fields,
                token,
            )
        }
        other => {
            warn!(%position, operation = other, "skipping unsupported change operation");
            return Ok(None);
        }
    };
    Ok(Some(event))
}

#[allow(clippy::needless_pass_by_value)]
fn connection_error(e: sqlx::Error) -> FeedError {
    FeedError::Connection(e.to_string())
}

#[allow(clippy::needless_pass_by_value)]
fn decode_error(e: sqlx::Error) -> FeedError {
    FeedError::Decode(e.to_string())
}

#[cfg(test)]
mod tests {
    use feedwatch_core::event::ResumeToken;
    use feedwatch_core::feed::FeedError;

    use super::{FeedPosition, resume_position};

    const HORIZON: FeedPosition = FeedPosition { tx_id: 700, seq: 10 };
    const HEAD: FeedPosition = FeedPosition { tx_id: 740, seq: 50 };

    #[test]
    fn test_resume_position_accepts_tokens_within_retained_range() {
        for raw in ["720:42", "700:10", "740:50"] {
            let position = resume_position(&ResumeToken::new(raw), HORIZON, HEAD).unwrap();
            assert_eq!(position.to_string(), raw);
        }
    }

    #[test]
    fn test_positions_order_by_transaction_before_sequence() {
        // Arrange
        let committed_late = FeedPosition::new(740, 3);
        let committed_early = FeedPosition::new(720, 9);

        // Assert
        assert!(committed_early < committed_late);
        assert_eq!(committed_late.to_token().as_str(), "740:3");
    }

    #[test]
    fn test_resume_position_rejects_pruned_token() {
        let result = resume_position(&ResumeToken::new("700:9"), HORIZON, HEAD);
        assert!(matches!(result, Err(FeedError::ResumePointInvalid(_))));
    }

    #[test]
    fn test_resume_position_rejects_token_ahead_of_head() {
        let result = resume_position(&ResumeToken::new("741:1"), HORIZON, HEAD);
        assert!(matches!(result, Err(FeedError::ResumePointInvalid(_))));
    }

    #[test]
    fn test_resume_position_rejects_foreign_token_format() {
        for raw in [r#"{"_data":"8265F0"}"#, "42", "720:", "x:1"] {
            let result = resume_position(&ResumeToken::new(raw), FeedPosition::default(), HEAD);
            assert!(matches!(result, Err(FeedError::ResumePointInvalid(_))), "{raw}");
        }
    }
}
