//! Change feed schema names and queries.
//!
//! The DDL lives in the workspace `migrations/` directory.

use feedwatch_core::collection::Collection;

/// `LISTEN`/`NOTIFY` channel raised by the change trigger.
pub const CHANGE_CHANNEL: &str = "change_events";

/// Lowest resumable position and the newest settled position of the log.
///
/// A row is settled once its transaction is older than every running one;
/// no row can later appear at or below a settled position.
pub const SELECT_FEED_BOUNDS: &str = r"
SELECT h.min_tx_id AS horizon_tx_id, h.min_seq AS horizon_seq,
       head.tx_id AS head_tx_id, head.seq AS head_seq
FROM change_feed_horizon h
LEFT JOIN LATERAL (
    SELECT e.tx_id, e.seq
    FROM change_events e
    WHERE e.tx_id < pg_snapshot_xmin(pg_current_snapshot())::text::bigint
    ORDER BY e.tx_id DESC, e.seq DESC
    LIMIT 1
) head ON TRUE
WHERE h.id = 1
";

/// Builds the batched read for one collection.
///
/// Binds: `$1` collection table name, `$2`/`$3` exclusive cursor
/// `(tx_id, seq)`, `$4` limit. Only settled rows are read. The current
/// document is joined at read time, so for updates it may reflect later
/// writes than the event itself.
#[must_use]
pub fn select_changes(collection: Collection) -> String {
    format!(
        r"
SELECT e.tx_id, e.seq, e.operation, e.document_id, e.fields, e.removed_fields,
       d.document AS current_document
FROM change_events e
LEFT JOIN {table} d ON d.id = e.document_id
WHERE e.collection = $1
  AND (e.tx_id, e.seq) > ($2, $3)
  AND e.tx_id < pg_snapshot_xmin(pg_current_snapshot())::text::bigint
ORDER BY e.tx_id, e.seq
LIMIT $4
",
        table = collection.table_name()
    )
}

/// Loads a user document.
pub const SELECT_USER: &str = "SELECT document FROM users WHERE id = $1";

/// Sets the welcome marker only when it is absent or null.
pub const MARK_WELCOME_SENT: &str = r"
UPDATE users
SET document = jsonb_set(document, '{welcomeSmsSentAt}', to_jsonb($2::text), true)
WHERE id = $1
  AND ((document -> 'welcomeSmsSentAt') IS NULL
       OR (document -> 'welcomeSmsSentAt') = 'null'::jsonb)
";

/// Loads a tradeable instrument document.
pub const SELECT_TRADEABLE: &str = "SELECT document FROM tradeables WHERE id = $1";

/// Loads a stream checkpoint.
pub const SELECT_CHECKPOINT: &str = "SELECT token FROM stream_checkpoints WHERE stream_name = $1";

/// Inserts or replaces a stream checkpoint.
pub const UPSERT_CHECKPOINT: &str = r"
INSERT INTO stream_checkpoints (stream_name, token, updated_at)
VALUES ($1, $2, NOW())
ON CONFLICT (stream_name)
DO UPDATE SET token = EXCLUDED.token, updated_at = EXCLUDED.updated_at
";

/// Deletes a stream checkpoint.
pub const DELETE_CHECKPOINT: &str = "DELETE FROM stream_checkpoints WHERE stream_name = $1";

#[cfg(test)]
mod tests {
    use feedwatch_core::collection::Collection;

    use super::select_changes;

    #[test]
    fn test_select_changes_joins_the_collection_table() {
        let sql = select_changes(Collection::BalanceTransactions);
        assert!(sql.contains("LEFT JOIN balance_transactions d"));
        assert!(sql.contains("(e.tx_id, e.seq) > ($2, $3)"));
        assert!(sql.contains("pg_snapshot_xmin"));
    }
}
