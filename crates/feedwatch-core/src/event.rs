//! Change events observed on a watched collection.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Kind of mutation reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A record was created.
    Insert,
    /// An existing record was modified.
    Update,
}

/// Opaque cursor supplied by the feed, used to resume after an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(String);

impl ResumeToken {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token carries no usable value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An insert or update observed on a watched collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Kind of mutation.
    pub operation: OperationType,
    /// Identifier of the affected record.
    pub document_id: String,
    /// Record state after the change. Best-effort: may already reflect later
    /// writes.
    pub full_document: Document,
    /// Fields set by an update, with their new values. Empty for inserts.
    pub updated_fields: Document,
    /// Fields removed by an update. Empty for inserts.
    pub removed_fields: Vec<String>,
    /// Cursor positioned just after this event.
    pub resume_token: ResumeToken,
}

impl ChangeEvent {
    /// Builds an insert event.
    #[must_use]
    pub fn insert(
        document_id: impl Into<String>,
        full_document: Document,
        resume_token: ResumeToken,
    ) -> Self {
        Self {
            operation: OperationType::Insert,
            document_id: document_id.into(),
            full_document,
            updated_fields: Document::new(),
            removed_fields: Vec::new(),
            resume_token,
        }
    }

    /// Builds an update event.
    #[must_use]
    pub fn update(
        document_id: impl Into<String>,
        full_document: Document,
        updated_fields: Document,
        removed_fields: Vec<String>,
        resume_token: ResumeToken,
    ) -> Self {
        Self {
            operation: OperationType::Update,
            document_id: document_id.into(),
            full_document,
            updated_fields,
            removed_fields,
            resume_token,
        }
    }

    /// Returns `true` for insert events.
    #[must_use]
    pub fn is_insert(&self) -> bool {
        self.operation == OperationType::Insert
    }

    /// Names of every field the update set or removed.
    #[must_use]
    pub fn updated_field_names(&self) -> BTreeSet<&str> {
        self.updated_fields
            .keys()
            .chain(self.removed_fields.iter().map(String::as_str))
            .collect()
    }

    /// Returns `true` if the update set or removed `field`.
    #[must_use]
    pub fn touched(&self, field: &str) -> bool {
        self.updated_fields.contains(field) || self.removed_fields.iter().any(|f| f == field)
    }
}
