//! Storage abstractions for service layer
//!
//! The resource store is a keyed document store: every record lives under a
//! [`Kind`] with a numeric id assigned on creation. Two backends implement
//! [`DocumentStore`]: an in-process map that can persist itself to a JSON
//! file, and PostgreSQL through SeaORM.

pub mod json_document_store;
pub mod seaorm;

use async_trait::async_trait;
use models::Kind;
use serde_json::Value;
use thiserror::Error;

use crate::pagination::Cursor;

pub use json_document_store::JsonDocumentStore;
pub use seaorm::SeaOrmDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} does not exist")]
    Missing { kind: Kind, id: i64 },
    #[error("invalid cursor")]
    InvalidCursor,
    #[error("backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Model(#[from] models::ModelError),
}

/// Equality match on a top-level string attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field: field.into(), value: value.into() }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        doc.get(&self.field).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Query {
    pub filter: Option<Filter>,
    pub limit: u64,
    pub cursor: Option<Cursor>,
}

/// A scan result in ascending id order.
#[derive(Clone, Debug)]
pub struct Page {
    pub records: Vec<(i64, Value)>,
    /// Where the next page starts; set whenever the page is non-empty.
    pub end_cursor: Option<Cursor>,
    pub more_results: bool,
}

impl Page {
    /// Build a page from up to `limit + 1` scanned records.
    pub(crate) fn from_scan(mut scanned: Vec<(i64, Value)>, limit: u64) -> Self {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let more_results = scanned.len() > limit;
        scanned.truncate(limit);
        let end_cursor = scanned.last().map(|(id, _)| Cursor::after(*id));
        Self { records: scanned, end_cursor, more_results }
    }

    /// Cursor for the next page, only when there is one.
    pub fn next_cursor(&self) -> Option<Cursor> {
        if self.more_results { self.end_cursor } else { None }
    }
}

/// One step of an atomic multi-record write.
#[derive(Clone, Debug)]
pub enum Write {
    Put { kind: Kind, id: i64, body: Value },
    Delete { kind: Kind, id: i64 },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, kind: Kind, body: Value) -> Result<i64, StoreError>;
    async fn get(&self, kind: Kind, id: i64) -> Result<Option<Value>, StoreError>;
    async fn query(&self, kind: Kind, query: &Query) -> Result<Page, StoreError>;
    async fn count(&self, kind: Kind, filter: Option<&Filter>) -> Result<u64, StoreError>;
    /// Overwrite an existing record; fails with [`StoreError::Missing`] if absent.
    async fn put(&self, kind: Kind, id: i64, body: Value) -> Result<(), StoreError>;
    /// Remove a record; returns whether it existed.
    async fn delete(&self, kind: Kind, id: i64) -> Result<bool, StoreError>;
    /// Apply all writes or none of them. Puts must target existing records.
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError>;
}
