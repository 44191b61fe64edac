//! Document store boundary.
//!
//! The remote store is an external collaborator; this module specifies the
//! contract the rest of the crate programs against:
//! - point and batched reads (`get`, `get_many`)
//! - one-shot queries and push subscriptions over a predicate
//! - create/update/delete plus an array-append primitive
//!
//! `sqlite::LocalStore` is the shipped implementation. It keeps documents
//! in SQLite and pushes full snapshots over tokio channels, which is the
//! same contract a networked backend would honor.

pub mod sqlite;

pub use sqlite::LocalStore;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::Result;

/// A document as stored: an id plus a JSON body.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Document id, unique within its collection
    pub id: String,
    /// JSON body (the id is not duplicated inside)
    pub data: Value,
}

impl Document {
    /// Decode the body into a typed model, injecting the id field.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let mut body = self.data.clone();
        if let Value::Object(map) = &mut body {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        Ok(serde_json::from_value(body)?)
    }
}

/// Serialize a model into a document body, stripping the redundant `id`
/// field (the id is the row key, not part of the body).
pub fn doc_body<T: Serialize>(value: &T) -> Result<Value> {
    let mut body = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    Ok(body)
}

/// Query predicate over a collection.
///
/// Deliberately minimal: the views in this system only ever filter on a
/// single field equality (`assignedTo == me`, `role == "teammate"`).
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Match every document in the collection.
    All,
    /// Match documents whose top-level `field` equals `value`.
    FieldEquals {
        field: String,
        value: Value,
    },
}

impl Predicate {
    /// Predicate matching documents where `field == value`.
    pub fn field_equals(field: &str, value: impl Into<Value>) -> Self {
        Self::FieldEquals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Whether a document body satisfies this predicate.
    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Predicate::All => true,
            Predicate::FieldEquals { field, value } => data.get(field) == Some(value),
        }
    }
}

/// Push feed of full snapshots for one subscription.
///
/// The first item is the initial snapshot; every subsequent item is a full
/// replacement set delivered after a matching document changed. Dropping
/// the feed releases the listener: the store stops delivering and no
/// callback can ever reach a consumer that let go of its feed.
pub struct ChangeFeed {
    rx: mpsc::Receiver<Vec<Document>>,
}

impl ChangeFeed {
    /// Wrap a receiver produced by a store implementation.
    pub fn new(rx: mpsc::Receiver<Vec<Document>>) -> Self {
        Self { rx }
    }

    /// Wait for the next full snapshot. Returns `None` once the store side
    /// has shut down.
    pub async fn recv(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }

    /// Non-blocking poll for an already-delivered snapshot.
    pub fn try_recv(&mut self) -> Option<Vec<Document>> {
        self.rx.try_recv().ok()
    }
}

/// Contract for the document store the client runs against.
///
/// Implementations must deliver subscription snapshots as full replacement
/// sets (never deltas) and stop delivering as soon as the returned
/// `ChangeFeed` is dropped.
pub trait DocumentStore: Send + Sync + 'static {
    /// Point read of a single document.
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>>> + Send;

    /// Batched multi-get. Missing ids are skipped, not errors; callers
    /// that need per-id presence compare against the input list.
    fn get_many(
        &self,
        collection: &str,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<Document>>> + Send;

    /// One-shot query in insertion order.
    fn query(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> impl Future<Output = Result<Vec<Document>>> + Send;

    /// Push subscription: initial snapshot, then one full snapshot per
    /// change to any matching document.
    fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
    ) -> impl Future<Output = Result<ChangeFeed>> + Send;

    /// Create a document with a fresh id; returns the id.
    fn create(
        &self,
        collection: &str,
        data: Value,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Create a document under a caller-chosen id (used for records keyed
    /// by an external identity, e.g. users keyed by principal id). Errors
    /// if the id already exists.
    fn put(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Partial update: top-level fields of `partial` overwrite the stored
    /// body; other fields are untouched. Errors with `NotFound` if absent.
    fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a document. Errors with `NotFound` if absent.
    fn delete(&self, collection: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Append a value to an array field, with set-union semantics (a value
    /// already present is not duplicated).
    fn append_to_array(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> impl Future<Output = Result<()>> + Send;
}
