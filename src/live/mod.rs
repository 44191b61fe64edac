//! Live collection subscriptions.
//!
//! A `LiveQuery` is a locally cached, ordered view over a remote query,
//! kept current by push notifications. Every delivery is a full
//! replacement snapshot (never a delta); consumers replace their view
//! wholesale, trading bandwidth for correctness under concurrent writers.
//!
//! Each snapshot carries a monotonic sequence number assigned at receipt.
//! Anything derived from a snapshot (join hydration, view application) is
//! tagged with that sequence, and stale derivations are dropped by the
//! consumer: last-snapshot-wins is enforced by sequencing, not assumed
//! from delivery ordering.
//!
//! Releasing the subscription is a resource contract, not optional
//! cleanup: call `unsubscribe()` (or drop the query) when the consuming
//! view is torn down, otherwise a live listener keeps writing snapshots
//! for a view nobody renders.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{USERS, UserRecord};
use crate::store::{ChangeFeed, Document, DocumentStore, Predicate};
use crate::Result;

/// One full-replacement delivery from a subscription.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Monotonic per-subscription sequence, starting at 0 for the initial
    /// snapshot
    pub seq: u64,
    /// All matching documents, in insertion order
    pub documents: Vec<Document>,
}

impl Snapshot {
    /// Decode every document into a typed model.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.documents.iter().map(Document::decode).collect()
    }
}

/// A live, push-updated query over one collection.
pub struct LiveQuery {
    collection: String,
    feed: Option<ChangeFeed>,
    next_seq: u64,
}

impl LiveQuery {
    /// Subscribe to `collection` filtered by `predicate`.
    ///
    /// The first `next_snapshot()` resolves immediately with the initial
    /// snapshot; later calls resolve once a matching document changes.
    pub async fn subscribe<S: DocumentStore>(
        store: &S,
        collection: &str,
        predicate: Predicate,
    ) -> Result<Self> {
        let feed = store.subscribe(collection, predicate).await?;
        debug!(collection, "live query subscribed");
        Ok(Self {
            collection: collection.to_string(),
            feed: Some(feed),
            next_seq: 0,
        })
    }

    /// The subscribed collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next full snapshot.
    ///
    /// Returns `None` after `unsubscribe()` or once the store side shut
    /// down; an unsubscribed query can never deliver again.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        let feed = self.feed.as_mut()?;
        let documents = feed.recv().await?;
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(Snapshot { seq, documents })
    }

    /// Wait for a snapshot, then drain any further deliveries already
    /// queued and return only the most recent one. Coalescing this way
    /// keeps a slow consumer from rendering superseded state.
    pub async fn latest_snapshot(&mut self) -> Option<Snapshot> {
        let mut snapshot = self.next_snapshot().await?;
        while let Some(feed) = self.feed.as_mut() {
            match feed.try_recv() {
                Some(documents) => {
                    let seq = self.next_seq;
                    self.next_seq += 1;
                    snapshot = Snapshot { seq, documents };
                }
                None => break,
            }
        }
        Some(snapshot)
    }

    /// Release the listener. Idempotent; after this no snapshot is ever
    /// delivered to this query again.
    pub fn unsubscribe(&mut self) {
        if self.feed.take().is_some() {
            debug!(collection = %self.collection, "live query unsubscribed");
        }
    }

    /// Whether the listener is still held.
    pub fn is_subscribed(&self) -> bool {
        self.feed.is_some()
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Resolve usernames for a set of user ids with one batched read.
///
/// Ids are deduplicated and fetched via `get_many`, a single store call
/// per snapshot regardless of fan-out. Ids with no user record are simply
/// absent from the map; views substitute their placeholder.
pub async fn hydrate_usernames<S, I>(store: &S, ids: I) -> Result<HashMap<String, String>>
where
    S: DocumentStore,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut unique: Vec<String> = Vec::new();
    for id in ids {
        let id = id.as_ref();
        if !unique.iter().any(|u| u == id) {
            unique.push(id.to_string());
        }
    }
    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    let documents = store.get_many(USERS, &unique).await?;
    let mut names = HashMap::with_capacity(documents.len());
    for doc in documents {
        let record: UserRecord = doc.decode()?;
        names.insert(record.id, record.username);
    }
    Ok(names)
}
