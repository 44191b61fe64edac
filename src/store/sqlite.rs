//! SQLite-backed document store with push notifications.
//!
//! Documents live in a single `documents` table keyed by (collection, id)
//! with JSON bodies; rowid preserves insertion order, which is the ordering
//! policy subscriptions deliver. Every committed write broadcasts the name
//! of the touched collection; each subscription task re-runs its query and
//! pushes a full replacement snapshot to its feed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, warn};

use super::{ChangeFeed, Document, DocumentStore, Predicate};
use crate::models::new_doc_id;
use crate::{Error, Result};

/// Capacity of the per-store change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 100;

/// Capacity of each subscription's snapshot feed.
const FEED_CAPACITY: usize = 32;

/// Local document store for a single data directory.
pub struct LocalStore {
    /// Root directory for this store's data
    pub root: PathBuf,
    /// SQLite connection guarded for use from async tasks
    conn: Arc<Mutex<Connection>>,
    /// Change notifications, carrying the touched collection name
    changes: broadcast::Sender<String>,
}

impl LocalStore {
    /// Open or create the store under the given data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("store.db");
        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            root: data_dir.to_path_buf(),
            conn: Arc::new(Mutex::new(conn)),
            changes,
        })
    }

    /// Initialize the SQLite schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection);
            "#,
        )?;
        Ok(())
    }

    /// Announce a committed write. Send errors mean no live subscriber,
    /// which is fine.
    fn notify(&self, collection: &str) {
        let _ = self.changes.send(collection.to_string());
    }

    fn get_sync(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(Some(Document {
                id: id.to_string(),
                data: serde_json::from_str(&body)?,
            })),
            None => Ok(None),
        }
    }

    /// Load a full collection in insertion order, filtered by predicate.
    fn query_sync(
        conn: &Connection,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Vec<Document>> {
        let mut stmt = conn.prepare(
            "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let data: Value = serde_json::from_str(&body)?;
            if predicate.matches(&data) {
                documents.push(Document { id, data });
            }
        }
        Ok(documents)
    }

    fn write_body(conn: &Connection, collection: &str, id: &str, data: &Value) -> Result<()> {
        conn.execute(
            "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
            params![collection, id, serde_json::to_string(data)?],
        )?;
        Ok(())
    }
}

impl DocumentStore for LocalStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock().await;
        Self::get_sync(&conn, collection, id)
    }

    async fn get_many(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        let conn = self.conn.lock().await;
        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = Self::get_sync(&conn, collection, id)? {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>> {
        let conn = self.conn.lock().await;
        Self::query_sync(&conn, collection, predicate)
    }

    async fn subscribe(&self, collection: &str, predicate: Predicate) -> Result<ChangeFeed> {
        // Register for changes before taking the initial snapshot so a
        // write landing in between still produces a delivery.
        let mut changes = self.changes.subscribe();

        let initial = {
            let conn = self.conn.lock().await;
            Self::query_sync(&conn, collection, &predicate)?
        };

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        // Cannot fail: the channel is empty and we still hold the receiver.
        let _ = tx.send(initial).await;

        let conn = Arc::clone(&self.conn);
        let collection = collection.to_string();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(changed) if changed == collection => {}
                    Ok(_) => continue,
                    // Lagged means notifications were dropped; the next
                    // re-query still yields a correct full snapshot.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(collection = %collection, skipped, "change feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                let snapshot = {
                    let conn = conn.lock().await;
                    Self::query_sync(&conn, &collection, &predicate)
                };
                match snapshot {
                    Ok(snapshot) => {
                        // Receiver dropped: the consumer unsubscribed.
                        if tx.send(snapshot).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(collection = %collection, error = %e, "snapshot query failed");
                        break;
                    }
                }
            }
            debug!(collection = %collection, "subscription task stopped");
        });

        Ok(ChangeFeed::new(rx))
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        let id = new_doc_id();
        {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection, id, serde_json::to_string(&data)?],
            )?;
        }
        debug!(collection, id = %id, "document created");
        self.notify(collection);
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection, id, serde_json::to_string(&data)?],
            )?;
        }
        debug!(collection, id, "document created (keyed)");
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, partial: Value) -> Result<()> {
        let Value::Object(partial) = partial else {
            return Err(Error::Validation(
                "partial update must be a JSON object".to_string(),
            ));
        };

        {
            let conn = self.conn.lock().await;
            let doc = Self::get_sync(&conn, collection, id)?
                .ok_or_else(|| Error::not_found(collection, id))?;

            let mut data = doc.data;
            let Value::Object(map) = &mut data else {
                return Err(Error::Validation(format!(
                    "document {collection}/{id} has a non-object body"
                )));
            };
            for (field, value) in partial {
                map.insert(field, value);
            }
            Self::write_body(&conn, collection, id, &data)?;
        }
        debug!(collection, id, "document updated");
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let deleted = {
            let conn = self.conn.lock().await;
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )?
        };
        if deleted == 0 {
            return Err(Error::not_found(collection, id));
        }
        debug!(collection, id, "document deleted");
        self.notify(collection);
        Ok(())
    }

    async fn append_to_array(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<()> {
        {
            let conn = self.conn.lock().await;
            let doc = Self::get_sync(&conn, collection, id)?
                .ok_or_else(|| Error::not_found(collection, id))?;

            let mut data = doc.data;
            let entries = data
                .as_object_mut()
                .ok_or_else(|| {
                    Error::Validation(format!("document {collection}/{id} has a non-object body"))
                })?
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            let Value::Array(entries) = entries else {
                return Err(Error::Validation(format!(
                    "field {field} on {collection}/{id} is not an array"
                )));
            };

            // Set-union semantics: appending an existing value is a no-op.
            if !entries.contains(&value) {
                entries.push(value);
                Self::write_body(&conn, collection, id, &data)?;
            } else {
                return Ok(());
            }
        }
        debug!(collection, id, field, "array field appended");
        self.notify(collection);
        Ok(())
    }
}
