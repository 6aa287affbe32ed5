//! SQLite-backed `DocumentStore` for on-device use and tests.
//!
//! Documents live as JSON text in the `documents` table keyed by
//! (collection, id). Equality filters are evaluated on the decoded JSON so
//! typed values (strings vs booleans) never match loosely.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{open_database, open_memory_database, DatabaseError};
use crate::backend::{BackendError, Document, DocumentStore, Filter, Record};

pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

fn parse_body(body: &str) -> Result<Record, DatabaseError> {
    Ok(serde_json::from_str(body)?)
}

fn query_documents(
    conn: &Connection,
    collection: &str,
    filters: &[Filter],
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![collection], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, body) = row?;
        let fields = parse_body(&body)?;
        if filters.iter().all(|f| f.matches(&fields)) {
            documents.push(Document { id, fields });
        }
    }
    Ok(documents)
}

fn insert_document(conn: &Connection, collection: &str, record: &Record) -> Result<String, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
        params![collection, id, serde_json::to_string(record)?],
    )?;
    Ok(id)
}

fn merge_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    partial: Record,
) -> Result<(), DatabaseError> {
    let body: Option<String> = match conn.query_row(
        "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
        |row| row.get(0),
    ) {
        Ok(body) => Some(body),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(e.into()),
    };
    let Some(body) = body else {
        return Err(DatabaseError::NotFound {
            entity_type: collection.into(),
            id: id.into(),
        });
    };

    let mut fields = parse_body(&body)?;
    fields.extend(partial);
    conn.execute(
        "UPDATE documents SET body = ?1, updated_at = datetime('now')
         WHERE collection = ?2 AND id = ?3",
        params![serde_json::to_string(&fields)?, collection, id],
    )?;
    Ok(())
}

fn delete_document(conn: &Connection, collection: &str, id: &str) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )?)
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, BackendError> {
        let conn = self.lock()?;
        let documents = query_documents(&conn, collection, filters)?;
        tracing::debug!(collection, matched = documents.len(), "Document query");
        Ok(documents)
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<String, BackendError> {
        let conn = self.lock()?;
        let id = insert_document(&conn, collection, &record)?;
        tracing::debug!(collection, id = %id, "Document inserted");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, partial: Record) -> Result<(), BackendError> {
        let conn = self.lock()?;
        merge_document(&conn, collection, id, partial)?;
        tracing::debug!(collection, id, "Document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        let conn = self.lock()?;
        let removed = delete_document(&conn, collection, id)?;
        if removed == 0 {
            tracing::debug!(collection, id, "Delete of missing document acknowledged");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// In-memory store whose reads start failing once any write has landed.
    /// Writes keep succeeding.
    pub struct ReadsFailAfterWrite {
        inner: SqliteDocumentStore,
        written: AtomicBool,
    }

    impl ReadsFailAfterWrite {
        pub fn new() -> Self {
            Self {
                inner: SqliteDocumentStore::in_memory().expect("in-memory store"),
                written: AtomicBool::new(false),
            }
        }

        /// Documents as stored, bypassing the read failure.
        pub async fn stored(&self, collection: &str) -> Vec<Document> {
            self.inner.query(collection, &[]).await.expect("inner query")
        }

        /// Let reads succeed again until the next write.
        pub fn heal(&self) {
            self.written.store(false, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DocumentStore for ReadsFailAfterWrite {
        async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, BackendError> {
            if self.written.load(Ordering::SeqCst) {
                return Err(BackendError::Transport("offline".into()));
            }
            self.inner.query(collection, filters).await
        }

        async fn insert(&self, collection: &str, record: Record) -> Result<String, BackendError> {
            let id = self.inner.insert(collection, record).await?;
            self.written.store(true, Ordering::SeqCst);
            Ok(id)
        }

        async fn update(&self, collection: &str, id: &str, partial: Record) -> Result<(), BackendError> {
            self.inner.update(collection, id, partial).await?;
            self.written.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
            self.inner.delete(collection, id).await?;
            self.written.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}
