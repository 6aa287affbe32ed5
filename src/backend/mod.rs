//! Collaborator interfaces the core consumes, plus local adapters.
//!
//! Every backend operation is async and reports failures through
//! [`BackendError`]. Failures are never retried here; they surface to the
//! caller, which reverts to its pre-operation state.

pub mod blob;
pub mod identity;
pub mod notify;
pub mod records;
pub mod store;

pub use blob::{BlobStore, FsBlobStore};
pub use identity::{IdentityProvider, SessionIdentity};
pub use notify::{NotificationSink, TracingNotifier};
pub use store::{Document, DocumentStore, Filter, Record};

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Malformed document {collection}/{id}: {reason}")]
    Malformed {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DatabaseError> for BackendError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => BackendError::NotFound {
                collection: entity_type,
                id,
            },
            DatabaseError::Json(e) => BackendError::Serialization(e),
            other => BackendError::Storage(other.to_string()),
        }
    }
}
