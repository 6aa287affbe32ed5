use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::BackendError;

/// Field map of a stored document.
pub type Record = Map<String, Value>;

/// A stored document with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Record,
}

impl Document {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when the record holds exactly `value` under `field`.
    pub fn matches(&self, record: &Record) -> bool {
        record.get(&self.field) == Some(&self.value)
    }
}

/// Remote document database reached through a generic query/mutate surface.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching every filter, in insertion order.
    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, BackendError>;

    /// Store a new document and return its assigned id.
    async fn insert(&self, collection: &str, record: Record) -> Result<String, BackendError>;

    /// Merge `partial` into an existing document. `null` values overwrite.
    async fn update(&self, collection: &str, id: &str, partial: Record) -> Result<(), BackendError>;

    /// Remove a document. Deleting a missing id is acknowledged.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError>;
}
