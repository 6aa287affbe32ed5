//! Shared application state: the injected backend collaborators.
//!
//! `CoreState` is built once at startup (from real SDK adapters or the
//! local ones) and handed to the command layer. Every query and write is
//! scoped to the identity provider's current user.

use std::sync::Arc;

use thiserror::Error;

use crate::appointment::ValidationError;
use crate::backend::{
    BackendError, BlobStore, DocumentStore, FsBlobStore, IdentityProvider, NotificationSink,
    TracingNotifier,
};
use crate::config::LocalBackendConfig;
use crate::db::{DatabaseError, SqliteDocumentStore};
use crate::pet_details::AppointmentBook;
use crate::pets::{PetRoster, PetValidationError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Please sign in first.")]
    NotSignedIn,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    PetValidation(#[from] PetValidationError),

    #[error("A save is already in progress.")]
    CommitInFlight,

    #[error("The dialog is not open.")]
    DialogClosed,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Local database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True for errors the user fixes in the form rather than by retrying.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::PetValidation(_))
    }
}

/// The four collaborators every flow needs.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn NotificationSink>,
    pub identity: Arc<dyn IdentityProvider>,
}

pub struct CoreState {
    backend: Backend,
}

impl CoreState {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Wire the on-device adapters: SQLite documents, file blobs, log notifications.
    pub fn local(
        config: &LocalBackendConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = SqliteDocumentStore::open(&config.database_path())?;
        tracing::info!(
            data_dir = %config.data_dir.display(),
            "Local backend ready"
        );
        Ok(Self::new(Backend {
            store: Arc::new(store),
            blobs: Arc::new(FsBlobStore::new(config.blob_root())),
            notifier: Arc::new(TracingNotifier),
            identity,
        }))
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// The signed-in user's id.
    pub fn owner_id(&self) -> Result<String, CoreError> {
        self.backend
            .identity
            .current_user_id()
            .filter(|id| !id.is_empty())
            .ok_or(CoreError::NotSignedIn)
    }

    /// Pet list scoped to the signed-in user (not yet loaded).
    pub fn roster(&self) -> Result<PetRoster, CoreError> {
        Ok(PetRoster::new(self.backend.clone(), self.owner_id()?))
    }

    /// Appointment list of one pet, scoped to the signed-in user (not yet loaded).
    pub fn appointment_book(&self, pet_id: &str) -> Result<AppointmentBook, CoreError> {
        Ok(AppointmentBook::new(
            Arc::clone(&self.backend.store),
            pet_id,
            self.owner_id()?,
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::test_backend;
    use super::*;
    use crate::appointment::DateField;

    #[test]
    fn owner_id_requires_sign_in() {
        let t = test_backend();
        let state = CoreState::new(t.backend.clone());
        assert_eq!(state.owner_id().unwrap(), "user-1");

        t.identity.sign_out();
        assert!(matches!(state.owner_id(), Err(CoreError::NotSignedIn)));
        assert!(matches!(state.roster(), Err(CoreError::NotSignedIn)));
        assert!(matches!(state.appointment_book("p1"), Err(CoreError::NotSignedIn)));
    }

    #[test]
    fn empty_user_id_counts_as_signed_out() {
        let t = test_backend();
        t.identity.sign_in("");
        let state = CoreState::new(t.backend.clone());
        assert!(matches!(state.owner_id(), Err(CoreError::NotSignedIn)));
    }

    #[test]
    fn validation_messages_pass_through() {
        let err = CoreError::from(ValidationError::PastDate(DateField::Start));
        assert_eq!(err.to_string(), "Start date cannot be in the past.");
        assert!(err.is_user_correctable());
        assert!(!CoreError::from(BackendError::Unauthenticated).is_user_correctable());
    }

    #[tokio::test]
    async fn local_state_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = LocalBackendConfig {
            data_dir: dir.path().join("nested"),
            ..LocalBackendConfig::default()
        };
        let identity = Arc::new(crate::backend::SessionIdentity::signed_in("user-9"));
        let state = CoreState::local(&config, identity).unwrap();

        assert!(config.database_path().exists());
        assert_eq!(state.owner_id().unwrap(), "user-9");
        let pets = state.backend().store.query("pets", &[]).await.unwrap();
        assert!(pets.is_empty());
    }
}
