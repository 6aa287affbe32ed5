//! Appointment list of a single pet.
//!
//! Holds the latest successful load from the document store and derives the
//! displayed list from it (sort, then search). Mutations never patch the
//! held list; they write through the store and reload, so a stale copy can
//! never bring a deleted entry back.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::appointment::{display_when, filter_by_search, sort_by_date};
use crate::backend::records::{
    appointment_from_document, appointment_update_record, fields, new_appointment_record,
};
use crate::backend::{BackendError, DocumentStore, Filter};
use crate::config::APPOINTMENTS_COLLECTION;
use crate::core_state::CoreError;
use crate::dialog::{AppointmentDialog, PendingCommit};
use crate::models::{Appointment, SortDirection};

/// Appointment as rendered on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCard {
    pub id: String,
    pub category: String,
    pub when: String,
    pub notes: Option<String>,
    pub is_ranged: bool,
    pub is_recurring: bool,
}

impl From<&Appointment> for AppointmentCard {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id.clone(),
            category: appointment.category.label().to_string(),
            when: display_when(appointment),
            notes: appointment.notes.clone(),
            is_ranged: appointment.is_ranged(),
            is_recurring: appointment.is_recurring,
        }
    }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// New appointment with its store-assigned id.
    Added(String),
    Updated(String),
}

impl CommitOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Added(id) | Self::Updated(id) => id,
        }
    }

    pub fn into_id(self) -> String {
        match self {
            Self::Added(id) | Self::Updated(id) => id,
        }
    }
}

pub struct AppointmentBook {
    store: Arc<dyn DocumentStore>,
    pet_id: String,
    owner_id: String,
    appointments: Vec<Appointment>,
    sort: SortDirection,
    query: String,
}

impl AppointmentBook {
    pub fn new(store: Arc<dyn DocumentStore>, pet_id: &str, owner_id: String) -> Self {
        Self {
            store,
            pet_id: pet_id.to_string(),
            owner_id,
            appointments: Vec::new(),
            sort: SortDirection::default(),
            query: String::new(),
        }
    }

    pub fn pet_id(&self) -> &str {
        &self.pet_id
    }

    /// Latest successful load, in store order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn find(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn sort(&self) -> SortDirection {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortDirection) {
        self.sort = sort;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Displayed list: sorted by date, then narrowed by the search query.
    pub fn visible(&self) -> Vec<&Appointment> {
        let sorted = sort_by_date(self.appointments.iter().collect(), self.sort);
        filter_by_search(sorted, &self.query).collect()
    }

    pub fn cards(&self) -> Vec<AppointmentCard> {
        self.visible().into_iter().map(AppointmentCard::from).collect()
    }

    /// Replace the held list with the pet's appointments owned by the user.
    /// On failure the previous list stays in place.
    pub async fn load(&mut self) -> Result<usize, BackendError> {
        let filters = [
            Filter::equals(fields::PET_ID, self.pet_id.as_str()),
            Filter::equals(fields::OWNER_ID, self.owner_id.as_str()),
        ];
        let documents = self.store.query(APPOINTMENTS_COLLECTION, &filters).await?;

        let mut appointments = Vec::with_capacity(documents.len());
        for doc in &documents {
            match appointment_from_document(doc) {
                Ok(appointment) => appointments.push(appointment),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable appointment"),
            }
        }

        tracing::debug!(pet_id = %self.pet_id, count = appointments.len(), "Appointments loaded");
        self.appointments = appointments;
        Ok(self.appointments.len())
    }

    /// Reload after an acknowledged write. The write stands even if this
    /// fails; the previous list is kept until the next successful load.
    async fn refresh(&mut self) {
        if let Err(e) = self.load().await {
            tracing::warn!(pet_id = %self.pet_id, error = %e, "Reload after write failed");
        }
    }

    /// Validate the dialog's draft, write it, and reload.
    ///
    /// Validation errors never reach the store. Once the store acknowledges
    /// the write the commit succeeds, whatever the reload does.
    pub async fn commit(
        &mut self,
        dialog: &mut AppointmentDialog,
        now: NaiveDateTime,
    ) -> Result<CommitOutcome, CoreError> {
        let pending = dialog.submit(now)?;

        if let PendingCommit::Update { updated, .. } = &pending {
            if updated.pet_id != self.pet_id || updated.owner_id != self.owner_id {
                let err = BackendError::PermissionDenied(format!(
                    "appointment {} belongs to another pet or user",
                    updated.id
                ));
                dialog.finish_commit(Err(&err));
                return Err(err.into());
            }
        }

        let written = match pending {
            PendingCommit::Insert(validated) => self
                .store
                .insert(
                    APPOINTMENTS_COLLECTION,
                    new_appointment_record(&self.pet_id, &self.owner_id, &validated),
                )
                .await
                .map(CommitOutcome::Added),
            PendingCommit::Update { id, changes, .. } => self
                .store
                .update(APPOINTMENTS_COLLECTION, &id, appointment_update_record(&changes))
                .await
                .map(|()| CommitOutcome::Updated(id)),
        };

        dialog.finish_commit(written.as_ref().map(|_| ()));
        let outcome = written?;
        match &outcome {
            CommitOutcome::Added(id) => tracing::info!(pet_id = %self.pet_id, id = %id, "Appointment added"),
            CommitOutcome::Updated(id) => tracing::info!(pet_id = %self.pet_id, id = %id, "Appointment updated"),
        }

        self.refresh().await;
        Ok(outcome)
    }

    /// [`commit`](Self::commit) against the local wall clock.
    pub async fn commit_now(&mut self, dialog: &mut AppointmentDialog) -> Result<CommitOutcome, CoreError> {
        self.commit(dialog, Local::now().naive_local()).await
    }

    /// Delete one of the listed appointments, then reload.
    pub async fn delete(&mut self, id: &str) -> Result<(), CoreError> {
        if self.find(id).is_none() {
            return Err(BackendError::NotFound {
                collection: APPOINTMENTS_COLLECTION.into(),
                id: id.into(),
            }
            .into());
        }
        self.store.delete(APPOINTMENTS_COLLECTION, id).await?;
        tracing::info!(pet_id = %self.pet_id, id, "Appointment deleted");
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    use crate::backend::{Document, Record};
    use crate::db::document_store::testing::ReadsFailAfterWrite;
    use crate::db::SqliteDocumentStore;
    use crate::dialog::DialogPhase;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    fn book(store: Arc<dyn DocumentStore>) -> AppointmentBook {
        AppointmentBook::new(store, "pet-1", "user-1".into())
    }

    fn sqlite() -> Arc<SqliteDocumentStore> {
        Arc::new(SqliteDocumentStore::in_memory().unwrap())
    }

    async fn add(book: &mut AppointmentBook, category: &str, days: i64, notes: &str) -> String {
        let mut dialog = AppointmentDialog::new();
        dialog.open_add();
        dialog
            .edit_draft(|d| {
                d.category = category.into();
                d.notes = notes.into();
                d.date = Some(now() + Duration::days(days));
            })
            .unwrap();
        match book.commit(&mut dialog, now()).await.unwrap() {
            CommitOutcome::Added(id) => id,
            other => panic!("expected insert, got {other:?}"),
        }
    }

    /// Store whose every call fails, for error-path checks.
    struct OfflineStore;

    #[async_trait]
    impl DocumentStore for OfflineStore {
        async fn query(&self, _: &str, _: &[Filter]) -> Result<Vec<Document>, BackendError> {
            Err(BackendError::Transport("offline".into()))
        }
        async fn insert(&self, _: &str, _: Record) -> Result<String, BackendError> {
            Err(BackendError::Transport("offline".into()))
        }
        async fn update(&self, _: &str, _: &str, _: Record) -> Result<(), BackendError> {
            Err(BackendError::Transport("offline".into()))
        }
        async fn delete(&self, _: &str, _: &str) -> Result<(), BackendError> {
            Err(BackendError::Transport("offline".into()))
        }
    }

    #[tokio::test]
    async fn add_then_list() {
        let mut book = book(sqlite());
        let id = add(&mut book, "Vaccination", 1, "Rabies").await;

        assert_eq!(book.appointments().len(), 1);
        let appt = book.find(&id).unwrap();
        assert_eq!(appt.pet_id, "pet-1");
        assert_eq!(appt.owner_id, "user-1");
        assert_eq!(appt.notes.as_deref(), Some("Rabies"));
    }

    #[tokio::test]
    async fn load_is_scoped_to_pet_and_owner() {
        let store = sqlite();
        let mut mine = book(store.clone());
        add(&mut mine, "Grooming", 1, "").await;

        let mut other_pet = AppointmentBook::new(store.clone(), "pet-2", "user-1".into());
        add(&mut other_pet, "Training", 2, "").await;

        let mut other_user = AppointmentBook::new(store.clone(), "pet-1", "user-2".into());
        add(&mut other_user, "Check-up", 3, "").await;

        mine.load().await.unwrap();
        assert_eq!(mine.appointments().len(), 1);
        assert_eq!(mine.appointments()[0].category.label(), "Grooming");
    }

    #[tokio::test]
    async fn visible_sorts_then_filters() {
        let mut book = book(sqlite());
        add(&mut book, "Grooming", 3, "Long coat").await;
        add(&mut book, "Vaccination", 1, "").await;
        add(&mut book, "Grooming", 2, "").await;

        let order: Vec<i64> = book
            .visible()
            .iter()
            .map(|a| (a.occurs_at - now()).num_days())
            .collect();
        assert_eq!(order, [1, 2, 3]);

        book.set_sort(SortDirection::Descending);
        book.set_query("groom");
        let order: Vec<i64> = book
            .visible()
            .iter()
            .map(|a| (a.occurs_at - now()).num_days())
            .collect();
        assert_eq!(order, [3, 2]);

        book.set_query("");
        assert_eq!(book.cards().len(), 3);
    }

    #[tokio::test]
    async fn medication_range_is_stored_and_rendered() {
        let mut book = book(sqlite());
        let mut dialog = AppointmentDialog::new();
        dialog.open_add();
        dialog
            .edit_draft(|d| {
                d.category = "Medication".into();
                d.date = Some(now() + Duration::days(1));
                d.end_date = Some(now() + Duration::days(2));
            })
            .unwrap();
        book.commit(&mut dialog, now()).await.unwrap();

        let cards = book.cards();
        assert!(cards[0].is_ranged);
        assert_eq!(cards[0].when, "02.07.2026. 08:00 – 03.07.2026. 08:00");
    }

    #[tokio::test]
    async fn edit_updates_in_place() {
        let mut book = book(sqlite());
        let id = add(&mut book, "Grooming", 1, "Bath").await;

        let mut dialog = AppointmentDialog::new();
        dialog.open_edit(book.find(&id).unwrap().clone());
        dialog
            .edit_draft(|d| {
                d.category = "Other".into();
                d.custom_category = "Dental".into();
            })
            .unwrap();
        let result = book.commit(&mut dialog, now()).await.unwrap();

        assert_eq!(result, CommitOutcome::Updated(id.clone()));
        assert_eq!(dialog.phase(), &DialogPhase::Committed);
        assert_eq!(book.appointments().len(), 1);
        let edited = book.find(&id).unwrap();
        assert_eq!(edited.category.label(), "Dental");
        assert_eq!(edited.notes.as_deref(), Some("Bath"));
    }

    #[tokio::test]
    async fn edit_of_foreign_appointment_is_refused() {
        let store = sqlite();
        let mut theirs = AppointmentBook::new(store.clone(), "pet-9", "user-2".into());
        let id = add(&mut theirs, "Grooming", 1, "").await;
        let foreign = theirs.find(&id).unwrap().clone();

        let mut mine = book(store.clone());
        let mut dialog = AppointmentDialog::new();
        dialog.open_edit(foreign);
        let err = mine.commit(&mut dialog, now()).await.unwrap_err();
        assert!(matches!(err, CoreError::Backend(BackendError::PermissionDenied(_))));

        theirs.load().await.unwrap();
        assert_eq!(theirs.find(&id).unwrap().category.label(), "Grooming");
    }

    #[tokio::test]
    async fn validation_failure_writes_nothing() {
        let store = sqlite();
        let mut book = book(store.clone());
        let mut dialog = AppointmentDialog::new();
        dialog.open_add();
        dialog
            .edit_draft(|d| d.date = Some(now() - Duration::days(1)))
            .unwrap();

        let err = book.commit(&mut dialog, now()).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(store.query(APPOINTMENTS_COLLECTION, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_reloads_from_store() {
        let store = sqlite();
        let mut book = book(store.clone());
        let keep = add(&mut book, "Grooming", 1, "").await;
        let gone = add(&mut book, "Training", 2, "").await;

        book.delete(&gone).await.unwrap();
        assert_eq!(book.appointments().len(), 1);
        assert!(book.find(&keep).is_some());
        assert!(store
            .query(APPOINTMENTS_COLLECTION, &[])
            .await
            .unwrap()
            .iter()
            .all(|d| d.id != gone));
    }

    #[tokio::test]
    async fn delete_of_unlisted_id_is_not_found() {
        let mut book = book(sqlite());
        let err = book.delete("missing").await.unwrap_err();
        assert!(matches!(err, CoreError::Backend(BackendError::NotFound { .. })));
    }

    #[tokio::test]
    async fn concurrent_edit_elsewhere_is_picked_up_on_reload() {
        let store = sqlite();
        let mut screen_a = book(store.clone());
        let mut screen_b = book(store.clone());
        let id = add(&mut screen_a, "Grooming", 1, "").await;
        screen_b.load().await.unwrap();

        screen_b.delete(&id).await.unwrap();
        // Screen A commits something else; its reload must not resurrect `id`
        add(&mut screen_a, "Training", 2, "").await;
        assert!(screen_a.find(&id).is_none());
        assert_eq!(screen_a.appointments().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_documents_are_skipped() {
        let store = sqlite();
        let mut bad = serde_json::Map::new();
        bad.insert("petId".into(), json!("pet-1"));
        bad.insert("userId".into(), json!("user-1"));
        bad.insert("type".into(), json!("Grooming"));
        bad.insert("date".into(), json!("not a date"));
        store.insert(APPOINTMENTS_COLLECTION, bad).await.unwrap();

        let mut book = book(store.clone());
        add(&mut book, "Training", 1, "").await;
        assert_eq!(book.appointments().len(), 1);
    }

    #[tokio::test]
    async fn backend_failure_keeps_previous_list_and_rejects_dialog() {
        let mut book = book(Arc::new(OfflineStore));
        assert!(book.load().await.is_err());
        assert!(book.appointments().is_empty());

        let mut dialog = AppointmentDialog::new();
        dialog.open_add();
        dialog
            .edit_draft(|d| d.date = Some(now() + Duration::days(1)))
            .unwrap();
        let err = book.commit(&mut dialog, now()).await.unwrap_err();

        assert!(matches!(err, CoreError::Backend(BackendError::Transport(_))));
        assert_eq!(dialog.error_message(), Some("Network error: offline"));
        assert!(dialog.can_save());
    }

    #[tokio::test]
    async fn acknowledged_write_succeeds_even_if_reload_fails() {
        let store = Arc::new(ReadsFailAfterWrite::new());
        let mut book = book(store.clone());
        let mut dialog = AppointmentDialog::new();
        dialog.open_add();
        dialog
            .edit_draft(|d| d.date = Some(now() + Duration::days(1)))
            .unwrap();

        let outcome = book.commit(&mut dialog, now()).await.unwrap();

        assert!(matches!(outcome, CommitOutcome::Added(_)));
        assert_eq!(dialog.phase(), &DialogPhase::Committed);
        assert_eq!(store.stored(APPOINTMENTS_COLLECTION).await.len(), 1);
        // Reload failed: the previous (empty) list is kept
        assert!(book.appointments().is_empty());
    }

    #[tokio::test]
    async fn delete_succeeds_even_if_reload_fails() {
        let store = Arc::new(ReadsFailAfterWrite::new());
        let mut book = book(store.clone());
        let id = add(&mut book, "Grooming", 1, "").await;
        store.heal();
        book.load().await.unwrap();
        assert!(book.find(&id).is_some());

        book.delete(&id).await.unwrap();
        assert!(store.stored(APPOINTMENTS_COLLECTION).await.is_empty());

        store.heal();
        book.load().await.unwrap();
        assert!(book.find(&id).is_none());
    }
}
