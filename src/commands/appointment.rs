//! Appointment commands for the pet details screen.
//!
//! - `appointment_categories`: picker options
//! - `sort_options`: sort dropdown entries
//! - `list_appointments`: sorted + searched cards for one pet
//! - `check_appointment_draft`: validate a draft without saving
//! - `add_appointment` / `edit_appointment` / `delete_appointment`

use serde::Serialize;

use crate::appointment::{validate_draft_now, AppointmentDraft};
use crate::core_state::{CoreError, CoreState};
use crate::dialog::AppointmentDialog;
use crate::models::{AppointmentCategory, SortDirection};
use crate::pet_details::{AppointmentCard, CommitOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOption {
    pub value: SortDirection,
    pub label: &'static str,
}

pub fn appointment_categories() -> Vec<&'static str> {
    AppointmentCategory::picker_options()
}

pub fn sort_options() -> Vec<SortOption> {
    [SortDirection::Ascending, SortDirection::Descending]
        .into_iter()
        .map(|value| SortOption {
            value,
            label: value.label(),
        })
        .collect()
}

/// Appointments of `pet_id`, sorted by date then narrowed by `query`.
pub async fn list_appointments(
    state: &CoreState,
    pet_id: &str,
    sort: SortDirection,
    query: &str,
) -> Result<Vec<AppointmentCard>, String> {
    let mut book = state.appointment_book(pet_id).map_err(|e| e.to_string())?;
    book.load().await.map_err(|e| e.to_string())?;
    book.set_sort(sort);
    book.set_query(query);
    Ok(book.cards())
}

/// Form-level check, used to show the error before the user hits "Save".
pub fn check_appointment_draft(draft: &AppointmentDraft) -> Result<(), String> {
    validate_draft_now(draft).map(|_| ()).map_err(|e| e.to_string())
}

/// Validates and inserts. Returns the new appointment id.
pub async fn add_appointment(
    state: &CoreState,
    pet_id: &str,
    draft: AppointmentDraft,
) -> Result<String, String> {
    let mut book = state.appointment_book(pet_id).map_err(|e| e.to_string())?;
    let mut dialog = AppointmentDialog::new();
    dialog.open_add();
    dialog.edit_draft(|d| *d = draft).map_err(|e| e.to_string())?;

    book.commit_now(&mut dialog)
        .await
        .map(CommitOutcome::into_id)
        .map_err(report)
}

/// Validates and writes the editable fields of an existing appointment.
pub async fn edit_appointment(
    state: &CoreState,
    pet_id: &str,
    appointment_id: &str,
    draft: AppointmentDraft,
) -> Result<(), String> {
    let mut book = state.appointment_book(pet_id).map_err(|e| e.to_string())?;
    book.load().await.map_err(|e| e.to_string())?;
    let existing = book
        .find(appointment_id)
        .cloned()
        .ok_or_else(|| format!("Appointment not found: {appointment_id}"))?;

    let mut dialog = AppointmentDialog::new();
    dialog.open_edit(existing);
    dialog.edit_draft(|d| *d = draft).map_err(|e| e.to_string())?;
    book.commit_now(&mut dialog).await.map(|_| ()).map_err(report)
}

pub async fn delete_appointment(
    state: &CoreState,
    pet_id: &str,
    appointment_id: &str,
) -> Result<(), String> {
    let mut book = state.appointment_book(pet_id).map_err(|e| e.to_string())?;
    book.load().await.map_err(|e| e.to_string())?;
    book.delete(appointment_id).await.map_err(report)
}

fn report(e: CoreError) -> String {
    if !e.is_user_correctable() {
        tracing::warn!(error = %e, "Appointment command failed");
    }
    e.to_string()
}
