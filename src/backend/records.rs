//! Mapping between domain models and stored document records.
//!
//! Field names follow the collections' existing documents
//! (`petId`, `userId`, `type`, `date`, `endDate`, ...). Timestamps are
//! stored as `STORED_DATETIME_FORMAT` strings, absent optionals as `null`.

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde_json::Value;

use super::store::{Document, Record};
use super::BackendError;
use crate::appointment::ValidatedAppointment;
use crate::config::{APPOINTMENTS_COLLECTION, PETS_COLLECTION, STORED_DATETIME_FORMAT};
use crate::models::{Appointment, AppointmentCategory, Pet, RecurrenceRule};

pub mod fields {
    pub const PET_ID: &str = "petId";
    pub const OWNER_ID: &str = "userId";
    pub const TYPE: &str = "type";
    pub const DATE: &str = "date";
    pub const END_DATE: &str = "endDate";
    pub const NOTES: &str = "notes";
    pub const IS_RECURRING: &str = "isRecurring";
    pub const RECURRENCE_RULE: &str = "recurrenceRule";
    pub const RECURRENCE_END_DATE: &str = "recurrenceEndDate";
    pub const NAME: &str = "name";
    pub const IMAGE_URL: &str = "imageUrl";
}

fn timestamp_value(at: Option<NaiveDateTime>) -> Value {
    at.map(|t| Value::String(t.format(STORED_DATETIME_FORMAT).to_string()))
        .unwrap_or(Value::Null)
}

// ═══════════════════════════════════════════
// Appointments
// ═══════════════════════════════════════════

/// Full record for a newly validated appointment.
pub fn new_appointment_record(pet_id: &str, owner_id: &str, appointment: &ValidatedAppointment) -> Record {
    let mut record = appointment_update_record(appointment);
    record.insert(fields::PET_ID.into(), pet_id.into());
    record.insert(fields::OWNER_ID.into(), owner_id.into());
    record.insert(fields::IS_RECURRING.into(), false.into());
    record.insert(fields::RECURRENCE_RULE.into(), Value::Null);
    record.insert(fields::RECURRENCE_END_DATE.into(), Value::Null);
    record
}

/// Partial record carrying only the fields an edit may change.
pub fn appointment_update_record(appointment: &ValidatedAppointment) -> Record {
    let mut record = Record::new();
    record.insert(fields::TYPE.into(), appointment.category().label().into());
    record.insert(fields::NOTES.into(), appointment.notes().unwrap_or_default().into());
    record.insert(fields::DATE.into(), timestamp_value(Some(appointment.occurs_at())));
    record.insert(fields::END_DATE.into(), timestamp_value(appointment.ends_at()));
    record
}

pub fn appointment_from_document(doc: &Document) -> Result<Appointment, BackendError> {
    let malformed = |reason: String| BackendError::Malformed {
        collection: APPOINTMENTS_COLLECTION.into(),
        id: doc.id.clone(),
        reason,
    };

    let occurs_at = read_timestamp(doc, fields::DATE)
        .map_err(&malformed)?
        .ok_or_else(|| malformed(format!("missing `{}`", fields::DATE)))?;
    let label = doc.str_field(fields::TYPE).unwrap_or_default().trim();
    if label.is_empty() {
        return Err(malformed(format!("missing `{}`", fields::TYPE)));
    }
    let category = AppointmentCategory::from_label(label);

    // Only Medication carries a range, and only one that ends after it starts
    let ends_at = match read_timestamp(doc, fields::END_DATE).map_err(&malformed)? {
        Some(end) if category.is_medication() && end > occurs_at => Some(end),
        Some(_) => {
            tracing::debug!(id = %doc.id, "Dropping end date outside a medication range");
            None
        }
        None => None,
    };
    let recurrence_ends_at = read_timestamp(doc, fields::RECURRENCE_END_DATE).map_err(&malformed)?;

    let recurrence_rule = match doc.str_field(fields::RECURRENCE_RULE) {
        None | Some("") => None,
        Some(raw) => match RecurrenceRule::from_str(raw) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!(id = %doc.id, error = %e, "Ignoring unknown recurrence rule");
                None
            }
        },
    };

    Ok(Appointment {
        id: doc.id.clone(),
        pet_id: doc.str_field(fields::PET_ID).unwrap_or_default().to_string(),
        owner_id: doc.str_field(fields::OWNER_ID).unwrap_or_default().to_string(),
        category,
        occurs_at,
        ends_at,
        notes: doc
            .str_field(fields::NOTES)
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string),
        is_recurring: doc.bool_field(fields::IS_RECURRING).unwrap_or(false),
        recurrence_rule,
        recurrence_ends_at,
    })
}

fn read_timestamp(doc: &Document, field: &str) -> Result<Option<NaiveDateTime>, String> {
    match doc.fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => NaiveDateTime::parse_from_str(raw, STORED_DATETIME_FORMAT)
            .map(Some)
            .map_err(|e| format!("bad `{field}` timestamp {raw:?}: {e}")),
        Some(other) => Err(format!("`{field}` is not a timestamp: {other}")),
    }
}

// ═══════════════════════════════════════════
// Pets
// ═══════════════════════════════════════════

pub fn new_pet_record(owner_id: &str, name: &str, species: &str, image_url: &str) -> Record {
    let mut record = pet_update_record(name, species);
    record.insert(fields::OWNER_ID.into(), owner_id.into());
    record.insert(fields::IMAGE_URL.into(), image_url.into());
    record
}

/// Pets are only ever edited in name and species.
pub fn pet_update_record(name: &str, species: &str) -> Record {
    let mut record = Record::new();
    record.insert(fields::NAME.into(), name.into());
    record.insert(fields::TYPE.into(), species.into());
    record
}

pub fn pet_from_document(doc: &Document) -> Result<Pet, BackendError> {
    let name = doc.str_field(fields::NAME).ok_or_else(|| BackendError::Malformed {
        collection: PETS_COLLECTION.into(),
        id: doc.id.clone(),
        reason: format!("missing `{}`", fields::NAME),
    })?;
    Ok(Pet {
        id: doc.id.clone(),
        owner_id: doc.str_field(fields::OWNER_ID).unwrap_or_default().to_string(),
        name: name.to_string(),
        species: doc.str_field(fields::TYPE).unwrap_or_default().to_string(),
        image_url: doc.str_field(fields::IMAGE_URL).unwrap_or_default().to_string(),
    })
}
