//! Appointment scheduling rules: draft validation, edits, sorting and search.
//!
//! Turns the add/edit dialog's form state into a validated appointment:
//! 1. Category resolution ("Other" takes the custom text)
//! 2. Date checks against the validation clock (future only)
//! 3. Medication ranges (end after now and after start)
//!
//! Everything here is pure. Writes to the document store happen in
//! `pet_details` once a draft has validated.

use std::borrow::Borrow;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DISPLAY_DATETIME_FORMAT;
use crate::models::{Appointment, AppointmentCategory, SortDirection, OTHER_LABEL};

// ─── Types ────────────────────────────────────────────────────────────────────

/// Unvalidated form state of the appointment dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    /// Selected picker option, "Other" for free text.
    pub category: String,
    /// Free text, read only when `category` is "Other".
    pub custom_category: String,
    pub notes: String,
    /// Date, or start date for Medication.
    pub date: Option<NaiveDateTime>,
    /// End date, kept only for Medication.
    pub end_date: Option<NaiveDateTime>,
}

impl Default for AppointmentDraft {
    fn default() -> Self {
        Self {
            category: AppointmentCategory::Vaccination.label().to_string(),
            custom_category: String::new(),
            notes: String::new(),
            date: None,
            end_date: None,
        }
    }
}

/// Which date picker a date error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateField {
    Date,
    Start,
    End,
}

impl DateField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Start => "Start date",
            Self::End => "End date",
        }
    }
}

/// User-correctable problems with a draft. Display text is shown inline in the form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Appointment type cannot be empty.")]
    EmptyCategory,

    #[error("{} cannot be in the past.", .0.label())]
    PastDate(DateField),

    #[error("End date must be after the start date.")]
    InvalidRange,
}

/// A draft that passed validation. Only [`validate_draft`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedAppointment {
    category: AppointmentCategory,
    notes: Option<String>,
    occurs_at: NaiveDateTime,
    ends_at: Option<NaiveDateTime>,
}

impl ValidatedAppointment {
    pub fn category(&self) -> &AppointmentCategory {
        &self.category
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn occurs_at(&self) -> NaiveDateTime {
        self.occurs_at
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        self.ends_at
    }

    /// Attach store identity to produce a full record. Recurrence stays unset.
    pub fn into_appointment(self, id: String, pet_id: String, owner_id: String) -> Appointment {
        Appointment {
            id,
            pet_id,
            owner_id,
            category: self.category,
            occurs_at: self.occurs_at,
            ends_at: self.ends_at,
            notes: self.notes,
            is_recurring: false,
            recurrence_rule: None,
            recurrence_ends_at: None,
        }
    }

    /// Overwrite the mutable fields of `existing`. Id, pet, owner and
    /// recurrence fields are carried over unchanged.
    pub fn apply_to(self, existing: &Appointment) -> Appointment {
        Appointment {
            category: self.category,
            notes: self.notes,
            occurs_at: self.occurs_at,
            ends_at: self.ends_at,
            ..existing.clone()
        }
    }
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// Validate a draft against `now`.
///
/// Secondary dates are discarded unless the resolved category is Medication.
pub fn validate_draft(
    draft: &AppointmentDraft,
    now: NaiveDateTime,
) -> Result<ValidatedAppointment, ValidationError> {
    let category = resolve_category(draft)?;

    let primary_field = if category.is_medication() {
        DateField::Start
    } else {
        DateField::Date
    };
    let occurs_at = match draft.date {
        Some(at) if at > now => at,
        _ => return Err(ValidationError::PastDate(primary_field)),
    };

    let ends_at = if category.is_medication() {
        match draft.end_date {
            None => None,
            Some(end) if end <= now => return Err(ValidationError::PastDate(DateField::End)),
            Some(end) if end <= occurs_at => return Err(ValidationError::InvalidRange),
            Some(end) => Some(end),
        }
    } else {
        None
    };

    let notes = Some(draft.notes.clone()).filter(|n| !n.trim().is_empty());

    Ok(ValidatedAppointment {
        category,
        notes,
        occurs_at,
        ends_at,
    })
}

/// [`validate_draft`] against the local wall clock.
pub fn validate_draft_now(draft: &AppointmentDraft) -> Result<ValidatedAppointment, ValidationError> {
    validate_draft(draft, Local::now().naive_local())
}

fn resolve_category(draft: &AppointmentDraft) -> Result<AppointmentCategory, ValidationError> {
    let text = if draft.category == OTHER_LABEL {
        draft.custom_category.trim()
    } else {
        draft.category.trim()
    };
    if text.is_empty() {
        return Err(ValidationError::EmptyCategory);
    }
    Ok(AppointmentCategory::from_label(text))
}

// ─── Edits ────────────────────────────────────────────────────────────────────

/// Initial dialog state for editing `existing`.
pub fn draft_from_existing(existing: &Appointment) -> AppointmentDraft {
    let (category, custom_category) = match &existing.category {
        AppointmentCategory::Other(text) => (OTHER_LABEL.to_string(), text.clone()),
        fixed => (fixed.label().to_string(), String::new()),
    };
    AppointmentDraft {
        category,
        custom_category,
        notes: existing.notes.clone().unwrap_or_default(),
        date: Some(existing.occurs_at),
        end_date: existing.ends_at,
    }
}

/// Re-validate `draft` and overwrite the mutable fields of `existing`.
pub fn apply_edit(
    existing: &Appointment,
    draft: &AppointmentDraft,
    now: NaiveDateTime,
) -> Result<Appointment, ValidationError> {
    Ok(validate_draft(draft, now)?.apply_to(existing))
}

// ─── Derived views ────────────────────────────────────────────────────────────

/// Stable sort on `occurs_at`; equal timestamps keep their input order.
pub fn sort_by_date<T: Borrow<Appointment>>(mut appointments: Vec<T>, direction: SortDirection) -> Vec<T> {
    match direction {
        SortDirection::Ascending => {
            appointments.sort_by(|a, b| a.borrow().occurs_at.cmp(&b.borrow().occurs_at))
        }
        SortDirection::Descending => {
            appointments.sort_by(|a, b| b.borrow().occurs_at.cmp(&a.borrow().occurs_at))
        }
    }
    appointments
}

/// Lazily keep appointments whose category, notes or displayed date contain
/// `query`, ignoring case. An empty query keeps everything.
pub fn filter_by_search<I>(appointments: I, query: &str) -> impl Iterator<Item = I::Item>
where
    I: IntoIterator,
    I::Item: Borrow<Appointment>,
{
    let needle = query.to_lowercase();
    appointments
        .into_iter()
        .filter(move |a| matches_query(a.borrow(), &needle))
}

fn matches_query(appointment: &Appointment, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    appointment.category.label().to_lowercase().contains(needle)
        || appointment
            .notes
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(needle))
        || format_display(appointment.occurs_at).to_lowercase().contains(needle)
}

/// `dd.mm.yyyy. HH:MM`, as shown on appointment cards.
pub fn format_display(at: NaiveDateTime) -> String {
    at.format(DISPLAY_DATETIME_FORMAT).to_string()
}

/// Card date line: a single date, or `start – end` for ranges.
pub fn display_when(appointment: &Appointment) -> String {
    match appointment.ends_at {
        Some(end) => format!(
            "{} – {}",
            format_display(appointment.occurs_at),
            format_display(end)
        ),
        None => format_display(appointment.occurs_at),
    }
}
