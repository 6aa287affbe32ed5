use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{AppointmentCategory, RecurrenceRule};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub pet_id: String,
    pub owner_id: String,
    pub category: AppointmentCategory,
    pub occurs_at: NaiveDateTime,
    /// Set only for ranged (Medication) appointments.
    pub ends_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub recurrence_ends_at: Option<NaiveDateTime>,
}

impl Appointment {
    pub fn is_ranged(&self) -> bool {
        self.ends_at.is_some()
    }
}
