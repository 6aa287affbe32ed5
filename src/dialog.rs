//! Add/edit appointment dialog state.
//!
//! `Idle -> Editing -> Validating -> {Committed | Rejected}`. A rejected
//! dialog returns to `Editing` as soon as the draft is touched again. While
//! a commit is in flight (`Validating`) further submits are refused, so a
//! double tap on "Save" cannot write twice.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::appointment::{draft_from_existing, validate_draft, AppointmentDraft, ValidatedAppointment};
use crate::core_state::CoreError;
use crate::models::Appointment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "message", rename_all = "snake_case")]
pub enum DialogPhase {
    Idle,
    Editing,
    Validating,
    Committed,
    /// Carries the message shown under the form.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMode {
    Add,
    Edit(Appointment),
}

/// What the caller must write once a submit validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommit {
    Insert(ValidatedAppointment),
    Update {
        id: String,
        changes: ValidatedAppointment,
        updated: Appointment,
    },
}

#[derive(Debug)]
pub struct AppointmentDialog {
    mode: Option<DialogMode>,
    draft: AppointmentDraft,
    phase: DialogPhase,
}

impl Default for AppointmentDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentDialog {
    pub fn new() -> Self {
        Self {
            mode: None,
            draft: AppointmentDraft::default(),
            phase: DialogPhase::Idle,
        }
    }

    pub fn open_add(&mut self) {
        self.mode = Some(DialogMode::Add);
        self.draft = AppointmentDraft::default();
        self.phase = DialogPhase::Editing;
    }

    pub fn open_edit(&mut self, existing: Appointment) {
        self.draft = draft_from_existing(&existing);
        self.mode = Some(DialogMode::Edit(existing));
        self.phase = DialogPhase::Editing;
    }

    /// Close without saving. Nothing carries over to the next dialog.
    pub fn dismiss(&mut self) {
        *self = Self::new();
    }

    pub fn phase(&self) -> &DialogPhase {
        &self.phase
    }

    pub fn mode(&self) -> Option<&DialogMode> {
        self.mode.as_ref()
    }

    pub fn draft(&self) -> &AppointmentDraft {
        &self.draft
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.phase, DialogPhase::Idle | DialogPhase::Committed)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            DialogPhase::Rejected(message) => Some(message),
            _ => None,
        }
    }

    /// "Save" is enabled once a date is picked and no commit is pending.
    pub fn can_save(&self) -> bool {
        matches!(self.phase, DialogPhase::Editing | DialogPhase::Rejected(_))
            && self.draft.date.is_some()
    }

    /// Change the draft. Clears a previous rejection.
    pub fn edit_draft(&mut self, change: impl FnOnce(&mut AppointmentDraft)) -> Result<(), CoreError> {
        match self.phase {
            DialogPhase::Editing | DialogPhase::Rejected(_) => {
                change(&mut self.draft);
                self.phase = DialogPhase::Editing;
                Ok(())
            }
            DialogPhase::Validating => Err(CoreError::CommitInFlight),
            DialogPhase::Idle | DialogPhase::Committed => Err(CoreError::DialogClosed),
        }
    }

    /// Validate the draft against `now` and, on success, mark the commit in flight.
    pub fn submit(&mut self, now: NaiveDateTime) -> Result<PendingCommit, CoreError> {
        match self.phase {
            DialogPhase::Editing | DialogPhase::Rejected(_) => {}
            DialogPhase::Validating => return Err(CoreError::CommitInFlight),
            DialogPhase::Idle | DialogPhase::Committed => return Err(CoreError::DialogClosed),
        }
        let Some(mode) = self.mode.as_ref() else {
            return Err(CoreError::DialogClosed);
        };
        self.phase = DialogPhase::Validating;

        let pending = match mode {
            DialogMode::Add => validate_draft(&self.draft, now).map(PendingCommit::Insert),
            DialogMode::Edit(existing) => validate_draft(&self.draft, now).map(|changes| {
                PendingCommit::Update {
                    id: existing.id.clone(),
                    updated: changes.clone().apply_to(existing),
                    changes,
                }
            }),
        };

        match pending {
            Ok(pending) => Ok(pending),
            Err(e) => {
                tracing::debug!(error = %e, "Appointment draft rejected");
                self.phase = DialogPhase::Rejected(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Apply the outcome of the backend write started by [`submit`](Self::submit).
    pub fn finish_commit<E: std::fmt::Display>(&mut self, outcome: Result<(), E>) {
        if self.phase != DialogPhase::Validating {
            tracing::debug!(phase = ?self.phase, "Commit finished for a dialog no longer waiting on it");
            return;
        }
        self.phase = match outcome {
            Ok(()) => DialogPhase::Committed,
            Err(e) => {
                tracing::warn!(error = %e, "Appointment save failed");
                DialogPhase::Rejected(e.to_string())
            }
        };
    }
}
