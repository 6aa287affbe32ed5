use std::fmt;

use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RecurrenceRule {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

str_enum!(SortDirection {
    Ascending => "asc",
    Descending => "desc",
});

impl SortDirection {
    /// Label shown in the sort dropdown.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ascending => "Earliest first",
            Self::Descending => "Latest first",
        }
    }
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Ascending
    }
}

/// Label of the catch-all option in the category picker.
pub const OTHER_LABEL: &str = "Other";

/// Appointment category. The five fixed options plus free text entered
/// under "Other".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentCategory {
    Vaccination,
    CheckUp,
    Grooming,
    Training,
    Medication,
    Other(String),
}

impl AppointmentCategory {
    /// Fixed options in picker order.
    pub const FIXED: [AppointmentCategory; 5] = [
        Self::Vaccination,
        Self::CheckUp,
        Self::Grooming,
        Self::Training,
        Self::Medication,
    ];

    /// Display label, also the value written to the `type` store field.
    pub fn label(&self) -> &str {
        match self {
            Self::Vaccination => "Vaccination",
            Self::CheckUp => "Check-up",
            Self::Grooming => "Grooming",
            Self::Training => "Training",
            Self::Medication => "Medication",
            Self::Other(text) => text,
        }
    }

    /// Maps a stored or selected label back to a category. Unknown labels
    /// become `Other` carrying the label verbatim.
    pub fn from_label(label: &str) -> Self {
        Self::FIXED
            .iter()
            .find(|c| c.label() == label)
            .cloned()
            .unwrap_or_else(|| Self::Other(label.to_string()))
    }

    pub fn is_medication(&self) -> bool {
        matches!(self, Self::Medication)
    }

    pub fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }

    /// Every picker option, "Other" last.
    pub fn picker_options() -> Vec<&'static str> {
        vec![
            "Vaccination",
            "Check-up",
            "Grooming",
            "Training",
            "Medication",
            OTHER_LABEL,
        ]
    }
}

impl fmt::Display for AppointmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
