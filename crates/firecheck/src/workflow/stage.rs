//! Which inspection stage applies to a unit.

use serde::Serialize;

use crate::model::Equipment;

/// The two inspection stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Stage 1: department officer check.
    OfficerCheck,
    /// Stage 2: technician confirmation of the open officer check.
    TechnicianConfirmation,
}

impl Stage {
    /// The stage number shown to users (1 or 2).
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::OfficerCheck => 1,
            Self::TechnicianConfirmation => 2,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OfficerCheck => write!(f, "stage 1 (officer check)"),
            Self::TechnicianConfirmation => write!(f, "stage 2 (technician confirmation)"),
        }
    }
}

/// Stage 2 iff the newest record is unconfirmed, otherwise stage 1.
#[must_use]
pub fn select_stage(unit: &Equipment) -> Stage {
    if unit.open_inspection().is_some() {
        Stage::TechnicianConfirmation
    } else {
        Stage::OfficerCheck
    }
}
