//! Inspection records and the criteria an officer checks.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// A two-valued check result with one negative state.
pub trait Criterion {
    /// Whether this result is the negative one ("defective", "abnormal", "present").
    fn is_negative(&self) -> bool;
}

/// Implements `Display`, `FromStr` and `Criterion` for a two-variant enum.
macro_rules! two_valued {
    ($name:ident, $field:literal, $good:ident => $good_str:literal, $bad:ident => $bad_str:literal) => {
        impl $name {
            /// The wire name of this value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    Self::$good => $good_str,
                    Self::$bad => $bad_str,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = WorkflowError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim();
                if value.eq_ignore_ascii_case($good_str) {
                    Ok(Self::$good)
                } else if value.eq_ignore_ascii_case($bad_str) {
                    Ok(Self::$bad)
                } else {
                    Err(WorkflowError::invalid_value($field, s))
                }
            }
        }

        impl Criterion for $name {
            fn is_negative(&self) -> bool {
                matches!(self, Self::$bad)
            }
        }
    };
}

/// Physical condition of the hose, lever or body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// No visible damage.
    #[default]
    Normal,
    /// Damaged or broken.
    Defective,
}

two_valued!(Condition, "condition", Normal => "normal", Defective => "defective");

/// Pressure gauge / weight reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pressure {
    /// Gauge in the green zone.
    #[default]
    Normal,
    /// Gauge out of range.
    Abnormal,
}

two_valued!(Pressure, "pressure", Normal => "normal", Abnormal => "abnormal");

/// Whether anything blocks access to the unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Obstruction {
    /// Access is clear.
    #[default]
    Absent,
    /// Something blocks access.
    Present,
}

two_valued!(Obstruction, "obstruction", Absent => "absent", Present => "present");

/// Overall verdict given by an officer or a technician.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Fit for use.
    #[default]
    Normal,
    /// Needs attention.
    Abnormal,
}

two_valued!(Verdict, "verdict", Normal => "normal", Abnormal => "abnormal");

/// The five checks recorded by the officer at stage 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionCriteria {
    /// Discharge hose.
    pub hose: Condition,
    /// Operating lever / handle.
    pub lever: Condition,
    /// Cylinder body.
    pub body: Condition,
    /// Pressure gauge or weight.
    pub pressure: Pressure,
    /// Obstruction in front of the unit.
    pub obstruction: Obstruction,
}

impl InspectionCriteria {
    /// Parse criteria from optional form values.
    ///
    /// Missing values take their defaults (`normal` / `absent`); present but
    /// unrecognized values are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidValue`] naming the offending check.
    pub fn from_form(
        hose: Option<&str>,
        lever: Option<&str>,
        body: Option<&str>,
        pressure: Option<&str>,
        obstruction: Option<&str>,
    ) -> Result<Self, WorkflowError> {
        Ok(Self {
            hose: parse_or_default(hose, "hose")?,
            lever: parse_or_default(lever, "lever")?,
            body: parse_or_default(body, "body")?,
            pressure: parse_or_default(pressure, "pressure")?,
            obstruction: parse_or_default(obstruction, "obstruction")?,
        })
    }

    /// Whether any check is in its negative state.
    #[must_use]
    pub fn any_negative(&self) -> bool {
        self.hose.is_negative()
            || self.lever.is_negative()
            || self.body.is_negative()
            || self.pressure.is_negative()
            || self.obstruction.is_negative()
    }

    /// The officer verdict implied by these checks.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.any_negative() {
            Verdict::Abnormal
        } else {
            Verdict::Normal
        }
    }
}

fn parse_or_default<T>(value: Option<&str>, field: &'static str) -> Result<T, WorkflowError>
where
    T: FromStr<Err = WorkflowError> + Default,
{
    match value {
        None => Ok(T::default()),
        Some(text) => text.parse().map_err(|_| WorkflowError::invalid_value(field, text)),
    }
}

/// Stage 2 fields, written once by the technician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianSignoff {
    /// Name of the confirming technician.
    pub name: String,
    /// Final verdict after confirmation.
    pub verdict: Verdict,
    /// Optional technical or repair note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the confirmation was submitted.
    pub confirmed_at: DateTime<Utc>,
}

/// One monthly inspection of a unit.
///
/// Created unconfirmed by the officer check; the technician signoff is the
/// only later change. The confirmation flag is the presence of the signoff,
/// so an unconfirmed record cannot carry technician fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    /// Unique record identifier.
    pub id: String,
    /// When the officer check was submitted.
    pub inspected_at: DateTime<Utc>,
    /// The recorded checks.
    pub criteria: InspectionCriteria,
    /// Name of the inspecting officer.
    pub officer_name: String,
    /// Verdict derived from the criteria.
    pub officer_verdict: Verdict,
    /// Optional officer note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_note: Option<String>,
    /// Technician confirmation, once given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<TechnicianSignoff>,
}

impl InspectionRecord {
    /// Whether a technician has confirmed this record.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.technician.is_some()
    }

    /// The final verdict: the technician's once confirmed, the officer's before.
    #[must_use]
    pub fn effective_verdict(&self) -> Verdict {
        self.technician
            .as_ref()
            .map_or(self.officer_verdict, |t| t.verdict)
    }
}
