//! Building and confirming inspection records.
//!
//! Both operations take the current collection and return a replacement; the
//! caller's value is never modified, so a rejected submission leaves nothing
//! half written.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::fleet::Fleet;
use crate::model::{
    Equipment, EquipmentId, InspectionCriteria, InspectionRecord, TechnicianSignoff, Verdict,
};

/// Stage 1 input from the department officer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficerCheck {
    /// The five checks.
    pub criteria: InspectionCriteria,
    /// Officer name, mandatory.
    pub officer_name: String,
    /// Optional free-text note.
    pub note: Option<String>,
}

/// Stage 2 input from the technician.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnicianConfirmation {
    /// Technician name, mandatory.
    pub technician_name: String,
    /// Final verdict; defaults to normal.
    pub verdict: Verdict,
    /// Optional technical note.
    pub note: Option<String>,
}

/// Record a stage 1 officer check on unit `id`.
///
/// The officer verdict is abnormal if any criterion is negative. The new
/// unconfirmed record is placed first in the unit's history; the last
/// confirmation date is left alone.
///
/// # Errors
///
/// - [`WorkflowError::MissingField`] for a blank officer name
/// - [`WorkflowError::Retired`] if the unit has been withdrawn from service
/// - [`WorkflowError::InspectionAlreadyOpen`] if the newest record is unconfirmed
/// - [`WorkflowError::UnknownEquipment`] if `id` is not in the collection
pub fn record_officer_check(
    fleet: &Fleet,
    id: &EquipmentId,
    check: OfficerCheck,
    now: DateTime<Utc>,
) -> Result<Fleet, WorkflowError> {
    let officer_name = required(&check.officer_name, "officer_name")?;

    fleet.replace(id, |unit| {
        reject_retired(unit)?;
        if unit.open_inspection().is_some() {
            return Err(WorkflowError::InspectionAlreadyOpen {
                code: unit.code.clone(),
            });
        }

        let record = InspectionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            inspected_at: now,
            criteria: check.criteria,
            officer_name,
            officer_verdict: check.criteria.verdict(),
            officer_note: optional(check.note.as_deref()),
            technician: None,
        };
        debug!(
            code = %unit.code,
            verdict = %record.officer_verdict,
            "Recorded officer check"
        );

        let mut unit = unit.clone();
        unit.inspections.insert(0, record);
        Ok(unit)
    })
}

/// Confirm the open inspection of unit `id` (stage 2).
///
/// Signs off the newest record in place and sets the unit's last
/// confirmation date to `now`, which is what compliance counts.
///
/// # Errors
///
/// - [`WorkflowError::MissingField`] for a blank technician name
/// - [`WorkflowError::Retired`] if the unit has been withdrawn from service
/// - [`WorkflowError::NoOpenInspection`] unless the newest record is unconfirmed
/// - [`WorkflowError::UnknownEquipment`] if `id` is not in the collection
pub fn confirm_inspection(
    fleet: &Fleet,
    id: &EquipmentId,
    confirmation: TechnicianConfirmation,
    now: DateTime<Utc>,
) -> Result<Fleet, WorkflowError> {
    let name = required(&confirmation.technician_name, "technician_name")?;

    fleet.replace(id, |unit| {
        reject_retired(unit)?;
        if unit.open_inspection().is_none() {
            return Err(WorkflowError::NoOpenInspection {
                code: unit.code.clone(),
            });
        }

        let mut unit = unit.clone();
        unit.inspections[0].technician = Some(TechnicianSignoff {
            name,
            verdict: confirmation.verdict,
            note: optional(confirmation.note.as_deref()),
            confirmed_at: now,
        });
        unit.last_confirmed_at = Some(now);
        info!(
            code = %unit.code,
            verdict = %confirmation.verdict,
            "Technician confirmed inspection"
        );
        Ok(unit)
    })
}

fn reject_retired(unit: &Equipment) -> Result<(), WorkflowError> {
    if unit.is_retired() {
        return Err(WorkflowError::Retired {
            code: unit.code.clone(),
        });
    }
    Ok(())
}

fn required(value: &str, field: &'static str) -> Result<String, WorkflowError> {
    let value = value.trim();
    if value.is_empty() {
        Err(WorkflowError::MissingField { field })
    } else {
        Ok(value.to_string())
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::compliance::{is_checked, summarize, MonthPeriod};
    use crate::fleet::tests::fleet_with;
    use crate::model::{Condition, Obstruction};
    use crate::workflow::{resolve, select_stage, Stage};
    use chrono::TimeZone;

    pub(crate) fn december_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 14, 9, 30, 0).unwrap()
    }

    pub(crate) fn officer(name: &str) -> OfficerCheck {
        OfficerCheck {
            criteria: InspectionCriteria::default(),
            officer_name: name.to_string(),
            note: None,
        }
    }

    pub(crate) fn technician(name: &str) -> TechnicianConfirmation {
        TechnicianConfirmation {
            technician_name: name.to_string(),
            verdict: Verdict::Normal,
            note: None,
        }
    }

    fn id_of(fleet: &Fleet, code: &str) -> EquipmentId {
        fleet.find_by_code(code).unwrap().id.clone()
    }

    #[test]
    fn test_defective_hose_makes_abnormal_unconfirmed_record() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        let check = OfficerCheck {
            criteria: InspectionCriteria {
                hose: Condition::Defective,
                ..Default::default()
            },
            officer_name: "Somchai".to_string(),
            note: Some("  ".to_string()),
        };

        let updated = record_officer_check(&fleet, &id, check, december_morning()).unwrap();
        let unit = updated.get(&id).unwrap();
        let record = &unit.inspections[0];
        assert_eq!(record.officer_verdict, Verdict::Abnormal);
        assert!(!record.is_confirmed());
        assert!(record.officer_note.is_none());
        assert!(unit.last_confirmed_at.is_none());
        assert!(fleet.get(&id).unwrap().inspections.is_empty());
    }

    #[test]
    fn test_officer_name_required() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        assert_eq!(
            record_officer_check(&fleet, &id, officer("   "), december_morning()).unwrap_err(),
            WorkflowError::MissingField {
                field: "officer_name"
            }
        );
    }

    #[test]
    fn test_second_officer_check_while_open_is_rejected() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        let fleet = record_officer_check(&fleet, &id, officer("A"), december_morning()).unwrap();
        assert_eq!(
            record_officer_check(&fleet, &id, officer("B"), december_morning()).unwrap_err(),
            WorkflowError::InspectionAlreadyOpen {
                code: "FE-001".to_string()
            }
        );
    }

    #[test]
    fn test_confirmation_closes_record_and_counts_as_checked() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        let now = december_morning();
        let fleet = record_officer_check(&fleet, &id, officer("Somchai"), now).unwrap();

        let mut confirmation = technician("Anan");
        confirmation.note = Some(" refilled ".to_string());
        let fleet = confirm_inspection(&fleet, &id, confirmation, now).unwrap();

        let unit = fleet.get(&id).unwrap();
        let signoff = unit.inspections[0].technician.as_ref().unwrap();
        assert!(unit.inspections[0].is_confirmed());
        assert_eq!(signoff.name, "Anan");
        assert_eq!(signoff.verdict, Verdict::Normal);
        assert_eq!(signoff.note.as_deref(), Some("refilled"));
        assert_eq!(unit.last_confirmed_at, Some(now));

        let december = MonthPeriod::of(&now);
        assert!(is_checked(unit, december));
        assert_eq!(summarize(&fleet, december).checked, 1);
    }

    #[test]
    fn test_confirmation_without_open_record() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        assert_eq!(
            confirm_inspection(&fleet, &id, technician("Anan"), december_morning()).unwrap_err(),
            WorkflowError::NoOpenInspection {
                code: "FE-001".to_string()
            }
        );
    }

    #[test]
    fn test_technician_name_required() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        let fleet = record_officer_check(&fleet, &id, officer("A"), december_morning()).unwrap();
        assert_eq!(
            confirm_inspection(&fleet, &id, technician(""), december_morning()).unwrap_err(),
            WorkflowError::MissingField {
                field: "technician_name"
            }
        );
    }

    #[test]
    fn test_retired_unit_is_refused_at_both_stages() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        let on = chrono::NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let retired = fleet.retire(&id, on).unwrap();
        let expected = WorkflowError::Retired {
            code: "FE-001".to_string(),
        };

        assert_eq!(
            record_officer_check(&retired, &id, officer("A"), december_morning()).unwrap_err(),
            expected
        );
        assert!(retired.get(&id).unwrap().inspections.is_empty());

        // Retired while a check was awaiting confirmation.
        let open = record_officer_check(&fleet, &id, officer("A"), december_morning()).unwrap();
        let open = open.retire(&id, on).unwrap();
        assert_eq!(
            confirm_inspection(&open, &id, technician("T"), december_morning()).unwrap_err(),
            expected
        );
        let unit = open.get(&id).unwrap();
        assert!(!unit.inspections[0].is_confirmed());
        assert!(unit.last_confirmed_at.is_none());
    }

    #[test]
    fn test_unknown_unit() {
        let fleet = fleet_with(&["FE-001"]);
        let missing = EquipmentId::new("nope");
        assert!(matches!(
            record_officer_check(&fleet, &missing, officer("A"), december_morning()),
            Err(WorkflowError::UnknownEquipment { .. })
        ));
    }

    #[test]
    fn test_two_officer_checks_only_newest_open() {
        let fleet = fleet_with(&["FE-001"]);
        let id = id_of(&fleet, "FE-001");
        let november = Utc.with_ymd_and_hms(2024, 11, 14, 9, 0, 0).unwrap();

        let fleet = record_officer_check(&fleet, &id, officer("A"), november).unwrap();
        let fleet = confirm_inspection(&fleet, &id, technician("T"), november).unwrap();
        let mut second = officer("B");
        second.criteria.obstruction = Obstruction::Present;
        let fleet = record_officer_check(&fleet, &id, second, december_morning()).unwrap();

        let unit = fleet.get(&id).unwrap();
        assert_eq!(unit.inspections.len(), 2);
        assert_eq!(unit.inspections[0].officer_name, "B");
        assert!(!unit.inspections[0].is_confirmed());
        assert!(unit.inspections[1].is_confirmed());
        assert_eq!(select_stage(unit), Stage::TechnicianConfirmation);

        let december = MonthPeriod::of(&december_morning());
        let resolution = resolve("fe-001", &fleet, december).unwrap();
        assert_eq!(resolution.stage, Stage::TechnicianConfirmation);

        let fleet = confirm_inspection(&fleet, &id, technician("T"), december_morning()).unwrap();
        let unit = fleet.get(&id).unwrap();
        assert!(unit.inspections.iter().all(InspectionRecord::is_confirmed));
        assert_eq!(unit.inspections[1].officer_name, "A");
    }
}
