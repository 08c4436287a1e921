//! Map a scanned or typed code to a unit and the stage that applies.

use serde::Serialize;
use tracing::debug;

use super::stage::{select_stage, Stage};
use crate::compliance::{is_checked, MonthPeriod};
use crate::error::WorkflowError;
use crate::fleet::Fleet;
use crate::model::{normalize_code, EquipmentId};

/// A successful identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Identifier of the matched unit.
    pub id: EquipmentId,
    /// Its human code.
    pub code: String,
    /// The stage to present.
    pub stage: Stage,
}

/// Resolve `raw` against the collection for the month `period`.
///
/// The code is trimmed and uppercased before an exact match, so scanned
/// `fe-001` and typed `FE-001` resolve identically. Pure: safe to call on
/// every decoded frame.
///
/// # Errors
///
/// - [`WorkflowError::NotFound`] when no unit has the code
/// - [`WorkflowError::Retired`] when the unit is retired
/// - [`WorkflowError::AlreadyCompliant`] when it was confirmed in `period`
pub fn resolve(raw: &str, fleet: &Fleet, period: MonthPeriod) -> Result<Resolution, WorkflowError> {
    let code = normalize_code(raw);
    let unit = fleet
        .iter()
        .find(|u| normalize_code(&u.code) == code)
        .ok_or_else(|| WorkflowError::NotFound { code: code.clone() })?;

    if unit.is_retired() {
        return Err(WorkflowError::Retired { code });
    }
    if is_checked(unit, period) {
        return Err(WorkflowError::AlreadyCompliant { code });
    }

    let stage = select_stage(unit);
    debug!(code = %code, stage = stage.number(), "Resolved fire extinguisher");
    Ok(Resolution {
        id: unit.id.clone(),
        code,
        stage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::tests::fleet_with;
    use crate::model::Equipment;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn december() -> MonthPeriod {
        MonthPeriod::new(2024, 12).unwrap()
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let fleet = fleet_with(&["FE-001", "FE-002"]);
        for raw in ["FE-003", "", "FE-0011", "FE 001"] {
            assert_eq!(
                resolve(raw, &fleet, december()).unwrap_err(),
                WorkflowError::NotFound {
                    code: normalize_code(raw)
                },
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_empty_fleet_is_not_found() {
        assert!(matches!(
            resolve("FE-001", &Fleet::new(), december()),
            Err(WorkflowError::NotFound { .. })
        ));
    }

    #[test]
    fn test_scanned_lowercase_matches_typed() {
        let fleet = fleet_with(&["FE-001"]);
        let scanned = resolve("fe-001", &fleet, december()).unwrap();
        let typed = resolve("FE-001", &fleet, december()).unwrap();
        assert_eq!(scanned, typed);
        assert_eq!(scanned.code, "FE-001");
        assert_eq!(scanned.stage, Stage::OfficerCheck);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let fleet = fleet_with(&["FE-001"]);
        assert!(resolve("  FE-001\n", &fleet, december()).is_ok());
    }

    #[test]
    fn test_retired_unit() {
        let fleet = fleet_with(&["FE-001"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let fleet = fleet
            .retire(&id, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap())
            .unwrap();
        assert_eq!(
            resolve("fe-001", &fleet, december()).unwrap_err(),
            WorkflowError::Retired {
                code: "FE-001".to_string()
            }
        );
    }

    #[test]
    fn test_already_compliant_only_within_period() {
        let fleet = fleet_with(&["FE-001"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let confirmed_at = Utc.with_ymd_and_hms(2024, 12, 10, 9, 0, 0).unwrap();
        let fleet = fleet
            .replace(&id, |u| {
                Ok(Equipment {
                    last_confirmed_at: Some(confirmed_at),
                    ..u.clone()
                })
            })
            .unwrap();

        assert_eq!(
            resolve("FE-001", &fleet, december()).unwrap_err(),
            WorkflowError::AlreadyCompliant {
                code: "FE-001".to_string()
            }
        );
        let january = MonthPeriod::new(2025, 1).unwrap();
        assert!(resolve("FE-001", &fleet, january).is_ok());
    }
}
