//! One inspector's pass through identify -> inspect -> identify.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::builder::{confirm_inspection, record_officer_check, OfficerCheck, TechnicianConfirmation};
use super::resolver::{resolve, Resolution};
use super::stage::Stage;
use crate::compliance::MonthPeriod;
use crate::error::WorkflowError;
use crate::fleet::Fleet;
use crate::model::EquipmentId;
use crate::scan::ScanExit;

/// How the unit code is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    /// Camera scanning.
    #[default]
    Scan,
    /// Typed code.
    Manual,
}

/// Where the session is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Step {
    /// Waiting for a code.
    #[default]
    Identify,
    /// A unit is selected and its stage form is open.
    Inspect {
        /// Selected unit.
        id: EquipmentId,
        /// Its code.
        code: String,
        /// Stage that applies.
        stage: Stage,
    },
}

/// Tracks entry mode and the selected unit between submissions.
///
/// The session never owns the collection: submissions take the current
/// [`Fleet`] and hand back its replacement.
#[derive(Debug, Clone, Default)]
pub struct InspectionSession {
    mode: EntryMode,
    step: Step,
}

impl InspectionSession {
    /// A session waiting for a scan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry mode.
    #[must_use]
    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> &Step {
        &self.step
    }

    /// Switch between scanning and manual entry.
    pub fn set_mode(&mut self, mode: EntryMode) {
        self.mode = mode;
    }

    /// Resolve a typed or scanned code and open its stage form.
    ///
    /// # Errors
    ///
    /// Any resolution error; the session stays at [`Step::Identify`].
    pub fn identify(
        &mut self,
        raw: &str,
        fleet: &Fleet,
        period: MonthPeriod,
    ) -> Result<Stage, WorkflowError> {
        let resolution = resolve(raw, fleet, period)?;
        Ok(self.select(resolution))
    }

    /// Take the result of a finished scan.
    ///
    /// A resolution opens the stage form and a cancelled scan changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns the device error after switching to [`EntryMode::Manual`].
    pub fn accept_scan(&mut self, exit: ScanExit) -> Result<Option<Stage>, WorkflowError> {
        match exit {
            ScanExit::Resolved(resolution) => Ok(Some(self.select(resolution))),
            ScanExit::Cancelled => Ok(None),
            ScanExit::DeviceUnavailable(error) => {
                warn!(error = %error, "Scanning unavailable, using manual entry");
                self.mode = EntryMode::Manual;
                Err(error)
            }
        }
    }

    /// Submit the stage 1 form for the selected unit.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::NoSelection`], [`WorkflowError::StageMismatch`], or
    /// any error from [`record_officer_check`]. The selection is kept on
    /// error so the form can be corrected.
    pub fn submit_officer_check(
        &mut self,
        fleet: &Fleet,
        check: OfficerCheck,
        now: DateTime<Utc>,
    ) -> Result<Fleet, WorkflowError> {
        let id = self.selected(Stage::OfficerCheck)?;
        let updated = record_officer_check(fleet, &id, check, now)?;
        self.cancel();
        Ok(updated)
    }

    /// Submit the stage 2 form for the selected unit.
    ///
    /// # Errors
    ///
    /// As [`InspectionSession::submit_officer_check`], with the errors of
    /// [`confirm_inspection`].
    pub fn submit_confirmation(
        &mut self,
        fleet: &Fleet,
        confirmation: TechnicianConfirmation,
        now: DateTime<Utc>,
    ) -> Result<Fleet, WorkflowError> {
        let id = self.selected(Stage::TechnicianConfirmation)?;
        let updated = confirm_inspection(fleet, &id, confirmation, now)?;
        self.cancel();
        Ok(updated)
    }

    /// Drop the selection and go back to identification.
    pub fn cancel(&mut self) {
        self.step = Step::Identify;
    }

    fn select(&mut self, resolution: Resolution) -> Stage {
        debug!(code = %resolution.code, stage = resolution.stage.number(), "Opened inspection form");
        let stage = resolution.stage;
        self.step = Step::Inspect {
            id: resolution.id,
            code: resolution.code,
            stage,
        };
        stage
    }

    fn selected(&self, requested: Stage) -> Result<EquipmentId, WorkflowError> {
        match &self.step {
            Step::Identify => Err(WorkflowError::NoSelection),
            Step::Inspect { id, stage, .. } if *stage == requested => Ok(id.clone()),
            Step::Inspect { stage, .. } => Err(WorkflowError::StageMismatch {
                expected: stage.number(),
                requested: requested.number(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::tests::fleet_with;
    use crate::workflow::builder::tests::{december_morning, officer, technician};

    fn december() -> MonthPeriod {
        MonthPeriod::of(&december_morning())
    }

    #[test]
    fn test_full_two_stage_pass() {
        let fleet = fleet_with(&["FE-001"]);
        let mut session = InspectionSession::new();

        assert_eq!(
            session.identify("fe-001", &fleet, december()).unwrap(),
            Stage::OfficerCheck
        );
        let fleet = session
            .submit_officer_check(&fleet, officer("Somchai"), december_morning())
            .unwrap();
        assert_eq!(session.step(), &Step::Identify);

        assert_eq!(
            session.identify("FE-001", &fleet, december()).unwrap(),
            Stage::TechnicianConfirmation
        );
        let fleet = session
            .submit_confirmation(&fleet, technician("Anan"), december_morning())
            .unwrap();
        assert_eq!(session.step(), &Step::Identify);

        assert_eq!(
            session.identify("FE-001", &fleet, december()).unwrap_err(),
            WorkflowError::AlreadyCompliant {
                code: "FE-001".to_string()
            }
        );
        assert_eq!(session.step(), &Step::Identify);
    }

    #[test]
    fn test_submit_without_selection() {
        let fleet = fleet_with(&["FE-001"]);
        let mut session = InspectionSession::new();
        assert_eq!(
            session
                .submit_officer_check(&fleet, officer("A"), december_morning())
                .unwrap_err(),
            WorkflowError::NoSelection
        );
    }

    #[test]
    fn test_submit_wrong_stage() {
        let fleet = fleet_with(&["FE-001"]);
        let mut session = InspectionSession::new();
        session.identify("FE-001", &fleet, december()).unwrap();
        assert_eq!(
            session
                .submit_confirmation(&fleet, technician("T"), december_morning())
                .unwrap_err(),
            WorkflowError::StageMismatch {
                expected: 1,
                requested: 2
            }
        );
        assert!(matches!(session.step(), Step::Inspect { .. }));
    }

    #[test]
    fn test_failed_submission_keeps_selection() {
        let fleet = fleet_with(&["FE-001"]);
        let mut session = InspectionSession::new();
        session.identify("FE-001", &fleet, december()).unwrap();
        assert!(session
            .submit_officer_check(&fleet, officer(""), december_morning())
            .is_err());
        assert!(matches!(session.step(), Step::Inspect { code, .. } if code == "FE-001"));

        session.cancel();
        assert_eq!(session.step(), &Step::Identify);
    }

    #[test]
    fn test_device_failure_switches_to_manual() {
        let mut session = InspectionSession::new();
        assert_eq!(session.mode(), EntryMode::Scan);
        let err = session
            .accept_scan(ScanExit::DeviceUnavailable(
                WorkflowError::device_unavailable("no camera"),
            ))
            .unwrap_err();
        assert!(err.forces_manual_entry());
        assert_eq!(session.mode(), EntryMode::Manual);
        assert_eq!(session.step(), &Step::Identify);
    }

    #[test]
    fn test_scan_result_opens_form() {
        let fleet = fleet_with(&["FE-001"]);
        let resolution = resolve("FE-001", &fleet, december()).unwrap();
        let mut session = InspectionSession::new();

        assert_eq!(session.accept_scan(ScanExit::Cancelled).unwrap(), None);
        assert_eq!(session.step(), &Step::Identify);
        assert_eq!(
            session.accept_scan(ScanExit::Resolved(resolution)).unwrap(),
            Some(Stage::OfficerCheck)
        );
        assert!(matches!(
            session.step(),
            Step::Inspect {
                stage: Stage::OfficerCheck,
                ..
            }
        ));
    }

    #[test]
    fn test_retired_unit_creates_no_record() {
        let fleet = fleet_with(&["FE-001"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let fleet = fleet
            .retire(&id, chrono::NaiveDate::from_ymd_opt(2024, 11, 1).unwrap())
            .unwrap();
        let mut session = InspectionSession::new();

        assert_eq!(
            session.identify("fe-001", &fleet, december()).unwrap_err(),
            WorkflowError::Retired {
                code: "FE-001".to_string()
            }
        );
        assert_eq!(
            session
                .submit_officer_check(&fleet, officer("A"), december_morning())
                .unwrap_err(),
            WorkflowError::NoSelection
        );
        assert!(fleet.get(&id).unwrap().inspections.is_empty());
    }

    #[test]
    fn test_unit_retired_after_identify_is_refused() {
        let fleet = fleet_with(&["FE-001"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let mut session = InspectionSession::new();
        session.identify("FE-001", &fleet, december()).unwrap();

        let retired = fleet
            .retire(&id, chrono::NaiveDate::from_ymd_opt(2024, 12, 1).unwrap())
            .unwrap();
        assert_eq!(
            session
                .submit_officer_check(&retired, officer("A"), december_morning())
                .unwrap_err(),
            WorkflowError::Retired {
                code: "FE-001".to_string()
            }
        );
        assert!(retired.get(&id).unwrap().inspections.is_empty());
    }
}
