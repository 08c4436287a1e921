//! The two-stage inspection workflow.
//!
//! A code is resolved to a unit and a stage, the officer records stage 1,
//! and a technician closes it with stage 2. Only stage 2 makes a unit count
//! as checked for the month.

mod builder;
mod resolver;
mod session;
mod stage;

pub use builder::{confirm_inspection, record_officer_check, OfficerCheck, TechnicianConfirmation};
pub use resolver::{resolve, Resolution};
pub use session::{EntryMode, InspectionSession, Step};
pub use stage::{select_stage, Stage};
