//! `firecheck` - Fire extinguisher registry with a two-stage monthly
//! inspection workflow.
//!
//! A unit is identified by scanning its QR label or typing its code, a
//! department officer records a five-point check (stage 1), and a technician
//! confirms it (stage 2). Monthly compliance is derived from confirmations.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod compliance;
pub mod config;
pub mod error;
pub mod fleet;
pub mod label;
pub mod logging;
pub mod model;
pub mod scan;
pub mod storage;
pub mod workflow;

pub use compliance::{summarize, ComplianceSummary, MonthPeriod, UnitStatus};
pub use config::Config;
pub use error::{Error, Result, WorkflowError};
pub use fleet::{CodeRules, EquipmentDraft, Fleet};
pub use label::Label;
pub use logging::init_logging;
pub use storage::{HistoryStore, Storage, StoreStats};
pub use workflow::{resolve, select_stage, InspectionSession, Resolution, Stage};
