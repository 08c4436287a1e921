//! Domain types: equipment units and their inspection records.

mod equipment;
mod inspection;

pub use equipment::{normalize_code, Category, Equipment, EquipmentId, LifecycleStatus};
pub use inspection::{
    Condition, Criterion, InspectionCriteria, InspectionRecord, Obstruction, Pressure,
    TechnicianSignoff, Verdict,
};
