//! Fire extinguisher units.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::inspection::InspectionRecord;
use crate::error::WorkflowError;

/// Normalize a human code for comparison and storage (trim, uppercase).
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Opaque unit identifier. Compared case-insensitively.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(String);

impl EquipmentId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for EquipmentId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extinguishing agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Dry chemical powder.
    DryChemical,
    /// Carbon dioxide.
    Co2,
    /// Foam.
    Foam,
    /// Stored-pressure water.
    Water,
    /// Clean agent (halocarbon).
    CleanAgent,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::DryChemical,
        Self::Co2,
        Self::Foam,
        Self::Water,
        Self::CleanAgent,
    ];

    /// The wire name of this category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DryChemical => "dry_chemical",
            Self::Co2 => "co2",
            Self::Foam => "foam",
            Self::Water => "water",
            Self::CleanAgent => "clean_agent",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| WorkflowError::invalid_value("category", s))
    }
}

/// Lifecycle status of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStatus {
    /// In service.
    #[default]
    Active,
    /// Withdrawn from service; never inspected again.
    Retired,
    /// Sent for repair. Still counted as active for compliance.
    UnderMaintenance,
}

impl LifecycleStatus {
    /// The wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retired => "retired",
            Self::UnderMaintenance => "under-maintenance",
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "active" => Ok(Self::Active),
            "retired" => Ok(Self::Retired),
            "under-maintenance" | "maintenance" => Ok(Self::UnderMaintenance),
            _ => Err(WorkflowError::invalid_value("status", s)),
        }
    }
}

/// One physical fire extinguisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Opaque identifier.
    pub id: EquipmentId,
    /// Human code printed on the unit and its QR label, uppercase.
    pub code: String,
    /// Extinguishing agent.
    pub category: Category,
    /// Where the unit is installed.
    pub location: String,
    /// Department responsible for the first-line check.
    pub department: String,
    /// Nominal capacity as labelled, e.g. "15 lbs".
    pub capacity: String,
    /// Lifecycle status.
    pub status: LifecycleStatus,
    /// Date the unit was installed or registered.
    pub installed_on: NaiveDate,
    /// Date the unit was retired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retired_on: Option<NaiveDate>,
    /// Timestamp of the last technician confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_confirmed_at: Option<DateTime<Utc>>,
    /// Inspection history, newest first.
    #[serde(default)]
    pub inspections: Vec<InspectionRecord>,
}

impl Equipment {
    /// Whether the unit has been withdrawn.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.status == LifecycleStatus::Retired
    }

    /// Whether the given code (any case, surrounding whitespace) is this unit's.
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        normalize_code(&self.code) == normalize_code(code)
    }

    /// The newest inspection record, if any.
    #[must_use]
    pub fn latest_inspection(&self) -> Option<&InspectionRecord> {
        self.inspections.first()
    }

    /// The newest record if it still awaits technician confirmation.
    #[must_use]
    pub fn open_inspection(&self) -> Option<&InspectionRecord> {
        self.latest_inspection().filter(|r| !r.is_confirmed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  fe-001 "), "FE-001");
        assert_eq!(normalize_code("FE-001"), "FE-001");
    }

    #[test]
    fn test_equipment_id_case_insensitive() {
        assert_eq!(EquipmentId::new("AbC-1"), EquipmentId::new("abc-1"));
        assert_ne!(EquipmentId::new("abc-1"), EquipmentId::new("abc-2"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(EquipmentId::generate(), EquipmentId::generate());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("co2".parse::<Category>().unwrap(), Category::Co2);
        assert_eq!(
            "Dry-Chemical".parse::<Category>().unwrap(),
            Category::DryChemical
        );
        assert!("halon".parse::<Category>().is_err());
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!(
            "under_maintenance".parse::<LifecycleStatus>().unwrap(),
            LifecycleStatus::UnderMaintenance
        );
        assert_eq!(LifecycleStatus::UnderMaintenance.to_string(), "under-maintenance");
        assert!("scrapped".parse::<LifecycleStatus>().is_err());
    }

    #[test]
    fn test_status_serde_kebab_case() {
        let json = serde_json::to_string(&LifecycleStatus::UnderMaintenance).unwrap();
        assert_eq!(json, "\"under-maintenance\"");
    }

    #[test]
    fn test_has_code() {
        let unit = Equipment {
            id: EquipmentId::new("1"),
            code: "FE-001".to_string(),
            category: Category::DryChemical,
            location: "Lobby".to_string(),
            department: "Admin".to_string(),
            capacity: "15 lbs".to_string(),
            status: LifecycleStatus::Active,
            installed_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            retired_on: None,
            last_confirmed_at: None,
            inspections: Vec::new(),
        };
        assert!(unit.has_code(" fe-001"));
        assert!(!unit.has_code("FE-002"));
        assert!(unit.latest_inspection().is_none());
        assert!(unit.open_inspection().is_none());
    }
}
