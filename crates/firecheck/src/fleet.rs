//! The equipment collection.
//!
//! [`Fleet`] is the single source of truth for every unit and its history.
//! It is never mutated in place: every operation borrows the current value
//! and returns a replacement, so a failed operation leaves the caller's
//! collection untouched.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorkflowError;
use crate::model::{normalize_code, Category, Equipment, EquipmentId, LifecycleStatus};

/// Input for creating or editing a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentDraft {
    /// Human code (normalized on save).
    pub code: String,
    /// Extinguishing agent.
    pub category: Category,
    /// Install location.
    pub location: String,
    /// Owning department.
    pub department: String,
    /// Nominal capacity.
    pub capacity: String,
    /// Lifecycle status.
    pub status: LifecycleStatus,
    /// Install date.
    pub installed_on: NaiveDate,
    /// Retire date, required when `status` is retired.
    pub retired_on: Option<NaiveDate>,
}

impl EquipmentDraft {
    /// Start a draft from an existing unit, for editing.
    #[must_use]
    pub fn from_equipment(unit: &Equipment) -> Self {
        Self {
            code: unit.code.clone(),
            category: unit.category,
            location: unit.location.clone(),
            department: unit.department.clone(),
            capacity: unit.capacity.clone(),
            status: unit.status,
            installed_on: unit.installed_on,
            retired_on: unit.retired_on,
        }
    }
}

/// Rules applied to human codes on create and edit.
#[derive(Debug, Clone, Default)]
pub struct CodeRules {
    pattern: Option<Regex>,
}

impl CodeRules {
    /// Accept any non-empty code.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require normalized codes to match `pattern`.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error for an invalid pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
        })
    }

    fn check(&self, code: &str) -> Result<(), WorkflowError> {
        match &self.pattern {
            Some(re) if !re.is_match(code) => Err(WorkflowError::InvalidCodeFormat {
                code: code.to_string(),
                pattern: re.as_str().to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// The full equipment collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fleet {
    units: Vec<Equipment>,
}

impl Fleet {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing list of units.
    #[must_use]
    pub fn from_units(units: Vec<Equipment>) -> Self {
        Self { units }
    }

    /// All units in registration order.
    #[must_use]
    pub fn units(&self) -> &[Equipment] {
        &self.units
    }

    /// Iterate over all units.
    pub fn iter(&self) -> std::slice::Iter<'_, Equipment> {
        self.units.iter()
    }

    /// Number of units, retired included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the collection has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Look up a unit by identifier.
    #[must_use]
    pub fn get(&self, id: &EquipmentId) -> Option<&Equipment> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// Look up a unit by human code, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Equipment> {
        let code = normalize_code(code);
        self.units.iter().find(|u| normalize_code(&u.code) == code)
    }

    /// Look up a unit by code, failing with [`WorkflowError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no unit has the code.
    pub fn require_code(&self, code: &str) -> Result<&Equipment, WorkflowError> {
        self.find_by_code(code).ok_or_else(|| WorkflowError::NotFound {
            code: normalize_code(code),
        })
    }

    /// Units whose code or location contains `term`, ignoring case.
    pub fn search<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a Equipment> + 'a {
        let term = term.trim().to_lowercase();
        self.units.iter().filter(move |u| {
            term.is_empty()
                || u.code.to_lowercase().contains(&term)
                || u.location.to_lowercase().contains(&term)
        })
    }

    /// Register a new unit.
    ///
    /// Returns the new collection and the identifier assigned to the unit.
    ///
    /// # Errors
    ///
    /// Fails if the draft is incomplete, the code breaks `rules`, or the code
    /// is already in use.
    pub fn add(
        &self,
        draft: EquipmentDraft,
        rules: &CodeRules,
    ) -> Result<(Self, EquipmentId), WorkflowError> {
        let code = self.validate_draft(&draft, rules, None)?;
        let id = EquipmentId::generate();
        let unit = Equipment {
            id: id.clone(),
            code,
            category: draft.category,
            location: draft.location.trim().to_string(),
            department: draft.department.trim().to_string(),
            capacity: draft.capacity.trim().to_string(),
            status: draft.status,
            installed_on: draft.installed_on,
            retired_on: retire_date_for(draft.status, draft.retired_on),
            last_confirmed_at: None,
            inspections: Vec::new(),
        };
        debug!(id = %id, code = %unit.code, "Registered fire extinguisher");

        let mut units = self.units.clone();
        units.push(unit);
        Ok((Self { units }, id))
    }

    /// Replace a unit's registration fields.
    ///
    /// Inspection history and the last confirmation date are kept.
    ///
    /// # Errors
    ///
    /// Fails if the unit is unknown, the draft is incomplete, the code breaks
    /// `rules`, or the code is used by another unit.
    pub fn update(
        &self,
        id: &EquipmentId,
        draft: EquipmentDraft,
        rules: &CodeRules,
    ) -> Result<Self, WorkflowError> {
        let code = self.validate_draft(&draft, rules, Some(id))?;
        self.replace(id, |unit| {
            Ok(Equipment {
                code,
                category: draft.category,
                location: draft.location.trim().to_string(),
                department: draft.department.trim().to_string(),
                capacity: draft.capacity.trim().to_string(),
                status: draft.status,
                installed_on: draft.installed_on,
                retired_on: retire_date_for(draft.status, draft.retired_on),
                ..unit.clone()
            })
        })
    }

    /// Withdraw a unit from service on the given date.
    ///
    /// # Errors
    ///
    /// Fails if the unit is unknown.
    pub fn retire(&self, id: &EquipmentId, on: NaiveDate) -> Result<Self, WorkflowError> {
        self.replace(id, |unit| {
            Ok(Equipment {
                status: LifecycleStatus::Retired,
                retired_on: Some(on),
                ..unit.clone()
            })
        })
    }

    /// Delete a unit together with its inspection history.
    ///
    /// # Errors
    ///
    /// Fails if the unit is unknown.
    pub fn remove(&self, id: &EquipmentId) -> Result<Self, WorkflowError> {
        if self.get(id).is_none() {
            return Err(unknown(id));
        }
        let units = self.units.iter().filter(|u| &u.id != id).cloned().collect();
        debug!(id = %id, "Deleted fire extinguisher");
        Ok(Self { units })
    }

    /// Return a collection where the unit `id` is replaced by `f(unit)`.
    ///
    /// `f` sees the current unit; on error the collection is not rebuilt.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownEquipment` if `id` is absent, or with `f`'s error.
    pub fn replace<F>(&self, id: &EquipmentId, f: F) -> Result<Self, WorkflowError>
    where
        F: FnOnce(&Equipment) -> Result<Equipment, WorkflowError>,
    {
        let index = self
            .units
            .iter()
            .position(|u| &u.id == id)
            .ok_or_else(|| unknown(id))?;
        let replacement = f(&self.units[index])?;

        let mut units = self.units.clone();
        units[index] = replacement;
        Ok(Self { units })
    }

    fn validate_draft(
        &self,
        draft: &EquipmentDraft,
        rules: &CodeRules,
        editing: Option<&EquipmentId>,
    ) -> Result<String, WorkflowError> {
        let code = normalize_code(&draft.code);
        if code.is_empty() {
            return Err(WorkflowError::MissingField { field: "code" });
        }
        if draft.location.trim().is_empty() {
            return Err(WorkflowError::MissingField { field: "location" });
        }
        if draft.department.trim().is_empty() {
            return Err(WorkflowError::MissingField { field: "department" });
        }
        if draft.status == LifecycleStatus::Retired && draft.retired_on.is_none() {
            return Err(WorkflowError::MissingField { field: "retired_on" });
        }
        rules.check(&code)?;

        let taken = self
            .units
            .iter()
            .any(|u| normalize_code(&u.code) == code && Some(&u.id) != editing);
        if taken {
            return Err(WorkflowError::DuplicateCode { code });
        }
        Ok(code)
    }
}

impl<'a> IntoIterator for &'a Fleet {
    type Item = &'a Equipment;
    type IntoIter = std::slice::Iter<'a, Equipment>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

/// Only retired units keep a retire date.
fn retire_date_for(status: LifecycleStatus, date: Option<NaiveDate>) -> Option<NaiveDate> {
    if status == LifecycleStatus::Retired {
        date
    } else {
        None
    }
}

fn unknown(id: &EquipmentId) -> WorkflowError {
    WorkflowError::UnknownEquipment { id: id.to_string() }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn draft(code: &str) -> EquipmentDraft {
        EquipmentDraft {
            code: code.to_string(),
            category: Category::DryChemical,
            location: "Ground floor corridor".to_string(),
            department: "Administration".to_string(),
            capacity: "15 lbs".to_string(),
            status: LifecycleStatus::Active,
            installed_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            retired_on: None,
        }
    }

    pub(crate) fn fleet_with(codes: &[&str]) -> Fleet {
        let rules = CodeRules::new();
        codes.iter().fold(Fleet::new(), |fleet, code| {
            fleet.add(draft(code), &rules).unwrap().0
        })
    }

    #[test]
    fn test_add_normalizes_code() {
        let (fleet, id) = Fleet::new().add(draft("  fe-001 "), &CodeRules::new()).unwrap();
        let unit = fleet.get(&id).unwrap();
        assert_eq!(unit.code, "FE-001");
        assert!(unit.inspections.is_empty());
        assert!(unit.last_confirmed_at.is_none());
    }

    #[test]
    fn test_add_leaves_original_untouched() {
        let original = fleet_with(&["FE-001"]);
        let (updated, _) = original.add(draft("FE-002"), &CodeRules::new()).unwrap();
        assert_eq!(original.len(), 1);
        assert_eq!(updated.len(), 2);
    }

    #[test]
    fn test_add_rejects_duplicate_code_case_insensitive() {
        let fleet = fleet_with(&["FE-001"]);
        let err = fleet.add(draft("fe-001"), &CodeRules::new()).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::DuplicateCode {
                code: "FE-001".to_string()
            }
        );
    }

    #[test]
    fn test_add_requires_fields() {
        let mut d = draft("FE-001");
        d.location = "   ".to_string();
        assert_eq!(
            Fleet::new().add(d, &CodeRules::new()).unwrap_err(),
            WorkflowError::MissingField { field: "location" }
        );

        let d = draft("  ");
        assert_eq!(
            Fleet::new().add(d, &CodeRules::new()).unwrap_err(),
            WorkflowError::MissingField { field: "code" }
        );
    }

    #[test]
    fn test_retired_draft_requires_date() {
        let mut d = draft("FE-001");
        d.status = LifecycleStatus::Retired;
        assert_eq!(
            Fleet::new().add(d.clone(), &CodeRules::new()).unwrap_err(),
            WorkflowError::MissingField { field: "retired_on" }
        );

        d.retired_on = NaiveDate::from_ymd_opt(2024, 6, 1);
        let (fleet, id) = Fleet::new().add(d, &CodeRules::new()).unwrap();
        assert!(fleet.get(&id).unwrap().is_retired());
    }

    #[test]
    fn test_code_pattern() {
        let rules = CodeRules::with_pattern(r"^FE-\d{3}$").unwrap();
        assert!(Fleet::new().add(draft("fe-001"), &rules).is_ok());
        let err = Fleet::new().add(draft("X1"), &rules).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCodeFormat { .. }));
    }

    #[test]
    fn test_update_keeps_own_code_and_history() {
        let fleet = fleet_with(&["FE-001", "FE-002"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();

        let mut d = EquipmentDraft::from_equipment(fleet.get(&id).unwrap());
        d.location = "Server room".to_string();
        let updated = fleet.update(&id, d, &CodeRules::new()).unwrap();
        assert_eq!(updated.get(&id).unwrap().location, "Server room");
        assert_eq!(updated.get(&id).unwrap().code, "FE-001");
    }

    #[test]
    fn test_update_rejects_other_units_code() {
        let fleet = fleet_with(&["FE-001", "FE-002"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let err = fleet
            .update(&id, draft("FE-002"), &CodeRules::new())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateCode { .. }));
    }

    #[test]
    fn test_update_clears_retire_date_when_reactivated() {
        let fleet = fleet_with(&["FE-001"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let retired = fleet
            .retire(&id, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .unwrap();

        let mut d = EquipmentDraft::from_equipment(retired.get(&id).unwrap());
        d.status = LifecycleStatus::Active;
        let active = retired.update(&id, d, &CodeRules::new()).unwrap();
        assert!(active.get(&id).unwrap().retired_on.is_none());
    }

    #[test]
    fn test_retire_sets_date() {
        let fleet = fleet_with(&["FE-001"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let retired = fleet.retire(&id, date).unwrap();
        let unit = retired.get(&id).unwrap();
        assert!(unit.is_retired());
        assert_eq!(unit.retired_on, Some(date));
        assert!(!fleet.get(&id).unwrap().is_retired());
    }

    #[test]
    fn test_remove() {
        let fleet = fleet_with(&["FE-001", "FE-002"]);
        let id = fleet.find_by_code("FE-001").unwrap().id.clone();
        let smaller = fleet.remove(&id).unwrap();
        assert_eq!(smaller.len(), 1);
        assert!(smaller.find_by_code("FE-001").is_none());
        assert!(matches!(
            smaller.remove(&id).unwrap_err(),
            WorkflowError::UnknownEquipment { .. }
        ));
    }

    #[test]
    fn test_search_by_code_or_location() {
        let fleet = fleet_with(&["FE-001", "CO-002"]);
        assert_eq!(fleet.search("fe").count(), 1);
        assert_eq!(fleet.search("CORRIDOR").count(), 2);
        assert_eq!(fleet.search("").count(), 2);
        assert_eq!(fleet.search("basement").count(), 0);
    }

    #[test]
    fn test_require_code_not_found() {
        let fleet = fleet_with(&["FE-001"]);
        assert_eq!(
            fleet.require_code(" fe-009 ").unwrap_err(),
            WorkflowError::NotFound {
                code: "FE-009".to_string()
            }
        );
    }

    #[test]
    fn test_serializes_as_list() {
        let fleet = fleet_with(&["FE-001"]);
        let json = serde_json::to_string(&fleet).unwrap();
        assert!(json.starts_with('['));
        let back: Fleet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fleet);
    }
}
