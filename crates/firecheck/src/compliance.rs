//! Monthly compliance derived from inspection history.
//!
//! Nothing here is stored: every figure is recomputed from the collection and
//! a calendar month on each read. A unit counts as checked only once a
//! technician has confirmed an inspection in that month; an officer check
//! alone does not count.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde::Serialize;

use crate::fleet::Fleet;
use crate::model::{Category, Equipment};

/// A calendar month in the host's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    /// Build a period; `month` is 1-based.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing the current instant.
    #[must_use]
    pub fn current() -> Self {
        Self::of(&Utc::now())
    }

    /// The local-time month containing `instant`.
    #[must_use]
    pub fn of(instant: &DateTime<Utc>) -> Self {
        Self::of_in(instant, &Local)
    }

    /// The month containing `instant` as seen in `tz`.
    #[must_use]
    pub fn of_in<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1-based.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Whether `instant` falls in this month (local time).
    #[must_use]
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        Self::of(instant) == *self
    }
}

impl std::fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Where a unit stands for a given month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Withdrawn; not expected to be inspected.
    Retired,
    /// Confirmed by a technician this month.
    Checked,
    /// Officer check recorded, technician confirmation outstanding.
    AwaitingConfirmation,
    /// Nothing confirmed yet this month.
    Pending,
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retired => write!(f, "retired"),
            Self::Checked => write!(f, "checked"),
            Self::AwaitingConfirmation => write!(f, "awaiting confirmation"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Whether the unit's last confirmed inspection falls in `period`.
#[must_use]
pub fn is_checked(unit: &Equipment, period: MonthPeriod) -> bool {
    unit.last_confirmed_at
        .as_ref()
        .is_some_and(|at| period.contains(at))
}

/// Classify one unit for `period`.
#[must_use]
pub fn unit_status(unit: &Equipment, period: MonthPeriod) -> UnitStatus {
    if unit.is_retired() {
        UnitStatus::Retired
    } else if is_checked(unit, period) {
        UnitStatus::Checked
    } else if unit.open_inspection().is_some() {
        UnitStatus::AwaitingConfirmation
    } else {
        UnitStatus::Pending
    }
}

/// Fleet-wide figures for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceSummary {
    /// The month summarized.
    pub period: MonthPeriod,
    /// Units not retired (under maintenance included).
    pub active: usize,
    /// Retired units.
    pub retired: usize,
    /// Active units confirmed this month.
    pub checked: usize,
    /// Active units not yet confirmed this month.
    pub pending: usize,
    /// Pending units with an officer check awaiting confirmation.
    pub awaiting_confirmation: usize,
    /// `round(checked / active * 100)`, 0 with no active units.
    pub completion_percent: u32,
}

impl ComplianceSummary {
    /// Whether every active unit is checked (and there is at least one).
    #[must_use]
    pub fn is_fully_compliant(&self) -> bool {
        self.active > 0 && self.pending == 0
    }
}

/// Summarize the fleet for `period`.
#[must_use]
pub fn summarize(fleet: &Fleet, period: MonthPeriod) -> ComplianceSummary {
    let mut active = 0;
    let mut retired = 0;
    let mut checked = 0;
    let mut awaiting_confirmation = 0;

    for unit in fleet {
        match unit_status(unit, period) {
            UnitStatus::Retired => retired += 1,
            UnitStatus::Checked => {
                active += 1;
                checked += 1;
            }
            UnitStatus::AwaitingConfirmation => {
                active += 1;
                awaiting_confirmation += 1;
            }
            UnitStatus::Pending => active += 1,
        }
    }

    ComplianceSummary {
        period,
        active,
        retired,
        checked,
        pending: active - checked,
        awaiting_confirmation,
        completion_percent: completion_percent(checked, active),
    }
}

/// Rounded percentage, half away from zero.
fn completion_percent(checked: usize, active: usize) -> u32 {
    if active == 0 {
        return 0;
    }
    let percent = (checked * 100 + active / 2) / active;
    u32::try_from(percent).unwrap_or(100)
}

/// Number of registered units per category, retired included.
#[must_use]
pub fn category_breakdown(fleet: &Fleet) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for unit in fleet {
        *counts.entry(unit.category).or_insert(0) += 1;
    }
    counts
}

/// Inventory filter used by listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryFilter {
    /// Units not retired.
    Active,
    /// Active units confirmed this month.
    Checked,
    /// Active units not confirmed this month.
    Pending,
    /// Retired units.
    Retired,
}

impl InventoryFilter {
    /// Whether `unit` passes this filter for `period`.
    #[must_use]
    pub fn matches(self, unit: &Equipment, period: MonthPeriod) -> bool {
        let status = unit_status(unit, period);
        match self {
            Self::Active => status != UnitStatus::Retired,
            Self::Checked => status == UnitStatus::Checked,
            Self::Pending => matches!(
                status,
                UnitStatus::Pending | UnitStatus::AwaitingConfirmation
            ),
            Self::Retired => status == UnitStatus::Retired,
        }
    }
}
