//! Constraint violation detection.
//!
//! Compares each dependency against the entities' *current* dates (not the
//! CPM-derived ones). A dependency is violated when
//!
//! ```text
//! successor_date < predecessor_date + lag
//! ```
//!
//! where each date is taken at the dependency's anchor on that side. The
//! rule is the same for FS, SS, FF and SF; the type only decides which
//! anchors are compared. Detection never mutates anything.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::graph::ScheduleGraph;
use crate::models::{add_days, days_between, Dependency, DependencyId, ScheduleEntity};

/// Whether `successor_date` falls before `predecessor_date + lag_days`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_gantt::violation::is_violated;
///
/// let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
/// assert!(is_violated(d(10), d(5), 0));
/// assert!(!is_violated(d(10), d(12), 0));
/// assert!(is_violated(d(10), d(12), 3));
/// ```
#[inline]
pub fn is_violated(predecessor_date: NaiveDate, successor_date: NaiveDate, lag_days: i64) -> bool {
    successor_date < add_days(predecessor_date, lag_days)
}

/// Result of checking one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCheck {
    /// Checked dependency.
    pub dependency_id: DependencyId,
    /// Earliest date the successor anchor may take (predecessor date + lag).
    pub required: NaiveDate,
    /// Current date of the successor anchor.
    pub actual: NaiveDate,
    /// Whether `actual < required`.
    pub violated: bool,
}

impl DependencyCheck {
    /// Days the successor anchor would need to move later to satisfy the
    /// dependency (zero when satisfied).
    pub fn shortfall_days(&self) -> i64 {
        days_between(self.actual, self.required).max(0)
    }
}

/// Checks one dependency against two entities' current dates.
///
/// Returns `None` if either anchor date is missing.
pub fn check_between(
    dependency: &Dependency,
    predecessor: &ScheduleEntity,
    successor: &ScheduleEntity,
) -> Option<DependencyCheck> {
    let pred_date = predecessor.date_at(dependency.predecessor_point)?;
    let actual = successor.date_at(dependency.successor_point)?;
    let required = dependency.required_date(pred_date);

    Some(DependencyCheck {
        dependency_id: dependency.id,
        required,
        actual,
        violated: actual < required,
    })
}

/// Violation flags for every dependency in a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    /// One check per dependency, in graph order.
    pub checks: Vec<DependencyCheck>,
}

impl ViolationReport {
    /// Checks for violated dependencies only.
    pub fn violated(&self) -> impl Iterator<Item = &DependencyCheck> {
        self.checks.iter().filter(|c| c.violated)
    }

    /// Number of violated dependencies.
    pub fn violation_count(&self) -> usize {
        self.violated().count()
    }

    /// Whether a dependency is violated. Unknown ids are not.
    pub fn is_violated(&self, dependency_id: DependencyId) -> bool {
        self.checks
            .iter()
            .any(|c| c.dependency_id == dependency_id && c.violated)
    }

    /// Boolean flag per dependency id.
    pub fn flags(&self) -> BTreeMap<DependencyId, bool> {
        self.checks
            .iter()
            .map(|c| (c.dependency_id, c.violated))
            .collect()
    }

    /// Whether no dependency is violated.
    pub fn is_clean(&self) -> bool {
        self.checks.iter().all(|c| !c.violated)
    }
}

/// Checks every dependency of `graph` against current dates.
pub fn detect_violations(graph: &ScheduleGraph) -> ViolationReport {
    let checks = graph
        .dependencies()
        .iter()
        .filter_map(|dep| {
            let pred = graph.entity(dep.predecessor)?;
            let succ = graph.entity(dep.successor)?;
            check_between(dep, pred, succ)
        })
        .collect();

    ViolationReport { checks }
}
