//! Records exchanged with the host's persistence layer.
//!
//! Field names follow the host's camelCase JSON. These are converted into
//! [`ScheduleEntity`] and [`Dependency`] values before graph building.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dependency::{Dependency, DependencyId, DependencyType};
use super::entity::{Anchor, EntityId, EntityKind, EntityRef, ScheduleEntity};

/// Project row as read from the store.
///
/// Committed dates win over desired dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: EntityId,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub desired_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub desired_completion_date: Option<NaiveDate>,
}

impl ProjectRecord {
    /// Creates a record with committed dates.
    pub fn new(id: EntityId, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id,
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    /// Effective start: `startDate`, else `desiredStartDate`.
    pub fn effective_start(&self) -> Option<NaiveDate> {
        self.start_date.or(self.desired_start_date)
    }

    /// Effective end: `endDate`, else `desiredCompletionDate`.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.end_date.or(self.desired_completion_date)
    }

    /// Converts to a schedulable entity.
    pub fn to_entity(&self) -> ScheduleEntity {
        ScheduleEntity::project(self.id, self.effective_start(), self.effective_end())
    }
}

/// Milestone row as read from the store.
///
/// Only planned dates are scheduled; actual dates are informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneRecord {
    pub id: EntityId,
    pub project_id: EntityId,
    #[serde(default)]
    pub planned_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub planned_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_end_date: Option<NaiveDate>,
}

impl MilestoneRecord {
    /// Creates a point milestone planned at `date`.
    pub fn new(id: EntityId, project_id: EntityId, date: NaiveDate) -> Self {
        Self {
            id,
            project_id,
            planned_end_date: Some(date),
            ..Self::default()
        }
    }

    /// Converts to a schedulable entity.
    ///
    /// `end = plannedEndDate`; `start = plannedStartDate`, falling back to
    /// the end so the milestone is a point.
    pub fn to_entity(&self) -> ScheduleEntity {
        ScheduleEntity {
            reference: EntityRef::Milestone(self.id),
            start: self.planned_start_date.or(self.planned_end_date),
            end: self.planned_end_date,
            project_id: Some(self.project_id),
        }
    }
}

/// Dependency row as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    pub id: DependencyId,
    pub predecessor_type: EntityKind,
    pub predecessor_id: EntityId,
    pub predecessor_point: Anchor,
    pub successor_type: EntityKind,
    pub successor_id: EntityId,
    pub successor_point: Anchor,
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub lag_days: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl DependencyRecord {
    /// Converts to a typed dependency.
    pub fn to_dependency(&self) -> Dependency {
        Dependency {
            id: self.id,
            predecessor: EntityRef::new(self.predecessor_type, self.predecessor_id),
            predecessor_point: self.predecessor_point,
            successor: EntityRef::new(self.successor_type, self.successor_id),
            successor_point: self.successor_point,
            dependency_type: self.dependency_type,
            lag_days: self.lag_days,
            active: self.is_active,
        }
    }
}

impl From<&DependencyRecord> for Dependency {
    fn from(record: &DependencyRecord) -> Self {
        record.to_dependency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    #[test]
    fn test_project_desired_dates_fallback() {
        let json = r#"{"id": 4, "desiredStartDate": "2025-02-01", "endDate": "2025-03-01",
                       "desiredCompletionDate": "2025-04-01"}"#;
        let record: ProjectRecord = serde_json::from_str(json).unwrap();
        let entity = record.to_entity();
        assert_eq!(entity.reference, EntityRef::Project(4));
        assert_eq!(entity.start, Some(d(2, 1)));
        assert_eq!(entity.end, Some(d(3, 1)));
    }

    #[test]
    fn test_milestone_point_from_planned_end() {
        let json = r#"{"id": 9, "projectId": 4, "plannedEndDate": "2025-02-10",
                       "actualEndDate": "2025-02-12"}"#;
        let record: MilestoneRecord = serde_json::from_str(json).unwrap();
        let entity = record.to_entity();
        assert_eq!(entity.start, Some(d(2, 10)));
        assert_eq!(entity.end, Some(d(2, 10)));
        assert_eq!(entity.project_id, Some(4));
    }

    #[test]
    fn test_milestone_with_planned_start() {
        let mut record = MilestoneRecord::new(9, 4, d(2, 10));
        record.planned_start_date = Some(d(2, 5));
        assert_eq!(record.to_entity().duration_days(), Some(5));
    }

    #[test]
    fn test_dependency_record_conversion() {
        let json = r#"{
            "id": 12,
            "predecessorType": "project", "predecessorId": 1, "predecessorPoint": "end",
            "successorType": "milestone", "successorId": 3, "successorPoint": "start",
            "dependencyType": "FS", "lagDays": -2
        }"#;
        let record: DependencyRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_active);
        let dep = Dependency::from(&record);
        assert_eq!(dep.predecessor, EntityRef::Project(1));
        assert_eq!(dep.successor, EntityRef::Milestone(3));
        assert_eq!(dep.lag_days, -2);
        assert_eq!(dep.dependency_type, DependencyType::FinishToStart);
    }
}
