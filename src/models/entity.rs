//! Schedulable entities.
//!
//! Two kinds of entity take part in the schedule:
//! - **Project**: an interval with `start <= end`.
//! - **Milestone**: a point in time (`start == end`) unless the source
//!   supplies a separate planned start. Milestones belong to a project.
//!
//! Dates are day-granular [`NaiveDate`]s; no timezone handling is done.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a project or milestone in the host's store.
pub type EntityId = i64;

/// Entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Interval entity.
    Project,
    /// Point entity belonging to a project.
    Milestone,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => f.write_str("project"),
            Self::Milestone => f.write_str("milestone"),
        }
    }
}

/// Typed reference to a schedulable entity.
///
/// Projects and milestones live in separate id spaces, so `Project(7)` and
/// `Milestone(7)` are different nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Project(EntityId),
    Milestone(EntityId),
}

impl EntityRef {
    /// Builds a reference from a kind and an id.
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        match kind {
            EntityKind::Project => Self::Project(id),
            EntityKind::Milestone => Self::Milestone(id),
        }
    }

    /// Entity kind.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::Milestone(_) => EntityKind::Milestone,
        }
    }

    /// Entity id (unique within its kind).
    pub fn id(&self) -> EntityId {
        match self {
            Self::Project(id) | Self::Milestone(id) => *id,
        }
    }

    /// Whether this refers to a project.
    #[inline]
    pub fn is_project(&self) -> bool {
        matches!(self, Self::Project(_))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Which end of an entity a dependency attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    End,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::End => f.write_str("end"),
        }
    }
}

/// A closed day interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range. Does not check ordering.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Zero-duration range at `date`.
    pub fn point(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Date at the given anchor.
    #[inline]
    pub fn at(&self, anchor: Anchor) -> NaiveDate {
        match anchor {
            Anchor::Start => self.start,
            Anchor::End => self.end,
        }
    }

    /// Duration in whole days (`end - start`).
    #[inline]
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Both anchors shifted by `days`.
    pub fn shifted(&self, days: i64) -> Self {
        Self::new(add_days(self.start, days), add_days(self.end, days))
    }

    /// Whether `start <= end`.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// Adds a signed number of days to a date, saturating at the calendar bounds.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(chrono::Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(chrono::Days::new(days.unsigned_abs()))
    };
    shifted.unwrap_or(if days >= 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    })
}

/// Subtracts a signed number of days, saturating like [`add_days`].
///
/// `i64::MIN` has no negation; it saturates to the latest date.
pub fn sub_days(date: NaiveDate, days: i64) -> NaiveDate {
    match days.checked_neg() {
        Some(negated) => add_days(date, negated),
        None => add_days(date, i64::MAX),
    }
}

/// Signed day difference `later - earlier`.
#[inline]
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Entity data pulled in for one computation.
///
/// `start`/`end` are nullable in the store; an entity missing either date
/// has no duration and is left out of the schedule graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntity {
    /// Typed identity.
    pub reference: EntityRef,
    /// Start date.
    pub start: Option<NaiveDate>,
    /// End date.
    pub end: Option<NaiveDate>,
    /// Owning project (milestones only).
    pub project_id: Option<EntityId>,
}

impl ScheduleEntity {
    /// Creates a project interval.
    pub fn project(id: EntityId, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            reference: EntityRef::Project(id),
            start,
            end,
            project_id: None,
        }
    }

    /// Creates a zero-duration milestone at `date`.
    pub fn milestone(id: EntityId, project_id: EntityId, date: NaiveDate) -> Self {
        Self {
            reference: EntityRef::Milestone(id),
            start: Some(date),
            end: Some(date),
            project_id: Some(project_id),
        }
    }

    /// Sets a separate planned start (milestones with a lead-in).
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Both dates, if present.
    pub fn range(&self) -> Option<DateRange> {
        Some(DateRange::new(self.start?, self.end?))
    }

    /// Date at an anchor, if present.
    pub fn date_at(&self, anchor: Anchor) -> Option<NaiveDate> {
        match anchor {
            Anchor::Start => self.start,
            Anchor::End => self.end,
        }
    }

    /// Duration in days, if both dates are present.
    pub fn duration_days(&self) -> Option<i64> {
        self.range().map(|r| r.duration_days())
    }

    /// Overwrites both dates.
    pub fn set_range(&mut self, range: DateRange) {
        self.start = Some(range.start);
        self.end = Some(range.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_entity_ref_identity() {
        let p = EntityRef::Project(7);
        let m = EntityRef::Milestone(7);
        assert_ne!(p, m);
        assert_eq!(p.id(), m.id());
        assert_eq!(p.kind(), EntityKind::Project);
        assert_eq!(EntityRef::new(EntityKind::Milestone, 7), m);
        assert_eq!(p.to_string(), "project:7");
    }

    #[test]
    fn test_entity_ref_serde_tagged() {
        let json = serde_json::to_string(&EntityRef::Milestone(3)).unwrap();
        assert_eq!(json, r#"{"kind":"milestone","id":3}"#);
        let back: EntityRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityRef::Milestone(3));
    }

    #[test]
    fn test_date_range_ops() {
        let r = DateRange::new(d(2025, 1, 1), d(2025, 1, 10));
        assert_eq!(r.duration_days(), 9);
        assert_eq!(r.at(Anchor::End), d(2025, 1, 10));
        let s = r.shifted(-3);
        assert_eq!(s.start, d(2024, 12, 29));
        assert_eq!(s.duration_days(), 9);
        assert!(r.is_ordered());
        assert!(!DateRange::new(d(2025, 1, 2), d(2025, 1, 1)).is_ordered());
    }

    #[test]
    fn test_add_days_saturates() {
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(add_days(NaiveDate::MIN, -1), NaiveDate::MIN);
        assert_eq!(add_days(d(2025, 2, 27), 2), d(2025, 3, 1));
        assert_eq!(sub_days(d(2025, 3, 1), 2), d(2025, 2, 27));
        assert_eq!(sub_days(d(2025, 3, 1), i64::MIN), NaiveDate::MAX);
        assert_eq!(sub_days(d(2025, 3, 1), i64::MAX), NaiveDate::MIN);
        assert_eq!(days_between(d(2025, 1, 10), d(2025, 1, 5)), -5);
    }

    #[test]
    fn test_milestone_is_point() {
        let m = ScheduleEntity::milestone(1, 10, d(2025, 3, 1));
        assert_eq!(m.duration_days(), Some(0));
        assert_eq!(m.project_id, Some(10));

        let lead = m.clone().with_start(d(2025, 2, 20));
        assert_eq!(lead.duration_days(), Some(9));
    }

    #[test]
    fn test_project_without_dates_has_no_range() {
        let p = ScheduleEntity::project(1, Some(d(2025, 1, 1)), None);
        assert!(p.range().is_none());
        assert_eq!(p.date_at(Anchor::Start), Some(d(2025, 1, 1)));
        assert_eq!(p.date_at(Anchor::End), None);
    }
}
