//! Typed temporal dependencies between entities.
//!
//! A dependency links an anchor of a predecessor to an anchor of a
//! successor, with a signed lag in days (negative = lead).
//!
//! | Type | Predecessor anchor | Successor anchor |
//! |------|--------------------|------------------|
//! | FS | end | start |
//! | SS | start | start |
//! | FF | end | end |
//! | SF | start | end |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::{add_days, Anchor, EntityRef};

/// Identifier of a dependency record.
pub type DependencyId = i64;

/// Dependency type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    /// Finish-to-Start.
    #[serde(rename = "FS")]
    FinishToStart,
    /// Start-to-Start.
    #[serde(rename = "SS")]
    StartToStart,
    /// Finish-to-Finish.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Start-to-Finish.
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyType {
    /// Conventional `(predecessor, successor)` anchors for this type.
    pub fn anchors(&self) -> (Anchor, Anchor) {
        match self {
            Self::FinishToStart => (Anchor::End, Anchor::Start),
            Self::StartToStart => (Anchor::Start, Anchor::Start),
            Self::FinishToFinish => (Anchor::End, Anchor::End),
            Self::StartToFinish => (Anchor::Start, Anchor::End),
        }
    }

    /// Short code (`FS`, `SS`, `FF`, `SF`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A dependency between two entity anchors.
///
/// Created and deleted by the host; the engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Record id.
    pub id: DependencyId,
    /// Constraining entity.
    pub predecessor: EntityRef,
    /// Anchor on the predecessor.
    pub predecessor_point: Anchor,
    /// Constrained entity.
    pub successor: EntityRef,
    /// Anchor on the successor.
    pub successor_point: Anchor,
    /// Relationship type.
    pub dependency_type: DependencyType,
    /// Signed offset in days added to the predecessor date.
    pub lag_days: i64,
    /// Inactive dependencies are ignored everywhere.
    pub active: bool,
}

impl Dependency {
    /// Creates an active dependency with the conventional anchors of `dependency_type`
    /// and zero lag.
    pub fn new(
        id: DependencyId,
        predecessor: EntityRef,
        successor: EntityRef,
        dependency_type: DependencyType,
    ) -> Self {
        let (predecessor_point, successor_point) = dependency_type.anchors();
        Self {
            id,
            predecessor,
            predecessor_point,
            successor,
            successor_point,
            dependency_type,
            lag_days: 0,
            active: true,
        }
    }

    /// Finish-to-Start shorthand.
    pub fn finish_to_start(id: DependencyId, predecessor: EntityRef, successor: EntityRef) -> Self {
        Self::new(id, predecessor, successor, DependencyType::FinishToStart)
    }

    /// Sets the lag (negative = lead).
    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }

    /// Overrides the anchors.
    pub fn with_points(mut self, predecessor_point: Anchor, successor_point: Anchor) -> Self {
        self.predecessor_point = predecessor_point;
        self.successor_point = successor_point;
        self
    }

    /// Marks the dependency inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Same entity and same anchor on both sides.
    pub fn is_self_loop(&self) -> bool {
        self.predecessor == self.successor && self.predecessor_point == self.successor_point
    }

    /// Predecessor date adjusted by the lag.
    #[inline]
    pub fn required_date(&self, predecessor_date: NaiveDate) -> NaiveDate {
        add_days(predecessor_date, self.lag_days)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}.{} -{}{:+}-> {}.{}",
            self.id,
            self.predecessor,
            self.predecessor_point,
            self.dependency_type,
            self.lag_days,
            self.successor,
            self.successor_point
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_anchors() {
        let dep = Dependency::new(
            1,
            EntityRef::Project(1),
            EntityRef::Project(2),
            DependencyType::StartToFinish,
        );
        assert_eq!(dep.predecessor_point, Anchor::Start);
        assert_eq!(dep.successor_point, Anchor::End);
        assert!(dep.active);
        assert_eq!(dep.lag_days, 0);
    }

    #[test]
    fn test_self_loop_needs_same_point() {
        let a = EntityRef::Project(1);
        let same_point = Dependency::new(1, a, a, DependencyType::StartToStart);
        assert!(same_point.is_self_loop());

        // start -> end of the same project is a legitimate constraint
        let across = Dependency::new(2, a, a, DependencyType::StartToFinish);
        assert!(!across.is_self_loop());
    }

    #[test]
    fn test_required_date_applies_lead() {
        let dep = Dependency::finish_to_start(1, EntityRef::Project(1), EntityRef::Project(2))
            .with_lag(-3);
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(
            dep.required_date(date),
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()
        );
    }

    #[test]
    fn test_dependency_type_serde_codes() {
        let json = serde_json::to_string(&DependencyType::FinishToFinish).unwrap();
        assert_eq!(json, r#""FF""#);
        let t: DependencyType = serde_json::from_str(r#""SF""#).unwrap();
        assert_eq!(t, DependencyType::StartToFinish);
    }

    #[test]
    fn test_display() {
        let dep = Dependency::finish_to_start(4, EntityRef::Project(1), EntityRef::Milestone(2))
            .with_lag(2);
        assert_eq!(dep.to_string(), "#4 project:1.end -FS+2-> milestone:2.start");
    }
}
