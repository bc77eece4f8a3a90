//! Change records and date writes.
//!
//! A [`DateWrite`] is one update sent to the host store. A [`ChangeRecord`]
//! is the reversible snapshot kept by the undo log for one committed change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::{DateRange, EntityId, EntityKind, EntityRef};

/// New dates for one entity, in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWrite {
    /// Entity to update.
    pub target: EntityRef,
    /// Dates to store (`startDate`/`endDate` for projects,
    /// `plannedStartDate`/`plannedEndDate` for milestones).
    pub range: DateRange,
}

impl DateWrite {
    pub fn new(target: EntityRef, range: DateRange) -> Self {
        Self { target, range }
    }
}

/// Before/after dates of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateChange {
    pub before: DateRange,
    pub after: DateRange,
}

impl DateChange {
    pub fn new(before: DateRange, after: DateRange) -> Self {
        Self { before, after }
    }

    /// Whether any anchor actually moved.
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

/// An entity touched by the cascade, captured only under
/// [`UndoScope::Cascade`](crate::engine::UndoScope::Cascade).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadedChange {
    pub entity: EntityRef,
    pub change: DateChange,
}

/// Reversible snapshot of one committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Entity the user edited.
    pub entity: EntityRef,
    /// Dates of that entity before and after the edit.
    pub dates: DateChange,
    /// Milestones of the edited project that were repositioned with it.
    pub affected_milestones: BTreeMap<EntityId, DateChange>,
    /// Other entities moved by the cascade, in the order they were written.
    pub cascaded: Vec<CascadedChange>,
    /// Human-readable summary.
    pub description: String,
}

impl ChangeRecord {
    /// Creates a record with no milestone or cascade captures.
    pub fn new(entity: EntityRef, dates: DateChange, description: impl Into<String>) -> Self {
        Self {
            entity,
            dates,
            affected_milestones: BTreeMap::new(),
            cascaded: Vec::new(),
            description: description.into(),
        }
    }

    /// Id of the edited entity.
    pub fn entity_id(&self) -> EntityId {
        self.entity.id()
    }

    /// Kind of the edited entity.
    pub fn entity_kind(&self) -> EntityKind {
        self.entity.kind()
    }

    /// Writes that restore every captured entity to its `before` dates.
    ///
    /// Cascaded entities are restored last-written-first, then milestones,
    /// then the edited entity itself.
    pub fn restore_writes(&self) -> Vec<DateWrite> {
        let mut writes: Vec<DateWrite> = self
            .cascaded
            .iter()
            .rev()
            .map(|c| DateWrite::new(c.entity, c.change.before))
            .collect();
        writes.extend(
            self.affected_milestones
                .iter()
                .map(|(&id, c)| DateWrite::new(EntityRef::Milestone(id), c.before)),
        );
        writes.push(DateWrite::new(self.entity, self.dates.before));
        writes
    }
}
