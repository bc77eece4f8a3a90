//! Persistence seam.
//!
//! The engine never talks to a database. Date writes go through
//! [`ScheduleStore`], one at a time and in order, so a later write always
//! lands after the earlier ones it may depend on.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ScheduleError, StoreError};
use crate::graph::ScheduleGraph;
use crate::models::{DateRange, DateWrite, EntityId, EntityRef};

/// Host store receiving date updates.
pub trait ScheduleStore {
    /// Updates a project's `startDate`/`endDate`.
    fn update_project_dates(&mut self, id: EntityId, range: DateRange) -> Result<(), StoreError>;

    /// Updates a milestone's `plannedStartDate`/`plannedEndDate`.
    fn update_milestone_dates(&mut self, id: EntityId, range: DateRange)
        -> Result<(), StoreError>;

    /// Dispatches a write by entity kind.
    fn write(&mut self, write: &DateWrite) -> Result<(), StoreError> {
        match write.target {
            EntityRef::Project(id) => self.update_project_dates(id, write.range),
            EntityRef::Milestone(id) => self.update_milestone_dates(id, write.range),
        }
    }
}

/// Writes `writes` in order, stopping at the first failure.
///
/// Returns the number of writes applied. On failure, the writes before the
/// failing one stay applied and the error reports how many there were.
pub fn commit_writes<S>(store: &mut S, writes: &[DateWrite]) -> Result<usize, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    for (applied, write) in writes.iter().enumerate() {
        store
            .write(write)
            .map_err(|source| ScheduleError::Persistence {
                target: write.target,
                applied,
                total: writes.len(),
                source,
            })?;
        debug!(
            "Stored {} = {}..{}",
            write.target, write.range.start, write.range.end
        );
    }
    Ok(writes.len())
}

/// In-memory [`ScheduleStore`].
///
/// Useful for previews and tests; keeps the last written range per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    projects: BTreeMap<EntityId, DateRange>,
    milestones: BTreeMap<EntityId, DateRange>,
    writes: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store with the current dates of every entity in `graph`.
    pub fn from_graph(graph: &ScheduleGraph) -> Self {
        let mut store = Self::new();
        for entity in graph.entities() {
            if let Some(range) = entity.range() {
                store.insert(entity.reference, range);
            }
        }
        store
    }

    fn insert(&mut self, reference: EntityRef, range: DateRange) {
        match reference {
            EntityRef::Project(id) => self.projects.insert(id, range),
            EntityRef::Milestone(id) => self.milestones.insert(id, range),
        };
    }

    /// Stored dates of an entity.
    pub fn range(&self, reference: EntityRef) -> Option<DateRange> {
        match reference {
            EntityRef::Project(id) => self.projects.get(&id).copied(),
            EntityRef::Milestone(id) => self.milestones.get(&id).copied(),
        }
    }

    /// Number of writes received.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl ScheduleStore for MemoryStore {
    fn update_project_dates(&mut self, id: EntityId, range: DateRange) -> Result<(), StoreError> {
        self.writes += 1;
        self.projects.insert(id, range);
        Ok(())
    }

    fn update_milestone_dates(
        &mut self,
        id: EntityId,
        range: DateRange,
    ) -> Result<(), StoreError> {
        self.writes += 1;
        self.milestones.insert(id, range);
        Ok(())
    }
}
