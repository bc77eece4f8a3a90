//! Entity graph construction.
//!
//! Converts flat entity and dependency lists into a [`ScheduleGraph`]:
//! a map of schedulable entities plus the dependencies whose endpoints
//! both resolve. Nothing here is fatal:
//! - entities without both dates (or with `start > end`) are excluded,
//! - inactive dependencies are filtered,
//! - dangling and self-loop dependencies are dropped with a warning.
//!
//! Exclusions and drops are kept on the graph so callers can surface them.

mod order;

pub use order::{dependency_order, DependencyOrder};

use std::collections::BTreeMap;

use tracing::warn;

use crate::models::{
    DateRange, DateWrite, Dependency, DependencyId, DependencyRecord, EntityId, EntityRef,
    MilestoneRecord, ProjectRecord, ScheduleEntity,
};

/// Why a dependency was left out of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Predecessor is unknown or was excluded.
    UnresolvedPredecessor,
    /// Successor is unknown or was excluded.
    UnresolvedSuccessor,
    /// Predecessor and successor are the same entity and anchor.
    SelfLoop,
}

/// A dependency that did not make it into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedDependency {
    pub dependency_id: DependencyId,
    pub reason: DropReason,
}

/// Why an entity was left out of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Start or end is missing; duration is undefined.
    MissingDates,
    /// `start > end`.
    InvertedInterval,
    /// The same reference appeared more than once; the first occurrence is kept.
    Duplicate,
}

/// An entity that did not make it into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedEntity {
    pub entity: EntityRef,
    pub reason: ExclusionReason,
}

/// Typed node-and-edge view of the schedule.
///
/// Every entity in the graph has both dates with `start <= end`, and every
/// dependency is active with both endpoints present.
#[derive(Debug, Clone, Default)]
pub struct ScheduleGraph {
    entities: BTreeMap<EntityRef, ScheduleEntity>,
    dependencies: Vec<Dependency>,
    milestones: BTreeMap<EntityId, Vec<EntityId>>,
    dropped: Vec<DroppedDependency>,
    excluded: Vec<ExcludedEntity>,
}

impl ScheduleGraph {
    /// Builds a graph from entities and dependencies.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use u_gantt::graph::ScheduleGraph;
    /// use u_gantt::models::{Dependency, EntityRef, ScheduleEntity};
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
    /// let graph = ScheduleGraph::build(
    ///     vec![
    ///         ScheduleEntity::project(1, Some(d(1)), Some(d(10))),
    ///         ScheduleEntity::project(2, None, Some(d(20))),
    ///     ],
    ///     vec![Dependency::finish_to_start(1, EntityRef::Project(1), EntityRef::Project(2))],
    /// );
    /// assert_eq!(graph.len(), 1);
    /// assert!(graph.dependencies().is_empty());
    /// assert_eq!(graph.dropped_dependencies().len(), 1);
    /// ```
    pub fn build(
        entities: impl IntoIterator<Item = ScheduleEntity>,
        dependencies: impl IntoIterator<Item = Dependency>,
    ) -> Self {
        let mut graph = Self::default();

        for entity in entities {
            graph.insert_entity(entity);
        }
        for dependency in dependencies {
            graph.insert_dependency(dependency);
        }

        graph
    }

    /// Builds a graph from the host's persistence records.
    pub fn from_records(
        projects: &[ProjectRecord],
        milestones: &[MilestoneRecord],
        dependencies: &[DependencyRecord],
    ) -> Self {
        let entities = projects
            .iter()
            .map(ProjectRecord::to_entity)
            .chain(milestones.iter().map(MilestoneRecord::to_entity));
        Self::build(entities, dependencies.iter().map(Dependency::from))
    }

    fn insert_entity(&mut self, entity: ScheduleEntity) {
        let reference = entity.reference;

        if self.entities.contains_key(&reference) {
            warn!("Duplicate entity {} ignored", reference);
            self.exclude(reference, ExclusionReason::Duplicate);
            return;
        }

        let Some(range) = entity.range() else {
            warn!("Entity {} has no start or end date; excluded from schedule", reference);
            self.exclude(reference, ExclusionReason::MissingDates);
            return;
        };
        if !range.is_ordered() {
            warn!(
                "Entity {} starts after it ends ({} > {}); excluded from schedule",
                reference, range.start, range.end
            );
            self.exclude(reference, ExclusionReason::InvertedInterval);
            return;
        }

        if let (EntityRef::Milestone(id), Some(project_id)) = (reference, entity.project_id) {
            self.milestones.entry(project_id).or_default().push(id);
        }
        self.entities.insert(reference, entity);
    }

    fn insert_dependency(&mut self, dependency: Dependency) {
        if !dependency.active {
            return;
        }

        let reason = if dependency.is_self_loop() {
            Some(DropReason::SelfLoop)
        } else if !self.entities.contains_key(&dependency.predecessor) {
            Some(DropReason::UnresolvedPredecessor)
        } else if !self.entities.contains_key(&dependency.successor) {
            Some(DropReason::UnresolvedSuccessor)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                warn!("Dependency {} dropped: {:?}", dependency, reason);
                self.dropped.push(DroppedDependency {
                    dependency_id: dependency.id,
                    reason,
                });
            }
            None => self.dependencies.push(dependency),
        }
    }

    fn exclude(&mut self, entity: EntityRef, reason: ExclusionReason) {
        self.excluded.push(ExcludedEntity { entity, reason });
    }

    /// Looks up an entity.
    pub fn entity(&self, reference: EntityRef) -> Option<&ScheduleEntity> {
        self.entities.get(&reference)
    }

    /// Dates of an entity in the graph.
    pub fn range(&self, reference: EntityRef) -> Option<DateRange> {
        self.entities.get(&reference).and_then(ScheduleEntity::range)
    }

    /// Whether the entity is part of the graph.
    pub fn contains(&self, reference: EntityRef) -> bool {
        self.entities.contains_key(&reference)
    }

    /// Entities in reference order.
    pub fn entities(&self) -> impl Iterator<Item = &ScheduleEntity> {
        self.entities.values()
    }

    /// Entity references in order.
    pub fn references(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.entities.keys().copied()
    }

    /// Active, resolved dependencies in input order.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Dependencies whose predecessor is `reference`.
    pub fn outgoing(&self, reference: EntityRef) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(move |d| d.predecessor == reference)
    }

    /// Dependencies whose successor is `reference`.
    pub fn incoming(&self, reference: EntityRef) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(move |d| d.successor == reference)
    }

    /// Scheduled milestones belonging to a project.
    pub fn milestones_of(&self, project_id: EntityId) -> &[EntityId] {
        self.milestones
            .get(&project_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Dependencies dropped while building.
    pub fn dropped_dependencies(&self) -> &[DroppedDependency] {
        &self.dropped
    }

    /// Entities excluded while building.
    pub fn excluded_entities(&self) -> &[ExcludedEntity] {
        &self.excluded
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the graph has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Overwrites an entity's dates. Returns `false` if it is not in the graph.
    pub fn set_range(&mut self, reference: EntityRef, range: DateRange) -> bool {
        match self.entities.get_mut(&reference) {
            Some(entity) => {
                entity.set_range(range);
                true
            }
            None => false,
        }
    }

    /// Applies writes in order, skipping entities not in the graph.
    pub fn apply_writes(&mut self, writes: &[DateWrite]) {
        for write in writes {
            if !self.set_range(write.target, write.range) {
                warn!("Write to {} skipped: not in graph", write.target);
            }
        }
    }
}
