//! Change propagation.
//!
//! Turns one user edit (move or resize) into the full set of date writes it
//! implies, then commits them through a [`ScheduleStore`].
//!
//! # Algorithm
//!
//! 1. Apply the edit to the target entity.
//! 2. If the target is a project, reposition its milestones proportionally:
//!    each milestone keeps its relative position `(date - start) / duration`
//!    against the new interval. A move is the special case where every
//!    milestone shifts by the project's delta.
//! 3. For every dependency whose predecessor is a moved entity and whose
//!    predecessor anchor actually moved, place the successor:
//!    - `FS`: successor start = predecessor end + lag
//!    - `SS`: successor start shifts by the predecessor start's delta
//!    - `FF`: successor end shifts by the predecessor end's delta
//!    - `SF`: successor end = predecessor start + lag
//!
//!    Anchors are read from the dependency's points, which match the type
//!    for conventional records. The successor keeps its duration.
//! 4. Repeat from each moved successor (and each repositioned milestone).
//!
//! A per-propagation visited set guarantees termination on cyclic graphs:
//! an entity is moved at most once per edit. Traversal uses an explicit
//! stack, so long chains cannot overflow the call stack.
//!
//! Planning ([`plan_change`]) is pure: it works on a copy of the graph and
//! returns the writes in commit order together with the undo record.

mod store;

pub use store::{commit_writes, MemoryStore, ScheduleStore};

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{EngineConfig, UndoScope};
use crate::error::ScheduleError;
use crate::graph::ScheduleGraph;
use crate::models::{
    add_days, days_between, Anchor, CascadedChange, ChangeRecord, DateChange, DateRange,
    DateWrite, Dependency, DependencyType, EntityId, EntityRef,
};

/// A finalized user edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleChange {
    /// Both anchors shift by the same number of days.
    Move { target: EntityRef, delta_days: i64 },
    /// One anchor moves to a new date; the other stays put.
    Resize {
        target: EntityRef,
        anchor: Anchor,
        new_date: NaiveDate,
    },
}

impl ScheduleChange {
    /// Move by a signed number of days.
    pub fn move_by(target: EntityRef, delta_days: i64) -> Self {
        Self::Move { target, delta_days }
    }

    /// Move so that `anchor` goes from `old_date` to `new_date`.
    pub fn move_anchor(target: EntityRef, old_date: NaiveDate, new_date: NaiveDate) -> Self {
        Self::move_by(target, days_between(old_date, new_date))
    }

    /// Resize by moving one anchor.
    pub fn resize(target: EntityRef, anchor: Anchor, new_date: NaiveDate) -> Self {
        Self::Resize {
            target,
            anchor,
            new_date,
        }
    }

    /// Edited entity.
    pub fn target(&self) -> EntityRef {
        match self {
            Self::Move { target, .. } | Self::Resize { target, .. } => *target,
        }
    }

    fn apply(&self, current: DateRange) -> Result<DateRange, ScheduleError> {
        let next = match *self {
            Self::Move { delta_days, .. } => current.shifted(delta_days),
            Self::Resize {
                anchor: Anchor::Start,
                new_date,
                ..
            } => DateRange::new(new_date, current.end),
            Self::Resize {
                anchor: Anchor::End,
                new_date,
                ..
            } => DateRange::new(current.start, new_date),
        };
        if !next.is_ordered() {
            return Err(ScheduleError::InvalidChange {
                target: self.target(),
                reason: format!("start {} would fall after end {}", next.start, next.end),
            });
        }
        Ok(next)
    }

    fn describe(&self, before: DateRange) -> String {
        match *self {
            Self::Move { target, delta_days } => {
                format!("Moved {} by {:+} days", target, delta_days)
            }
            Self::Resize {
                target,
                anchor,
                new_date,
            } => format!(
                "Resized {} {} from {} to {}",
                target,
                anchor,
                before.at(anchor),
                new_date
            ),
        }
    }
}

/// Planned outcome of one edit.
#[derive(Debug, Clone)]
pub struct Propagation {
    /// Graph with every write applied.
    pub graph: ScheduleGraph,
    /// Writes in commit order; the edited entity comes first.
    pub writes: Vec<DateWrite>,
    /// Undo snapshot for the edit.
    pub record: ChangeRecord,
}

impl Propagation {
    /// Entities touched, in write order.
    pub fn touched(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.writes.iter().map(|w| w.target)
    }
}

/// Places a successor after its predecessor moved, keeping its duration.
///
/// The anchors come from the dependency's own points. `FS` and `SF` pin the
/// successor anchor to the predecessor anchor plus lag. `SS` and `FF` shift
/// the successor anchor by the same delta as the predecessor anchor; the lag
/// is already part of the existing gap and is not applied again.
pub fn successor_range(
    dependency: &Dependency,
    predecessor: DateChange,
    successor: DateRange,
) -> DateRange {
    let pred_point = dependency.predecessor_point;
    let succ_point = dependency.successor_point;
    match dependency.dependency_type {
        DependencyType::FinishToStart | DependencyType::StartToFinish => {
            let target = add_days(predecessor.after.at(pred_point), dependency.lag_days);
            successor.shifted(days_between(successor.at(succ_point), target))
        }
        DependencyType::StartToStart | DependencyType::FinishToFinish => {
            successor.shifted(days_between(
                predecessor.before.at(pred_point),
                predecessor.after.at(pred_point),
            ))
        }
    }
}

/// Repositions a milestone against a project's new interval, preserving its
/// relative position. Zero-length projects shift milestones by the start delta.
pub fn reposition_milestone(milestone: DateRange, project: DateChange) -> DateRange {
    let DateChange { before, after } = project;
    let old_duration = before.duration_days();
    let new_duration = after.duration_days();

    if old_duration == 0 || old_duration == new_duration {
        return milestone.shifted(days_between(before.start, after.start));
    }

    let scale = |date: NaiveDate| {
        let offset = days_between(before.start, date) as f64;
        let scaled = (offset * new_duration as f64 / old_duration as f64).round() as i64;
        add_days(after.start, scaled)
    };
    DateRange::new(scale(milestone.start), scale(milestone.end))
}

/// Plans an edit without touching any store.
///
/// Returns `Ok(None)` when the edit leaves the target's dates unchanged.
///
/// # Errors
/// - [`ScheduleError::EntityNotFound`] / [`ScheduleError::Unscheduled`] if the
///   target is not in the graph.
/// - [`ScheduleError::InvalidChange`] if the edit would invert the interval.
pub fn plan_change(
    graph: &ScheduleGraph,
    change: &ScheduleChange,
    config: &EngineConfig,
) -> Result<Option<Propagation>, ScheduleError> {
    let target = change.target();
    let Some(before) = graph.range(target) else {
        let unscheduled = graph.excluded_entities().iter().any(|e| e.entity == target);
        return Err(if unscheduled {
            ScheduleError::Unscheduled(target)
        } else {
            ScheduleError::EntityNotFound(target)
        });
    };

    let after = change.apply(before)?;
    if after == before {
        debug!("{} unchanged; nothing to propagate", target);
        return Ok(None);
    }

    let root = DateChange::new(before, after);
    let mut cascade = Cascade::new(graph.clone(), config);
    let direct_milestones = cascade.run(target, root);

    let mut record = ChangeRecord::new(target, root, change.describe(before));
    record.affected_milestones = direct_milestones;
    if config.undo_scope == UndoScope::Cascade {
        let cascaded = cascade
            .log
            .iter()
            .filter(|(entity, _)| *entity != target && !is_direct_milestone(&record, *entity))
            .map(|&(entity, change)| CascadedChange { entity, change })
            .collect();
        record.cascaded = cascaded;
    }

    Ok(Some(Propagation {
        graph: cascade.graph,
        writes: cascade.writes,
        record,
    }))
}

fn is_direct_milestone(record: &ChangeRecord, entity: EntityRef) -> bool {
    matches!(entity, EntityRef::Milestone(id) if record.affected_milestones.contains_key(&id))
}

struct Cascade<'a> {
    graph: ScheduleGraph,
    config: &'a EngineConfig,
    visited: HashSet<EntityRef>,
    writes: Vec<DateWrite>,
    log: Vec<(EntityRef, DateChange)>,
}

impl<'a> Cascade<'a> {
    fn new(graph: ScheduleGraph, config: &'a EngineConfig) -> Self {
        Self {
            graph,
            config,
            visited: HashSet::new(),
            writes: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Runs the cascade from `root`; returns the root's repositioned milestones.
    fn run(&mut self, root: EntityRef, change: DateChange) -> BTreeMap<EntityId, DateChange> {
        self.visited.insert(root);
        let mut stack: Vec<(EntityRef, DateChange, usize)> = Vec::new();

        let milestones = self.place(root, change, 0, &mut stack);
        let direct = milestones
            .iter()
            .filter_map(|(r, c)| match r {
                EntityRef::Milestone(id) => Some((*id, *c)),
                EntityRef::Project(_) => None,
            })
            .collect();

        while let Some((moved, change, depth)) = stack.pop() {
            if depth >= self.config.max_cascade_depth {
                warn!(
                    "Cascade from {} stopped at depth {}; dependents left unchanged",
                    moved, depth
                );
                continue;
            }

            let outgoing: Vec<Dependency> = self
                .graph
                .outgoing(moved)
                .filter(|dep| {
                    let point = dep.predecessor_point;
                    change.before.at(point) != change.after.at(point)
                })
                .cloned()
                .collect();

            for dep in outgoing {
                let successor = dep.successor;
                if self.visited.contains(&successor) {
                    debug!("{} already moved in this propagation; skipping {}", successor, dep);
                    continue;
                }
                let Some(old) = self.graph.range(successor) else {
                    continue;
                };
                let new = successor_range(&dep, change, old);
                if new == old {
                    continue;
                }

                debug!("{} moves {} to {}..{}", dep, successor, new.start, new.end);
                self.visited.insert(successor);
                self.place(successor, DateChange::new(old, new), depth + 1, &mut stack);
            }
        }

        direct
    }

    /// Writes an entity's new dates, repositions its milestones, and queues
    /// everything that moved. Returns the repositioned milestones.
    fn place(
        &mut self,
        reference: EntityRef,
        change: DateChange,
        depth: usize,
        stack: &mut Vec<(EntityRef, DateChange, usize)>,
    ) -> Vec<(EntityRef, DateChange)> {
        self.write(reference, change);

        let mut moved_milestones = Vec::new();
        if let EntityRef::Project(project_id) = reference {
            if self.config.rescale_milestones {
                let milestone_ids = self.graph.milestones_of(project_id).to_vec();
                for id in milestone_ids {
                    let milestone = EntityRef::Milestone(id);
                    if self.visited.contains(&milestone) {
                        continue;
                    }
                    let Some(old) = self.graph.range(milestone) else {
                        continue;
                    };
                    let new = reposition_milestone(old, change);
                    if new == old {
                        continue;
                    }
                    self.visited.insert(milestone);
                    let milestone_change = DateChange::new(old, new);
                    self.write(milestone, milestone_change);
                    moved_milestones.push((milestone, milestone_change));
                }
            }
        }

        // Pushed in reverse so the entity's own dependents are handled first,
        // then its milestones in order.
        for &(milestone, milestone_change) in moved_milestones.iter().rev() {
            stack.push((milestone, milestone_change, depth + 1));
        }
        stack.push((reference, change, depth));

        moved_milestones
    }

    fn write(&mut self, reference: EntityRef, change: DateChange) {
        self.graph.set_range(reference, change.after);
        self.writes.push(DateWrite::new(reference, change.after));
        self.log.push((reference, change));
    }
}
