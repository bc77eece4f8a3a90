//! Critical Path Method (CPM).
//!
//! Computes earliest and latest start/finish dates for every entity in a
//! [`ScheduleGraph`], then derives slack and the critical path.
//!
//! # Algorithm
//!
//! 1. Initialize each node's earliest and latest dates from its own interval.
//! 2. **Forward pass** over dependencies in topological order: the
//!    predecessor's earliest date at its anchor plus lag pushes the
//!    successor's earliest start (shifting the finish with it) or its
//!    earliest finish (finish only).
//! 3. Set every latest finish to the project horizon (maximum earliest
//!    finish) and latest start to `horizon - duration`.
//! 4. **Backward pass** in reverse order: the successor's latest date at its
//!    anchor minus lag pulls the predecessor's latest finish (shifting the
//!    start with it) or its latest start (start only).
//! 5. Slack and criticality, see [`analyze`].
//!
//! Results are recomputed from scratch on every call; nothing is cached.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use u_gantt::cpm::compute_cpm;
//! use u_gantt::graph::ScheduleGraph;
//! use u_gantt::models::{Dependency, EntityRef, ScheduleEntity};
//!
//! let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
//! let graph = ScheduleGraph::build(
//!     vec![
//!         ScheduleEntity::project(1, Some(d(1)), Some(d(10))),
//!         ScheduleEntity::project(2, Some(d(5)), Some(d(15))),
//!     ],
//!     vec![Dependency::finish_to_start(1, EntityRef::Project(1), EntityRef::Project(2)).with_lag(2)],
//! );
//!
//! let result = compute_cpm(&graph);
//! let b = result.node(EntityRef::Project(2)).unwrap();
//! assert_eq!(b.earliest_start, d(12));
//! assert_eq!(b.earliest_finish, d(22));
//! assert!(result.is_critical(EntityRef::Project(1)));
//! ```
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"

mod slack;

pub use slack::{analyze, CpmResult};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::graph::{dependency_order, DependencyOrder, ScheduleGraph};
use crate::models::{add_days, days_between, sub_days, Anchor, EntityRef};

/// CPM dates of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpmNode {
    pub earliest_start: NaiveDate,
    pub earliest_finish: NaiveDate,
    pub latest_start: NaiveDate,
    pub latest_finish: NaiveDate,
    /// Duration of the entity's own interval (days).
    pub duration_days: i64,
    /// `latest_start - earliest_start` in days. Filled in by [`analyze`].
    pub slack_days: i64,
}

impl CpmNode {
    fn from_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            earliest_start: start,
            earliest_finish: end,
            latest_start: start,
            latest_finish: end,
            duration_days: days_between(start, end),
            slack_days: 0,
        }
    }

    #[inline]
    fn earliest_at(&self, anchor: Anchor) -> NaiveDate {
        match anchor {
            Anchor::Start => self.earliest_start,
            Anchor::End => self.earliest_finish,
        }
    }

    #[inline]
    fn latest_at(&self, anchor: Anchor) -> NaiveDate {
        match anchor {
            Anchor::Start => self.latest_start,
            Anchor::End => self.latest_finish,
        }
    }
}

/// Raw output of the forward and backward passes, before slack analysis.
#[derive(Debug, Clone, Default)]
pub struct CpmPasses {
    /// Node dates keyed by entity.
    pub nodes: BTreeMap<EntityRef, CpmNode>,
    /// Maximum earliest finish; `None` for an empty graph.
    pub horizon: Option<NaiveDate>,
    /// Ordering used for both passes.
    pub order: DependencyOrder,
}

/// Runs both passes over `graph`.
pub fn compute_passes(graph: &ScheduleGraph) -> CpmPasses {
    let mut nodes: BTreeMap<EntityRef, CpmNode> = graph
        .entities()
        .filter_map(|e| {
            let range = e.range()?;
            Some((e.reference, CpmNode::from_range(range.start, range.end)))
        })
        .collect();

    let order = dependency_order(graph);
    let dependencies = graph.dependencies();

    // Forward pass
    for &idx in &order.edges {
        let dep = &dependencies[idx];
        let Some(pred) = nodes.get(&dep.predecessor) else {
            continue;
        };
        let candidate = dep.required_date(pred.earliest_at(dep.predecessor_point));
        let Some(succ) = nodes.get_mut(&dep.successor) else {
            continue;
        };

        match dep.successor_point {
            Anchor::Start => {
                if candidate > succ.earliest_start {
                    let delta = days_between(succ.earliest_start, candidate);
                    succ.earliest_start = candidate;
                    succ.earliest_finish = add_days(succ.earliest_finish, delta);
                }
            }
            Anchor::End => {
                if candidate > succ.earliest_finish {
                    succ.earliest_finish = candidate;
                }
            }
        }
    }

    let horizon = nodes.values().map(|n| n.earliest_finish).max();

    if let Some(horizon) = horizon {
        for node in nodes.values_mut() {
            node.latest_finish = horizon;
            node.latest_start = sub_days(horizon, node.duration_days);
        }
    }

    // Backward pass
    for idx in order.reversed_edges() {
        let dep = &dependencies[idx];
        let Some(succ) = nodes.get(&dep.successor) else {
            continue;
        };
        let candidate = sub_days(succ.latest_at(dep.successor_point), dep.lag_days);
        let Some(pred) = nodes.get_mut(&dep.predecessor) else {
            continue;
        };

        match dep.predecessor_point {
            Anchor::End => {
                if candidate < pred.latest_finish {
                    let delta = days_between(candidate, pred.latest_finish);
                    pred.latest_finish = candidate;
                    pred.latest_start = sub_days(pred.latest_start, delta);
                }
            }
            Anchor::Start => {
                if candidate < pred.latest_start {
                    pred.latest_start = candidate;
                }
            }
        }
    }

    CpmPasses {
        nodes,
        horizon,
        order,
    }
}

/// Runs both passes and the slack analysis with the default criticality
/// threshold (zero slack).
pub fn compute_cpm(graph: &ScheduleGraph) -> CpmResult {
    analyze(compute_passes(graph), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dependency, DependencyType, ScheduleEntity};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn project(id: i64, start: NaiveDate, end: NaiveDate) -> ScheduleEntity {
        ScheduleEntity::project(id, Some(start), Some(end))
    }

    fn p(id: i64) -> EntityRef {
        EntityRef::Project(id)
    }

    #[test]
    fn test_fs_with_lag_pushes_successor() {
        let g = ScheduleGraph::build(
            vec![project(1, d(1, 1), d(1, 10)), project(2, d(1, 5), d(1, 15))],
            vec![Dependency::finish_to_start(1, p(1), p(2)).with_lag(2)],
        );
        let passes = compute_passes(&g);
        let b = passes.nodes[&p(2)];
        assert_eq!(b.earliest_start, d(1, 12));
        assert_eq!(b.earliest_finish, d(1, 22));
        assert_eq!(b.duration_days, 10);
        assert_eq!(passes.horizon, Some(d(1, 22)));

        let a = passes.nodes[&p(1)];
        assert_eq!(a.latest_finish, d(1, 10));
        assert_eq!(a.latest_start, d(1, 1));
    }

    #[test]
    fn test_satisfied_dependency_does_not_pull_earlier() {
        let g = ScheduleGraph::build(
            vec![project(1, d(1, 1), d(1, 10)), project(2, d(1, 20), d(1, 25))],
            vec![Dependency::finish_to_start(1, p(1), p(2))],
        );
        let passes = compute_passes(&g);
        assert_eq!(passes.nodes[&p(2)].earliest_start, d(1, 20));
    }

    #[test]
    fn test_finish_anchor_moves_finish_only() {
        // FF: B must end no earlier than A's end + 3
        let g = ScheduleGraph::build(
            vec![project(1, d(1, 1), d(1, 20)), project(2, d(1, 5), d(1, 10))],
            vec![Dependency::new(1, p(1), p(2), DependencyType::FinishToFinish).with_lag(3)],
        );
        let passes = compute_passes(&g);
        let b = passes.nodes[&p(2)];
        assert_eq!(b.earliest_start, d(1, 5));
        assert_eq!(b.earliest_finish, d(1, 23));
        assert_eq!(passes.horizon, Some(d(1, 23)));
    }

    #[test]
    fn test_reordered_input_matches_ordered_input() {
        let entities = || {
            vec![
                project(1, d(1, 1), d(1, 5)),
                project(2, d(1, 1), d(1, 3)),
                project(3, d(1, 1), d(1, 4)),
            ]
        };
        let ordered = ScheduleGraph::build(
            entities(),
            vec![
                Dependency::finish_to_start(1, p(1), p(2)),
                Dependency::finish_to_start(2, p(2), p(3)),
            ],
        );
        let reversed = ScheduleGraph::build(
            entities(),
            vec![
                Dependency::finish_to_start(2, p(2), p(3)),
                Dependency::finish_to_start(1, p(1), p(2)),
            ],
        );
        let a = compute_passes(&ordered);
        let b = compute_passes(&reversed);
        assert_eq!(a.nodes, b.nodes);
        // 1: 1..5, 2: 5..7, 3: 7..10
        assert_eq!(a.nodes[&p(3)].earliest_start, d(1, 7));
        assert_eq!(a.nodes[&p(3)].earliest_finish, d(1, 10));
    }

    #[test]
    fn test_start_to_start_backward_tightens_latest_start() {
        // SS: B starts no earlier than A.start + 2; B is the long pole
        let g = ScheduleGraph::build(
            vec![project(1, d(1, 1), d(1, 3)), project(2, d(1, 1), d(1, 11))],
            vec![Dependency::new(1, p(1), p(2), DependencyType::StartToStart).with_lag(2)],
        );
        let passes = compute_passes(&g);
        let b = passes.nodes[&p(2)];
        assert_eq!(b.earliest_start, d(1, 3));
        assert_eq!(b.earliest_finish, d(1, 13));
        let a = passes.nodes[&p(1)];
        assert_eq!(a.latest_start, d(1, 1));
        assert_eq!(a.latest_finish, d(1, 13));
    }

    #[test]
    fn test_cycle_terminates_and_is_reported() {
        let g = ScheduleGraph::build(
            vec![project(1, d(1, 1), d(1, 5)), project(2, d(1, 1), d(1, 5))],
            vec![
                Dependency::finish_to_start(1, p(1), p(2)),
                Dependency::finish_to_start(2, p(2), p(1)),
            ],
        );
        let passes = compute_passes(&g);
        assert_eq!(passes.order.broken, vec![2]);
        assert_eq!(passes.nodes[&p(2)].earliest_start, d(1, 5));
    }

    #[test]
    fn test_extreme_lags_saturate() {
        let g = ScheduleGraph::build(
            vec![
                project(1, d(1, 1), d(1, 10)),
                project(2, d(1, 5), d(1, 15)),
                project(3, d(2, 1), d(2, 5)),
            ],
            vec![
                Dependency::finish_to_start(1, p(1), p(2)).with_lag(i64::MIN),
                Dependency::finish_to_start(2, p(2), p(3)).with_lag(i64::MAX),
            ],
        );
        let passes = compute_passes(&g);

        // A lead of i64::MIN never pushes; i64::MAX pushes to the calendar end
        assert_eq!(passes.nodes[&p(2)].earliest_start, d(1, 5));
        assert_eq!(passes.nodes[&p(3)].earliest_start, NaiveDate::MAX);
        assert_eq!(passes.horizon, Some(NaiveDate::MAX));

        let result = analyze(passes, 0);
        assert!(result.node(p(1)).is_some());
    }

    #[test]
    fn test_empty_graph() {
        let passes = compute_passes(&ScheduleGraph::default());
        assert!(passes.nodes.is_empty());
        assert_eq!(passes.horizon, None);
    }

    #[test]
    fn test_milestone_point_node() {
        let g = ScheduleGraph::build(
            vec![
                project(1, d(1, 1), d(1, 10)),
                ScheduleEntity::milestone(7, 1, d(1, 4)),
            ],
            vec![Dependency::finish_to_start(1, p(1), EntityRef::Milestone(7))],
        );
        let passes = compute_passes(&g);
        let m = passes.nodes[&EntityRef::Milestone(7)];
        assert_eq!(m.earliest_start, d(1, 10));
        assert_eq!(m.earliest_finish, d(1, 10));
        assert_eq!(m.duration_days, 0);
    }
}
