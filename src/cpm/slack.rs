//! Slack and critical path analysis.
//!
//! Pure post-processing over [`CpmPasses`]: no further graph traversal.
//!
//! - `slack_days = latest_start - earliest_start`
//! - A node is critical iff `slack_days <= threshold` (zero by default, so
//!   negative slack from over-constrained inputs also counts as critical).

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::{CpmNode, CpmPasses};
use crate::models::{days_between, Dependency, DependencyId, EntityRef};

/// Full CPM output consumed by rendering code.
#[derive(Debug, Clone, Default)]
pub struct CpmResult {
    /// Dates and slack per entity.
    pub nodes: BTreeMap<EntityRef, CpmNode>,
    /// Entities with slack at or below the threshold.
    pub critical_path: BTreeSet<EntityRef>,
    /// Maximum earliest finish.
    pub horizon: Option<NaiveDate>,
    /// Dependencies excluded to break cycles. Dates of nodes on these
    /// cycles are not authoritative.
    pub broken_dependencies: Vec<DependencyId>,
}

/// Derives slack and the critical set from the raw passes.
pub fn analyze(passes: CpmPasses, critical_slack_days: i64) -> CpmResult {
    let CpmPasses {
        mut nodes,
        horizon,
        order,
    } = passes;

    let mut critical_path = BTreeSet::new();
    for (&reference, node) in nodes.iter_mut() {
        node.slack_days = days_between(node.earliest_start, node.latest_start);
        if node.slack_days <= critical_slack_days {
            critical_path.insert(reference);
        }
    }

    CpmResult {
        nodes,
        critical_path,
        horizon,
        broken_dependencies: order.broken,
    }
}

impl CpmResult {
    /// CPM dates of an entity.
    pub fn node(&self, reference: EntityRef) -> Option<&CpmNode> {
        self.nodes.get(&reference)
    }

    /// Slack of an entity in days.
    pub fn slack(&self, reference: EntityRef) -> Option<i64> {
        self.nodes.get(&reference).map(|n| n.slack_days)
    }

    /// Whether the entity is on the critical path.
    pub fn is_critical(&self, reference: EntityRef) -> bool {
        self.critical_path.contains(&reference)
    }

    /// Whether both ends of a dependency are critical (arrow highlighting).
    pub fn is_critical_dependency(&self, dependency: &Dependency) -> bool {
        self.is_critical(dependency.predecessor) && self.is_critical(dependency.successor)
    }

    /// Critical entities ordered by earliest start, then earliest finish.
    pub fn critical_sequence(&self) -> Vec<EntityRef> {
        let mut seq: Vec<EntityRef> = self.critical_path.iter().copied().collect();
        seq.sort_by_key(|r| {
            let n = &self.nodes[r];
            (n.earliest_start, n.earliest_finish, *r)
        });
        seq
    }

    /// Whether cycles were broken to compute this result.
    pub fn has_cycles(&self) -> bool {
        !self.broken_dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::cpm::{analyze, compute_cpm, compute_passes};
    use crate::graph::ScheduleGraph;
    use crate::models::{Dependency, EntityRef, ScheduleEntity};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn p(id: i64) -> EntityRef {
        EntityRef::Project(id)
    }

    /// Diamond: 1 → 2 → 4 and 1 → 3 → 4, with 2 longer than 3.
    fn diamond() -> ScheduleGraph {
        ScheduleGraph::build(
            vec![
                ScheduleEntity::project(1, Some(d(1)), Some(d(3))),
                ScheduleEntity::project(2, Some(d(1)), Some(d(11))),
                ScheduleEntity::project(3, Some(d(1)), Some(d(5))),
                ScheduleEntity::project(4, Some(d(1)), Some(d(2))),
            ],
            vec![
                Dependency::finish_to_start(1, p(1), p(2)),
                Dependency::finish_to_start(2, p(1), p(3)),
                Dependency::finish_to_start(3, p(2), p(4)),
                Dependency::finish_to_start(4, p(3), p(4)),
            ],
        )
    }

    #[test]
    fn test_diamond_slack() {
        let result = compute_cpm(&diamond());
        // 1: 1..3, 2: 3..13, 3: 3..7, 4: 13..14
        assert_eq!(result.horizon, Some(d(14)));
        assert_eq!(result.slack(p(1)), Some(0));
        assert_eq!(result.slack(p(2)), Some(0));
        assert_eq!(result.slack(p(3)), Some(6));
        assert_eq!(result.slack(p(4)), Some(0));
        assert_eq!(result.critical_sequence(), vec![p(1), p(2), p(4)]);
        assert!(!result.is_critical(p(3)));
    }

    #[test]
    fn test_acyclic_slack_is_non_negative_and_critical_chain_connected() {
        let g = diamond();
        let result = compute_cpm(&g);
        assert!(result.nodes.values().all(|n| n.slack_days >= 0));

        // Consecutive critical nodes are linked by a dependency
        let seq = result.critical_sequence();
        for pair in seq.windows(2) {
            assert!(g
                .dependencies()
                .iter()
                .any(|dep| dep.predecessor == pair[0] && dep.successor == pair[1]));
        }
        // Starts at a source, ends at the horizon
        assert_eq!(g.incoming(seq[0]).count(), 0);
        assert_eq!(
            result.node(*seq.last().unwrap()).unwrap().earliest_finish,
            result.horizon.unwrap()
        );
    }

    #[test]
    fn test_threshold_widens_critical_set() {
        let result = analyze(compute_passes(&diamond()), 6);
        assert!(result.is_critical(p(3)));
        let strict = analyze(compute_passes(&diamond()), 0);
        assert!(!strict.is_critical(p(3)));
    }

    #[test]
    fn test_critical_dependency() {
        let g = diamond();
        let result = compute_cpm(&g);
        let deps = g.dependencies();
        assert!(result.is_critical_dependency(&deps[0]));
        assert!(!result.is_critical_dependency(&deps[1]));
    }

    #[test]
    fn test_unconnected_nodes() {
        let g = ScheduleGraph::build(
            vec![
                ScheduleEntity::project(1, Some(d(1)), Some(d(10))),
                ScheduleEntity::project(2, Some(d(1)), Some(d(4))),
            ],
            vec![],
        );
        let result = compute_cpm(&g);
        assert_eq!(result.slack(p(1)), Some(0));
        assert_eq!(result.slack(p(2)), Some(6));
        assert!(!result.has_cycles());
    }
}
