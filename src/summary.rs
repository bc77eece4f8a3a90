//! Schedule summary indicators.
//!
//! Condenses a graph, its CPM result, and its violation report into the
//! figures shown in a timeline header.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Window | Earliest start .. horizon (max earliest finish) |
//! | Span | Days between window start and horizon |
//! | Critical count | Nodes with slack at or below threshold |
//! | Violated dependencies | Dependencies broken by current dates |
//! | Total / max slack | Over non-critical nodes |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cpm::CpmResult;
use crate::graph::ScheduleGraph;
use crate::models::days_between;
use crate::violation::ViolationReport;

/// Schedule-level indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Earliest CPM start across all nodes.
    pub window_start: Option<NaiveDate>,
    /// Maximum CPM earliest finish.
    pub horizon: Option<NaiveDate>,
    /// `horizon - window_start` in days (0 for an empty schedule).
    pub span_days: i64,
    /// Scheduled entities.
    pub node_count: usize,
    /// Entities on the critical path.
    pub critical_count: usize,
    /// Dependencies in the graph.
    pub dependency_count: usize,
    /// Dependencies violated by current dates.
    pub violated_dependencies: usize,
    /// Dependencies excluded to break cycles.
    pub broken_dependencies: usize,
    /// Sum of positive slack (days).
    pub total_slack_days: i64,
    /// Largest slack of any node (days).
    pub max_slack_days: i64,
}

impl ScheduleSummary {
    /// Computes the summary.
    pub fn calculate(graph: &ScheduleGraph, cpm: &CpmResult, violations: &ViolationReport) -> Self {
        let window_start = cpm.nodes.values().map(|n| n.earliest_start).min();
        let span_days = match (window_start, cpm.horizon) {
            (Some(start), Some(end)) => days_between(start, end),
            _ => 0,
        };

        let total_slack_days = cpm
            .nodes
            .values()
            .map(|n| n.slack_days.max(0))
            .sum();
        let max_slack_days = cpm
            .nodes
            .values()
            .map(|n| n.slack_days)
            .max()
            .unwrap_or(0)
            .max(0);

        Self {
            window_start,
            horizon: cpm.horizon,
            span_days,
            node_count: cpm.nodes.len(),
            critical_count: cpm.critical_path.len(),
            dependency_count: graph.dependencies().len(),
            violated_dependencies: violations.violation_count(),
            broken_dependencies: cpm.broken_dependencies.len(),
            total_slack_days,
            max_slack_days,
        }
    }

    /// No dependency is violated and no cycle had to be broken.
    pub fn is_on_track(&self) -> bool {
        self.violated_dependencies == 0 && self.broken_dependencies == 0
    }

    /// Fraction of nodes on the critical path (0.0 for an empty schedule).
    pub fn critical_ratio(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.critical_count as f64 / self.node_count as f64
        }
    }
}
