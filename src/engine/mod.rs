//! Schedule engine facade.
//!
//! [`ScheduleEngine`] bundles an [`EngineConfig`] with the engine's
//! operations. It holds no schedule state: the caller owns the graph, the
//! store, and the undo log, and passes them in explicitly.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use u_gantt::engine::ScheduleEngine;
//! use u_gantt::graph::ScheduleGraph;
//! use u_gantt::models::{Dependency, EntityRef, ScheduleEntity};
//! use u_gantt::propagation::{MemoryStore, ScheduleChange};
//! use u_gantt::undo::UndoLog;
//!
//! let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
//! let a = EntityRef::Project(1);
//! let b = EntityRef::Project(2);
//! let mut graph = ScheduleGraph::build(
//!     vec![
//!         ScheduleEntity::project(1, Some(d(1)), Some(d(10))),
//!         ScheduleEntity::project(2, Some(d(12)), Some(d(20))),
//!     ],
//!     vec![Dependency::finish_to_start(1, a, b).with_lag(2)],
//! );
//! let mut store = MemoryStore::from_graph(&graph);
//! let mut undo = UndoLog::new();
//! let engine = ScheduleEngine::new();
//!
//! engine
//!     .apply_change(&mut graph, &ScheduleChange::move_by(a, 3), &mut store, &mut undo)
//!     .unwrap();
//! assert_eq!(graph.range(b).unwrap().start, d(15));
//! assert!(engine.check_dependencies(&graph).is_clean());
//!
//! engine.undo(&mut graph, &mut store, &mut undo).unwrap();
//! assert_eq!(graph.range(a).unwrap().start, d(1));
//! ```

mod config;

pub use config::{EngineConfig, UndoScope};

use tracing::info;

use crate::cpm::{analyze, compute_passes, CpmResult};
use crate::error::ScheduleError;
use crate::graph::ScheduleGraph;
use crate::models::ChangeRecord;
use crate::propagation::{commit_writes, plan_change, Propagation, ScheduleChange, ScheduleStore};
use crate::summary::ScheduleSummary;
use crate::undo::UndoLog;
use crate::violation::{detect_violations, ViolationReport};

/// Stateless entry point to the schedule engine.
#[derive(Debug, Clone, Default)]
pub struct ScheduleEngine {
    config: EngineConfig,
}

impl ScheduleEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Computes CPM dates, slack, and the critical path.
    pub fn compute_cpm(&self, graph: &ScheduleGraph) -> CpmResult {
        analyze(compute_passes(graph), self.config.critical_slack_days)
    }

    /// Flags every dependency violated by the current dates.
    pub fn check_dependencies(&self, graph: &ScheduleGraph) -> ViolationReport {
        detect_violations(graph)
    }

    /// Plans an edit without side effects. See [`plan_change`].
    pub fn plan_change(
        &self,
        graph: &ScheduleGraph,
        change: &ScheduleChange,
    ) -> Result<Option<Propagation>, ScheduleError> {
        plan_change(graph, change, &self.config)
    }

    /// Plans, commits, and records an edit.
    ///
    /// On success `graph` reflects every write and `undo` holds the new
    /// record. An edit with zero displacement returns `Ok(None)` without
    /// touching the store or the undo log.
    ///
    /// # Errors
    /// Planning errors leave everything untouched. A
    /// [`ScheduleError::Persistence`] failure leaves the writes before it
    /// applied (in the store and in `graph`); no undo record is kept, and
    /// the caller should re-fetch to reconcile.
    pub fn apply_change<S>(
        &self,
        graph: &mut ScheduleGraph,
        change: &ScheduleChange,
        store: &mut S,
        undo: &mut UndoLog,
    ) -> Result<Option<ChangeRecord>, ScheduleError>
    where
        S: ScheduleStore + ?Sized,
    {
        let Some(propagation) = self.plan_change(graph, change)? else {
            return Ok(None);
        };

        if let Err(err) = commit_writes(store, &propagation.writes) {
            if let ScheduleError::Persistence { applied, .. } = &err {
                graph.apply_writes(&propagation.writes[..*applied]);
            }
            return Err(err);
        }

        info!(
            "{} ({} entities written)",
            propagation.record.description,
            propagation.writes.len()
        );
        *graph = propagation.graph;
        undo.record_change(propagation.record.clone());
        Ok(Some(propagation.record))
    }

    /// Restores the last recorded change, in the store and in `graph`.
    ///
    /// # Errors
    /// On a [`ScheduleError::Persistence`] failure the restore writes before
    /// it stay applied in the store and in `graph`, and the record stays in
    /// `undo` so the undo can be retried.
    pub fn undo<S>(
        &self,
        graph: &mut ScheduleGraph,
        store: &mut S,
        undo: &mut UndoLog,
    ) -> Result<Option<ChangeRecord>, ScheduleError>
    where
        S: ScheduleStore + ?Sized,
    {
        let pending = undo
            .peek()
            .map(ChangeRecord::restore_writes)
            .unwrap_or_default();
        match undo.undo(store) {
            Ok(restored) => Ok(restored.map(|(record, writes)| {
                graph.apply_writes(&writes);
                record
            })),
            Err(err) => {
                if let ScheduleError::Persistence { applied, .. } = &err {
                    graph.apply_writes(&pending[..*applied]);
                }
                Err(err)
            }
        }
    }

    /// Summarizes the schedule.
    pub fn summarize(&self, graph: &ScheduleGraph) -> ScheduleSummary {
        let cpm = self.compute_cpm(graph);
        let violations = self.check_dependencies(graph);
        ScheduleSummary::calculate(graph, &cpm, &violations)
    }
}
