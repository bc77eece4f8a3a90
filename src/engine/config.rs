//! Engine configuration.

use serde::{Deserialize, Serialize};

/// What the undo record captures for one change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoScope {
    /// The edited entity and the milestones repositioned with it.
    #[default]
    Direct,
    /// Everything the cascade wrote.
    Cascade,
}

/// Tunables for [`ScheduleEngine`](super::ScheduleEngine).
///
/// # Examples
///
/// ```
/// use u_gantt::engine::{EngineConfig, UndoScope};
///
/// let config = EngineConfig::new()
///     .with_critical_slack(2)
///     .with_undo_scope(UndoScope::Cascade);
/// assert_eq!(config.critical_slack_days, 2);
/// assert!(config.rescale_milestones);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A node is critical iff its slack is at or below this many days.
    pub critical_slack_days: i64,
    /// Reposition a project's milestones when the project moves or resizes.
    pub rescale_milestones: bool,
    /// Undo capture scope.
    pub undo_scope: UndoScope,
    /// Maximum cascade depth below the edited entity.
    pub max_cascade_depth: usize,
}

impl EngineConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self {
            critical_slack_days: 0,
            rescale_milestones: true,
            undo_scope: UndoScope::Direct,
            max_cascade_depth: 1024,
        }
    }

    /// Sets the criticality threshold.
    pub fn with_critical_slack(mut self, days: i64) -> Self {
        self.critical_slack_days = days;
        self
    }

    /// Enables or disables milestone repositioning.
    pub fn with_milestone_rescaling(mut self, enabled: bool) -> Self {
        self.rescale_milestones = enabled;
        self
    }

    /// Sets the undo capture scope.
    pub fn with_undo_scope(mut self, scope: UndoScope) -> Self {
        self.undo_scope = scope;
        self
    }

    /// Sets the cascade depth bound.
    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
