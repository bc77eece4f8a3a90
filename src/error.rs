//! Error types.
//!
//! Only conditions the caller must act on are errors. Dangling edges,
//! undated entities and dependency cycles are logged and reported as data.

use thiserror::Error;

use crate::models::EntityRef;

/// Errors raised by planning, committing, or undoing a change.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The edited entity is not in the graph.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityRef),

    /// The entity exists in the store but lacks the dates needed to schedule it.
    #[error("Entity {0} has no schedulable dates")]
    Unscheduled(EntityRef),

    /// The requested edit would produce an invalid interval.
    #[error("Invalid change for {target}: {reason}")]
    InvalidChange { target: EntityRef, reason: String },

    /// A store write failed; earlier writes of the same commit remain applied.
    #[error("Persistence failed for {target} after {applied} of {total} writes")]
    Persistence {
        target: EntityRef,
        applied: usize,
        total: usize,
        #[source]
        source: StoreError,
    },
}

/// Error returned by a [`ScheduleStore`](crate::propagation::ScheduleStore).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl StoreError {
    /// Creates an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying transport error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
