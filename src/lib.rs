//! Dependency-constrained schedule engine for project timelines.
//!
//! Projects and milestones are date intervals linked by typed dependencies
//! (FS, SS, FF, SF) with lag. The engine computes critical-path dates and
//! slack, flags violated dependencies, cascades an edit through every
//! dependent entity, and keeps a single-step undo of the last edit.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `EntityRef`, `ScheduleEntity`, `Dependency`,
//!   `DateRange`, `ChangeRecord`, and the host's camelCase records
//! - **`graph`**: `ScheduleGraph` construction and dependency ordering
//! - **`cpm`**: Forward/backward passes, slack, and the critical path
//! - **`violation`**: Dependency violation detection
//! - **`propagation`**: Edit cascading, milestone repositioning, and the
//!   `ScheduleStore` persistence seam
//! - **`undo`**: Single-slot undo log
//! - **`engine`**: `ScheduleEngine` facade and `EngineConfig`
//! - **`summary`**: Schedule-level indicators
//! - **`validation`**: Input integrity checks (duplicate IDs, DAG cycles, dangling references)
//! - **`error`**: `ScheduleError` and `StoreError`
//!
//! # Architecture
//!
//! The crate holds no schedule state and performs no I/O of its own.
//! Callers build a graph from their records, ask the engine for results,
//! and hand it a store to receive date writes.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - PMI (2021), "A Guide to the Project Management Body of Knowledge", Ch. 6
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4

pub mod cpm;
pub mod engine;
pub mod error;
pub mod graph;
pub mod models;
pub mod propagation;
pub mod summary;
pub mod undo;
pub mod validation;
pub mod violation;

pub use engine::{EngineConfig, ScheduleEngine, UndoScope};
pub use error::{ScheduleError, StoreError};
