//! Schedule domain models.
//!
//! Provides the data types the engine reads from the host (entities,
//! dependencies, persistence records) and the transient values it
//! produces (date writes, change records).
//!
//! # Host Mappings
//!
//! | u-gantt | Host store |
//! |---------|-----------|
//! | `ScheduleEntity` (project) | Project row (`startDate`, `endDate`) |
//! | `ScheduleEntity` (milestone) | Milestone row (`plannedStartDate`, `plannedEndDate`) |
//! | `Dependency` | Dependency row |
//! | `ChangeRecord` | Not persisted (undo slot) |

mod change;
mod dependency;
mod entity;
mod record;

pub use change::{CascadedChange, ChangeRecord, DateChange, DateWrite};
pub use dependency::{Dependency, DependencyId, DependencyType};
pub use entity::{
    add_days, days_between, sub_days, Anchor, DateRange, EntityId, EntityKind, EntityRef,
    ScheduleEntity,
};
pub use record::{DependencyRecord, MilestoneRecord, ProjectRecord};
