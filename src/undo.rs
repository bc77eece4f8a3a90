//! Single-slot undo log.
//!
//! Holds at most one [`ChangeRecord`]. Recording a new change overwrites the
//! previous one; undoing consumes it, so a second consecutive undo is a
//! no-op.
//!
//! Undo restores captured dates unconditionally. Edits made to the same
//! entities after the captured change are overwritten without detection.

use tracing::info;

use crate::error::ScheduleError;
use crate::models::{ChangeRecord, DateWrite};
use crate::propagation::{commit_writes, ScheduleStore};

/// One level of undo.
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    slot: Option<ChangeRecord>,
}

impl UndoLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`, replacing any earlier one.
    pub fn record_change(&mut self, record: ChangeRecord) {
        self.slot = Some(record);
    }

    /// The record an undo would restore.
    pub fn peek(&self) -> Option<&ChangeRecord> {
        self.slot.as_ref()
    }

    /// Whether there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Drops the pending record.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Writes the captured `before` dates back to `store`.
    ///
    /// Returns the restored record and the writes that were issued, or
    /// `None` if the log was empty. If a write fails the record is kept so
    /// the undo can be retried; restoring is idempotent.
    pub fn undo<S>(
        &mut self,
        store: &mut S,
    ) -> Result<Option<(ChangeRecord, Vec<DateWrite>)>, ScheduleError>
    where
        S: ScheduleStore + ?Sized,
    {
        let Some(record) = self.slot.take() else {
            return Ok(None);
        };

        let writes = record.restore_writes();
        if let Err(err) = commit_writes(store, &writes) {
            self.slot = Some(record);
            return Err(err);
        }

        info!("Undid change: {}", record.description);
        Ok(Some((record, writes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateChange, DateRange, EntityRef};
    use crate::propagation::MemoryStore;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn range(a: u32, b: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, a).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, b).unwrap(),
        )
    }

    fn record(description: &str) -> ChangeRecord {
        let mut r = ChangeRecord::new(
            EntityRef::Project(1),
            DateChange::new(range(1, 10), range(3, 12)),
            description,
        );
        r.affected_milestones = BTreeMap::from([(4, DateChange::new(range(5, 5), range(7, 7)))]);
        r
    }

    #[test]
    fn test_undo_restores_before_dates() {
        let mut log = UndoLog::new();
        log.record_change(record("move"));
        let mut store = MemoryStore::new();

        let (restored, writes) = log.undo(&mut store).unwrap().unwrap();
        assert_eq!(restored.description, "move");
        assert_eq!(writes.len(), 2);
        assert_eq!(store.range(EntityRef::Project(1)), Some(range(1, 10)));
        assert_eq!(store.range(EntityRef::Milestone(4)), Some(range(5, 5)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_second_undo_is_noop() {
        let mut log = UndoLog::new();
        log.record_change(record("move"));
        let mut store = MemoryStore::new();
        log.undo(&mut store).unwrap();
        let writes_after_first = store.write_count();

        assert!(log.undo(&mut store).unwrap().is_none());
        assert_eq!(store.write_count(), writes_after_first);
    }

    #[test]
    fn test_record_overwrites() {
        let mut log = UndoLog::new();
        log.record_change(record("first"));
        log.record_change(record("second"));
        assert_eq!(log.peek().unwrap().description, "second");
        log.clear();
        assert!(log.is_empty());
    }
}
