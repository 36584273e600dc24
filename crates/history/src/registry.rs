use std::collections::HashMap;
use std::sync::Arc;

use terrascape_common::SubjectId;
use terrascape_scene::{SceneError, Subject, SubjectFactory, SubjectHandle};
use tracing::trace;

use crate::snapshot::SnapshotLog;
use crate::timeline::{ActionEvent, HistoryState, StateKind};

/// Per-subject tracking state: the snapshot log, the current live handle,
/// and the factory that resurrects the subject when none is live.
pub struct TrackingRecord {
    live: Option<SubjectHandle>,
    log: SnapshotLog,
    factory: Arc<dyn SubjectFactory>,
}

impl TrackingRecord {
    /// Handle of the live subject, or `None` while it is deleted.
    pub fn live(&self) -> Option<SubjectHandle> {
        self.live
    }

    pub(crate) fn set_live(&mut self, live: Option<SubjectHandle>) {
        self.live = live;
    }

    pub(crate) fn log(&self) -> &SnapshotLog {
        &self.log
    }

    pub(crate) fn factory(&self) -> Arc<dyn SubjectFactory> {
        Arc::clone(&self.factory)
    }

    /// Total snapshot bytes stored for this subject.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }
}

/// Maps tracked subjects to their [`TrackingRecord`]s.
///
/// Records are created lazily on first reference and destroyed only by a
/// full history clear or by redo-branch pruning.
#[derive(Default)]
pub struct TrackingRegistry {
    records: HashMap<SubjectId, TrackingRecord>,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: SubjectId) -> Option<&TrackingRecord> {
        self.records.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: SubjectId) -> Option<&mut TrackingRecord> {
        self.records.get_mut(&id)
    }

    /// Iterate over tracked subjects and their records.
    pub fn iter(&self) -> impl Iterator<Item = (SubjectId, &TrackingRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Look up the record for a live subject, creating it with an empty log
    /// and the subject's factory on first reference. The live handle is
    /// refreshed either way.
    pub(crate) fn get_or_create(
        &mut self,
        subject: &dyn Subject,
        handle: SubjectHandle,
    ) -> &mut TrackingRecord {
        let record = self
            .records
            .entry(subject.id())
            .or_insert_with(|| TrackingRecord {
                live: Some(handle),
                log: SnapshotLog::new(),
                factory: subject.factory(),
            });
        record.live = Some(handle);
        record
    }

    /// Record a state for a live subject: append a history state referencing
    /// the log's write position, then serialize the subject's current data
    /// into the log. This is the only point snapshot data is ever written.
    pub(crate) fn record_state(
        &mut self,
        event: &mut ActionEvent,
        subject: &dyn Subject,
        handle: SubjectHandle,
        kind: StateKind,
    ) -> Result<(), SceneError> {
        let record = self.get_or_create(subject, handle);
        let offset = record.log.write_offset();
        subject.save_state(record.log.buffer_mut())?;
        event.states.push(HistoryState {
            subject: subject.id(),
            kind,
            offset,
        });
        trace!(id = %subject.id(), ?kind, offset, "state recorded");
        Ok(())
    }

    /// Drop records not accepted by the predicate.
    pub(crate) fn retain(&mut self, f: impl FnMut(&SubjectId, &mut TrackingRecord) -> bool) {
        self.records.retain(f);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
