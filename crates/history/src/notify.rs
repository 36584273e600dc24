use terrascape_scene::SubjectHandle;

/// What happened to a subject during recording or replay.
///
/// `Completed` is emitted once per undo/redo call, with no subject, after
/// all per-subject notifications, so the host can refresh its views on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEventKind {
    Created,
    Deleted,
    Modified,
    Completed,
}

/// Host callback for history activity.
///
/// Invoked synchronously by both the recording and the replay side so the
/// editor's panels can refresh. The sink must not call back into the
/// history engine.
pub trait HistorySink {
    fn on_history_event(&mut self, subject: Option<SubjectHandle>, kind: HistoryEventKind);
}
