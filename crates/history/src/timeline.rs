use terrascape_common::SubjectId;

/// How a recorded state relates to its subject's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    /// Snapshot of a subject just after it was created.
    Creation,
    /// Snapshot taken right before the subject was deleted.
    Deletion,
    /// Snapshot of the subject's value (post-edit, or an anchor referencing
    /// an earlier snapshot as the pre-edit value).
    Modify,
    /// Pre-edit snapshot of a subject with no prior history.
    StoreInit,
}

/// One per-subject entry of an action event: which subject, what kind of
/// state, and where its snapshot starts in the subject's log.
///
/// Immutable once written; anchors reference existing entries by copying
/// their offset rather than re-serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    pub subject: SubjectId,
    pub kind: StateKind,
    pub offset: usize,
}

/// One coherent user action (a drag stroke, a placement) recorded as an
/// ordered list of per-subject states, undone and redone atomically.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub context_id: u64,
    pub states: Vec<HistoryState>,
}

impl ActionEvent {
    pub fn new(context_id: u64) -> Self {
        Self {
            context_id,
            states: Vec::new(),
        }
    }
}

/// Committed action events plus the cursor marking the current position.
///
/// `cursor` is `None` when everything is undone; events after the cursor are
/// the redo branch. At most one pending (in-progress) event exists at a time.
#[derive(Debug, Default)]
pub struct Timeline {
    events: Vec<ActionEvent>,
    cursor: Option<usize>,
    pending: Option<ActionEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ActionEvent] {
        &self.events
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: Option<usize>) {
        if let Some(c) = cursor {
            debug_assert!(c < self.events.len());
        }
        self.cursor = cursor;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn pending(&self) -> Option<&ActionEvent> {
        self.pending.as_ref()
    }

    /// Open the pending event if none is open, and return it.
    pub(crate) fn ensure_pending(&mut self, context_id: u64) -> &mut ActionEvent {
        self.pending
            .get_or_insert_with(|| ActionEvent::new(context_id))
    }

    /// Commit the pending event: append it if it recorded any states,
    /// discard it otherwise. Returns `true` if an event was appended.
    pub(crate) fn commit_pending(&mut self) -> bool {
        let Some(event) = self.pending.take() else {
            return false;
        };
        if event.states.is_empty() {
            return false;
        }
        self.events.push(event);
        self.cursor = Some(self.events.len() - 1);
        true
    }

    /// Number of events behind (and including) the cursor.
    pub fn undo_steps(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    /// Number of events ahead of the cursor (the redo branch).
    pub fn redo_steps(&self) -> usize {
        self.events.len() - self.undo_steps()
    }

    /// Drop the redo branch, keeping events up to and including the cursor.
    pub(crate) fn truncate_to_cursor(&mut self) {
        self.events.truncate(self.undo_steps());
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
        self.cursor = None;
        self.pending = None;
    }
}
