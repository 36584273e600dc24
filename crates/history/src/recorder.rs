use std::collections::{BTreeMap, HashSet};

use terrascape_common::SubjectId;
use terrascape_scene::{Scene, SubjectHandle};
use tracing::debug;

use crate::error::HistoryError;
use crate::notify::{HistoryEventKind, HistorySink};
use crate::registry::TrackingRegistry;
use crate::timeline::{HistoryState, StateKind, Timeline};

/// Where a subject's most recent recorded state was found.
enum PriorState {
    /// Already recorded in the in-progress action; nothing more to anchor.
    InPending,
    /// Found in a committed event at or before the cursor.
    Committed(HistoryState),
    /// The subject has no recorded history.
    None,
}

/// The action-history engine: records user actions against a [`Scene`] and
/// replays them for undo/redo.
///
/// One instance per loaded level, created on load and [cleared](Self::clear)
/// on unload. Strictly single-threaded; every call runs to completion before
/// the next.
///
/// # Recording protocol
///
/// - [`on_create`](Self::on_create) after inserting a subject,
/// - [`on_delete`](Self::on_delete) *before* removing it (the snapshot must
///   capture the pre-deletion state),
/// - [`begin_modify`](Self::begin_modify) before changing a subject,
///   re-entrant per subject so streamed edits (paint-drag callbacks)
///   flatten into one logical edit,
/// - [`end_action`](Self::end_action) to commit everything recorded since
///   the action opened as one undoable event.
#[derive(Default)]
pub struct ActionHistory {
    timeline: Timeline,
    registry: TrackingRegistry,
    /// Subjects open for modification in the pending action, with a
    /// per-subject re-entrancy depth.
    editing: BTreeMap<SubjectId, u32>,
    next_context_id: u64,
    sink: Option<Box<dyn HistorySink>>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Box<dyn HistorySink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn HistorySink>>) {
        self.sink = sink;
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &[crate::timeline::ActionEvent] {
        self.timeline.events()
    }

    /// Index of the current event, or `None` when fully undone.
    pub fn cursor(&self) -> Option<usize> {
        self.timeline.cursor()
    }

    /// Whether an action is currently being recorded.
    pub fn has_pending(&self) -> bool {
        self.timeline.has_pending()
    }

    /// Per-subject tracking records (logs, live handles).
    pub fn registry(&self) -> &TrackingRegistry {
        &self.registry
    }

    /// Record the creation of a subject that is already live in the scene.
    /// The snapshot captures its just-created state.
    pub fn on_create(&mut self, scene: &Scene, handle: SubjectHandle) -> Result<(), HistoryError> {
        let subject = scene.get(handle).ok_or(HistoryError::SubjectNotFound(handle))?;
        self.rewind_events();
        let pending = self.timeline.ensure_pending(self.next_context_id);
        self.registry
            .record_state(pending, subject, handle, StateKind::Creation)?;
        self.notify(Some(handle), HistoryEventKind::Created);
        Ok(())
    }

    /// Record the deletion of a subject. Must be called while the subject is
    /// still live: the snapshot captures the pre-deletion state that later
    /// resurrection restores. The caller remains responsible for actually
    /// removing the subject from the scene afterwards.
    pub fn on_delete(&mut self, scene: &Scene, handle: SubjectHandle) -> Result<(), HistoryError> {
        let subject = scene.get(handle).ok_or(HistoryError::SubjectNotFound(handle))?;
        let id = subject.id();
        self.rewind_events();
        let pending = self.timeline.ensure_pending(self.next_context_id);
        self.registry
            .record_state(pending, subject, handle, StateKind::Deletion)?;
        self.registry
            .get_mut(id)
            .expect("record was just created")
            .set_live(None);
        // A deletion supersedes an open modify on the same subject; the
        // deletion snapshot is the subject's final state, so no post-edit
        // state is taken at commit.
        self.editing.remove(&id);
        self.notify(Some(handle), HistoryEventKind::Deleted);
        Ok(())
    }

    /// Open a subject for modification within the pending action.
    ///
    /// Re-entrant per subject: nested calls before
    /// [`end_action`](Self::end_action) only bump a counter, so a stream of
    /// edit callbacks records a single pre/post pair. The pre-edit value is
    /// anchored at zero storage cost when a prior snapshot exists; otherwise
    /// a fresh pre-edit snapshot is taken.
    pub fn begin_modify(
        &mut self,
        scene: &Scene,
        handle: SubjectHandle,
    ) -> Result<(), HistoryError> {
        let subject = scene.get(handle).ok_or(HistoryError::SubjectNotFound(handle))?;
        let id = subject.id();

        if let Some(depth) = self.editing.get_mut(&id) {
            *depth += 1;
            return Ok(());
        }
        self.rewind_events();
        self.editing.insert(id, 1);

        match self.find_prior_state(id) {
            PriorState::InPending => {}
            PriorState::Committed(prior) if prior.kind != StateKind::Deletion => {
                // Anchor the pending action's "before" value to the nearest
                // known prior snapshot: same subject, same offset, kind
                // forced to Modify. No re-serialization.
                let pending = self.timeline.ensure_pending(self.next_context_id);
                pending.states.push(HistoryState {
                    subject: id,
                    kind: StateKind::Modify,
                    offset: prior.offset,
                });
            }
            PriorState::Committed(_) => {
                debug!(subject = %id, "last recorded state is a deletion; no anchor recorded");
            }
            PriorState::None => {
                let pending = self.timeline.ensure_pending(self.next_context_id);
                self.registry
                    .record_state(pending, subject, handle, StateKind::StoreInit)?;
            }
        }
        Ok(())
    }

    /// Commit the pending action as one undoable event.
    ///
    /// Serializes the post-edit state of every subject opened with
    /// [`begin_modify`](Self::begin_modify), appends the event to the
    /// timeline (or discards it if nothing was recorded), and advances the
    /// context-id counter. No-op when no action is open.
    pub fn end_action(&mut self, scene: &Scene) -> Result<(), HistoryError> {
        if !self.timeline.has_pending() {
            debug_assert!(
                self.editing.is_empty(),
                "subjects open for modification without a pending action"
            );
            return Ok(());
        }

        let editing = std::mem::take(&mut self.editing);
        for id in editing.into_keys() {
            let handle = self
                .registry
                .get(id)
                .expect("edited subject has no tracking record")
                .live()
                .expect("edited subject has no live handle");
            let subject = scene.get(handle).ok_or(HistoryError::SubjectNotFound(handle))?;
            let pending = self.timeline.ensure_pending(self.next_context_id);
            self.registry
                .record_state(pending, subject, handle, StateKind::Modify)?;
        }

        let committed = self.timeline.commit_pending();
        self.next_context_id += 1;
        if committed {
            debug!(
                events = self.timeline.events().len(),
                "action committed to timeline"
            );
        }
        Ok(())
    }

    /// Discard the redo branch before recording a new action.
    ///
    /// Tracking records whose entire history lies in the discarded branch
    /// are dropped from the registry. If such a subject still exists in the
    /// scene it is left there untouched; removing it is the editor layer's
    /// call, not ours.
    fn rewind_events(&mut self) {
        if self.timeline.has_pending() {
            return;
        }
        let discarded = self.timeline.redo_steps();
        if discarded == 0 {
            return;
        }

        let kept: HashSet<SubjectId> = self.timeline.events()[..self.timeline.undo_steps()]
            .iter()
            .flat_map(|event| event.states.iter().map(|state| state.subject))
            .collect();
        self.registry.retain(|id, record| {
            if kept.contains(id) {
                true
            } else {
                debug!(
                    subject = %id,
                    still_live = record.live().is_some(),
                    "dropping tracking record; its history lies in the discarded redo branch"
                );
                false
            }
        });

        self.timeline.truncate_to_cursor();
        debug!(discarded, "redo branch discarded");
    }

    fn find_prior_state(&self, id: SubjectId) -> PriorState {
        if let Some(pending) = self.timeline.pending() {
            if pending.states.iter().any(|s| s.subject == id) {
                return PriorState::InPending;
            }
        }
        for event in self.timeline.events()[..self.timeline.undo_steps()]
            .iter()
            .rev()
        {
            if let Some(state) = event.states.iter().rev().find(|s| s.subject == id) {
                return PriorState::Committed(*state);
            }
        }
        PriorState::None
    }

    pub(crate) fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub(crate) fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub(crate) fn registry_mut(&mut self) -> &mut TrackingRegistry {
        &mut self.registry
    }

    pub(crate) fn editing_mut(&mut self) -> &mut BTreeMap<SubjectId, u32> {
        &mut self.editing
    }

    pub(crate) fn reset_context_counter(&mut self) {
        self.next_context_id = 0;
    }

    pub(crate) fn notify(&mut self, subject: Option<SubjectHandle>, kind: HistoryEventKind) {
        if let Some(sink) = &mut self.sink {
            sink.on_history_event(subject, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Prop;
    use terrascape_scene::Subject;

    fn spawn(scene: &mut Scene, value: i32) -> (SubjectId, SubjectHandle) {
        let prop = Prop::new(value);
        let id = Subject::id(&prop);
        (id, scene.insert(Box::new(prop)))
    }

    #[test]
    fn create_then_commit_appends_one_event() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (id, handle) = spawn(&mut scene, 1);

        history.on_create(&scene, handle).unwrap();
        assert!(history.has_pending());
        history.end_action(&scene).unwrap();

        assert!(!history.has_pending());
        assert_eq!(history.events().len(), 1);
        assert_eq!(history.cursor(), Some(0));
        let states = &history.events()[0].states;
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].subject, id);
        assert_eq!(states[0].kind, StateKind::Creation);
    }

    #[test]
    fn empty_action_is_discarded() {
        let scene = Scene::new();
        let mut history = ActionHistory::new();
        history.end_action(&scene).unwrap();
        assert_eq!(history.events().len(), 0);
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn context_ids_are_distinct_across_actions() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (_, a) = spawn(&mut scene, 1);
        let (_, b) = spawn(&mut scene, 2);

        history.on_create(&scene, a).unwrap();
        history.end_action(&scene).unwrap();
        history.on_create(&scene, b).unwrap();
        history.end_action(&scene).unwrap();

        assert_ne!(
            history.events()[0].context_id,
            history.events()[1].context_id
        );
    }

    #[test]
    fn reentrant_begin_modify_records_one_anchor() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (id, handle) = spawn(&mut scene, 1);

        // Simulates a paint drag: several begin calls, one end.
        history.begin_modify(&scene, handle).unwrap();
        history.begin_modify(&scene, handle).unwrap();
        history.begin_modify(&scene, handle).unwrap();
        crate::testutil::set_prop_value(&mut scene, handle, 9);
        history.end_action(&scene).unwrap();

        let states = &history.events()[0].states;
        let inits = states
            .iter()
            .filter(|s| s.subject == id && s.kind == StateKind::StoreInit)
            .count();
        let modifies = states
            .iter()
            .filter(|s| s.subject == id && s.kind == StateKind::Modify)
            .count();
        assert_eq!(inits, 1);
        assert_eq!(modifies, 1);
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn modify_after_commit_anchors_without_reserializing() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (id, handle) = spawn(&mut scene, 1);

        history.on_create(&scene, handle).unwrap();
        history.end_action(&scene).unwrap();
        let creation_offset = history.events()[0].states[0].offset;
        let log_len = history.registry().get(id).unwrap().log_len();

        history.begin_modify(&scene, handle).unwrap();

        // The anchor reuses the creation snapshot's offset; the log did not grow.
        assert_eq!(history.registry().get(id).unwrap().log_len(), log_len);
        history.end_action(&scene).unwrap();
        let states = &history.events()[1].states;
        assert_eq!(states[0].kind, StateKind::Modify);
        assert_eq!(states[0].offset, creation_offset);
        assert_eq!(states[1].kind, StateKind::Modify);
        assert!(states[1].offset > creation_offset);
    }

    #[test]
    fn modify_within_creating_action_needs_no_anchor() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (_, handle) = spawn(&mut scene, 1);

        history.on_create(&scene, handle).unwrap();
        history.begin_modify(&scene, handle).unwrap();
        history.end_action(&scene).unwrap();

        let states = &history.events()[0].states;
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].kind, StateKind::Creation);
        assert_eq!(states[1].kind, StateKind::Modify);
    }

    #[test]
    fn delete_clears_live_handle() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (id, handle) = spawn(&mut scene, 1);

        history.on_create(&scene, handle).unwrap();
        history.end_action(&scene).unwrap();
        history.on_delete(&scene, handle).unwrap();
        scene.remove(handle);
        history.end_action(&scene).unwrap();

        let record = history.registry().get(id).unwrap();
        assert_eq!(record.live(), None);
        // The pre-deletion snapshot is retained.
        assert!(record.log_len() > 0);
    }

    #[test]
    fn delete_during_open_modify_commits_without_post_state() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (id, handle) = spawn(&mut scene, 1);

        history.on_create(&scene, handle).unwrap();
        history.end_action(&scene).unwrap();

        // The subject is deleted while open for modification; its deletion
        // snapshot already carries the edit.
        history.begin_modify(&scene, handle).unwrap();
        crate::testutil::set_prop_value(&mut scene, handle, 5);
        history.on_delete(&scene, handle).unwrap();
        scene.remove(handle);
        history.end_action(&scene).unwrap();

        let kinds: Vec<StateKind> = history.events()[1]
            .states
            .iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(kinds, [StateKind::Modify, StateKind::Deletion]);
        assert_eq!(history.registry().get(id).unwrap().live(), None);
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut scene = Scene::new();
        let mut history = ActionHistory::new();
        let (_, handle) = spawn(&mut scene, 1);
        scene.remove(handle);

        let err = history.on_create(&scene, handle).unwrap_err();
        assert!(matches!(err, HistoryError::SubjectNotFound(_)));
    }
}
