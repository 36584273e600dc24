//! Undo/redo replay over the recorded timeline.
//!
//! Both operations run in two phases. Stepping over an event first inverts
//! its lifecycle records (creations are retired, deletions resurrected from
//! their pre-deletion snapshots), then the event at the new cursor position
//! is replayed so its subjects carry the values recorded there. The branch
//! between updating a live subject in place and constructing a new one is
//! decided by an explicit liveness check on the tracking record.

use terrascape_common::SubjectId;
use terrascape_scene::Scene;
use tracing::debug;

use crate::error::HistoryError;
use crate::notify::HistoryEventKind;
use crate::recorder::ActionHistory;
use crate::timeline::{HistoryState, StateKind};

impl ActionHistory {
    /// Step one event back.
    ///
    /// No-op when fully undone. Must not be called while an action is being
    /// recorded.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<(), HistoryError> {
        assert!(
            !self.has_pending(),
            "undo called while an action is being recorded"
        );
        let Some(cursor) = self.cursor() else {
            return Ok(());
        };

        // Phase 1: invert the lifecycle records of the event being stepped
        // over.
        let states = self.timeline().events()[cursor].states.clone();
        for state in &states {
            match state.kind {
                StateKind::Creation => self.retire_subject(scene, state.subject),
                StateKind::Deletion => self.ensure_live(scene, state)?,
                StateKind::Modify | StateKind::StoreInit => {}
            }
        }

        self.timeline_mut().set_cursor(cursor.checked_sub(1));

        // Phase 2: replay the event at the new current position.
        if let Some(current) = self.cursor() {
            let states = self.timeline().events()[current].states.clone();
            for state in &states {
                match state.kind {
                    StateKind::Creation => {
                        self.apply_state(scene, state, HistoryEventKind::Created)?
                    }
                    StateKind::Modify | StateKind::StoreInit => {
                        self.apply_state(scene, state, HistoryEventKind::Modified)?
                    }
                    StateKind::Deletion => {}
                }
            }
        }

        self.notify(None, HistoryEventKind::Completed);
        debug!(
            undo_steps = self.undo_steps(),
            redo_steps = self.redo_steps(),
            "undo applied"
        );
        Ok(())
    }

    /// Step one event forward along the redo branch.
    ///
    /// No-op when fully redone. Must not be called while an action is being
    /// recorded.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<(), HistoryError> {
        assert!(
            !self.has_pending(),
            "redo called while an action is being recorded"
        );
        let total = self.events().len();
        let next = match self.cursor() {
            Some(c) if c + 1 < total => c + 1,
            Some(_) => return Ok(()),
            None if total > 0 => 0,
            None => return Ok(()),
        };

        // Phase 1: re-apply the current event's deletions. Idempotent
        // safeguard; normally they already took effect.
        if let Some(current) = self.cursor() {
            let states = self.timeline().events()[current].states.clone();
            for state in states.iter().filter(|s| s.kind == StateKind::Deletion) {
                self.retire_subject(scene, state.subject);
            }
        }

        self.timeline_mut().set_cursor(Some(next));

        // Phase 2: replay the event at the new current position.
        let states = self.timeline().events()[next].states.clone();
        for state in &states {
            match state.kind {
                StateKind::Deletion => self.retire_subject(scene, state.subject),
                StateKind::Creation => {
                    let live = self
                        .registry()
                        .get(state.subject)
                        .expect("history state references an untracked subject")
                        .live();
                    match live {
                        Some(handle) => self.notify(Some(handle), HistoryEventKind::Created),
                        None => self.resurrect_from(scene, state, HistoryEventKind::Created)?,
                    }
                }
                StateKind::Modify | StateKind::StoreInit => {
                    self.apply_state(scene, state, HistoryEventKind::Modified)?
                }
            }
        }

        self.notify(None, HistoryEventKind::Completed);
        debug!(
            undo_steps = self.undo_steps(),
            redo_steps = self.redo_steps(),
            "redo applied"
        );
        Ok(())
    }

    /// Number of events that can be undone; 0 when fully undone.
    pub fn undo_steps(&self) -> usize {
        self.timeline().undo_steps()
    }

    /// Number of events that can be redone; 0 when fully redone.
    pub fn redo_steps(&self) -> usize {
        self.timeline().redo_steps()
    }

    /// Wipe the timeline, the registry and any in-progress action, and reset
    /// the context-id counter. Tied to level unload; live subjects in the
    /// scene are untouched.
    pub fn clear(&mut self) {
        self.timeline_mut().clear();
        self.registry_mut().clear();
        self.editing_mut().clear();
        self.reset_context_counter();
        debug!("history cleared");
    }

    /// Remove a subject from the scene if it is live, clearing the record's
    /// handle. No-op for an already-retired subject.
    fn retire_subject(&mut self, scene: &mut Scene, id: SubjectId) {
        let live = {
            let record = self
                .registry_mut()
                .get_mut(id)
                .expect("history state references an untracked subject");
            let live = record.live();
            record.set_live(None);
            live
        };
        if let Some(handle) = live {
            self.notify(Some(handle), HistoryEventKind::Deleted);
            scene.remove(handle);
        }
    }

    /// Make sure the state's subject is live, resurrecting it from the
    /// snapshot at `state.offset` if it is not. Notifies only when a
    /// resurrection actually happened.
    fn ensure_live(&mut self, scene: &mut Scene, state: &HistoryState) -> Result<(), HistoryError> {
        let live = self
            .registry()
            .get(state.subject)
            .expect("history state references an untracked subject")
            .live();
        match live {
            Some(_) => Ok(()),
            None => self.resurrect_from(scene, state, HistoryEventKind::Created),
        }
    }

    /// Apply the snapshot at `state.offset` to its subject: in place when it
    /// is live, through the factory when it is not.
    fn apply_state(
        &mut self,
        scene: &mut Scene,
        state: &HistoryState,
        kind: HistoryEventKind,
    ) -> Result<(), HistoryError> {
        let record = self
            .registry()
            .get(state.subject)
            .expect("history state references an untracked subject");
        match record.live() {
            Some(handle) => {
                let bytes = record.log().read_at(state.offset).to_vec();
                let subject = scene
                    .get_mut(handle)
                    .ok_or(HistoryError::SubjectNotFound(handle))?;
                subject.load_state(&bytes)?;
                self.notify(Some(handle), kind);
                Ok(())
            }
            None => self.resurrect_from(scene, state, kind),
        }
    }

    fn resurrect_from(
        &mut self,
        scene: &mut Scene,
        state: &HistoryState,
        kind: HistoryEventKind,
    ) -> Result<(), HistoryError> {
        let (factory, bytes) = {
            let record = self
                .registry()
                .get(state.subject)
                .expect("history state references an untracked subject");
            (record.factory(), record.log().read_at(state.offset).to_vec())
        };
        let subject = factory
            .resurrect(&bytes)
            .map_err(|source| HistoryError::Resurrection {
                subject: state.subject,
                source,
            })?;
        let handle = scene.insert(subject);
        self.registry_mut()
            .get_mut(state.subject)
            .expect("record disappeared during resurrection")
            .set_live(Some(handle));
        self.notify(Some(handle), kind);
        Ok(())
    }
}
