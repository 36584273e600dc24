//! Action history for the terrascape editor.
//!
//! Every user action is recorded as an ordered list of per-subject snapshot
//! references into append-only, per-subject byte logs. Undo and redo replay
//! those snapshots; deleting a subject keeps its pre-deletion snapshot so it
//! can be resurrected later. Recording a new action after undoing discards
//! the redo branch.
//!
//! # Invariants
//! - At most one action is in progress at a time; undo/redo are rejected
//!   while one is open.
//! - Snapshot log offsets grow monotonically; a recorded state is never
//!   mutated, only referenced.
//! - A tracking record's live handle is absent exactly when the subject is
//!   removed from the scene.
//! - Committing an action that recorded no states is a no-op.

pub mod error;
#[cfg(test)]
mod testutil;
pub mod notify;
pub mod player;
pub mod recorder;
pub mod registry;
pub mod snapshot;
pub mod timeline;

pub use error::HistoryError;
pub use notify::{HistoryEventKind, HistorySink};
pub use recorder::ActionHistory;
pub use registry::{TrackingRecord, TrackingRegistry};
pub use snapshot::SnapshotLog;
pub use timeline::{ActionEvent, HistoryState, StateKind, Timeline};
