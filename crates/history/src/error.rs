use terrascape_common::SubjectId;
use terrascape_scene::{SceneError, SubjectHandle};

/// Errors from recording and replaying history.
///
/// Call-discipline violations (ending an action that was never begun,
/// undoing while an action is open) are not errors; they are programmer
/// mistakes and are asserted.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Snapshot encode/decode failed.
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    /// A handle passed by the caller does not resolve to a live subject.
    #[error("no live subject for handle {0:?}")]
    SubjectNotFound(SubjectHandle),
    /// A factory could not reconstruct a deleted subject from its snapshot.
    ///
    /// Replay stops where the failure occurred; the caller should treat the
    /// history as unusable and clear it.
    #[error("failed to resurrect subject {subject}: {source}")]
    Resurrection {
        subject: SubjectId,
        source: SceneError,
    },
}
