use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use terrascape_common::SubjectId;

use crate::arena::SubjectHandle;

/// Errors from subject serialization and scene lookups.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("CBOR encode error: {0}")]
    Encode(String),
    #[error("CBOR decode error: {0}")]
    Decode(String),
    #[error("no live subject for handle {0:?}")]
    SubjectNotFound(SubjectHandle),
}

/// An editable subject: anything whose lifecycle and state the editor tracks.
///
/// The contract is deliberately narrow. A subject must be able to write its
/// full state as one self-delimiting snapshot, overwrite itself in place from
/// such a snapshot, detach from whatever live structure references it, and
/// hand out a factory that reconstructs a fresh instance when no live one
/// exists.
pub trait Subject: std::fmt::Debug {
    /// Stable identity; preserved across deletion and resurrection.
    fn id(&self) -> SubjectId;

    /// Short kind name for logging and inspection, e.g. `"terrain-tile"`.
    fn kind_name(&self) -> &'static str;

    /// Append the full current state as exactly one CBOR value.
    fn save_state(&self, out: &mut Vec<u8>) -> Result<(), SceneError>;

    /// Overwrite self from the snapshot at the head of `bytes`, in place.
    /// Trailing bytes after the first CBOR value are ignored.
    fn load_state(&mut self, bytes: &[u8]) -> Result<(), SceneError>;

    /// Detach from the live structure that holds this subject. Not a free:
    /// the snapshot history keeps the state alive.
    fn remove_from_scene(&mut self);

    /// Factory that reconstructs a new instance from a snapshot.
    fn factory(&self) -> Arc<dyn SubjectFactory>;
}

/// Reconstructs a subject from a snapshot when none is live.
pub trait SubjectFactory: Send + Sync {
    fn resurrect(&self, bytes: &[u8]) -> Result<Box<dyn Subject>, SceneError>;
}

/// Encode a value as one CBOR item appended to `out`.
pub fn encode_state<T: Serialize + ?Sized>(value: &T, out: &mut Vec<u8>) -> Result<(), SceneError> {
    ciborium::into_writer(value, out).map_err(|e| SceneError::Encode(e.to_string()))
}

/// Decode one CBOR item from the head of `bytes`. Trailing bytes are ignored,
/// so a snapshot can be read out of a larger append-only log.
pub fn decode_state<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SceneError> {
    ciborium::from_reader(bytes).map_err(|e| SceneError::Decode(e.to_string()))
}
