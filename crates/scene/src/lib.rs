//! Scene: the live structure that holds editable subjects.
//!
//! # Invariants
//! - Subjects are owned by a generational arena; stale handles never resolve.
//! - Every subject can serialize its full state, overwrite itself from a
//!   snapshot, and be reconstructed from one by its factory.

pub mod arena;
pub mod subject;
pub mod subjects;

pub use arena::{Scene, SubjectHandle};
pub use subject::{decode_state, encode_state, SceneError, Subject, SubjectFactory};
pub use subjects::{PlacedModel, TerrainTile};
