//! Shared types for the terrascape editor: subject identity, tile
//! addressing, transforms.

pub mod types;

pub use types::{SubjectId, TileCoord, Transform};
