//! Concrete subject kinds: terrain tiles and placed models.
//!
//! Both serialize their complete state as a single CBOR value, so a snapshot
//! taken at any point fully reproduces the subject.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use terrascape_common::{SubjectId, TileCoord, Transform};
use tracing::debug;

use crate::subject::{decode_state, encode_state, SceneError, Subject, SubjectFactory};

/// A square heightfield tile of the terrain grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainTile {
    id: SubjectId,
    coord: TileCoord,
    size: u32,
    heights: Vec<f32>,
}

impl TerrainTile {
    /// Create a tile with a uniform height.
    pub fn new(coord: TileCoord, size: u32, height: f32) -> Self {
        Self {
            id: SubjectId::new(),
            coord,
            size,
            heights: vec![height; (size * size) as usize],
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn height_at(&self, x: u32, y: u32) -> f32 {
        self.heights[(y * self.size + x) as usize]
    }

    pub fn set_height(&mut self, x: u32, y: u32, height: f32) {
        self.heights[(y * self.size + x) as usize] = height;
    }

    /// Raise every sample by `amount` (a whole-tile brush stroke).
    pub fn raise(&mut self, amount: f32) {
        for h in &mut self.heights {
            *h += amount;
        }
    }
}

impl Subject for TerrainTile {
    fn id(&self) -> SubjectId {
        self.id
    }

    fn kind_name(&self) -> &'static str {
        "terrain-tile"
    }

    fn save_state(&self, out: &mut Vec<u8>) -> Result<(), SceneError> {
        encode_state(self, out)
    }

    fn load_state(&mut self, bytes: &[u8]) -> Result<(), SceneError> {
        *self = decode_state(bytes)?;
        Ok(())
    }

    fn remove_from_scene(&mut self) {
        debug!(id = %self.id, coord = ?self.coord, "terrain tile detached");
    }

    fn factory(&self) -> Arc<dyn SubjectFactory> {
        Arc::new(TerrainTileFactory)
    }
}

/// Reconstructs a [`TerrainTile`] from a snapshot.
pub struct TerrainTileFactory;

impl SubjectFactory for TerrainTileFactory {
    fn resurrect(&self, bytes: &[u8]) -> Result<Box<dyn Subject>, SceneError> {
        let tile: TerrainTile = decode_state(bytes)?;
        Ok(Box::new(tile))
    }
}

/// A model placed in the world: asset reference plus transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedModel {
    id: SubjectId,
    asset: String,
    transform: Transform,
}

impl PlacedModel {
    pub fn new(asset: impl Into<String>, transform: Transform) -> Self {
        Self {
            id: SubjectId::new(),
            asset: asset.into(),
            transform,
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }
}

impl Subject for PlacedModel {
    fn id(&self) -> SubjectId {
        self.id
    }

    fn kind_name(&self) -> &'static str {
        "placed-model"
    }

    fn save_state(&self, out: &mut Vec<u8>) -> Result<(), SceneError> {
        encode_state(self, out)
    }

    fn load_state(&mut self, bytes: &[u8]) -> Result<(), SceneError> {
        *self = decode_state(bytes)?;
        Ok(())
    }

    fn remove_from_scene(&mut self) {
        debug!(id = %self.id, asset = %self.asset, "placed model detached");
    }

    fn factory(&self) -> Arc<dyn SubjectFactory> {
        Arc::new(PlacedModelFactory)
    }
}

/// Reconstructs a [`PlacedModel`] from a snapshot.
pub struct PlacedModelFactory;

impl SubjectFactory for PlacedModelFactory {
    fn resurrect(&self, bytes: &[u8]) -> Result<Box<dyn Subject>, SceneError> {
        let model: PlacedModel = decode_state(bytes)?;
        Ok(Box::new(model))
    }
}
