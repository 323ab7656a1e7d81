//! Column fill for the reference world.
//!
//! The surface height is a pure function of the column, so it stays stable no
//! matter which structures have already been written into the world.

use std::sync::Arc;

use crate::chunk::{BlockId, BLOCK_AIR, BLOCK_BEDROCK, BLOCK_DIRT, BLOCK_GRASS, BLOCK_STONE};
use crate::noise::{NoiseConfig, NoiseGenerator};

/// Depth of the soil layer between the top block and stone.
const SOIL_DEPTH: i32 = 3;

/// Shape of the terrain surface.
#[derive(Debug, Clone)]
pub enum TerrainShape {
    /// Every column's surface sits at the same height.
    Flat { surface_y: i32 },
    /// Perlin hills between `base - amplitude` and `base + amplitude`.
    Rolling {
        noise: Arc<NoiseGenerator>,
        base: i32,
        amplitude: i32,
    },
}

/// Terrain description: surface shape plus the blocks used to fill columns.
#[derive(Debug, Clone)]
pub struct Terrain {
    pub shape: TerrainShape,
    pub top: BlockId,
    pub soil: BlockId,
    pub filler: BlockId,
}

impl Terrain {
    /// Flat grass-covered terrain whose first air block is at `surface_y`.
    pub fn flat(surface_y: i32) -> Self {
        Self {
            shape: TerrainShape::Flat { surface_y },
            top: BLOCK_GRASS,
            soil: BLOCK_DIRT,
            filler: BLOCK_STONE,
        }
    }

    pub fn rolling(seed: u64, base: i32, amplitude: i32) -> Self {
        Self {
            shape: TerrainShape::Rolling {
                noise: Arc::new(NoiseGenerator::new(NoiseConfig::hills(seed as u32))),
                base,
                amplitude,
            },
            top: BLOCK_GRASS,
            soil: BLOCK_DIRT,
            filler: BLOCK_STONE,
        }
    }

    pub fn with_top(mut self, top: BlockId) -> Self {
        self.top = top;
        self
    }

    /// First air Y above the terrain in this column.
    pub fn surface_y(&self, world_x: i32, world_z: i32) -> i32 {
        match &self.shape {
            TerrainShape::Flat { surface_y } => *surface_y,
            TerrainShape::Rolling {
                noise,
                base,
                amplitude,
            } => {
                let min = f64::from(base - amplitude);
                let max = f64::from(base + amplitude);
                noise
                    .sample_2d_range(world_x as f64, world_z as f64, min, max)
                    .round() as i32
            }
        }
    }

    /// Block at height `y` of a column whose surface is `surface_y`.
    pub fn block_at(&self, y: i32, surface_y: i32) -> BlockId {
        if y == 0 {
            BLOCK_BEDROCK
        } else if y >= surface_y {
            BLOCK_AIR
        } else if y == surface_y - 1 {
            self.top
        } else if y >= surface_y - 1 - SOIL_DEPTH {
            self.soil
        } else {
            self.filler
        }
    }
}
