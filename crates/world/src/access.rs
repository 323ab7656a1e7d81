//! The contract between generators and whatever world they write into.

use serde::{Deserialize, Serialize};

use crate::biome::BiomeKey;
use crate::bounds::BlockPos;
use crate::chunk::{
    BlockId, BLOCK_AIR, BLOCK_DIRT, BLOCK_GRASS, BLOCK_GRAVEL, BLOCK_LEAVES, BLOCK_OIL, BLOCK_SAND,
    BLOCK_SNOW_LAYER, BLOCK_TALL_GRASS, BLOCK_WATER,
};

/// Which existing blocks a write may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Overwrite whatever is there.
    Always,
    /// Only soft surface material: air, soil, sand, plants, water and existing oil.
    LakeSurface,
}

impl ReplacePolicy {
    pub fn permits(self, existing: BlockId) -> bool {
        match self {
            Self::Always => true,
            Self::LakeSurface => matches!(
                existing,
                BLOCK_AIR
                    | BLOCK_DIRT
                    | BLOCK_GRASS
                    | BLOCK_SAND
                    | BLOCK_GRAVEL
                    | BLOCK_WATER
                    | BLOCK_TALL_GRASS
                    | BLOCK_LEAVES
                    | BLOCK_SNOW_LAYER
                    | BLOCK_OIL
            ),
        }
    }
}

/// World surface a generator reads from and writes into.
///
/// Writes must be idempotent: writing the same block twice leaves the world
/// as if it had been written once.
pub trait WorldAccess {
    /// Number of block layers, starting at y = 0.
    fn height(&self) -> i32;

    /// Biome at `pos`, or `None` when it cannot be resolved.
    fn biome_at(&self, pos: BlockPos) -> Option<BiomeKey>;

    /// First air Y above the generated terrain of a column.
    fn surface_y(&self, x: i32, z: i32) -> i32;

    /// Write `block` at `pos` if `policy` allows replacing what is there.
    /// Returns whether the block was written.
    fn set_voxel(&mut self, pos: BlockPos, block: BlockId, policy: ReplacePolicy) -> bool;

    /// Place a spring fed by `source_count` surrounding source blocks.
    fn place_spring(&mut self, pos: BlockPos, source_count: usize) -> bool;

    /// Whether this world has a spring block at all.
    fn springs_available(&self) -> bool {
        true
    }
}
