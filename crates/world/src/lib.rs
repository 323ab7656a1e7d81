//! Voxel world types shared by the deposit generator and its tools.
//!
//! Provides chunk storage, block positions and boxes, biome keys, the
//! [`WorldAccess`] contract and [`VoxelWorld`], an in-memory implementation of it.

mod access;
mod biome;
mod bounds;
mod chunk;
mod noise;
mod storage;
mod terrain;
mod voxel_world;

pub use access::*;
pub use biome::*;
pub use bounds::*;
pub use chunk::*;
pub use crate::noise::{NoiseConfig, NoiseGenerator};
pub use storage::*;
pub use terrain::*;
pub use voxel_world::*;
