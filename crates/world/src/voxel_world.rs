//! In-memory reference world implementing [`WorldAccess`].
//!
//! Chunks are generated lazily from a [`Terrain`] the first time anything
//! touches them. Every accepted write is also recorded in a write log so tests
//! can check exactly which positions a generator touched.

use std::collections::BTreeMap;

use tracing::trace;

use crate::access::{ReplacePolicy, WorldAccess};
use crate::biome::{BiomeKey, BiomeLayout};
use crate::bounds::BlockPos;
use crate::chunk::{
    BlockId, Chunk, ChunkPos, DirtyFlags, Voxel, BLOCK_OIL_SPRING, CHUNK_SIZE_X, CHUNK_SIZE_Y,
    CHUNK_SIZE_Z,
};
use crate::storage::ChunkStorage;
use crate::terrain::Terrain;

/// A single accepted block write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    pub pos: BlockPos,
    pub block: BlockId,
}

/// Chunked voxel world backed by [`ChunkStorage`].
pub struct VoxelWorld {
    terrain: Terrain,
    biomes: BiomeLayout,
    storage: ChunkStorage,
    springs: BTreeMap<BlockPos, usize>,
    springs_available: bool,
    write_log: Option<Vec<WriteRecord>>,
}

impl VoxelWorld {
    pub fn new(terrain: Terrain, biomes: BiomeLayout) -> Self {
        Self {
            terrain,
            biomes,
            storage: ChunkStorage::new(),
            springs: BTreeMap::new(),
            springs_available: true,
            write_log: None,
        }
    }

    /// Disable spring placement, as in worlds without a spring block.
    pub fn without_springs(mut self) -> Self {
        self.springs_available = false;
        self
    }

    /// Start recording every accepted write.
    pub fn record_writes(&mut self) {
        self.write_log = Some(Vec::new());
    }

    /// Drain the write log (empty when recording is off).
    pub fn take_writes(&mut self) -> Vec<WriteRecord> {
        self.write_log.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn storage(&self) -> &ChunkStorage {
        &self.storage
    }

    /// Springs placed so far with the source counts they were fed.
    pub fn springs(&self) -> &BTreeMap<BlockPos, usize> {
        &self.springs
    }

    /// Chunks modified since the last call.
    pub fn take_dirty_chunks(&mut self) -> Vec<(ChunkPos, DirtyFlags)> {
        self.storage.take_dirty()
    }

    /// Block at `pos`, generating the chunk if needed. Out-of-range Y reads as air.
    pub fn block(&mut self, pos: BlockPos) -> BlockId {
        if !(0..CHUNK_SIZE_Y as i32).contains(&pos.y) {
            return crate::chunk::BLOCK_AIR;
        }
        let (lx, lz) = local_xz(pos);
        self.chunk_mut(pos.chunk()).voxel(lx, pos.y as usize, lz).id
    }

    /// Block at `pos` if its chunk is resident.
    pub fn peek(&self, pos: BlockPos) -> Option<BlockId> {
        if !(0..CHUNK_SIZE_Y as i32).contains(&pos.y) {
            return None;
        }
        let (lx, lz) = local_xz(pos);
        self.storage
            .get(pos.chunk())
            .map(|chunk| chunk.voxel(lx, pos.y as usize, lz).id)
    }

    fn chunk_mut(&mut self, chunk_pos: ChunkPos) -> &mut Chunk {
        let terrain = &self.terrain;
        self.storage.ensure_chunk_with(chunk_pos, |chunk| {
            trace!(chunk = %chunk_pos, "generating terrain");
            fill_terrain(chunk, terrain);
        })
    }
}

impl WorldAccess for VoxelWorld {
    fn height(&self) -> i32 {
        CHUNK_SIZE_Y as i32
    }

    fn biome_at(&self, pos: BlockPos) -> Option<BiomeKey> {
        self.biomes.biome_at(pos.x, pos.z)
    }

    fn surface_y(&self, x: i32, z: i32) -> i32 {
        self.terrain.surface_y(x, z)
    }

    fn set_voxel(&mut self, pos: BlockPos, block: BlockId, policy: ReplacePolicy) -> bool {
        if !(0..self.height()).contains(&pos.y) {
            return false;
        }
        let (lx, lz) = local_xz(pos);
        let chunk = self.chunk_mut(pos.chunk());
        let existing = chunk.voxel(lx, pos.y as usize, lz).id;
        if !policy.permits(existing) {
            return false;
        }
        chunk.set_voxel(lx, pos.y as usize, lz, Voxel::new(block));
        if let Some(log) = self.write_log.as_mut() {
            log.push(WriteRecord { pos, block });
        }
        true
    }

    fn place_spring(&mut self, pos: BlockPos, source_count: usize) -> bool {
        if !self.springs_available || !self.set_voxel(pos, BLOCK_OIL_SPRING, ReplacePolicy::Always)
        {
            return false;
        }
        self.chunk_mut(pos.chunk()).mark(DirtyFlags::SPRINGS);
        self.springs.insert(pos, source_count);
        true
    }

    fn springs_available(&self) -> bool {
        self.springs_available
    }
}

fn local_xz(pos: BlockPos) -> (usize, usize) {
    (
        pos.x.rem_euclid(CHUNK_SIZE_X as i32) as usize,
        pos.z.rem_euclid(CHUNK_SIZE_Z as i32) as usize,
    )
}

fn fill_terrain(chunk: &mut Chunk, terrain: &Terrain) {
    let origin = chunk.position();
    for lz in 0..CHUNK_SIZE_Z {
        for lx in 0..CHUNK_SIZE_X {
            let surface = terrain.surface_y(
                origin.min_world_x() + lx as i32,
                origin.min_world_z() + lz as i32,
            );
            chunk.fill_column(lx, lz, |y| terrain.block_at(y as i32, surface));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{BLOCK_AIR, BLOCK_GRASS, BLOCK_OIL, BLOCK_STONE};

    fn plains_world() -> VoxelWorld {
        VoxelWorld::new(Terrain::flat(64), BiomeLayout::uniform("plains"))
    }

    #[test]
    fn lazily_generates_terrain() {
        let mut world = plains_world();
        assert!(world.peek(BlockPos::new(0, 63, 0)).is_none());
        assert_eq!(world.block(BlockPos::new(-5, 63, -5)), BLOCK_GRASS);
        assert_eq!(world.block(BlockPos::new(-5, 30, -5)), BLOCK_STONE);
        assert_eq!(world.block(BlockPos::new(-5, 64, -5)), BLOCK_AIR);
        assert!(world.take_dirty_chunks().is_empty());
    }

    #[test]
    fn set_voxel_respects_policy() {
        let mut world = plains_world();
        let stone = BlockPos::new(3, 20, 3);
        let grass = BlockPos::new(3, 63, 3);
        assert!(!world.set_voxel(stone, BLOCK_OIL, ReplacePolicy::LakeSurface));
        assert!(world.set_voxel(grass, BLOCK_OIL, ReplacePolicy::LakeSurface));
        assert!(world.set_voxel(stone, BLOCK_OIL, ReplacePolicy::Always));
        assert_eq!(world.block(stone), BLOCK_OIL);
        assert_eq!(world.block(grass), BLOCK_OIL);
    }

    #[test]
    fn set_voxel_rejects_out_of_range_height() {
        let mut world = plains_world();
        assert!(!world.set_voxel(BlockPos::new(0, -1, 0), BLOCK_OIL, ReplacePolicy::Always));
        assert!(!world.set_voxel(BlockPos::new(0, 256, 0), BLOCK_OIL, ReplacePolicy::Always));
    }

    #[test]
    fn write_log_records_accepted_writes_only() {
        let mut world = plains_world();
        world.record_writes();
        world.set_voxel(BlockPos::new(0, 10, 0), BLOCK_OIL, ReplacePolicy::LakeSurface);
        world.set_voxel(BlockPos::new(0, 63, 0), BLOCK_OIL, ReplacePolicy::LakeSurface);
        let writes = world.take_writes();
        assert_eq!(
            writes,
            vec![WriteRecord {
                pos: BlockPos::new(0, 63, 0),
                block: BLOCK_OIL
            }]
        );
    }

    #[test]
    fn springs_are_tracked_and_mark_chunk() {
        let mut world = plains_world();
        let pos = BlockPos::new(-20, 0, 7);
        assert!(world.place_spring(pos, 42));
        assert_eq!(world.springs().get(&pos), Some(&42));
        assert_eq!(world.block(pos), BLOCK_OIL_SPRING);
        let dirty = world.take_dirty_chunks();
        assert_eq!(dirty.len(), 1);
        assert!(dirty[0].1.contains(DirtyFlags::SPRINGS));
    }

    #[test]
    fn springs_can_be_disabled() {
        let mut world = plains_world().without_springs();
        assert!(!world.springs_available());
        assert!(!world.place_spring(BlockPos::new(0, 0, 0), 1));
        assert!(world.springs().is_empty());
    }
}
