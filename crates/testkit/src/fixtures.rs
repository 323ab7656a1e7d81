//! Reference worlds and world fingerprints shared by worldtests.

use oilgen_world::{
    BiomeKey, BiomeLayout, BlockId, Terrain, VoxelWorld, BLOCK_OIL, BLOCK_OIL_SPRING,
};

/// Surface height of the flat fixtures: the first air block is at y = 64.
pub const FLAT_SURFACE_Y: i32 = 64;

/// Flat grass world with a single biome everywhere.
pub fn flat_world(biome: &str) -> VoxelWorld {
    VoxelWorld::new(Terrain::flat(FLAT_SURFACE_Y), BiomeLayout::uniform(biome))
}

/// Flat desert: a surface-deposit biome with the 3x bonus.
pub fn desert_world() -> VoxelWorld {
    flat_world("desert")
}

/// Flat plains: an ordinary biome where lakes never form.
pub fn plains_world() -> VoxelWorld {
    flat_world("plains")
}

/// Rolling terrain with noise-driven patches of mixed biomes.
pub fn patchwork_world(seed: u64) -> VoxelWorld {
    let biomes = ["desert", "plains", "ocean", "forest"]
        .into_iter()
        .map(BiomeKey::new)
        .collect();
    VoxelWorld::new(
        Terrain::rolling(seed, FLAT_SURFACE_Y, 6),
        BiomeLayout::patches(seed, biomes),
    )
}

/// BLAKE3 fingerprint (hex) of every resident chunk and placed spring.
///
/// Two worlds with the same digest hold the same blocks in the same chunks.
pub fn world_digest(world: &VoxelWorld) -> String {
    let mut hasher = blake3::Hasher::new();
    for chunk in world.storage().iter() {
        let pos = chunk.position();
        hasher.update(&pos.x.to_le_bytes());
        hasher.update(&pos.z.to_le_bytes());
        for voxel in chunk.voxels() {
            hasher.update(&voxel.id.to_le_bytes());
        }
    }
    for (pos, count) in world.springs() {
        hasher.update(&pos.x.to_le_bytes());
        hasher.update(&pos.y.to_le_bytes());
        hasher.update(&pos.z.to_le_bytes());
        hasher.update(&(*count as u64).to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Count of `block` across resident chunks.
pub fn count_blocks(world: &VoxelWorld, block: BlockId) -> usize {
    world
        .storage()
        .iter()
        .map(|chunk| chunk.voxels().iter().filter(|v| v.id == block).count())
        .sum()
}

/// Oil and spring blocks across resident chunks.
pub fn oil_blocks(world: &VoxelWorld) -> usize {
    count_blocks(world, BLOCK_OIL) + count_blocks(world, BLOCK_OIL_SPRING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oilgen_world::{BlockPos, ReplacePolicy, WorldAccess};

    #[test]
    fn digest_tracks_block_changes() {
        let mut a = plains_world();
        let mut b = plains_world();
        a.block(BlockPos::new(0, 0, 0));
        b.block(BlockPos::new(0, 0, 0));
        assert_eq!(world_digest(&a), world_digest(&b));

        b.set_voxel(BlockPos::new(1, 63, 1), BLOCK_OIL, ReplacePolicy::Always);
        assert_ne!(world_digest(&a), world_digest(&b));
        assert_eq!(oil_blocks(&b), 1);
        assert_eq!(oil_blocks(&a), 0);
    }

    #[test]
    fn digest_covers_springs() {
        let mut a = plains_world();
        let mut b = plains_world();
        a.place_spring(BlockPos::new(0, 0, 0), 10);
        b.place_spring(BlockPos::new(0, 0, 0), 11);
        assert_ne!(world_digest(&a), world_digest(&b));
    }

    #[test]
    fn patchwork_resolves_biomes() {
        let world = patchwork_world(5);
        assert!(world.biome_at(BlockPos::new(0, 0, 0)).is_some());
        assert!(world.surface_y(0, 0) > 0);
    }
}
