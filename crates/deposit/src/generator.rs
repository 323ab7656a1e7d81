//! Per-chunk deposit derivation.
//!
//! A [`Deposit`] is a pure function of the world seed, the config and what the
//! world reports about biomes and springs. Populating a chunk re-derives the
//! deposits of every neighbour in range, so derivation must never depend on
//! what has already been written.

use std::sync::Arc;

use oilgen_world::{BiomeKey, BlockBox, BlockPos, ChunkPos, WorldAccess, CHUNK_SIZE_X, CHUNK_SIZE_Z};
use serde::Serialize;
use tracing::{debug, trace};

use crate::cache::DepositCache;
use crate::composer::{compose, TENDRIL_Y};
use crate::config::DepositConfig;
use crate::placement::{decide, DepositClass, Placement, Site};
use crate::rng::{rng_for, DepositRandom, OIL_GEN_SALT};
use crate::scanner::MAX_CHUNK_RADIUS;
use crate::structure::{Spring, Structure};

/// Blocks kept clear between any populated or deposit-rooting chunk and the
/// `i32` coordinate limits. Covers the scan radius, so every structure of a
/// kept deposit has representable coordinates.
pub const WORLD_EDGE_MARGIN: i32 = (MAX_CHUNK_RADIUS + 2) * CHUNK_SIZE_X as i32;

/// Whether `chunk` and its offset population box lie at least
/// [`WORLD_EDGE_MARGIN`] blocks inside the `i32` coordinate range.
pub fn chunk_within_world(chunk: ChunkPos) -> bool {
    let limit = i64::from(i32::MAX - WORLD_EDGE_MARGIN);
    let inside = |c: i32, size: usize| {
        let min = i64::from(c) * size as i64;
        let max = min + 2 * size as i64 - 1;
        min >= -limit && max <= limit
    };
    inside(chunk.x, CHUNK_SIZE_X) && inside(chunk.z, CHUNK_SIZE_Z)
}

/// One deposit rooted in a chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deposit {
    pub origin: ChunkPos,
    /// Tendril anchor; X and Z are the deposit's column.
    pub center: BlockPos,
    pub biome: Option<BiomeKey>,
    pub placement: Placement,
    pub structures: Vec<Structure>,
}

impl Deposit {
    /// Derive the deposit for `origin` from an explicit random stream.
    ///
    /// Draws the column offset first, then resolves the biome at the
    /// column's bottom, then runs placement and composition on the same stream.
    pub fn derive<R, W>(rng: &mut R, world: &W, origin: ChunkPos, config: &DepositConfig) -> Self
    where
        R: DepositRandom + ?Sized,
        W: WorldAccess + ?Sized,
    {
        let half = CHUNK_SIZE_X as i32 / 2;
        let dx = rng.next_int(CHUNK_SIZE_X as i32);
        let dz = rng.next_int(CHUNK_SIZE_Z as i32);
        let x = origin.min_world_x().wrapping_add(half + dx);
        let z = origin.min_world_z().wrapping_add(half + dz);

        if !chunk_within_world(origin) {
            trace!(chunk = %origin, "chunk beyond the world edge, no deposit");
            return Self {
                origin,
                center: BlockPos::new(x, TENDRIL_Y, z),
                biome: None,
                placement: Placement::NONE,
                structures: Vec::new(),
            };
        }

        let biome = world.biome_at(BlockPos::new(x, 0, z));
        let placement = decide(
            rng,
            Site {
                x,
                z,
                biome: biome.as_ref(),
            },
            config,
        );
        let structures = compose(rng, &placement, x, z, config, world.springs_available());

        Self {
            origin,
            center: BlockPos::new(x, TENDRIL_Y, z),
            biome,
            placement,
            structures,
        }
    }

    pub fn class(&self) -> DepositClass {
        self.placement.class
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn spring(&self) -> Option<&Spring> {
        self.structures.iter().find_map(|s| match s {
            Structure::Spring(spring) => Some(spring),
            _ => None,
        })
    }

    /// Union of every structure's bounds.
    pub fn bounds(&self) -> Option<BlockBox> {
        self.structures
            .iter()
            .map(Structure::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Source voxels across every structure, ignoring clipping.
    pub fn source_voxel_count<W: WorldAccess + ?Sized>(&self, world: &W) -> usize {
        self.structures
            .iter()
            .map(|s| s.source_voxel_count(world))
            .sum()
    }
}

/// Seeded deposit generator.
///
/// Holds the world seed and an immutable config. With a cache enabled the
/// generator must only be used against one world, since biomes and spring
/// availability are baked into cached deposits.
pub struct DepositGenerator {
    seed: u64,
    config: Arc<DepositConfig>,
    cache: Option<DepositCache>,
}

impl DepositGenerator {
    pub fn new(seed: u64, config: DepositConfig) -> Self {
        Self {
            seed,
            config: Arc::new(config),
            cache: None,
        }
    }

    /// Keep up to `capacity` derived deposits around.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = DepositCache::new(capacity);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &DepositConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&DepositCache> {
        self.cache.as_ref()
    }

    /// Deposit rooted in `chunk`. Chunks without a deposit yield an empty one.
    pub fn deposit_at<W: WorldAccess + ?Sized>(&self, world: &W, chunk: ChunkPos) -> Arc<Deposit> {
        match &self.cache {
            Some(cache) => cache.get_or_insert_with(self.seed, chunk, || self.derive(world, chunk)),
            None => Arc::new(self.derive(world, chunk)),
        }
    }

    fn derive<W: WorldAccess + ?Sized>(&self, world: &W, chunk: ChunkPos) -> Deposit {
        let mut rng = rng_for(self.seed, chunk, OIL_GEN_SALT);
        let deposit = Deposit::derive(&mut rng, world, chunk, &self.config);
        if !deposit.is_empty() {
            debug!(
                chunk = %chunk,
                class = deposit.class().as_str(),
                x = deposit.center.x,
                z = deposit.center.z,
                structures = deposit.structures.len(),
                "derived deposit"
            );
        }
        deposit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Draw, ScriptedRandom};
    use oilgen_world::{BiomeLayout, Terrain, VoxelWorld};

    fn world(biome: &str) -> VoxelWorld {
        VoxelWorld::new(Terrain::flat(64), BiomeLayout::uniform(biome))
    }

    #[test]
    fn centre_is_drawn_inside_offset_window() {
        let w = world("plains");
        let mut rng = ScriptedRandom::new([0.0, 0.999, 0.9, 0.9]);
        let d = Deposit::derive(&mut rng, &w, ChunkPos::new(-2, 3), &DepositConfig::default());
        assert_eq!(d.center, BlockPos::new(-32 + 8, TENDRIL_Y, 48 + 8 + 15));
        assert!(d.is_empty());
        assert_eq!(
            rng.draws(),
            &[Draw::Int(16), Draw::Int(16), Draw::Double, Draw::Double]
        );
    }

    #[test]
    fn unresolved_biome_gives_empty_deposit() {
        let w = VoxelWorld::new(Terrain::flat(64), BiomeLayout::custom(|_, _| None));
        let mut rng = ScriptedRandom::new([]);
        let d = Deposit::derive(&mut rng, &w, ChunkPos::new(0, 0), &DepositConfig::default());
        assert!(d.is_empty());
        assert!(d.biome.is_none());
        assert_eq!(rng.draws().len(), 2);
    }

    #[test]
    fn spring_and_bounds_of_large_deposit() {
        let w = world("plains");
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.0]);
        let d = Deposit::derive(&mut rng, &w, ChunkPos::new(0, 0), &DepositConfig::default());
        assert_eq!(d.class(), DepositClass::Large);
        assert_eq!(d.spring().map(|s| s.pos), Some(BlockPos::new(16, 0, 16)));
        let b = d.bounds().expect("non-empty");
        // Tendril radius 25 around column 16.
        assert_eq!(b.min.x, 16 - 25);
        assert_eq!(b.max.z, 16 + 25);
        assert_eq!(b.min.y, 0);
    }

    #[test]
    fn generator_is_deterministic_with_and_without_cache() {
        let w = world("desert");
        let plain = DepositGenerator::new(7, DepositConfig::default());
        let cached = DepositGenerator::new(7, DepositConfig::default()).with_cache(64);
        for cx in -4..4 {
            for cz in -4..4 {
                let chunk = ChunkPos::new(cx, cz);
                let a = plain.deposit_at(&w, chunk);
                let b = cached.deposit_at(&w, chunk);
                let c = cached.deposit_at(&w, chunk);
                assert_eq!(a, b);
                assert!(Arc::ptr_eq(&b, &c));
            }
        }
    }

    #[test]
    fn chunks_past_the_world_edge_root_nothing() {
        let w = world("plains");
        let forced = DepositGenerator::new(
            5,
            DepositConfig {
                large_prob: 1.0,
                ..DepositConfig::default()
            },
        );
        for chunk in [
            ChunkPos::new(200_000_000, 0),
            ChunkPos::new(0, -200_000_000),
            ChunkPos::new(i32::MAX / 16, 0),
            ChunkPos::new(i32::MIN, i32::MAX),
        ] {
            assert!(!chunk_within_world(chunk));
            let d = forced.deposit_at(&w, chunk);
            assert!(d.is_empty(), "{chunk} rooted a deposit");
            assert!(d.biome.is_none());
        }

        let near_edge = ChunkPos::new(i32::MAX / 16 - 10, i32::MIN / 16 + 10);
        assert!(chunk_within_world(near_edge));
        let d = forced.deposit_at(&w, near_edge);
        assert_eq!(d.class(), DepositClass::Large);
        let b = d.bounds().expect("non-empty");
        assert!(b.max.x > i32::MAX - 2 * WORLD_EDGE_MARGIN);
    }

    #[test]
    fn different_seeds_diverge() {
        let w = world("desert");
        let a = DepositGenerator::new(1, DepositConfig::default());
        let b = DepositGenerator::new(2, DepositConfig::default());
        let differs = (0..32).any(|cx| {
            let chunk = ChunkPos::new(cx, 0);
            a.deposit_at(&w, chunk).center != b.deposit_at(&w, chunk).center
        });
        assert!(differs);
    }
}
