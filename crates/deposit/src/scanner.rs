//! Chunk population: materialise every nearby deposit clipped to one chunk.
//!
//! The population box of chunk `(cx, cz)` is offset by half a chunk, so it
//! covers `[cx*16 + 8, cx*16 + 23]` on X and Z and the full world height.
//! Deposit columns are drawn from the same window, which places a deposit's
//! spring inside the population box of the chunk it is rooted in.

use oilgen_world::{BlockBox, BlockPos, ChunkPos, WorldAccess, CHUNK_SIZE_X, CHUNK_SIZE_Z};
use serde::Serialize;
use tracing::{debug, trace};

use crate::generator::{chunk_within_world, DepositGenerator};

/// How many chunks away a deposit may be rooted and still reach the populated chunk.
///
/// The widest structure is a tendril of radius 44 around a column at most 23
/// blocks into its chunk, which stays within 5 chunks.
pub const MAX_CHUNK_RADIUS: i32 = 5;

/// What a single population wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    pub chunk: ChunkPos,
    /// Neighbouring chunks that rooted a deposit.
    pub deposits_seen: usize,
    pub voxels_written: usize,
    pub springs_placed: usize,
    /// Source count handed to the last spring placed.
    pub spring_source_total: usize,
}

impl PopulateReport {
    /// Whether the chunk was modified.
    pub fn placed(&self) -> bool {
        self.voxels_written > 0 || self.springs_placed > 0
    }
}

/// Box a population of `chunk` may write into.
pub fn population_box(chunk: ChunkPos, height: i32) -> BlockBox {
    let x = chunk.min_world_x().wrapping_add(CHUNK_SIZE_X as i32 / 2);
    let z = chunk.min_world_z().wrapping_add(CHUNK_SIZE_Z as i32 / 2);
    BlockBox::new(
        BlockPos::new(x, 0, z),
        BlockPos::new(
            x.wrapping_add(CHUNK_SIZE_X as i32 - 1),
            height - 1,
            z.wrapping_add(CHUNK_SIZE_Z as i32 - 1),
        ),
    )
}

impl DepositGenerator {
    /// Populate `chunk`: re-derive each deposit within [`MAX_CHUNK_RADIUS`]
    /// and write the parts of it that fall inside the chunk's population box.
    pub fn populate<W: WorldAccess + ?Sized>(&self, world: &mut W, chunk: ChunkPos) -> PopulateReport {
        let mut report = PopulateReport {
            chunk,
            ..PopulateReport::default()
        };
        if !chunk_within_world(chunk) {
            debug!(chunk = %chunk, "chunk beyond the world edge, nothing populated");
            return report;
        }
        let bounds = population_box(chunk, world.height());
        // Running total across every deposit visited in this call.
        let mut source_total = 0;

        for dx in -MAX_CHUNK_RADIUS..=MAX_CHUNK_RADIUS {
            for dz in -MAX_CHUNK_RADIUS..=MAX_CHUNK_RADIUS {
                let deposit = self.deposit_at(&*world, chunk.offset(dx, dz));
                if deposit.is_empty() {
                    continue;
                }
                report.deposits_seen += 1;

                for structure in &deposit.structures {
                    report.voxels_written += structure.materialize(&mut *world, &bounds);
                }

                let Some(spring) = deposit.spring() else {
                    continue;
                };
                if !bounds.contains(spring.pos) {
                    continue;
                }
                source_total += deposit.source_voxel_count(&*world);
                if spring.place(&mut *world, source_total) {
                    report.springs_placed += 1;
                    report.spring_source_total = source_total;
                    trace!(pos = %spring.pos, source_total, "placed spring");
                }
            }
        }

        if report.placed() {
            debug!(
                chunk = %chunk,
                deposits = report.deposits_seen,
                voxels = report.voxels_written,
                springs = report.springs_placed,
                "populated chunk"
            );
        }
        report
    }
}
