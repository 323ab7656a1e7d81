//! Chunk-walk worldtests.
//!
//! A worldtest visits a fixed list of chunks in order, runs one step per chunk
//! against some state and snapshots selected state after each step. The frames
//! are compared against a golden JSON file (or written when
//! `OILGEN_UPDATE_SNAPSHOTS=1` is set).

use crate::snapshot::assert_json_snapshot;
use anyhow::Result;
use oilgen_world::ChunkPos;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a worldtest.
#[derive(Debug, Clone)]
pub struct WorldtestConfig {
    /// Human-readable name (written into the snapshot report).
    pub name: String,
    /// Chunks visited, in order.
    pub chunks: Vec<ChunkPos>,
    /// Path to the golden JSON file.
    pub snapshot_path: PathBuf,
}

/// State captured after visiting one chunk.
#[derive(Debug, Clone, Serialize)]
pub struct WorldtestFrame<S> {
    /// Position in the walk, starting at 0.
    pub step: usize,
    /// Chunk visited in this step.
    pub chunk: ChunkPos,
    /// Snapshot payload.
    pub snapshot: S,
}

#[derive(Debug, Clone, Serialize)]
struct WorldtestReport<S> {
    name: String,
    frames: Vec<WorldtestFrame<S>>,
}

/// Run a worldtest and assert (or update) the snapshot at `config.snapshot_path`.
pub fn run_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: WorldtestConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<()>
where
    Snapshot: Serialize,
    StepFn: FnMut(ChunkPos, &mut State),
    SnapFn: FnMut(ChunkPos, &State) -> Snapshot,
{
    let frames = walk(&config.chunks, &mut state, &mut step, &mut snapshot);
    let report = WorldtestReport {
        name: config.name,
        frames,
    };
    assert_json_snapshot(config.snapshot_path, &report)
}

/// Visit `chunks` and collect a frame per step without touching any snapshot file.
pub fn walk<State, Snapshot, StepFn, SnapFn>(
    chunks: &[ChunkPos],
    state: &mut State,
    step: &mut StepFn,
    snapshot: &mut SnapFn,
) -> Vec<WorldtestFrame<Snapshot>>
where
    StepFn: FnMut(ChunkPos, &mut State),
    SnapFn: FnMut(ChunkPos, &State) -> Snapshot,
{
    chunks
        .iter()
        .enumerate()
        .map(|(i, &chunk)| {
            step(chunk, state);
            WorldtestFrame {
                step: i,
                chunk,
                snapshot: snapshot(chunk, state),
            }
        })
        .collect()
}

/// Chunks of the square of `radius` around `center`, Z outer, X inner.
pub fn chunk_square(center: ChunkPos, radius: i32) -> Vec<ChunkPos> {
    let mut chunks = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)).max(0) as usize);
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            chunks.push(center.offset(dx, dz));
        }
    }
    chunks
}
