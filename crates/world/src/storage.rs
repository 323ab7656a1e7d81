use std::collections::BTreeMap;

use crate::chunk::{Chunk, ChunkPos, DirtyFlags};

/// In-memory chunk arena.
/// Uses BTreeMap for deterministic iteration order (digests and reports depend on it).
#[derive(Default)]
pub struct ChunkStorage {
    chunks: BTreeMap<ChunkPos, Chunk>,
}

impl ChunkStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true when no chunks are currently stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Obtain mutable access to a chunk, creating and initialising it if necessary.
    pub fn ensure_chunk_with<F>(&mut self, pos: ChunkPos, init: F) -> &mut Chunk
    where
        F: FnOnce(&mut Chunk),
    {
        self.chunks.entry(pos).or_insert_with(|| {
            let mut chunk = Chunk::new(pos);
            init(&mut chunk);
            chunk
        })
    }

    /// Attempt to fetch a chunk immutably.
    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Iterate over resident chunks in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.values()
    }

    /// Drain dirty flags from every chunk, returning the ones that had any set.
    pub fn take_dirty(&mut self) -> Vec<(ChunkPos, DirtyFlags)> {
        self.chunks
            .iter_mut()
            .filter_map(|(pos, chunk)| {
                let flags = chunk.take_dirty_flags();
                (!flags.is_empty()).then_some((*pos, flags))
            })
            .collect()
    }
}
