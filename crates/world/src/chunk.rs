use std::fmt;

/// Chunk width (X axis) in voxels.
pub const CHUNK_SIZE_X: usize = 16;
/// Chunk height (Y axis) in voxels.
pub const CHUNK_SIZE_Y: usize = 256;
/// Chunk depth (Z axis) in voxels.
pub const CHUNK_SIZE_Z: usize = 16;
/// Total voxel count per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Block identifier.
pub type BlockId = u16;

/// Reserved ID for air.
pub const BLOCK_AIR: BlockId = 0;
/// ID for stone.
pub const BLOCK_STONE: BlockId = 1;
/// ID for dirt.
pub const BLOCK_DIRT: BlockId = 2;
/// ID for grass.
pub const BLOCK_GRASS: BlockId = 3;
/// ID for sand.
pub const BLOCK_SAND: BlockId = 4;
/// ID for gravel.
pub const BLOCK_GRAVEL: BlockId = 5;
/// ID for still water.
pub const BLOCK_WATER: BlockId = 6;
/// ID for bedrock.
pub const BLOCK_BEDROCK: BlockId = 7;
/// ID for tall grass / plants that any fluid may wash away.
pub const BLOCK_TALL_GRASS: BlockId = 8;
/// ID for leaves.
pub const BLOCK_LEAVES: BlockId = 9;
/// ID for snow layers.
pub const BLOCK_SNOW_LAYER: BlockId = 10;
/// ID for crude oil source blocks.
pub const BLOCK_OIL: BlockId = 20;
/// ID for the oil spring placed at the bottom of large deposits.
pub const BLOCK_OIL_SPRING: BlockId = 21;

/// Chunk-local position (X, Y, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl LocalPos {
    /// Convert to a linear index within the voxel array.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE_X);
        debug_assert!(self.y < CHUNK_SIZE_Y);
        debug_assert!(self.z < CHUNK_SIZE_Z);
        (self.y * CHUNK_SIZE_Z + self.z) * CHUNK_SIZE_X + self.x
    }
}

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given world column.
    pub fn containing(world_x: i32, world_z: i32) -> Self {
        Self {
            x: world_x.div_euclid(CHUNK_SIZE_X as i32),
            z: world_z.div_euclid(CHUNK_SIZE_Z as i32),
        }
    }

    /// World X of the chunk's first column. Wraps for chunks past the `i32` block range.
    pub fn min_world_x(self) -> i32 {
        self.x.wrapping_mul(CHUNK_SIZE_X as i32)
    }

    /// World Z of the chunk's first column. Wraps for chunks past the `i32` block range.
    pub fn min_world_z(self) -> i32 {
        self.z.wrapping_mul(CHUNK_SIZE_Z as i32)
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x.wrapping_add(dx), self.z.wrapping_add(dz))
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Per-voxel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Voxel {
    pub id: BlockId,
}

impl Voxel {
    pub const fn new(id: BlockId) -> Self {
        Self { id }
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Dirty flags set whenever chunk data changes.
    pub struct DirtyFlags: u8 {
        /// Terrain was written after the chunk was filled.
        const BLOCKS = 0b0000_0001;
        /// A spring was registered inside the chunk.
        const SPRINGS = 0b0000_0010;
    }
}

impl Default for DirtyFlags {
    fn default() -> Self {
        DirtyFlags::empty()
    }
}

/// Chunk storing voxel data plus dirty flags.
pub struct Chunk {
    position: ChunkPos,
    voxels: Vec<Voxel>,
    dirty: DirtyFlags,
}

impl Chunk {
    /// Allocate a fresh chunk filled with air.
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            voxels: vec![Voxel::default(); CHUNK_VOLUME],
            dirty: DirtyFlags::empty(),
        }
    }

    #[inline]
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        LocalPos { x, y, z }.index()
    }

    /// Fetch a voxel copy.
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Voxel {
        self.voxels[Self::index(x, y, z)]
    }

    /// Set a voxel and mark the chunk dirty when the value changes.
    pub fn set_voxel(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) {
        let idx = Self::index(x, y, z);
        if self.voxels[idx] != voxel {
            self.voxels[idx] = voxel;
            self.dirty.insert(DirtyFlags::BLOCKS);
        }
    }

    pub(crate) fn mark(&mut self, flags: DirtyFlags) {
        self.dirty.insert(flags);
    }

    /// Fill without touching dirty flags (used when the chunk is first generated).
    pub(crate) fn fill_column(&mut self, x: usize, z: usize, ids: impl Fn(usize) -> BlockId) {
        for y in 0..CHUNK_SIZE_Y {
            let idx = Self::index(x, y, z);
            self.voxels[idx] = Voxel::new(ids(y));
        }
    }

    /// Borrow raw voxel storage, ordered Y-major then Z then X.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Peek at the current dirty flags.
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    /// Consume and return the current dirty flags.
    pub fn take_dirty_flags(&mut self) -> DirtyFlags {
        let flags = self.dirty;
        self.dirty = DirtyFlags::empty();
        flags
    }
}
