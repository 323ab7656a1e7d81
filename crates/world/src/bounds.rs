//! World-space block positions and axis-aligned block boxes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chunk::ChunkPos;

/// Absolute block position in world space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Squared euclidean distance, computed in floating point like block-centre distances.
    pub fn dist_sqr(self, other: BlockPos) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        let dz = f64::from(self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }

    pub fn get(self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Copy of `self` with the coordinate on `axis` replaced.
    pub fn with(self, axis: Axis, value: i32) -> Self {
        match axis {
            Axis::X => Self { x: value, ..self },
            Axis::Y => Self { y: value, ..self },
            Axis::Z => Self { z: value, ..self },
        }
    }

    pub fn chunk(self) -> ChunkPos {
        ChunkPos::containing(self.x, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Cartesian axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Inclusive axis-aligned box of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockBox {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockBox {
    /// Box spanning both corners, whichever order they are given in.
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn single(pos: BlockPos) -> Self {
        Self { min: pos, max: pos }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    pub fn intersects(&self, other: &BlockBox) -> bool {
        ranges_intersect(self.min.x, self.max.x, other.min.x, other.max.x)
            && ranges_intersect(self.min.y, self.max.y, other.min.y, other.max.y)
            && ranges_intersect(self.min.z, self.max.z, other.min.z, other.max.z)
    }

    /// Overlapping region, or `None` when the boxes are disjoint.
    pub fn intersect(&self, other: &BlockBox) -> Option<BlockBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BlockBox {
            min: BlockPos::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            max: BlockPos::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        })
    }

    /// Smallest box holding both.
    pub fn union(&self, other: &BlockBox) -> BlockBox {
        BlockBox::new(
            BlockPos::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            BlockPos::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    pub fn size_x(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn size_y(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    pub fn size_z(&self) -> i32 {
        self.max.z - self.min.z + 1
    }

    pub fn volume(&self) -> u64 {
        self.size_x() as u64 * self.size_y() as u64 * self.size_z() as u64
    }

    /// Iterate every position, X fastest, then Z, then Y.
    pub fn iter(&self) -> impl Iterator<Item = BlockPos> {
        let b = *self;
        (b.min.y..=b.max.y).flat_map(move |y| {
            (b.min.z..=b.max.z)
                .flat_map(move |z| (b.min.x..=b.max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

fn ranges_intersect(a_min: i32, a_max: i32, b_min: i32, b_max: i32) -> bool {
    a_min <= b_max && b_min <= a_max
}
