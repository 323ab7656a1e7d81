//! Solid shapes a deposit is built from.
//!
//! Each shape is a membership predicate over world positions plus a bounding
//! box. Materialising a shape only ever touches positions inside both its own
//! box and the box it is asked to fill, so a chunk population never writes
//! outside the chunk being populated.

use oilgen_world::{
    Axis, BlockBox, BlockPos, ReplacePolicy, WorldAccess, BLOCK_OIL, CHUNK_SIZE_Y,
};
use serde::ser::Serializer;
use serde::Serialize;

use crate::rng::DepositRandom;

/// Slack added to a sphere's squared radius so boundary voxels survive float rounding.
pub const SPHERE_EPSILON: f64 = 0.01;

const MAX_Y: i32 = CHUNK_SIZE_Y as i32 - 1;

/// One piece of a deposit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Structure {
    Tendril(Tendril),
    Sphere(Sphere),
    Spout(Spout),
    Tube(Tube),
    Spring(Spring),
}

impl Structure {
    pub fn bounds(&self) -> BlockBox {
        match self {
            Self::Tendril(s) => s.bounds(),
            Self::Sphere(s) => s.bounds(),
            Self::Spout(s) => s.bounds(),
            Self::Tube(s) => s.bounds(),
            Self::Spring(s) => BlockBox::single(s.pos),
        }
    }

    pub fn policy(&self) -> ReplacePolicy {
        match self {
            Self::Tendril(_) => ReplacePolicy::LakeSurface,
            _ => ReplacePolicy::Always,
        }
    }

    /// Whether `pos` belongs to the shape. Springs have no source voxels.
    pub fn contains<W: WorldAccess + ?Sized>(&self, world: &W, pos: BlockPos) -> bool {
        match self {
            Self::Tendril(s) => s.contains(world, pos),
            Self::Sphere(s) => s.contains(pos),
            Self::Spout(s) => s.contains(world, pos),
            Self::Tube(s) => s.contains(pos),
            Self::Spring(_) => false,
        }
    }

    /// Write the shape's oil into `world`, limited to `within`.
    /// Returns how many writes the world accepted.
    pub fn materialize<W: WorldAccess + ?Sized>(&self, world: &mut W, within: &BlockBox) -> usize {
        let Some(clip) = self.bounds().intersect(within) else {
            return 0;
        };
        match self {
            Self::Tendril(s) => s.materialize(world, &clip),
            Self::Spring(_) => 0,
            _ => {
                let policy = self.policy();
                let mut written = 0;
                for pos in clip.iter() {
                    if self.contains(&*world, pos) && world.set_voxel(pos, BLOCK_OIL, policy) {
                        written += 1;
                    }
                }
                written
            }
        }
    }

    /// Source voxels the full shape holds, independent of any clipping.
    pub fn source_voxel_count<W: WorldAccess + ?Sized>(&self, world: &W) -> usize {
        match self {
            Self::Tendril(s) => s.source_voxel_count(),
            Self::Sphere(s) => s.source_voxel_count(),
            Self::Spout(s) => s.source_voxel_count(world),
            Self::Tube(s) => s.source_voxel_count(),
            Self::Spring(_) => 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tendril(_) => "tendril",
            Self::Sphere(_) => "sphere",
            Self::Spout(_) => "spout",
            Self::Tube(_) => "tube",
            Self::Spring(_) => "spring",
        }
    }
}

/// Ball of radius `radius` around `center`, boundary inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sphere {
    pub center: BlockPos,
    pub radius: i32,
}

impl Sphere {
    pub fn new(center: BlockPos, radius: i32) -> Self {
        Self { center, radius }
    }

    pub fn bounds(&self) -> BlockBox {
        let r = self.radius;
        BlockBox::new(self.center.offset(-r, -r, -r), self.center.offset(r, r, r))
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.dist_sqr(self.center) <= f64::from(self.radius * self.radius) + SPHERE_EPSILON
    }

    pub fn source_voxel_count(&self) -> usize {
        self.bounds().iter().filter(|p| self.contains(*p)).count()
    }
}

/// Cylinder of `radius` starting at `center` and running `length` blocks along `axis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tube {
    pub center: BlockPos,
    pub length: i32,
    pub radius: i32,
    pub axis: Axis,
}

impl Tube {
    pub fn new(center: BlockPos, length: i32, radius: i32, axis: Axis) -> Self {
        Self {
            center,
            length,
            radius,
            axis,
        }
    }

    /// Vertical tube rising from `base`.
    pub fn vertical(base: BlockPos, height: i32, radius: i32) -> Self {
        Self::new(base, height, radius, Axis::Y)
    }

    pub fn bounds(&self) -> BlockBox {
        let r = self.radius;
        let along = self.center.get(self.axis);
        let min = self.center.offset(-r, -r, -r).with(self.axis, along);
        let max = self.center.offset(r, r, r).with(self.axis, along + self.length);
        BlockBox::new(min, max)
    }

    /// Projects `pos` onto the plane through the centre perpendicular to the axis.
    pub fn contains(&self, pos: BlockPos) -> bool {
        if !self.bounds().contains(pos) {
            return false;
        }
        let projected = pos.with(self.axis, self.center.get(self.axis));
        projected.dist_sqr(self.center) <= f64::from(self.radius * self.radius)
    }

    pub fn source_voxel_count(&self) -> usize {
        self.bounds().iter().filter(|p| self.contains(*p)).count()
    }
}

/// Vertical shaft from `start` up to the surface, topped by a plume that
/// narrows by one block of radius every `height` blocks above ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spout {
    pub start: BlockPos,
    pub height: i32,
    pub radius: i32,
}

impl Spout {
    pub fn new(start: BlockPos, height: i32, radius: i32) -> Self {
        Self {
            start,
            height,
            radius,
        }
    }

    pub fn bounds(&self) -> BlockBox {
        let r = self.radius;
        BlockBox::new(
            BlockPos::new(self.start.x - r, self.start.y, self.start.z - r),
            BlockPos::new(self.start.x + r, MAX_Y, self.start.z + r),
        )
    }

    /// Radius of the spout at height `y`, or `None` when `y` is outside it.
    fn radius_at(&self, y: i32, surface_y: i32) -> Option<i32> {
        if y < self.start.y {
            return None;
        }
        if y < surface_y {
            return Some(self.radius);
        }
        if self.height <= 0 {
            return None;
        }
        let step = (y - surface_y) / self.height;
        (step <= self.radius).then(|| self.radius - step)
    }

    pub fn contains<W: WorldAccess + ?Sized>(&self, world: &W, pos: BlockPos) -> bool {
        let surface_y = world.surface_y(self.start.x, self.start.z);
        let Some(r) = self.radius_at(pos.y, surface_y) else {
            return false;
        };
        let dx = pos.x - self.start.x;
        let dz = pos.z - self.start.z;
        dx * dx + dz * dz <= r * r
    }

    pub fn source_voxel_count<W: WorldAccess + ?Sized>(&self, world: &W) -> usize {
        let surface_y = world.surface_y(self.start.x, self.start.z);
        let shaft = (surface_y - self.start.y).max(0) as usize * disk_area(self.radius);
        let plume = if self.height > 0 {
            (0..=self.radius)
                .map(|r| self.height as usize * disk_area(r))
                .sum()
        } else {
            0
        };
        shaft + plume
    }
}

fn disk_area(radius: i32) -> usize {
    let mut n = 0;
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            if dx * dx + dz * dz <= radius * radius {
                n += 1;
            }
        }
    }
    n
}

/// Single spring block at the bottom of a large deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spring {
    pub pos: BlockPos,
}

impl Spring {
    pub fn new(pos: BlockPos) -> Self {
        Self { pos }
    }

    /// Place the spring, fed by `source_count` source voxels.
    pub fn place<W: WorldAccess + ?Sized>(&self, world: &mut W, source_count: usize) -> bool {
        world.place_spring(self.pos, source_count)
    }
}

/// Square occupancy grid of side `2 * radius + 1`, indexed `[x][z]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TendrilPattern {
    radius: i32,
    cells: Vec<bool>,
}

impl TendrilPattern {
    pub fn empty(radius: i32) -> Self {
        let side = (2 * radius + 1) as usize;
        Self {
            radius,
            cells: vec![false; side * side],
        }
    }

    /// Disk of `lake_radius` grown outwards ring by ring up to `radius - 1`.
    ///
    /// A cell on ring `w` is considered with probability `(radius - w + 4) / (radius + 4)`
    /// and, when considered, becomes occupied iff one of its 4-neighbours is.
    pub fn grow<R: DepositRandom + ?Sized>(lake_radius: i32, radius: i32, rng: &mut R) -> Self {
        let mut pattern = Self::empty(radius);
        let lake_radius = lake_radius.min(radius);
        let c = radius;

        for dx in -lake_radius..=lake_radius {
            for dz in -lake_radius..=lake_radius {
                pattern.set(c + dx, c + dz, dx * dx + dz * dz <= lake_radius * lake_radius);
            }
        }

        for w in 1..radius {
            let proba = (radius - w + 4) as f32 / (radius + 4) as f32;

            pattern.grow_cell(rng, proba, c, c + w);
            pattern.grow_cell(rng, proba, c, c - w);
            pattern.grow_cell(rng, proba, c + w, c);
            pattern.grow_cell(rng, proba, c - w, c);

            for i in 1..=w {
                pattern.grow_cell(rng, proba, c + i, c + w);
                pattern.grow_cell(rng, proba, c + i, c - w);
                pattern.grow_cell(rng, proba, c + w, c + i);
                pattern.grow_cell(rng, proba, c - w, c + i);

                pattern.grow_cell(rng, proba, c - i, c + w);
                pattern.grow_cell(rng, proba, c - i, c - w);
                pattern.grow_cell(rng, proba, c + w, c - i);
                pattern.grow_cell(rng, proba, c - w, c - i);
            }
        }
        pattern
    }

    fn grow_cell<R: DepositRandom + ?Sized>(&mut self, rng: &mut R, proba: f32, x: i32, z: i32) {
        if rng.next_float() <= proba {
            let touching = self.is_set(x, z - 1)
                || self.is_set(x, z + 1)
                || self.is_set(x - 1, z)
                || self.is_set(x + 1, z);
            self.set(x, z, touching);
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn side(&self) -> i32 {
        2 * self.radius + 1
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let side = self.side();
        ((0..side).contains(&x) && (0..side).contains(&z)).then(|| (x * side + z) as usize)
    }

    /// Out-of-grid cells read as unset.
    pub fn is_set(&self, x: i32, z: i32) -> bool {
        self.index(x, z).is_some_and(|i| self.cells[i])
    }

    pub fn set(&mut self, x: i32, z: i32, value: bool) {
        if let Some(i) = self.index(x, z) {
            self.cells[i] = value;
        }
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Rows along Z, one string per X, `#` for occupied cells.
    pub fn rows(&self) -> Vec<String> {
        let side = self.side();
        (0..side)
            .map(|x| {
                (0..side)
                    .map(|z| if self.is_set(x, z) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }
}

impl Serialize for TendrilPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

/// Surface lake and the tendrils flowing out of it.
///
/// Every occupied cell becomes `depth` oil blocks directly beneath the column's
/// surface, replacing only soft surface material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tendril {
    /// World position of pattern cell `[0][0]`.
    pub start: BlockPos,
    pub depth: i32,
    pub pattern: TendrilPattern,
}

impl Tendril {
    /// Grow a tendril centred on `center`, drawing the pattern and then the depth.
    pub fn generate<R: DepositRandom + ?Sized>(
        center: BlockPos,
        lake_radius: i32,
        radius: i32,
        rng: &mut R,
    ) -> Self {
        let pattern = TendrilPattern::grow(lake_radius, radius, rng);
        let depth = if rng.next_double() < 0.5 { 1 } else { 2 };
        Self {
            start: center.offset(-radius, 0, -radius),
            depth,
            pattern,
        }
    }

    pub fn bounds(&self) -> BlockBox {
        let last = self.pattern.side() - 1;
        BlockBox::new(
            BlockPos::new(self.start.x, 0, self.start.z),
            BlockPos::new(self.start.x + last, MAX_Y, self.start.z + last),
        )
    }

    fn column_set(&self, x: i32, z: i32) -> bool {
        self.pattern.is_set(x - self.start.x, z - self.start.z)
    }

    pub fn contains<W: WorldAccess + ?Sized>(&self, world: &W, pos: BlockPos) -> bool {
        if !self.column_set(pos.x, pos.z) {
            return false;
        }
        let surface_y = world.surface_y(pos.x, pos.z);
        (surface_y - self.depth..surface_y).contains(&pos.y)
    }

    fn materialize<W: WorldAccess + ?Sized>(&self, world: &mut W, clip: &BlockBox) -> usize {
        let mut written = 0;
        for z in clip.min.z..=clip.max.z {
            for x in clip.min.x..=clip.max.x {
                if !self.column_set(x, z) {
                    continue;
                }
                let surface_y = world.surface_y(x, z);
                let lo = (surface_y - self.depth).max(clip.min.y);
                let hi = (surface_y - 1).min(clip.max.y);
                for y in lo..=hi {
                    if world.set_voxel(BlockPos::new(x, y, z), BLOCK_OIL, ReplacePolicy::LakeSurface)
                    {
                        written += 1;
                    }
                }
            }
        }
        written
    }

    pub fn source_voxel_count(&self) -> usize {
        self.pattern.occupied() * self.depth as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ChunkRng, ScriptedRandom};
    use oilgen_world::{BiomeLayout, Terrain, VoxelWorld, BLOCK_STONE};
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn flat_world() -> VoxelWorld {
        VoxelWorld::new(Terrain::flat(64), BiomeLayout::uniform("plains"))
    }

    #[test]
    fn sphere_boundary_is_inclusive() {
        let sphere = Sphere::new(BlockPos::new(0, 30, 0), 4);
        assert!(sphere.contains(BlockPos::new(4, 30, 0)));
        assert!(sphere.contains(BlockPos::new(0, 26, 0)));
        assert!(!sphere.contains(BlockPos::new(5, 30, 0)));
        assert!(!sphere.contains(BlockPos::new(0, 30, -5)));
        // 3² + 3² = 18 > 16
        assert!(!sphere.contains(BlockPos::new(3, 30, 3)));
    }

    #[test]
    fn sphere_count_matches_bruteforce() {
        let sphere = Sphere::new(BlockPos::new(10, 25, -10), 2);
        // Lattice points with x²+y²+z² <= 4.
        assert_eq!(sphere.source_voxel_count(), 33);
    }

    #[test]
    fn vertical_tube_spans_length_inclusive() {
        let tube = Tube::vertical(BlockPos::new(0, 1, 0), 20, 1);
        let b = tube.bounds();
        assert_eq!(b.min, BlockPos::new(-1, 1, -1));
        assert_eq!(b.max, BlockPos::new(1, 21, 1));
        assert!(tube.contains(BlockPos::new(0, 21, 0)));
        assert!(tube.contains(BlockPos::new(1, 10, 0)));
        assert!(!tube.contains(BlockPos::new(1, 10, 1)));
        assert!(!tube.contains(BlockPos::new(0, 22, 0)));
        assert_eq!(tube.source_voxel_count(), 21 * 5);
    }

    #[test]
    fn horizontal_tube_projects_onto_axis_plane() {
        let tube = Tube::new(BlockPos::new(0, 10, 0), 5, 2, Axis::X);
        assert!(tube.contains(BlockPos::new(3, 12, 0)));
        assert!(tube.contains(BlockPos::new(5, 10, -2)));
        assert!(!tube.contains(BlockPos::new(6, 10, 0)));
        assert!(!tube.contains(BlockPos::new(2, 12, 1)));
    }

    #[test]
    fn spout_reaches_surface_and_plume() {
        let world = flat_world();
        let spout = Spout::new(BlockPos::new(0, 20, 0), 3, 1);
        assert!(spout.contains(&world, BlockPos::new(0, 20, 0)));
        assert!(spout.contains(&world, BlockPos::new(1, 63, 0)));
        // First plume segment keeps radius 1, second narrows to the centre column.
        assert!(spout.contains(&world, BlockPos::new(1, 66, 0)));
        assert!(!spout.contains(&world, BlockPos::new(1, 67, 0)));
        assert!(spout.contains(&world, BlockPos::new(0, 69, 0)));
        assert!(!spout.contains(&world, BlockPos::new(0, 70, 0)));
        assert!(!spout.contains(&world, BlockPos::new(0, 19, 0)));
        // shaft 44 layers * 5 + plume 3 * 5 + 3 * 1
        assert_eq!(spout.source_voxel_count(&world), 44 * 5 + 15 + 3);
    }

    #[test]
    fn spout_without_height_stops_below_surface() {
        let world = flat_world();
        let spout = Spout::new(BlockPos::new(0, 25, 0), -1, 0);
        assert!(spout.contains(&world, BlockPos::new(0, 63, 0)));
        assert!(!spout.contains(&world, BlockPos::new(0, 64, 0)));
        assert_eq!(spout.source_voxel_count(&world), 39);
    }

    #[test]
    fn materialize_clips_to_box() {
        let mut world = flat_world();
        world.record_writes();
        let sphere = Structure::Sphere(Sphere::new(BlockPos::new(0, 30, 0), 5));
        let within = BlockBox::new(BlockPos::new(0, 0, 0), BlockPos::new(15, 255, 15));
        let written = sphere.materialize(&mut world, &within);
        let writes = world.take_writes();
        assert_eq!(written, writes.len());
        assert!(written > 0);

        let expected: BTreeSet<BlockPos> = sphere
            .bounds()
            .iter()
            .filter(|p| within.contains(*p) && sphere.contains(&world, *p))
            .collect();
        let actual: BTreeSet<BlockPos> = writes.iter().map(|w| w.pos).collect();
        assert_eq!(actual.len(), writes.len());
        assert_eq!(actual, expected);
    }

    #[test]
    fn disjoint_box_writes_nothing() {
        let mut world = flat_world();
        let tube = Structure::Tube(Tube::vertical(BlockPos::new(0, 1, 0), 10, 1));
        let far = BlockBox::new(BlockPos::new(100, 0, 100), BlockPos::new(115, 255, 115));
        assert_eq!(tube.materialize(&mut world, &far), 0);
    }

    #[test]
    fn tendril_pattern_starts_with_lake_disk() {
        let mut rng = ScriptedRandom::new([]).with_fallback(0.999);
        let pattern = TendrilPattern::grow(2, 5, &mut rng);
        // Every ring draw fails with 0.999 > proba, so only the disk remains.
        assert_eq!(pattern.occupied(), 13);
        assert!(pattern.is_set(5, 5));
        assert!(pattern.is_set(7, 5));
        assert!(!pattern.is_set(7, 7));
        assert_eq!(rng.draws().len(), 4 * (5 * 5 - 1));
    }

    #[test]
    fn tendril_pattern_fills_when_every_draw_succeeds() {
        let mut rng = ScriptedRandom::new([]);
        let pattern = TendrilPattern::grow(2, 5, &mut rng);
        // Rings 1..=4 around the centre are all connected: a 9x9 square.
        assert_eq!(pattern.occupied(), 81);
        assert!(!pattern.is_set(0, 0));
        assert!(!pattern.is_set(10, 5));
    }

    #[test]
    fn tendril_writes_beneath_surface_only_on_soft_blocks() {
        let mut world = flat_world();
        world.record_writes();
        let mut rng = ScriptedRandom::new([]).with_fallback(0.999);
        let tendril = Tendril::generate(BlockPos::new(8, 62, 8), 2, 5, &mut rng);
        assert_eq!(tendril.depth, 2);
        let structure = Structure::Tendril(tendril);
        let within = BlockBox::new(BlockPos::new(-100, 0, -100), BlockPos::new(100, 255, 100));
        let written = structure.materialize(&mut world, &within);
        // 13 columns, grass at 63 and dirt at 62.
        assert_eq!(written, 26);
        assert_eq!(structure.source_voxel_count(&world), 26);
        assert!(world
            .take_writes()
            .iter()
            .all(|w| w.pos.y == 63 || w.pos.y == 62));
        assert_ne!(world.block(BlockPos::new(8, 61, 8)), BLOCK_OIL);
    }

    #[test]
    fn tendril_does_not_replace_stone_surface() {
        let terrain = Terrain::flat(64).with_top(BLOCK_STONE);
        let mut world = VoxelWorld::new(terrain, BiomeLayout::uniform("plains"));
        let mut rng = ScriptedRandom::new([]).with_fallback(0.999);
        let structure = Structure::Tendril(Tendril::generate(
            BlockPos::new(0, 62, 0),
            2,
            5,
            &mut rng,
        ));
        let within = BlockBox::new(BlockPos::new(-50, 0, -50), BlockPos::new(50, 255, 50));
        let written = structure.materialize(&mut world, &within);
        // Depth 2: the stone top layer is kept, the dirt below is replaced.
        assert_eq!(written, 13);
    }

    #[test]
    fn grown_patterns_are_connected() {
        for seed in 0..64u64 {
            let mut rng = ChunkRng::seed_from_u64(seed);
            let pattern = TendrilPattern::grow(4, 30, &mut rng);
            assert_connected(&pattern);
        }
    }

    pub(crate) fn assert_connected(pattern: &TendrilPattern) {
        let side = pattern.side();
        let c = pattern.radius();
        let mut seen = vec![false; (side * side) as usize];
        let mut stack = vec![(c, c)];
        let mut reached = 0;
        while let Some((x, z)) = stack.pop() {
            if !pattern.is_set(x, z) || seen[(x * side + z) as usize] {
                continue;
            }
            seen[(x * side + z) as usize] = true;
            reached += 1;
            stack.extend([(x + 1, z), (x - 1, z), (x, z + 1), (x, z - 1)]);
        }
        assert_eq!(reached, pattern.occupied(), "pattern has floating cells");
    }

    #[test]
    fn pattern_rows_serialize_as_strings() {
        let mut pattern = TendrilPattern::empty(1);
        pattern.set(1, 1, true);
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, r#"["...",".#.","..."]"#);
    }
}
