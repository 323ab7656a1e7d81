//! Turns a placement into the ordered structures of one deposit.
//!
//! Order matters: later structures are written after earlier ones, so the
//! tube carves through the cavity and the spring goes in last.

use oilgen_world::BlockPos;

use crate::config::{DepositConfig, SpoutRange};
use crate::placement::{DepositClass, Placement};
use crate::rng::DepositRandom;
use crate::structure::{Sphere, Spout, Spring, Structure, Tendril, Tube};

/// Y level the tendril pattern is anchored at.
pub const TENDRIL_Y: i32 = 62;

const WELL_Y_BASE: i32 = 20;
const WELL_Y_SPREAD: i32 = 10;

/// Build the structures for `placement` centred on column `(x, z)`.
///
/// Draw order after the tendril: well Y, cavity radius, spout height.
/// Lakes stop after the tendril.
pub fn compose<R: DepositRandom + ?Sized>(
    rng: &mut R,
    placement: &Placement,
    x: i32,
    z: i32,
    config: &DepositConfig,
    springs_available: bool,
) -> Vec<Structure> {
    if placement.is_none() {
        return Vec::new();
    }

    let mut structures = vec![Structure::Tendril(Tendril::generate(
        BlockPos::new(x, TENDRIL_Y, z),
        placement.lake_radius,
        placement.tendril_radius,
        rng,
    ))];

    if placement.class == DepositClass::Lake {
        return structures;
    }

    let large = placement.class == DepositClass::Large;
    let well_y = WELL_Y_BASE + rng.next_int(WELL_Y_SPREAD);
    let cavity_radius = if large {
        8 + rng.next_int(9)
    } else {
        4 + rng.next_int(4)
    };
    structures.push(Structure::Sphere(Sphere::new(
        BlockPos::new(x, well_y, z),
        cavity_radius,
    )));

    let mut tube_radius = cavity_radius;
    if config.enable_spouts {
        let (range, radius) = if large {
            (config.large_spout, 1)
        } else {
            (config.small_spout, 0)
        };
        let height = spout_height(rng, range);
        structures.push(Structure::Spout(Spout::new(
            BlockPos::new(x, well_y, z),
            height,
            radius,
        )));
        tube_radius = radius;
    }

    if large {
        structures.push(Structure::Tube(Tube::vertical(
            BlockPos::new(x, 1, z),
            well_y,
            tube_radius,
        )));
        if springs_available {
            structures.push(Structure::Spring(Spring::new(BlockPos::new(x, 0, z))));
        }
    }

    structures
}

fn spout_height<R: DepositRandom + ?Sized>(rng: &mut R, range: SpoutRange) -> i32 {
    let range = range.normalized();
    if range.min == range.max {
        range.min
    } else {
        range.min + rng.next_int(range.max - range.min)
    }
}
