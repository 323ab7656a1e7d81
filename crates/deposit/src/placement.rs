//! Per-chunk decision of whether, and how large, a deposit forms.

use oilgen_world::BiomeKey;
use serde::Serialize;
use tracing::trace;

use crate::config::DepositConfig;
use crate::rng::DepositRandom;

/// Distance from the origin inside which end-like biomes never get deposits.
pub const END_PROTECTED_RADIUS: i32 = 1200;

const SURFACE_BONUS: f64 = 3.0;
const EXCESSIVE_BONUS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositClass {
    Large,
    Medium,
    Lake,
    None,
}

impl DepositClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Large => "large",
            Self::Medium => "medium",
            Self::Lake => "lake",
            Self::None => "none",
        }
    }
}

/// Outcome of the placement draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub class: DepositClass,
    pub lake_radius: i32,
    pub tendril_radius: i32,
}

impl Placement {
    pub const NONE: Placement = Placement {
        class: DepositClass::None,
        lake_radius: 0,
        tendril_radius: 0,
    };

    pub fn is_none(&self) -> bool {
        self.class == DepositClass::None
    }
}

/// Where the deposit would sit and what the world says about it.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub x: i32,
    pub z: i32,
    /// `None` when the host could not resolve the biome.
    pub biome: Option<&'a BiomeKey>,
}

/// Biome-modulated chance multiplier.
pub fn bonus(config: &DepositConfig, biome: &BiomeKey) -> f64 {
    let mut bonus = if config.is_surface_deposit_biome(biome) {
        SURFACE_BONUS
    } else {
        1.0
    };
    bonus *= config.generation_rate;
    if config.is_excessive_biome(biome) {
        bonus *= EXCESSIVE_BONUS;
    }
    bonus
}

/// End-like biomes near the origin stay clear. Either axis being close is enough.
fn in_protected_end_area(biome: &BiomeKey, x: i32, z: i32) -> bool {
    biome.path().contains("end")
        && (x.abs() < END_PROTECTED_RADIUS || z.abs() < END_PROTECTED_RADIUS)
}

/// Decide the class and tendril sizing for a site.
///
/// Draw order: up to three chance doubles (large, medium, lake), then one
/// tendril radius int. The lake chance is only drawn in surface-deposit biomes.
pub fn decide<R: DepositRandom + ?Sized>(
    rng: &mut R,
    site: Site<'_>,
    config: &DepositConfig,
) -> Placement {
    let Some(biome) = site.biome else {
        trace!(x = site.x, z = site.z, "biome unresolved, no deposit");
        return Placement::NONE;
    };

    if config.is_biome_disabled(biome) {
        trace!(%biome, x = site.x, z = site.z, "biome disabled, no deposit");
        return Placement::NONE;
    }

    if in_protected_end_area(biome, site.x, site.z) {
        trace!(%biome, x = site.x, z = site.z, "end biome near origin, no deposit");
        return Placement::NONE;
    }

    let surface_biome = config.is_surface_deposit_biome(biome);
    let bonus = bonus(config, biome);

    let class = if rng.next_double() <= config.large_prob * bonus {
        DepositClass::Large
    } else if rng.next_double() <= config.medium_prob * bonus {
        DepositClass::Medium
    } else if surface_biome && rng.next_double() <= config.small_prob * bonus {
        DepositClass::Lake
    } else {
        trace!(%biome, x = site.x, z = site.z, "no threshold met");
        return Placement::NONE;
    };

    let (lake_radius, tendril_radius) = match class {
        DepositClass::Large => (4, 25 + rng.next_int(20)),
        DepositClass::Lake => (6, 25 + rng.next_int(20)),
        _ => (2, 5 + rng.next_int(10)),
    };

    Placement {
        class,
        lake_radius,
        tendril_radius,
    }
}
