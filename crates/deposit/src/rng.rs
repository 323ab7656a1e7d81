//! Deterministic per-chunk random streams.
//!
//! Every deposit is re-derived from scratch each time a nearby chunk is
//! populated, so the stream for a chunk must be a pure function of
//! `(world seed, chunk, salt)`. The stream is SplitMix64 seeded through
//! [`chunk_seed`]; it never depends on `rand`'s unspecified `StdRng` algorithm.

use std::collections::VecDeque;

use oilgen_world::ChunkPos;
use rand::{RngCore, SeedableRng};
use serde::Serialize;

/// Salt that separates the oil generator's streams from other generators.
pub const OIL_GEN_SALT: u64 = 0xD0_46_B4_E4_0C_7D_07_CF;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const Z_MULTIPLIER: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// SplitMix64 output finaliser.
#[inline]
pub fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for a chunk's stream. Coordinates are sign-extended before mixing.
pub fn chunk_seed(world_seed: u64, chunk: ChunkPos, salt: u64) -> u64 {
    mix64(
        world_seed
            ^ (chunk.x as u64).wrapping_mul(GOLDEN_GAMMA)
            ^ (chunk.z as u64).wrapping_mul(Z_MULTIPLIER)
            ^ salt,
    )
}

/// Stream for `chunk` under `salt`.
pub fn rng_for(world_seed: u64, chunk: ChunkPos, salt: u64) -> ChunkRng {
    ChunkRng::seed_from_u64(chunk_seed(world_seed, chunk, salt))
}

/// The draws deposit generation is written against.
pub trait DepositRandom {
    /// Uniform integer in `[0, bound)`. Non-positive bounds yield 0.
    fn next_int(&mut self, bound: i32) -> i32;
    /// Uniform double in `[0, 1)`.
    fn next_double(&mut self) -> f64;
    /// Uniform float in `[0, 1)`.
    fn next_float(&mut self) -> f32;
}

/// SplitMix64 stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRng {
    state: u64,
}

impl RngCore for ChunkRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        mix64(self.state)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for ChunkRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            state: u64::from_le_bytes(seed),
        }
    }

    fn seed_from_u64(state: u64) -> Self {
        Self { state }
    }
}

impl DepositRandom for ChunkRng {
    fn next_int(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        ((u64::from(self.next_u32()) * bound as u64) >> 32) as i32
    }

    fn next_double(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn next_float(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 * (1.0 / (1u32 << 24) as f32)
    }
}

/// One draw taken from a [`DepositRandom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Draw {
    Int(i32),
    Double,
    Float,
}

/// Replays scripted unit values and records every draw taken.
///
/// Each draw consumes one value in `[0, 1)`: doubles and floats return it as
/// is, `next_int(n)` maps it to `floor(v * n)`. When the script runs out the
/// fallback value is used.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    script: VecDeque<f64>,
    fallback: f64,
    draws: Vec<Draw>,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: 0.0,
            draws: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Every draw taken so far, in order.
    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    /// Scripted values not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next_unit(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

impl DepositRandom for ScriptedRandom {
    fn next_int(&mut self, bound: i32) -> i32 {
        self.draws.push(Draw::Int(bound));
        let unit = self.next_unit();
        if bound <= 0 {
            return 0;
        }
        ((unit * f64::from(bound)) as i32).clamp(0, bound - 1)
    }

    fn next_double(&mut self) -> f64 {
        self.draws.push(Draw::Double);
        self.next_unit()
    }

    fn next_float(&mut self) -> f32 {
        self.draws.push(Draw::Float);
        self.next_unit() as f32
    }
}
