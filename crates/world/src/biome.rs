//! Biome identifiers and the layouts the reference world uses to assign them.
//!
//! Biomes are keyed by namespaced string ids (`namespace:path`) so configuration
//! files can name them directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::noise::{NoiseConfig, NoiseGenerator};

/// Namespace assumed for keys written without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Namespaced biome identifier, e.g. `minecraft:desert`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BiomeKey(String);

impl BiomeKey {
    /// Parse a key, defaulting the namespace when it is missing.
    pub fn new(raw: &str) -> Self {
        if raw.contains(':') {
            Self(raw.to_owned())
        } else {
            Self(format!("{DEFAULT_NAMESPACE}:{raw}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map_or(DEFAULT_NAMESPACE, |(ns, _)| ns)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(_, path)| path)
    }
}

impl From<String> for BiomeKey {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<BiomeKey> for String {
    fn from(key: BiomeKey) -> Self {
        key.0
    }
}

impl From<&str> for BiomeKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for BiomeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type BiomeFn = dyn Fn(i32, i32) -> Option<BiomeKey> + Send + Sync;

/// How the reference world assigns biomes to columns.
#[derive(Clone)]
pub enum BiomeLayout {
    /// Every column has the same biome.
    Uniform(BiomeKey),
    /// Noise-driven patches cycling through `biomes`.
    Patches {
        noise: Arc<NoiseGenerator>,
        biomes: Vec<BiomeKey>,
    },
    /// Arbitrary lookup; `None` marks columns whose biome cannot be resolved.
    Custom(Arc<BiomeFn>),
}

impl BiomeLayout {
    pub fn uniform(key: impl Into<BiomeKey>) -> Self {
        Self::Uniform(key.into())
    }

    pub fn patches(seed: u64, biomes: Vec<BiomeKey>) -> Self {
        Self::Patches {
            noise: Arc::new(NoiseGenerator::new(NoiseConfig::patches(seed as u32))),
            biomes,
        }
    }

    pub fn custom<F>(lookup: F) -> Self
    where
        F: Fn(i32, i32) -> Option<BiomeKey> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(lookup))
    }

    pub fn biome_at(&self, world_x: i32, world_z: i32) -> Option<BiomeKey> {
        match self {
            Self::Uniform(key) => Some(key.clone()),
            Self::Patches { noise, biomes } => {
                if biomes.is_empty() {
                    return None;
                }
                let v = noise.sample_2d_range(world_x as f64, world_z as f64, 0.0, 1.0);
                let idx = ((v * biomes.len() as f64) as usize).min(biomes.len() - 1);
                Some(biomes[idx].clone())
            }
            Self::Custom(lookup) => lookup(world_x, world_z),
        }
    }
}

impl fmt::Debug for BiomeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform(key) => f.debug_tuple("Uniform").field(key).finish(),
            Self::Patches { biomes, .. } => {
                f.debug_struct("Patches").field("biomes", biomes).finish()
            }
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
