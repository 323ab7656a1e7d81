use oilgen_deposit::DepositConfig;
use oilgen_world::{BiomeKey, BiomeLayout, Terrain, VoxelWorld};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/oilgen.toml";

/// Settings for the `oilgen` binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// World seed used when `--seed` is not given.
    pub seed: u64,
    /// Deposits kept in the generator's cache; 0 disables it.
    pub cache_capacity: usize,
    pub world: WorldSettings,
    pub deposits: DepositConfig,
}

/// Shape of the reference world the binary generates into.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldSettings {
    /// First air block above flat terrain, or the mean height of rolling terrain.
    pub surface_y: i32,
    /// Height variation of rolling terrain; 0 keeps the world flat.
    pub hill_amplitude: i32,
    /// One biome fills the world; several are scattered in noise patches.
    pub biomes: Vec<BiomeKey>,
    /// Whether the world has a spring block.
    pub springs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            cache_capacity: 4096,
            world: WorldSettings::default(),
            deposits: DepositConfig::default(),
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            surface_y: 64,
            hill_amplitude: 0,
            biomes: vec![BiomeKey::new("desert")],
            springs: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        let config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AppConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                AppConfig::default()
            }
        };
        config.validated()
    }

    /// Replace an invalid deposit section with defaults.
    fn validated(mut self) -> Self {
        if let Err(err) = self.deposits.validate() {
            warn!("Invalid deposit settings: {err}. Using default deposit settings");
            self.deposits = DepositConfig::default();
        }
        self
    }
}

impl WorldSettings {
    /// Build an empty reference world.
    pub fn build(&self, seed: u64) -> VoxelWorld {
        let terrain = if self.hill_amplitude > 0 {
            Terrain::rolling(seed, self.surface_y, self.hill_amplitude)
        } else {
            Terrain::flat(self.surface_y)
        };
        let biomes = match self.biomes.as_slice() {
            [] => BiomeLayout::custom(|_, _| None),
            [single] => BiomeLayout::uniform(single.clone()),
            many => BiomeLayout::patches(seed, many.to_vec()),
        };
        let world = VoxelWorld::new(terrain, biomes);
        if self.springs {
            world
        } else {
            world.without_springs()
        }
    }
}
