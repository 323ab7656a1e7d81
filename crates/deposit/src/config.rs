//! Generation settings.
//!
//! The generator never reads process-wide state: a [`DepositConfig`] value is
//! handed to it once and treated as immutable.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use oilgen_world::BiomeKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`DepositConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse deposit config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: &'static str, value: f64 },
}

/// Inclusive-exclusive spout height range, `min + next_int(max - min)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoutRange {
    pub min: i32,
    pub max: i32,
}

impl SpoutRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Range with `min <= max`; misconfigured ranges are swapped silently.
    pub fn normalized(self) -> Self {
        if self.max < self.min {
            Self {
                min: self.max,
                max: self.min,
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositConfig {
    /// Base chance that a chunk roots a large deposit.
    pub large_prob: f64,
    /// Base chance that a chunk roots a medium deposit.
    pub medium_prob: f64,
    /// Base chance that a chunk in a surface-deposit biome roots a lake.
    pub small_prob: f64,
    /// Global multiplier applied to every chance.
    pub generation_rate: f64,
    pub excluded_biomes: BTreeSet<BiomeKey>,
    /// `true`: `excluded_biomes` lists biomes to skip. `false`: it lists the only biomes allowed.
    pub excluded_biomes_is_blacklist: bool,
    /// Biomes with a 3x bonus where surface lakes may form.
    pub surface_deposit_biomes: BTreeSet<BiomeKey>,
    /// Biomes with an additional 30x bonus.
    pub excessive_biomes: BTreeSet<BiomeKey>,
    pub enable_spouts: bool,
    pub large_spout: SpoutRange,
    pub small_spout: SpoutRange,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            large_prob: 0.0004,
            medium_prob: 0.001,
            small_prob: 0.02,
            generation_rate: 1.0,
            excluded_biomes: keys(&["minecraft:the_void", "minecraft:nether_wastes"]),
            excluded_biomes_is_blacklist: true,
            surface_deposit_biomes: keys(&[
                "minecraft:desert",
                "minecraft:ocean",
                "minecraft:deep_ocean",
                "minecraft:warm_ocean",
            ]),
            excessive_biomes: BTreeSet::new(),
            enable_spouts: true,
            large_spout: SpoutRange::new(6, 12),
            small_spout: SpoutRange::new(-1, 1),
        }
    }
}

impl DepositConfig {
    /// Parse and validate a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: DepositConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("large_prob", self.large_prob),
            ("medium_prob", self.medium_prob),
            ("small_prob", self.small_prob),
            ("generation_rate", self.generation_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }
        Ok(())
    }

    /// Whether the biome filter rejects `biome`.
    pub fn is_biome_disabled(&self, biome: &BiomeKey) -> bool {
        self.excluded_biomes.contains(biome) == self.excluded_biomes_is_blacklist
    }

    pub fn is_surface_deposit_biome(&self, biome: &BiomeKey) -> bool {
        self.surface_deposit_biomes.contains(biome)
    }

    pub fn is_excessive_biome(&self, biome: &BiomeKey) -> bool {
        self.excessive_biomes.contains(biome)
    }
}

fn keys(raw: &[&str]) -> BTreeSet<BiomeKey> {
    raw.iter().map(|k| BiomeKey::new(k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        DepositConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = DepositConfig::from_toml_str("").expect("parse");
        assert_eq!(cfg, DepositConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let cfg = DepositConfig::from_toml_str(
            r#"
            generation_rate = 2.5
            surface_deposit_biomes = ["badlands"]
            excluded_biomes_is_blacklist = false

            [large_spout]
            min = 10
            max = 4
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.generation_rate, 2.5);
        assert!(cfg.is_surface_deposit_biome(&BiomeKey::new("minecraft:badlands")));
        assert!(!cfg.excluded_biomes_is_blacklist);
        assert_eq!(cfg.large_spout.normalized(), SpoutRange::new(4, 10));
        assert_eq!(cfg.medium_prob, DepositConfig::default().medium_prob);
    }

    #[test]
    fn negative_probability_is_rejected() {
        let err = DepositConfig::from_toml_str("large_prob = -0.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                field: "large_prob",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = DepositConfig::from_toml_str("large_prob = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DepositConfig::load_from_path(Path::new("/nonexistent/oilgen.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/oilgen.toml"));
    }

    #[test]
    fn blacklist_polarity() {
        let mut cfg = DepositConfig::default();
        let void = BiomeKey::new("the_void");
        let plains = BiomeKey::new("plains");
        assert!(cfg.is_biome_disabled(&void));
        assert!(!cfg.is_biome_disabled(&plains));

        cfg.excluded_biomes_is_blacklist = false;
        assert!(!cfg.is_biome_disabled(&void));
        assert!(cfg.is_biome_disabled(&plains));
    }

    #[test]
    fn normalized_keeps_ordered_range() {
        assert_eq!(SpoutRange::new(-1, 1).normalized(), SpoutRange::new(-1, 1));
    }
}
